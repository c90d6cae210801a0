//! Responses API Provider
//!
//! 核心组件，负责与上游模型服务通信：
//! 流式会话、最终响应查询以及文件的上传、删除和下载

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::Client;

use crate::http_client::{build_client, ProxyConfig};
use crate::model::config::Config;

use super::decoder::decode_response;
use super::model::files::{RemoteFile, PURPOSE_ASSISTANTS};
use super::model::requests::{ResponsesRequest, Tool};
use super::model::response::FinalResponse;
use super::source::{EventSource, EventStream};

/// 非流式请求超时（秒）
const API_TIMEOUT_SECS: u64 = 120;

/// 项目 ID 请求头
const PROJECT_HEADER: &str = "openai-project";

/// Responses API Provider
pub struct ResponsesProvider {
    config: Config,
    /// 非流式请求使用，带整体超时
    client: Client,
    /// 流式会话使用，不限制读取时长
    stream_client: Client,
}

impl ResponsesProvider {
    /// 创建新的 Provider 实例
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let proxy = ProxyConfig::from_config(&config);
        let client = build_client(proxy.as_ref(), Some(Duration::from_secs(API_TIMEOUT_SECS)))?;
        let stream_client = build_client(proxy.as_ref(), None)?;

        Ok(Self {
            config,
            client,
            stream_client,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 拼接 API 地址
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// 构建请求头
    fn build_headers(config: &Config) -> anyhow::Result<HeaderMap> {
        let api_key = config
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("未配置上游 API 密钥"))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))?,
        );
        if let Some(project) = config.project.as_deref().filter(|p| !p.is_empty()) {
            headers.insert(PROJECT_HEADER, HeaderValue::from_str(project)?);
        }

        Ok(headers)
    }

    /// 构建流式会话请求体，模型、温度和工具选择策略来自配置
    pub fn build_request(&self, query: &str, file_ids: &[String]) -> ResponsesRequest {
        ResponsesRequest::new(self.config.model_uri(), query, self.config.temperature)
            .with_tool(Tool::code_interpreter(file_ids.to_vec()))
    }

    /// 非 2xx 响应转换为错误
    async fn ensure_success(response: reqwest::Response, what: &str) -> anyhow::Result<reqwest::Response> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("{}失败: {} {}", what, status, body);
        }
        Ok(response)
    }

    /// 发送流式请求
    ///
    /// # Returns
    /// 返回原始的 HTTP Response，调用方负责处理流式数据
    pub async fn call_api_stream(&self, query: &str, file_ids: &[String]) -> anyhow::Result<reqwest::Response> {
        let headers = Self::build_headers(&self.config)?;
        let request = self.build_request(query, file_ids);

        let response = self
            .stream_client
            .post(self.url("responses"))
            .headers(headers)
            .header(ACCEPT, "text/event-stream")
            .json(&request)
            .send()
            .await?;

        Self::ensure_success(response, "流式 API 请求").await
    }

    /// 按 ID 获取完整响应
    pub async fn retrieve_response(&self, response_id: &str) -> anyhow::Result<FinalResponse> {
        let headers = Self::build_headers(&self.config)?;
        let response = self
            .client
            .get(self.url(&format!("responses/{}", response_id)))
            .headers(headers)
            .send()
            .await?;

        let response = Self::ensure_success(response, "获取响应").await?;
        Ok(response.json().await?)
    }

    /// 上传 CSV 文件
    pub async fn upload_file(&self, filename: &str, content: Vec<u8>) -> anyhow::Result<RemoteFile> {
        let headers = Self::build_headers(&self.config)?;
        let part = Part::bytes(content)
            .file_name(filename.to_string())
            .mime_str("text/csv")?;
        let form = Form::new()
            .text("purpose", PURPOSE_ASSISTANTS)
            .part("file", part);

        let response = self
            .client
            .post(self.url("files"))
            .headers(headers)
            .multipart(form)
            .send()
            .await?;

        let response = Self::ensure_success(response, "上传文件").await?;
        Ok(response.json().await?)
    }

    /// 删除文件
    pub async fn delete_file(&self, file_id: &str) -> anyhow::Result<()> {
        let headers = Self::build_headers(&self.config)?;
        let response = self
            .client
            .delete(self.url(&format!("files/{}", file_id)))
            .headers(headers)
            .send()
            .await?;

        Self::ensure_success(response, "删除文件").await?;
        Ok(())
    }

    /// 下载文件内容
    pub async fn file_content(&self, file_id: &str) -> anyhow::Result<Bytes> {
        let headers = Self::build_headers(&self.config)?;
        let response = self
            .client
            .get(self.url(&format!("files/{}/content", file_id)))
            .headers(headers)
            .send()
            .await?;

        let response = Self::ensure_success(response, "下载文件").await?;
        Ok(response.bytes().await?)
    }
}

#[async_trait]
impl EventSource for ResponsesProvider {
    async fn open(&self, query: &str, file_ids: &[String]) -> anyhow::Result<EventStream> {
        let response = self.call_api_stream(query, file_ids).await?;
        Ok(decode_response(response))
    }

    async fn retrieve_final(&self, response_id: &str) -> anyhow::Result<FinalResponse> {
        self.retrieve_response(response_id).await
    }
}
