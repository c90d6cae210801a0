//! 中继服务类型定义

use axum::response::sse::Event;
use serde::{Deserialize, Serialize};

// === 错误响应 ===

/// API 错误响应
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// 错误详情
#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

impl ErrorResponse {
    /// 创建新的错误响应
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                error_type: error_type.into(),
                message: message.into(),
            },
        }
    }

    /// 请求参数错误
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new("invalid_request_error", message)
    }

    /// 上游服务错误
    pub fn upstream_error(message: impl Into<String>) -> Self {
        Self::new("upstream_error", message)
    }
}

// === 推送给客户端的事件 ===

/// 容器文件引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileCitation {
    pub file_id: String,
    pub filename: String,
}

/// 推送给浏览器的事件
///
/// 每个变体对应一个固定的 SSE 事件名；变体字段按声明顺序序列化为 JSON 负载
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ClientEvent {
    TextDelta { delta: String },
    CodeDelta { delta: String },
    CodeGenerated { code: String, block: u32 },
    CodeRunning { block: u32 },
    CodeInterpreting { block: u32 },
    CodeCompleted { block: u32 },
    CodeResult {
        code: String,
        outputs: Vec<String>,
        block: u32,
    },
    ReasoningDelta { delta: String },
    Processing { response_id: String },
    Files { files: Vec<FileCitation> },
    Done {},
    Error { message: String },
}

impl ClientEvent {
    /// 由错误值构造 `error` 事件，消息包含完整的错误链
    pub fn error(err: &anyhow::Error) -> Self {
        Self::Error {
            message: format!("{:#}", err),
        }
    }

    /// SSE 事件名
    pub fn name(&self) -> &'static str {
        match self {
            Self::TextDelta { .. } => "text_delta",
            Self::CodeDelta { .. } => "code_delta",
            Self::CodeGenerated { .. } => "code_generated",
            Self::CodeRunning { .. } => "code_running",
            Self::CodeInterpreting { .. } => "code_interpreting",
            Self::CodeCompleted { .. } => "code_completed",
            Self::CodeResult { .. } => "code_result",
            Self::ReasoningDelta { .. } => "reasoning_delta",
            Self::Processing { .. } => "processing",
            Self::Files { .. } => "files",
            Self::Done {} => "done",
            Self::Error { .. } => "error",
        }
    }

    /// 是否为终止事件
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done {} | Self::Error { .. })
    }

    /// JSON 负载
    ///
    /// 只包含字符串、整数和字符串键，序列化不会失败；非 ASCII 字符按 UTF-8 原样输出
    pub fn data(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// 编码为 SSE 事件
    pub fn to_sse_event(&self) -> Event {
        Event::default().event(self.name()).data(self.data())
    }
}

// === 文件接口类型 ===

/// 分析请求参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeRequest {
    pub query: String,
    pub file_ids: Vec<String>,
}

impl AnalyzeRequest {
    /// 从查询参数对解析，`file_ids` 可重复出现
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Result<Self, ErrorResponse> {
        let mut query = None;
        let mut file_ids = Vec::new();
        for (key, value) in pairs {
            match key.as_str() {
                "query" => query = Some(value),
                "file_ids" => file_ids.push(value),
                _ => {}
            }
        }

        let query = query.ok_or_else(|| ErrorResponse::invalid_request("缺少 query 参数"))?;
        Ok(Self { query, file_ids })
    }
}

/// 上传结果（含 CSV 预览）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedFile {
    pub file_id: String,
    pub filename: String,
    pub columns: Vec<String>,
    pub preview_rows: Vec<Vec<String>>,
    pub row_count: usize,
}

/// 下载参数
#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    #[serde(default = "default_download_name")]
    pub filename: String,
}

fn default_download_name() -> String {
    "file".to_string()
}

/// 删除结果
#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}
