//! Responses API 响应对象
//!
//! 同时用于流式事件中的输出项和流结束后查询到的完整响应

use serde::Deserialize;

/// 流式事件中携带的响应引用
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseRef {
    pub id: String,
    #[serde(default)]
    pub error: Option<ResponseError>,
}

/// 响应失败原因
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseError {
    #[serde(default)]
    pub code: Option<String>,
    pub message: String,
}

/// 完整响应（`GET /responses/{id}`）
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FinalResponse {
    pub id: String,
    #[serde(default)]
    pub output: Vec<OutputItem>,
}

/// 响应输出项
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum OutputItem {
    #[serde(rename = "message")]
    Message {
        #[serde(default)]
        content: Vec<ContentPart>,
    },

    /// 一次代码执行
    #[serde(rename = "code_interpreter_call")]
    CodeInterpreterCall {
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        outputs: Option<Vec<CodeOutput>>,
    },

    #[serde(other)]
    Other,
}

/// 代码执行输出
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum CodeOutput {
    #[serde(rename = "logs")]
    Logs {
        #[serde(default)]
        logs: String,
    },

    #[serde(other)]
    Other,
}

/// 消息内容片段
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentPart {
    #[serde(default)]
    pub annotations: Option<Vec<Annotation>>,
}

/// 内容注解
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Annotation {
    /// 指向执行容器内文件的引用
    #[serde(rename = "container_file_citation")]
    ContainerFileCitation {
        file_id: String,
        filename: String,
    },

    #[serde(other)]
    Other,
}
