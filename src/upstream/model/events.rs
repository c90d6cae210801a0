//! 上游流式事件
//!
//! Responses API 以 SSE 推送的事件，按 `type` 字段区分

use serde::Deserialize;

use super::response::{OutputItem, ResponseError, ResponseRef};

/// 上游流式事件
///
/// 只建模中继需要的事件类型，其余类型统一落入 [`UpstreamEvent::Unknown`]。
/// 已知类型的负载缺少必需字段时反序列化失败，按协议错误处理。
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum UpstreamEvent {
    /// 响应已创建并开始处理
    #[serde(rename = "response.in_progress")]
    ResponseInProgress { response: ResponseRef },

    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta { delta: String },

    #[serde(rename = "response.code_interpreter_call_code.delta")]
    CodeDelta { delta: String },

    /// 代码生成完成
    ///
    /// 完整代码通常在 `code` 字段，部分兼容实现放在 `data` 字段
    #[serde(rename = "response.code_interpreter_call_code.done")]
    CodeDone {
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        data: Option<String>,
    },

    #[serde(rename = "response.code_interpreter_call.in_progress")]
    CallInProgress,

    #[serde(rename = "response.code_interpreter_call.interpreting")]
    CallInterpreting,

    #[serde(rename = "response.code_interpreter_call.completed")]
    CallCompleted,

    #[serde(rename = "response.output_item.done")]
    OutputItemDone { item: OutputItem },

    #[serde(rename = "response.reasoning_text.delta")]
    ReasoningTextDelta { delta: String },

    #[serde(rename = "response.reasoning_summary_text.delta")]
    ReasoningSummaryTextDelta { delta: String },

    /// 服务端在流中报告的错误
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        code: Option<String>,
        message: String,
    },

    /// 响应以失败告终
    #[serde(rename = "response.failed")]
    ResponseFailed { response: ResponseRef },

    /// 未识别的事件类型
    #[serde(other)]
    Unknown,
}

impl UpstreamEvent {
    /// 事件类型名称（用于日志）
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ResponseInProgress { .. } => "response.in_progress",
            Self::OutputTextDelta { .. } => "response.output_text.delta",
            Self::CodeDelta { .. } => "response.code_interpreter_call_code.delta",
            Self::CodeDone { .. } => "response.code_interpreter_call_code.done",
            Self::CallInProgress => "response.code_interpreter_call.in_progress",
            Self::CallInterpreting => "response.code_interpreter_call.interpreting",
            Self::CallCompleted => "response.code_interpreter_call.completed",
            Self::OutputItemDone { .. } => "response.output_item.done",
            Self::ReasoningTextDelta { .. } => "response.reasoning_text.delta",
            Self::ReasoningSummaryTextDelta { .. } => "response.reasoning_summary_text.delta",
            Self::Error { .. } => "error",
            Self::ResponseFailed { .. } => "response.failed",
            Self::Unknown => "unknown",
        }
    }

    /// 将服务端报告的错误事件转换为错误值
    pub fn into_result(self) -> anyhow::Result<Self> {
        match self {
            Self::Error { code, message } => match code {
                Some(code) => anyhow::bail!("上游错误 {}: {}", code, message),
                None => anyhow::bail!("上游错误: {}", message),
            },
            Self::ResponseFailed { response } => {
                let reason = match response.error {
                    Some(ResponseError {
                        code: Some(code),
                        message,
                    }) => format!("{} {}", code, message),
                    Some(ResponseError { message, .. }) => message,
                    None => "unknown error".to_string(),
                };
                anyhow::bail!("上游响应 {} 失败: {}", response.id, reason)
            }
            other => Ok(other),
        }
    }
}
