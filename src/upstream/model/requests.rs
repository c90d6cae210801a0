//! Responses API 请求类型定义

use serde::Serialize;

/// `POST /responses` 请求体
///
/// # 示例
///
/// ```rust
/// use code_interpreter_relay::upstream::model::requests::{ResponsesRequest, Tool};
///
/// let request = ResponsesRequest::new("gpt://folder/model", "plot sales", 0.3)
///     .with_tool(Tool::code_interpreter(vec!["file-1".to_string()]));
/// let json = serde_json::to_value(&request).unwrap();
/// assert_eq!(json["tools"][0]["container"]["type"], "auto");
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ResponsesRequest {
    pub model: String,
    pub input: String,
    pub tool_choice: String,
    pub temperature: f32,
    pub tools: Vec<Tool>,
    pub stream: bool,
}

impl ResponsesRequest {
    /// 创建流式请求，工具选择策略固定为 `auto`
    pub fn new(model: impl Into<String>, input: impl Into<String>, temperature: f32) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            tool_choice: "auto".to_string(),
            temperature,
            tools: Vec::new(),
            stream: true,
        }
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }
}

/// 工具定义
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Tool {
    CodeInterpreter { container: ContainerConfig },
}

impl Tool {
    /// 自动分配容器的代码执行工具，可挂载已上传文件
    pub fn code_interpreter(file_ids: Vec<String>) -> Self {
        Self::CodeInterpreter {
            container: ContainerConfig::auto(file_ids),
        }
    }
}

/// 执行容器配置
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerConfig {
    #[serde(rename = "type")]
    pub container_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_ids: Vec<String>,
}

impl ContainerConfig {
    pub fn auto(file_ids: Vec<String>) -> Self {
        Self {
            container_type: "auto".to_string(),
            file_ids,
        }
    }
}
