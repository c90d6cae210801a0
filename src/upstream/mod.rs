//! 上游模型服务
//!
//! 通过 Responses API 打开带代码执行工具的流式会话，
//! 并把 SSE 事件解码为封闭的 [`model::events::UpstreamEvent`] 枚举。

pub mod decoder;
pub mod model;
pub mod provider;
pub mod source;

pub use provider::ResponsesProvider;
pub use source::{EventSource, EventStream};
