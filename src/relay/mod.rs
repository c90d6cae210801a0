//! 代码执行会话中继服务
//!
//! 把上游 Responses API 的流式代码执行会话转换为浏览器使用的 SSE 事件，
//! 并提供 CSV 文件上传、删除、下载和示例数据等辅助端点。
//!
//! # 使用示例
//! ```rust,ignore
//! use code_interpreter_relay::relay::{create_router, AppState};
//! use code_interpreter_relay::upstream::ResponsesProvider;
//!
//! let provider = ResponsesProvider::new(config)?;
//! let app = create_router(AppState::new(provider));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, app).await?;
//! ```

mod citations;
mod handlers;
mod middleware;
mod preview;
mod router;
pub mod translator;
pub mod types;

pub use middleware::AppState;
pub use router::create_router;
