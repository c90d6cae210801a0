//! 上游数据模型
//!
//! - `events`: 流式事件
//! - `response`: 响应对象与输出项
//! - `requests`: 请求体
//! - `files`: 文件对象

pub mod events;
pub mod files;
pub mod requests;
pub mod response;
