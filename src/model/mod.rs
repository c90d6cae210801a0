//! 启动参数与配置

pub mod arg;
pub mod config;
