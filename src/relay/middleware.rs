//! 应用状态与中间件

use std::path::PathBuf;
use std::sync::Arc;

use crate::upstream::{EventSource, ResponsesProvider};

/// 应用共享状态
#[derive(Clone)]
pub struct AppState {
    /// 上游 Provider，负责文件上传、删除和下载
    pub provider: Arc<ResponsesProvider>,
    /// 流式会话使用的事件源，默认即 `provider`
    pub source: Arc<dyn EventSource>,
    /// 静态页面目录
    pub static_dir: PathBuf,
    /// 示例 CSV 数据目录
    pub sample_data_dir: PathBuf,
}

impl AppState {
    /// 创建新的应用状态，目录取自 Provider 的配置
    pub fn new(provider: ResponsesProvider) -> Self {
        let static_dir = PathBuf::from(&provider.config().static_dir);
        let sample_data_dir = PathBuf::from(&provider.config().sample_data_dir);
        let provider = Arc::new(provider);

        Self {
            source: provider.clone(),
            provider,
            static_dir,
            sample_data_dir,
        }
    }

    /// 替换流式会话的事件源
    pub fn with_event_source(mut self, source: Arc<dyn EventSource>) -> Self {
        self.source = source;
        self
    }

    /// 设置示例数据目录
    pub fn with_sample_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sample_data_dir = dir.into();
        self
    }
}

/// CORS 中间件层
///
/// 浏览器页面可能与服务不同源，这里允许所有来源、方法和请求头。
pub fn cors_layer() -> tower_http::cors::CorsLayer {
    use tower_http::cors::{Any, CorsLayer};

    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
