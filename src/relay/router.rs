//! 路由配置

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::services::{ServeDir, ServeFile};

use super::{
    handlers::{analyze, delete_file, download_file, list_sample_data, upload_files, upload_sample},
    middleware::{cors_layer, AppState},
};

/// 上传请求体上限
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// 创建路由
///
/// # 端点
/// - `GET /api/analyze` - 流式分析（SSE）
/// - `POST /api/upload` - 上传 CSV 文件
/// - `DELETE /api/files/{file_id}` - 删除文件
/// - `GET /api/files/{file_id}/download` - 下载文件
/// - `GET /api/sample-data` - 示例数据预览
/// - `POST /api/upload-sample` - 上传示例数据
/// - `/static/*`、`/` - 静态页面
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/analyze", get(analyze))
        .route(
            "/upload",
            post(upload_files).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/files/{file_id}", delete(delete_file))
        .route("/files/{file_id}/download", get(download_file))
        .route("/sample-data", get(list_sample_data))
        .route("/upload-sample", post(upload_sample));

    let static_dir = state.static_dir.clone();

    Router::new()
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new(&static_dir))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .layer(cors_layer())
        .with_state(state)
}
