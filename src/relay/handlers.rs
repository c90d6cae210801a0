//! HTTP 处理器

use std::convert::Infallible;
use std::path::Path as FsPath;

use axum::extract::{Multipart, Path, Query, State};
use axum::response::sse::Sse;
use axum::response::{IntoResponse, Json, Response};
use futures::StreamExt;
use http::{header, HeaderName, HeaderValue, StatusCode};

use super::middleware::AppState;
use super::preview::{parse_csv_preview, CsvPreview};
use super::translator::{relay, Session};
use super::types::{AnalyzeRequest, DownloadParams, ErrorResponse, OkResponse, UploadedFile};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// 上传文件缺少文件名时使用的名称
const DEFAULT_UPLOAD_NAME: &str = "file.csv";

fn bad_request(message: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::invalid_request(message.to_string())),
    )
}

fn upstream_error(err: anyhow::Error) -> ApiError {
    tracing::error!("上游请求失败: {:#}", err);
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse::upstream_error(format!("{:#}", err))),
    )
}

fn internal_error(err: impl std::fmt::Display) -> ApiError {
    tracing::error!("内部错误: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("internal_error", err.to_string())),
    )
}

/// GET /api/analyze
///
/// 以 SSE 推送转换后的会话事件，最后一个事件为 `done` 或 `error`
pub async fn analyze(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let request = match AnalyzeRequest::from_pairs(pairs) {
        Ok(request) => request,
        Err(error) => return (StatusCode::BAD_REQUEST, Json(error)).into_response(),
    };

    let session = Session::new(request.query, request.file_ids);
    let events = relay(state.source.clone(), session)
        .map(|event| Ok::<_, Infallible>(event.to_sse_event()));

    (
        [
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Sse::new(events),
    )
        .into_response()
}

/// 生成预览并上传到上游
async fn upload_csv(state: &AppState, filename: &str, content: Vec<u8>) -> Result<UploadedFile, ApiError> {
    let preview = parse_csv_preview(&content, filename);
    let file = state
        .provider
        .upload_file(filename, content)
        .await
        .map_err(upstream_error)?;

    tracing::info!(file_id = %file.id, filename, rows = preview.row_count, "文件已上传");

    Ok(UploadedFile {
        file_id: file.id,
        filename: filename.to_string(),
        columns: preview.columns,
        preview_rows: preview.preview_rows,
        row_count: preview.row_count,
    })
}

/// POST /api/upload
pub async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Vec<UploadedFile>>, ApiError> {
    let mut results = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(bad_request)? {
        if field.name() != Some("files") {
            continue;
        }
        let filename = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_UPLOAD_NAME)
            .to_string();
        let content = field.bytes().await.map_err(bad_request)?;

        results.push(upload_csv(&state, &filename, content.to_vec()).await?);
    }

    Ok(Json(results))
}

/// DELETE /api/files/{file_id}
///
/// 删除失败只记录日志，始终返回成功
pub async fn delete_file(State(state): State<AppState>, Path(file_id): Path<String>) -> Json<OkResponse> {
    if let Err(e) = state.provider.delete_file(&file_id).await {
        tracing::warn!(file_id = %file_id, "删除文件失败: {:#}", e);
    }
    Json(OkResponse { ok: true })
}

/// 按扩展名推断下载内容类型
pub fn content_type_for(filename: &str) -> &'static str {
    let ext = FsPath::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("pdf") => "application/pdf",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

/// GET /api/files/{file_id}/download
pub async fn download_file(
    State(state): State<AppState>,
    Path(file_id): Path<String>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, ApiError> {
    let content = state
        .provider
        .file_content(&file_id)
        .await
        .map_err(upstream_error)?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        params.filename.replace(['"', '\r', '\n'], "_")
    );
    let disposition =
        HeaderValue::from_str(&disposition).unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type_for(&params.filename))),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    )
        .into_response())
}

/// 示例文件名只允许目录内的普通文件名
fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != ".."
}

/// GET /api/sample-data
pub async fn list_sample_data(State(state): State<AppState>) -> Result<Json<Vec<CsvPreview>>, ApiError> {
    let mut entries = match tokio::fs::read_dir(&state.sample_data_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("示例数据目录不可用 {}: {}", state.sample_data_dir.display(), e);
            return Ok(Json(Vec::new()));
        }
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(internal_error)? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("csv") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut samples = Vec::with_capacity(paths.len());
    for path in paths {
        let content = tokio::fs::read(&path).await.map_err(internal_error)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        samples.push(parse_csv_preview(&content, &name));
    }

    Ok(Json(samples))
}

/// POST /api/upload-sample
///
/// 不存在或非法的文件名直接跳过
pub async fn upload_sample(
    State(state): State<AppState>,
    Json(filenames): Json<Vec<String>>,
) -> Result<Json<Vec<UploadedFile>>, ApiError> {
    let mut results = Vec::new();

    for name in filenames {
        if !is_plain_file_name(&name) {
            tracing::warn!("跳过非法示例文件名: {}", name);
            continue;
        }
        let path = state.sample_data_dir.join(&name);
        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(internal_error(e)),
        };

        results.push(upload_csv(&state, &name, content).await?);
    }

    Ok(Json(results))
}
