//! 上游文件对象

use serde::Deserialize;

/// `POST /files` 返回的文件对象
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteFile {
    pub id: String,
}

/// 上传用途
pub const PURPOSE_ASSISTANTS: &str = "assistants";
