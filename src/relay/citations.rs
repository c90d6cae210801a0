//! 从最终响应中提取容器文件引用

use crate::upstream::model::response::{Annotation, FinalResponse, OutputItem};

use super::types::FileCitation;

/// 按出现顺序收集所有消息内容中的 `container_file_citation` 注解
pub fn extract_files(response: &FinalResponse) -> Vec<FileCitation> {
    response
        .output
        .iter()
        .filter_map(|item| match item {
            OutputItem::Message { content } => Some(content),
            _ => None,
        })
        .flatten()
        .filter_map(|part| part.annotations.as_ref())
        .flatten()
        .filter_map(|annotation| match annotation {
            Annotation::ContainerFileCitation {
                file_id, filename, ..
            } => Some(FileCitation {
                file_id: file_id.clone(),
                filename: filename.clone(),
            }),
            Annotation::Other => None,
        })
        .collect()
}
