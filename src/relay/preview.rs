//! CSV 预览
//!
//! 上传文件和示例数据都会附带表头、前几行和总行数，供页面展示

use csv::ReaderBuilder;
use serde::Serialize;

/// 预览行数
const PREVIEW_ROWS: usize = 10;

/// UTF-8 BOM
const BOM: char = '\u{feff}';

/// CSV 预览
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CsvPreview {
    pub filename: String,
    pub columns: Vec<String>,
    pub preview_rows: Vec<Vec<String>>,
    pub row_count: usize,
}

/// 解析 CSV 内容生成预览
///
/// 首行为表头，其余为数据行；非法 UTF-8 按替换字符处理
pub fn parse_csv_preview(content: &[u8], filename: &str) -> CsvPreview {
    let decoded = String::from_utf8_lossy(content);
    let text = decoded.strip_prefix(BOM).unwrap_or(decoded.as_ref());

    let mut records = parse_records(text).into_iter();
    let columns = match records.next() {
        Some(header) => header,
        None => {
            return CsvPreview {
                filename: filename.to_string(),
                columns: Vec::new(),
                preview_rows: Vec::new(),
                row_count: 0,
            }
        }
    };

    let data_rows: Vec<Vec<String>> = records.collect();
    CsvPreview {
        filename: filename.to_string(),
        columns,
        preview_rows: data_rows.iter().take(PREVIEW_ROWS).cloned().collect(),
        row_count: data_rows.len(),
    }
}

/// 按 RFC 4180 解析记录
///
/// 行内字段数可以不同；空行被跳过，字段中间的引号按字面处理
fn parse_records(text: &str) -> Vec<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for result in reader.records() {
        match result {
            Ok(record) => records.push(record.iter().map(str::to_string).collect()),
            Err(e) => {
                tracing::warn!("CSV 解析中止: {}", e);
                break;
            }
        }
    }
    records
}
