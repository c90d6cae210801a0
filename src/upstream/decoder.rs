//! 上游 SSE 解码
//!
//! 将字节流切分为 SSE 事件，再把每个事件的 `data` 解析为 [`UpstreamEvent`]

use anyhow::Context;
use bytes::Bytes;
use eventsource_stream::{Event, Eventsource};
use futures::{future, Stream, StreamExt};

use super::model::events::UpstreamEvent;
use super::source::EventStream;

/// 流结束标记（部分兼容实现会发送）
const DONE_MARKER: &str = "[DONE]";

/// 解析单个 SSE 事件
///
/// 空数据和结束标记返回 `Ok(None)`；无法解析的数据以及服务端错误事件返回错误
pub fn decode_event(event: &Event) -> anyhow::Result<Option<UpstreamEvent>> {
    let data = event.data.trim();
    if data.is_empty() || data == DONE_MARKER {
        return Ok(None);
    }

    let parsed: UpstreamEvent = serde_json::from_str(data).with_context(|| {
        let name = if event.event.is_empty() {
            "message"
        } else {
            event.event.as_str()
        };
        format!("无法解析上游事件 {}", name)
    })?;

    parsed.into_result().map(Some)
}

/// 将上游响应体字节流转换为事件流
pub fn decode_stream<S, E>(bytes: S) -> EventStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    bytes
        .eventsource()
        .filter_map(|item| {
            future::ready(match item {
                Ok(event) => decode_event(&event).transpose(),
                Err(e) => Some(Err(anyhow::anyhow!("上游流读取失败: {}", e))),
            })
        })
        .boxed()
}

/// 将上游 HTTP 响应转换为事件流
pub fn decode_response(response: reqwest::Response) -> EventStream {
    decode_stream(response.bytes_stream())
}
