//! 上游事件源抽象

use async_trait::async_trait;
use futures::stream::BoxStream;

use super::model::events::UpstreamEvent;
use super::model::response::FinalResponse;

/// 上游事件流
///
/// 按到达顺序产出事件；传输或协议错误以单个 `Err` 表示
pub type EventStream = BoxStream<'static, anyhow::Result<UpstreamEvent>>;

/// 上游事件源
///
/// 每个会话调用一次 `open`，事件流耗尽后最多调用一次 `retrieve_final`
#[async_trait]
pub trait EventSource: Send + Sync {
    /// 以查询文本和已上传文件打开流式会话
    async fn open(&self, query: &str, file_ids: &[String]) -> anyhow::Result<EventStream>;

    /// 按 ID 获取完整的最终响应
    async fn retrieve_final(&self, response_id: &str) -> anyhow::Result<FinalResponse>;
}
