//! 上游事件到客户端事件的转换
//!
//! # 会话状态
//! 每个请求持有一个 [`Translator`]，状态依次为
//! `Idle → Streaming → Finalizing → Done`：
//! - `Streaming`：逐个拉取上游事件，每个事件最多产生一个客户端事件
//! - `Finalizing`：上游流正常结束且拿到过响应 ID 时，查询最终响应提取文件引用
//! - `Done`：发送唯一的终止事件（`done` 或 `error`）
//!
//! # 代码块编号
//! 编号只在代码生成完成时递增，执行生命周期事件沿用当前编号。
//! 前提：上游总是先完整生成一个代码块，再开始它的执行生命周期；
//! 事件中没有可用于关联代码块的 ID，这里不做乱序防御。

use std::sync::Arc;

use async_stream::stream;
use futures::{Stream, StreamExt};
use uuid::Uuid;

use crate::upstream::model::events::UpstreamEvent;
use crate::upstream::model::response::{CodeOutput, OutputItem};
use crate::upstream::EventSource;

use super::citations::extract_files;
use super::types::ClientEvent;

/// 会话阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Streaming,
    Finalizing,
    Done,
}

/// 单次请求的会话
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// 会话 ID，仅用于日志关联
    pub id: Uuid,
    pub query: String,
    pub file_ids: Vec<String>,
    pub response_id: Option<String>,
}

impl Session {
    pub fn new(query: impl Into<String>, file_ids: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            query: query.into(),
            file_ids,
            response_id: None,
        }
    }
}

/// 事件转换器
///
/// 会话状态只属于处理该请求的任务，不跨请求共享
#[derive(Debug)]
pub struct Translator {
    session: Session,
    block: u32,
    phase: Phase,
}

impl Translator {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            block: 0,
            phase: Phase::Idle,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// 当前代码块编号（尚未生成代码时为 0）
    pub fn block(&self) -> u32 {
        self.block
    }

    /// 会话已打开，开始拉取事件
    pub fn begin(&mut self) {
        self.phase = Phase::Streaming;
    }

    /// 转换单个上游事件
    pub fn translate(&mut self, event: UpstreamEvent) -> Option<ClientEvent> {
        match event {
            UpstreamEvent::OutputTextDelta { delta } => Some(ClientEvent::TextDelta { delta }),
            UpstreamEvent::CodeDelta { delta } => Some(ClientEvent::CodeDelta { delta }),
            UpstreamEvent::CodeDone { code, data } => {
                self.block += 1;
                let code = code
                    .filter(|c| !c.is_empty())
                    .or(data)
                    .unwrap_or_default();
                tracing::info!(
                    session = %self.session.id,
                    block = self.block,
                    code_len = code.len(),
                    "代码块生成完成"
                );
                Some(ClientEvent::CodeGenerated {
                    code,
                    block: self.block,
                })
            }
            UpstreamEvent::CallInProgress => Some(ClientEvent::CodeRunning { block: self.block }),
            UpstreamEvent::CallInterpreting => {
                Some(ClientEvent::CodeInterpreting { block: self.block })
            }
            UpstreamEvent::CallCompleted => Some(ClientEvent::CodeCompleted { block: self.block }),
            UpstreamEvent::OutputItemDone {
                item: OutputItem::CodeInterpreterCall { code, outputs, .. },
            } => {
                let outputs = outputs
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|output| match output {
                        CodeOutput::Logs { logs } if !logs.is_empty() => Some(logs),
                        _ => None,
                    })
                    .collect();
                Some(ClientEvent::CodeResult {
                    code: code.unwrap_or_default(),
                    outputs,
                    block: self.block,
                })
            }
            UpstreamEvent::ReasoningTextDelta { delta } => {
                Some(ClientEvent::ReasoningDelta { delta })
            }
            UpstreamEvent::ReasoningSummaryTextDelta { delta } => {
                Some(ClientEvent::ReasoningDelta { delta })
            }
            UpstreamEvent::ResponseInProgress { response } => {
                self.session.response_id = Some(response.id.clone());
                Some(ClientEvent::Processing {
                    response_id: response.id,
                })
            }
            UpstreamEvent::OutputItemDone { .. }
            | UpstreamEvent::Error { .. }
            | UpstreamEvent::ResponseFailed { .. }
            | UpstreamEvent::Unknown => None,
        }
    }

    /// 上游流正常结束
    ///
    /// 拿到过响应 ID 时进入 `Finalizing` 并返回该 ID，否则直接进入 `Done`
    pub fn end_stream(&mut self) -> Option<String> {
        match self.session.response_id.clone() {
            Some(id) => {
                self.phase = Phase::Finalizing;
                Some(id)
            }
            None => {
                self.phase = Phase::Done;
                None
            }
        }
    }

    /// 进入终止状态
    pub fn finish(&mut self) {
        self.phase = Phase::Done;
    }
}

/// 打开上游会话并产出客户端事件流
///
/// 流的最后一个事件总是 `done` 或 `error`，之后不再产出任何事件。
/// 客户端断开时该流被丢弃，上游连接随之释放。
pub fn relay<S>(source: Arc<S>, session: Session) -> impl Stream<Item = ClientEvent> + Send
where
    S: EventSource + ?Sized + 'static,
{
    stream! {
        let session_id = session.id;
        let mut translator = Translator::new(session);
        tracing::info!(
            session = %session_id,
            query_len = translator.session().query.len(),
            files = translator.session().file_ids.len(),
            "打开上游会话"
        );

        let opened = source
            .open(&translator.session().query, &translator.session().file_ids)
            .await;
        let mut upstream = match opened {
            Ok(upstream) => upstream,
            Err(e) => {
                tracing::error!(session = %session_id, "打开上游会话失败: {:#}", e);
                translator.finish();
                yield ClientEvent::error(&e);
                return;
            }
        };
        translator.begin();

        while let Some(item) = upstream.next().await {
            match item {
                Ok(event) => {
                    tracing::debug!(session = %session_id, kind = event.kind(), "上游事件");
                    if let Some(client_event) = translator.translate(event) {
                        debug_assert!(!client_event.is_terminal());
                        yield client_event;
                    }
                }
                Err(e) => {
                    tracing::error!(session = %session_id, "上游流中断: {:#}", e);
                    translator.finish();
                    yield ClientEvent::error(&e);
                    return;
                }
            }
        }
        drop(upstream);

        debug_assert_eq!(translator.phase(), Phase::Streaming);
        if let Some(response_id) = translator.end_stream() {
            match source.retrieve_final(&response_id).await {
                Ok(response) => {
                    let files = extract_files(&response);
                    if !files.is_empty() {
                        tracing::info!(session = %session_id, count = files.len(), "最终响应包含文件引用");
                        yield ClientEvent::Files { files };
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        session = %session_id,
                        "获取最终响应 {} 失败，忽略文件引用: {:#}",
                        response_id,
                        e
                    );
                }
            }
        }

        translator.finish();
        tracing::info!(
            session = %session_id,
            phase = ?translator.phase(),
            blocks = translator.block(),
            "会话结束"
        );
        yield ClientEvent::Done {};
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::types::FileCitation;
    use crate::upstream::model::response::{FinalResponse, ResponseRef};
    use crate::upstream::source::testing::ScriptedSource;
    use serde_json::json;

    fn in_progress(id: &str) -> UpstreamEvent {
        UpstreamEvent::ResponseInProgress {
            response: ResponseRef {
                id: id.to_string(),
                error: None,
            },
        }
    }

    fn text(delta: &str) -> UpstreamEvent {
        UpstreamEvent::OutputTextDelta {
            delta: delta.to_string(),
        }
    }

    fn code_delta(delta: &str) -> UpstreamEvent {
        UpstreamEvent::CodeDelta {
            delta: delta.to_string(),
        }
    }

    fn code_done(code: &str) -> UpstreamEvent {
        UpstreamEvent::CodeDone {
            code: Some(code.to_string()),
            data: None,
        }
    }

    fn call_item(code: &str, logs: &[&str]) -> UpstreamEvent {
        let outputs: Vec<_> = logs.iter().map(|l| json!({"type": "logs", "logs": l})).collect();
        UpstreamEvent::OutputItemDone {
            item: serde_json::from_value(json!({
                "type": "code_interpreter_call",
                "code": code,
                "outputs": outputs
            }))
            .unwrap(),
        }
    }

    fn final_response(id: &str, annotations: serde_json::Value) -> FinalResponse {
        serde_json::from_value(json!({
            "id": id,
            "output": [{"type": "message", "content": [
                {"type": "output_text", "text": "ok", "annotations": annotations}
            ]}]
        }))
        .unwrap()
    }

    async fn run(source: ScriptedSource) -> (Vec<ClientEvent>, Arc<ScriptedSource>) {
        let source = Arc::new(source);
        let events = relay(source.clone(), Session::new("q", vec![])).collect().await;
        (events, source)
    }

    #[tokio::test]
    async fn test_full_code_block_scenario() {
        let source = ScriptedSource::from_events(vec![
            in_progress("R1"),
            text("Hi"),
            code_delta("pri"),
            code_delta("nt(1)"),
            code_done("print(1)"),
            UpstreamEvent::CallInProgress,
            UpstreamEvent::CallInterpreting,
            call_item("print(1)", &["1\n"]),
            UpstreamEvent::CallCompleted,
        ])
        .with_final(final_response("R1", json!([])));

        let (events, source) = run(source).await;

        assert_eq!(
            events,
            vec![
                ClientEvent::Processing {
                    response_id: "R1".to_string()
                },
                ClientEvent::TextDelta {
                    delta: "Hi".to_string()
                },
                ClientEvent::CodeDelta {
                    delta: "pri".to_string()
                },
                ClientEvent::CodeDelta {
                    delta: "nt(1)".to_string()
                },
                ClientEvent::CodeGenerated {
                    code: "print(1)".to_string(),
                    block: 1
                },
                ClientEvent::CodeRunning { block: 1 },
                ClientEvent::CodeInterpreting { block: 1 },
                ClientEvent::CodeResult {
                    code: "print(1)".to_string(),
                    outputs: vec!["1\n".to_string()],
                    block: 1
                },
                ClientEvent::CodeCompleted { block: 1 },
                ClientEvent::Done {},
            ]
        );
        assert_eq!(source.lookups(), 1);
    }

    #[tokio::test]
    async fn test_dropped_stream_stops_pulling_upstream() {
        let source = Arc::new(
            ScriptedSource::from_events(vec![
                in_progress("R1"),
                text("a"),
                text("b"),
                text("c"),
            ])
            .with_final(final_response("R1", json!([]))),
        );

        let mut events = Box::pin(relay(source.clone(), Session::new("q", vec![])));
        assert_eq!(
            events.next().await,
            Some(ClientEvent::Processing {
                response_id: "R1".to_string()
            })
        );
        drop(events);

        assert_eq!(source.pulled(), 1);
        assert_eq!(source.lookups(), 0);
    }

    #[tokio::test]
    async fn test_transport_error_mid_stream() {
        let source = ScriptedSource::new(vec![
            Ok(text("a")),
            Ok(text("b")),
            Err(anyhow::anyhow!("connection reset by peer")),
            Ok(text("never")),
        ]);

        let (events, source) = run(source).await;

        assert_eq!(
            events,
            vec![
                ClientEvent::TextDelta {
                    delta: "a".to_string()
                },
                ClientEvent::TextDelta {
                    delta: "b".to_string()
                },
                ClientEvent::Error {
                    message: "connection reset by peer".to_string()
                },
            ]
        );
        assert_eq!(source.lookups(), 0);
        assert_eq!(source.pulled(), 3);
    }

    #[tokio::test]
    async fn test_files_event_before_done() {
        let source = ScriptedSource::from_events(vec![in_progress("R1"), text("see files")])
            .with_final(final_response(
                "R1",
                json!([
                    {"type": "container_file_citation", "file_id": "F1", "filename": "doc.csv"},
                    {"type": "container_file_citation", "file_id": "F2", "filename": "report.png"}
                ]),
            ));

        let (events, _) = run(source).await;

        assert_eq!(events.len(), 4);
        assert_eq!(
            events[2],
            ClientEvent::Files {
                files: vec![
                    FileCitation {
                        file_id: "F1".to_string(),
                        filename: "doc.csv".to_string()
                    },
                    FileCitation {
                        file_id: "F2".to_string(),
                        filename: "report.png".to_string()
                    },
                ]
            }
        );
        assert_eq!(events[3], ClientEvent::Done {});
    }

    #[tokio::test]
    async fn test_no_response_id_skips_lookup() {
        let source = ScriptedSource::from_events(vec![text("x")])
            .with_final(final_response(
                "R1",
                json!([{"type": "container_file_citation", "file_id": "F1", "filename": "a.csv"}]),
            ));

        let (events, source) = run(source).await;

        assert_eq!(source.lookups(), 0);
        assert_eq!(
            events,
            vec![
                ClientEvent::TextDelta {
                    delta: "x".to_string()
                },
                ClientEvent::Done {}
            ]
        );
    }

    #[tokio::test]
    async fn test_lookup_failure_degrades_to_no_files() {
        // 未设置最终响应，查询失败
        let source = ScriptedSource::from_events(vec![in_progress("R1")]);

        let (events, source) = run(source).await;

        assert_eq!(source.lookups(), 1);
        assert_eq!(
            events,
            vec![
                ClientEvent::Processing {
                    response_id: "R1".to_string()
                },
                ClientEvent::Done {}
            ]
        );
    }

    #[tokio::test]
    async fn test_open_failure_emits_single_error() {
        let source = ScriptedSource::failing_open("流式 API 请求失败: 401 Unauthorized");

        let (events, source) = run(source).await;

        assert_eq!(
            events,
            vec![ClientEvent::Error {
                message: "流式 API 请求失败: 401 Unauthorized".to_string()
            }]
        );
        assert_eq!(source.lookups(), 0);
    }

    #[tokio::test]
    async fn test_session_query_and_files_are_forwarded() {
        let source = Arc::new(ScriptedSource::from_events(vec![]));
        let session = Session::new("средняя выручка", vec!["f1".to_string(), "f2".to_string()]);
        let events: Vec<_> = relay(source.clone(), session).collect().await;

        assert_eq!(events, vec![ClientEvent::Done {}]);
        assert_eq!(
            source.opened_with(),
            Some((
                "средняя выручка".to_string(),
                vec!["f1".to_string(), "f2".to_string()]
            ))
        );
    }

    #[test]
    fn test_block_attribution_across_multiple_blocks() {
        let mut translator = Translator::new(Session::new("q", vec![]));
        translator.begin();

        // 首个代码块生成之前的执行事件归属于 0
        assert_eq!(
            translator.translate(UpstreamEvent::CallInProgress),
            Some(ClientEvent::CodeRunning { block: 0 })
        );

        let script = vec![
            code_done("a"),
            UpstreamEvent::CallInProgress,
            call_item("a", &[]),
            UpstreamEvent::CallCompleted,
            code_done("b"),
            UpstreamEvent::CallInterpreting,
            call_item("b", &["", "x"]),
            UpstreamEvent::CallCompleted,
            code_done("c"),
        ];

        let mut current = 0;
        let mut generated = 0;
        for event in script {
            match translator.translate(event).unwrap() {
                ClientEvent::CodeGenerated { block, .. } => {
                    generated += 1;
                    assert_eq!(block, current + 1);
                    current = block;
                }
                ClientEvent::CodeRunning { block }
                | ClientEvent::CodeInterpreting { block }
                | ClientEvent::CodeCompleted { block } => assert_eq!(block, current),
                ClientEvent::CodeResult { block, outputs, .. } => {
                    assert_eq!(block, current);
                    if block == 2 {
                        assert_eq!(outputs, vec!["x".to_string()]);
                    } else {
                        assert!(outputs.is_empty());
                    }
                }
                other => panic!("unexpected event: {:?}", other),
            }
        }

        assert_eq!(generated, 3);
        assert_eq!(translator.block(), 3);
    }

    #[test]
    fn test_code_text_fallback() {
        let mut translator = Translator::new(Session::new("q", vec![]));

        let event = translator.translate(UpstreamEvent::CodeDone {
            code: None,
            data: Some("from data".to_string()),
        });
        assert_eq!(
            event,
            Some(ClientEvent::CodeGenerated {
                code: "from data".to_string(),
                block: 1
            })
        );

        let event = translator.translate(UpstreamEvent::CodeDone {
            code: Some(String::new()),
            data: Some("fallback".to_string()),
        });
        assert_eq!(
            event,
            Some(ClientEvent::CodeGenerated {
                code: "fallback".to_string(),
                block: 2
            })
        );

        let event = translator.translate(UpstreamEvent::CodeDone {
            code: None,
            data: None,
        });
        assert_eq!(
            event,
            Some(ClientEvent::CodeGenerated {
                code: String::new(),
                block: 3
            })
        );
    }

    #[test]
    fn test_ignored_events() {
        let mut translator = Translator::new(Session::new("q", vec![]));
        assert_eq!(translator.translate(UpstreamEvent::Unknown), None);
        assert_eq!(
            translator.translate(UpstreamEvent::OutputItemDone {
                item: OutputItem::Message { content: vec![] }
            }),
            None
        );
        assert_eq!(translator.block(), 0);
    }

    #[test]
    fn test_both_reasoning_variants_unify() {
        let mut translator = Translator::new(Session::new("q", vec![]));
        assert_eq!(
            translator.translate(UpstreamEvent::ReasoningTextDelta {
                delta: "think".to_string()
            }),
            Some(ClientEvent::ReasoningDelta {
                delta: "think".to_string()
            })
        );
        assert_eq!(
            translator.translate(UpstreamEvent::ReasoningSummaryTextDelta {
                delta: "sum".to_string()
            }),
            Some(ClientEvent::ReasoningDelta {
                delta: "sum".to_string()
            })
        );
    }

    #[test]
    fn test_phase_transitions() {
        let mut translator = Translator::new(Session::new("q", vec![]));
        assert_eq!(translator.phase(), Phase::Idle);
        translator.begin();
        assert_eq!(translator.phase(), Phase::Streaming);
        assert_eq!(translator.end_stream(), None);
        assert_eq!(translator.phase(), Phase::Done);

        let mut translator = Translator::new(Session::new("q", vec![]));
        translator.begin();
        translator.translate(in_progress("R7"));
        assert_eq!(translator.session().response_id.as_deref(), Some("R7"));
        assert_eq!(translator.end_stream(), Some("R7".to_string()));
        assert_eq!(translator.phase(), Phase::Finalizing);
        translator.finish();
        assert_eq!(translator.phase(), Phase::Done);
    }
}
