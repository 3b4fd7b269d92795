//! Background writer for chat messages.
//!
//! Writes are queued in FIFO order and sent one at a time by a worker task,
//! so a message typed while another one is still in flight is never dropped.
//! Progress is published on a `watch` channel as [`DispatchState`].

use std::sync::Arc;

use streamchat_shared::dto::SendMessageRequest;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::{domain::StreamId, error::ClientError, transport::StreamApi};

/// A message waiting to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    pub stream_id: StreamId,
    pub request: SendMessageRequest,
}

/// Loading and result state of the dispatcher
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchState {
    /// A write is currently on the wire
    pub in_flight: bool,
    /// Writes waiting behind the one in flight
    pub queued: usize,
    /// Writes the server accepted
    pub sent: u64,
    /// Writes that failed
    pub failed: u64,
    /// Error of the most recent write, cleared by the next success
    pub last_error: Option<String>,
    /// Client tokens of failed writes not collected yet, see
    /// [`MutationDispatcher::take_failed_tokens`]
    pub failed_tokens: Vec<String>,
}

impl DispatchState {
    pub fn is_idle(&self) -> bool {
        !self.in_flight && self.queued == 0
    }
}

/// FIFO queue of message writes drained by a single worker task
pub struct MutationDispatcher {
    sender: mpsc::UnboundedSender<PendingWrite>,
    state: Arc<watch::Sender<DispatchState>>,
    worker: JoinHandle<()>,
}

impl MutationDispatcher {
    /// Create a dispatcher and spawn its worker task
    pub fn new(api: Arc<dyn StreamApi>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(DispatchState::default());
        let state = Arc::new(state);
        let worker = tokio::spawn(drain_writes(api, receiver, state.clone()));

        Self {
            sender,
            state,
            worker,
        }
    }

    /// Queue a write. Returns immediately; the write is sent in the background.
    pub fn enqueue(&self, write: PendingWrite) -> Result<(), ClientError> {
        self.state.send_modify(|s| s.queued += 1);
        if self.sender.send(write).is_err() {
            self.state.send_modify(|s| s.queued = s.queued.saturating_sub(1));
            return Err(ClientError::DispatcherClosed);
        }
        Ok(())
    }

    pub fn state(&self) -> DispatchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DispatchState> {
        self.state.subscribe()
    }

    /// Collect the client tokens of writes that failed since the last call.
    ///
    /// Subscribers are not notified; the counters they render do not change.
    pub fn take_failed_tokens(&self) -> Vec<String> {
        let mut taken = Vec::new();
        self.state.send_if_modified(|s| {
            taken = std::mem::take(&mut s.failed_tokens);
            false
        });
        taken
    }

    /// Wait until every queued write has completed.
    pub async fn wait_idle(&self) {
        let mut receiver = self.state.subscribe();
        // The sender lives as long as `self`, so this cannot fail
        let _ = receiver.wait_for(DispatchState::is_idle).await;
    }
}

impl Drop for MutationDispatcher {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn drain_writes(
    api: Arc<dyn StreamApi>,
    mut receiver: mpsc::UnboundedReceiver<PendingWrite>,
    state: Arc<watch::Sender<DispatchState>>,
) {
    while let Some(write) = receiver.recv().await {
        state.send_modify(|s| {
            s.queued = s.queued.saturating_sub(1);
            s.in_flight = true;
        });

        let client_token = write.request.client_token.clone();
        let result = api.post_message(write.stream_id, write.request).await;

        match &result {
            Ok(response) if response.ok => {
                tracing::debug!("Message written to stream {}", write.stream_id);
            }
            Ok(_) => tracing::warn!("Stream {} rejected the message", write.stream_id),
            Err(e) => tracing::warn!("Failed to send message to stream {}: {}", write.stream_id, e),
        }

        state.send_modify(|s| {
            s.in_flight = false;
            match result {
                Ok(response) if response.ok => {
                    s.sent += 1;
                    s.last_error = None;
                }
                Ok(_) => {
                    s.failed += 1;
                    s.last_error = Some("Server rejected the message".to_string());
                    s.failed_tokens.extend(client_token);
                }
                Err(e) => {
                    s.failed += 1;
                    s.last_error = Some(e.to_string());
                    s.failed_tokens.extend(client_token);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockStreamApi;
    use mockall::{Sequence, predicate::eq};
    use streamchat_shared::dto::SendMessageResponse;

    fn create_test_write(text: &str) -> PendingWrite {
        PendingWrite {
            stream_id: StreamId::new(1),
            request: SendMessageRequest {
                message: text.to_string(),
                client_token: Some(format!("token-{text}")),
                avatar: None,
            },
        }
    }

    #[tokio::test]
    async fn test_writes_are_sent_in_order() {
        // テスト項目: キューに入れた書き込みが FIFO 順に 1 件ずつ送信される
        // given (前提条件):
        let mut api = MockStreamApi::new();
        let mut seq = Sequence::new();
        for text in ["first", "second", "third"] {
            api.expect_post_message()
                .with(eq(StreamId::new(1)), eq(create_test_write(text).request))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(SendMessageResponse { ok: true }));
        }
        let dispatcher = MutationDispatcher::new(Arc::new(api));

        // when (操作):
        for text in ["first", "second", "third"] {
            dispatcher.enqueue(create_test_write(text)).unwrap();
        }
        dispatcher.wait_idle().await;

        // then (期待する結果):
        let state = dispatcher.state();
        assert_eq!(state.sent, 3);
        assert_eq!(state.failed, 0);
        assert!(state.is_idle());
    }

    #[tokio::test]
    async fn test_enqueue_reports_queued_write_before_worker_runs() {
        // テスト項目: enqueue 直後はワーカー実行前でも書き込みが待機中として数えられる
        // given (前提条件):
        let mut api = MockStreamApi::new();
        api.expect_post_message()
            .returning(|_, _| Ok(SendMessageResponse { ok: true }));
        let dispatcher = MutationDispatcher::new(Arc::new(api));

        // when (操作):
        dispatcher.enqueue(create_test_write("hello")).unwrap();

        // then (期待する結果):
        assert_eq!(dispatcher.state().queued, 1);
        assert!(!dispatcher.state().is_idle());
    }

    #[tokio::test]
    async fn test_failed_write_is_recorded_and_queue_continues() {
        // テスト項目: 書き込み失敗が記録され、後続の書き込みは継続して送信される
        // given (前提条件):
        let mut api = MockStreamApi::new();
        let mut seq = Sequence::new();
        api.expect_post_message()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(ClientError::UnexpectedStatus(401)));
        api.expect_post_message()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(SendMessageResponse { ok: false }));
        let dispatcher = MutationDispatcher::new(Arc::new(api));

        // when (操作):
        dispatcher.enqueue(create_test_write("one")).unwrap();
        dispatcher.enqueue(create_test_write("two")).unwrap();
        dispatcher.wait_idle().await;

        // then (期待する結果):
        let state = dispatcher.state();
        assert_eq!(state.sent, 0);
        assert_eq!(state.failed, 2);
        assert_eq!(
            state.last_error.as_deref(),
            Some("Server rejected the message")
        );
    }

    #[tokio::test]
    async fn test_failed_write_tokens_are_taken_once() {
        // テスト項目: 失敗した書き込みのトークンだけが記録され、一度取り出すと空になる
        // given (前提条件):
        let mut api = MockStreamApi::new();
        let mut seq = Sequence::new();
        api.expect_post_message()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(ClientError::UnexpectedStatus(401)));
        api.expect_post_message()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(SendMessageResponse { ok: true }));
        api.expect_post_message()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(SendMessageResponse { ok: false }));
        let dispatcher = MutationDispatcher::new(Arc::new(api));

        // when (操作):
        for text in ["one", "two", "three"] {
            dispatcher.enqueue(create_test_write(text)).unwrap();
        }
        dispatcher.wait_idle().await;
        let taken = dispatcher.take_failed_tokens();

        // then (期待する結果):
        assert_eq!(taken, vec!["token-one", "token-three"]);
        assert!(dispatcher.take_failed_tokens().is_empty());
        assert_eq!(dispatcher.state().failed, 2);
    }

    #[tokio::test]
    async fn test_success_clears_last_error() {
        // テスト項目: 失敗の後に成功すると last_error がクリアされる
        // given (前提条件):
        let mut api = MockStreamApi::new();
        let mut seq = Sequence::new();
        api.expect_post_message()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(ClientError::UnexpectedStatus(500)));
        api.expect_post_message()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(SendMessageResponse { ok: true }));
        let dispatcher = MutationDispatcher::new(Arc::new(api));

        // when (操作):
        dispatcher.enqueue(create_test_write("one")).unwrap();
        dispatcher.enqueue(create_test_write("two")).unwrap();
        dispatcher.wait_idle().await;

        // then (期待する結果):
        let state = dispatcher.state();
        assert_eq!(state.sent, 1);
        assert_eq!(state.failed, 1);
        assert!(state.last_error.is_none());
    }
}
