//! Chat synchronization core.
//!
//! [`ChatSync`] owns the snapshot cache, its poll task and the message
//! dispatcher for one viewed stream. A submitted message is appended to the
//! cached snapshot right away and written in the background; the next poll
//! replaces the snapshot with the server's copy, which includes the message
//! once the write has landed.

use std::{sync::Arc, time::Duration};

use streamchat_shared::{
    dto::{ChatMessage, SendMessageRequest, StreamResponse, StreamSnapshot},
    time::{Clock, SystemClock},
};
use tokio::{sync::watch, task::JoinHandle};
use uuid::Uuid;

use crate::{
    cache::{CacheEntry, SnapshotCache, spawn_poller},
    dispatcher::{DispatchState, MutationDispatcher, PendingWrite},
    domain::{ProvisionalIds, StreamId, Viewer, append_message, provisional_message},
    error::SubmitError,
    transport::StreamApi,
    view::{MessageInput, StreamView, compose},
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Tuning knobs for [`ChatSync`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Time between two snapshot fetches
    pub poll_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl SyncConfig {
    /// Replace settings the poll task cannot run with by their defaults.
    ///
    /// `tokio::time::interval` panics on a zero period.
    fn sanitized(self) -> Self {
        if self.poll_interval.is_zero() {
            tracing::warn!(
                "Poll interval must be positive, using {:?}",
                DEFAULT_POLL_INTERVAL
            );
            return Self {
                poll_interval: DEFAULT_POLL_INTERVAL,
            };
        }
        self
    }
}

/// Synchronizes the chat panel of one stream with the server.
///
/// Must be created inside a tokio runtime. Dropping it stops polling and
/// discards writes that have not been sent yet.
pub struct ChatSync {
    api: Arc<dyn StreamApi>,
    cache: Arc<SnapshotCache>,
    dispatcher: MutationDispatcher,
    viewer: Option<Viewer>,
    clock: Arc<dyn Clock>,
    provisional_ids: ProvisionalIds,
    config: SyncConfig,
    poller: Option<JoinHandle<()>>,
}

impl ChatSync {
    /// Start synchronizing `stream_id`. Without a stream id nothing is fetched.
    pub fn new(
        api: Arc<dyn StreamApi>,
        viewer: Option<Viewer>,
        stream_id: Option<StreamId>,
        config: SyncConfig,
    ) -> Self {
        Self::with_clock(api, viewer, stream_id, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        api: Arc<dyn StreamApi>,
        viewer: Option<Viewer>,
        stream_id: Option<StreamId>,
        config: SyncConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let cache = Arc::new(SnapshotCache::new(api.clone(), clock.clone(), stream_id));
        let dispatcher = MutationDispatcher::new(api.clone());
        let mut sync = Self {
            api,
            cache,
            dispatcher,
            viewer,
            clock,
            provisional_ids: ProvisionalIds::new(),
            config: config.sanitized(),
            poller: None,
        };
        sync.start_polling();
        sync
    }

    pub fn stream_id(&self) -> Option<StreamId> {
        self.cache.key()
    }

    pub fn viewer(&self) -> Option<&Viewer> {
        self.viewer.as_ref()
    }

    /// The displayed snapshot, `None` until the first successful fetch
    pub fn snapshot(&self) -> Option<StreamSnapshot> {
        self.cache.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<CacheEntry> {
        self.cache.subscribe()
    }

    pub fn dispatch_state(&self) -> DispatchState {
        self.dispatcher.state()
    }

    pub fn subscribe_dispatch(&self) -> watch::Receiver<DispatchState> {
        self.dispatcher.subscribe()
    }

    /// The page as it should be displayed right now
    pub fn view(&self) -> StreamView {
        compose(self.cache.get().as_ref(), self.viewer.as_ref())
    }

    /// Send the text currently in `input`.
    ///
    /// The input is cleared and the message is appended to the displayed
    /// snapshot before this returns; the write itself happens in the
    /// background. When no snapshot has been fetched yet there is nothing to
    /// append to, but the write is still queued.
    ///
    /// Returns the provisional message.
    pub fn submit(&self, input: &mut MessageInput) -> Result<ChatMessage, SubmitError> {
        if input.value().trim().is_empty() {
            return Err(SubmitError::EmptyMessage);
        }
        let stream_id = self.stream_id().ok_or(SubmitError::NoStream)?;

        let text = input.take();
        let client_token = Uuid::new_v4().to_string();
        let message = provisional_message(
            self.provisional_ids.next(self.clock.now_millis()),
            text.clone(),
            self.viewer.as_ref(),
            client_token.clone(),
        );

        let appended = self
            .cache
            .update_local(|current| append_message(current, message.clone()), false);
        if !appended {
            tracing::debug!("No snapshot cached yet, sending without optimistic append");
        }

        self.dispatcher
            .enqueue(PendingWrite {
                stream_id,
                request: SendMessageRequest {
                    message: text,
                    client_token: Some(client_token),
                    avatar: self.viewer.as_ref().and_then(|v| v.avatar.clone()),
                },
            })
            .map_err(|e| SubmitError::Dispatch(e.to_string()))?;

        Ok(message)
    }

    /// Replace the displayed snapshot with a server response.
    ///
    /// Provisional messages not present in `response` disappear; a response
    /// with `ok = false` changes nothing. Returns whether the snapshot was
    /// replaced.
    pub fn on_poll_tick(&self, response: StreamResponse) -> bool {
        self.cache.apply(response)
    }

    /// Switch to another stream, or to none.
    ///
    /// The current snapshot is discarded, polling restarts for the new stream
    /// and writes that have not been sent yet are dropped.
    pub fn navigate(&mut self, stream_id: Option<StreamId>) {
        if self.cache.key() == stream_id {
            return;
        }
        tracing::info!(
            "Navigating from stream {:?} to {:?}",
            self.cache.key().map(StreamId::value),
            stream_id.map(StreamId::value)
        );

        self.stop_polling();
        self.dispatcher = MutationDispatcher::new(self.api.clone());
        self.cache.rekey(stream_id);
        self.start_polling();
    }

    /// Client tokens of submitted messages whose write failed since the last
    /// call. Those messages will not come back in a server snapshot.
    pub fn take_failed_writes(&self) -> Vec<String> {
        self.dispatcher.take_failed_tokens()
    }

    /// Wait until every submitted message has been written or has failed.
    pub async fn wait_for_writes(&self) {
        self.dispatcher.wait_idle().await;
    }

    fn start_polling(&mut self) {
        if let Some(stream_id) = self.cache.key() {
            tracing::debug!(
                "Polling stream {} every {:?}",
                stream_id,
                self.config.poll_interval
            );
            self.poller = Some(spawn_poller(self.cache.clone(), self.config.poll_interval));
        }
    }

    fn stop_polling(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}

impl Drop for ChatSync {
    fn drop(&mut self) {
        self.stop_polling();
    }
}
