//! Polled snapshot cache keyed by stream id.
//!
//! The cache holds the latest stream snapshot and publishes every change on a
//! `watch` channel. It is filled in three ways:
//!
//! - [`SnapshotCache::refresh`]: fetch from the server and replace the value
//! - [`SnapshotCache::set_local`] / [`SnapshotCache::update_local`]: overwrite
//!   locally, optionally without asking the server again
//! - [`SnapshotCache::apply`]: replace with a response fetched elsewhere
//!
//! Every local write bumps a generation counter. A fetch that was already in
//! flight when the generation changed is discarded, so an optimistic write is
//! not overwritten by a response that was produced before it.

use std::{sync::Arc, time::Duration};

use streamchat_shared::{
    dto::{StreamResponse, StreamSnapshot},
    time::Clock,
};
use tokio::{
    sync::{Notify, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};

use crate::{domain::StreamId, transport::StreamApi};

/// Current cache content as seen by subscribers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheEntry {
    /// Stream the cache is keyed by; `None` disables fetching
    pub key: Option<StreamId>,
    /// Last fetched snapshot, possibly with local edits
    pub value: Option<StreamSnapshot>,
    /// Bumped on every local write and re-key
    pub generation: u64,
    /// When the value was last replaced by a server response (Unix millis)
    pub fetched_at: Option<i64>,
}

/// Key-addressed cache of the stream snapshot
pub struct SnapshotCache {
    api: Arc<dyn StreamApi>,
    clock: Arc<dyn Clock>,
    state: watch::Sender<CacheEntry>,
    revalidate: Notify,
}

impl SnapshotCache {
    pub fn new(api: Arc<dyn StreamApi>, clock: Arc<dyn Clock>, key: Option<StreamId>) -> Self {
        let (state, _) = watch::channel(CacheEntry {
            key,
            ..CacheEntry::default()
        });
        Self {
            api,
            clock,
            state,
            revalidate: Notify::new(),
        }
    }

    pub fn key(&self) -> Option<StreamId> {
        self.state.borrow().key
    }

    /// Latest value, if any
    pub fn get(&self) -> Option<StreamSnapshot> {
        self.state.borrow().value.clone()
    }

    pub fn entry(&self) -> CacheEntry {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CacheEntry> {
        self.state.subscribe()
    }

    /// Overwrite the cached value locally.
    ///
    /// With `revalidate = false` the value stays until the next scheduled poll
    /// and any fetch already in flight is discarded. With `revalidate = true`
    /// the poll task is woken to fetch right away.
    pub fn set_local(&self, value: Option<StreamSnapshot>, revalidate: bool) {
        self.state.send_modify(|entry| {
            entry.value = value;
            entry.generation += 1;
        });
        if revalidate {
            self.revalidate.notify_one();
        }
    }

    /// Derive a new value from the current one and store it locally.
    ///
    /// Nothing is written when the cache is empty. Returns whether a value was
    /// stored.
    pub fn update_local<F>(&self, update: F, revalidate: bool) -> bool
    where
        F: FnOnce(&StreamSnapshot) -> StreamSnapshot,
    {
        let updated = self.state.send_if_modified(|entry| match entry.value.as_ref() {
            Some(current) => {
                entry.value = Some(update(current));
                entry.generation += 1;
                true
            }
            None => false,
        });
        if updated && revalidate {
            self.revalidate.notify_one();
        }
        updated
    }

    /// Replace the value with a server response.
    ///
    /// A response with `ok = false` or without a stream leaves the cache
    /// untouched. Returns whether the value was replaced.
    pub fn apply(&self, response: StreamResponse) -> bool {
        let Some(snapshot) = response.into_snapshot() else {
            tracing::debug!("Server response carried no stream, keeping current snapshot");
            return false;
        };
        let fetched_at = self.clock.now_millis();
        self.state.send_modify(|entry| {
            entry.value = Some(snapshot);
            entry.fetched_at = Some(fetched_at);
        });
        true
    }

    /// Fetch the snapshot for the current key and store it.
    ///
    /// Does nothing without a key. Fetch failures are logged and leave the
    /// current value in place. Returns whether the value was replaced.
    pub async fn refresh(&self) -> bool {
        let (key, generation) = {
            let entry = self.state.borrow();
            (entry.key, entry.generation)
        };
        let Some(stream_id) = key else {
            return false;
        };

        let response = match self.api.fetch_stream(stream_id).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Failed to fetch stream {}: {}", stream_id, e);
                return false;
            }
        };

        let Some(snapshot) = response.into_snapshot() else {
            tracing::debug!("Stream {} not available, keeping current snapshot", stream_id);
            return false;
        };
        let fetched_at = self.clock.now_millis();
        let replaced = self.state.send_if_modified(|entry| {
            if entry.key != key || entry.generation != generation {
                return false;
            }
            entry.value = Some(snapshot);
            entry.fetched_at = Some(fetched_at);
            true
        });
        if !replaced {
            tracing::debug!(
                "Discarding response for stream {} fetched before a local write",
                stream_id
            );
        }
        replaced
    }

    /// Point the cache at another stream, dropping the current value.
    pub fn rekey(&self, key: Option<StreamId>) {
        self.state.send_modify(|entry| {
            entry.key = key;
            entry.value = None;
            entry.fetched_at = None;
            entry.generation += 1;
        });
    }

    async fn revalidation_requested(&self) {
        self.revalidate.notified().await;
    }
}

/// Spawn the task that refreshes `cache` every `interval`.
///
/// The first refresh happens immediately. Ticks never overlap: the next tick
/// is scheduled only after the previous fetch has finished. A revalidation
/// request from [`SnapshotCache::set_local`] triggers an extra refresh.
/// Aborting the returned handle stops polling.
pub fn spawn_poller(cache: Arc<SnapshotCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                () = cache.revalidation_requested() => {
                    tracing::debug!("Revalidation requested");
                }
            }
            cache.refresh().await;
        }
    })
}
