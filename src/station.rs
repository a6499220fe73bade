//! Shared station state
//!
//! One `Station` is created at startup and handed, behind an `Arc`, to the
//! supervisor and to every request handler. It owns the chunk store, the
//! known channels, the channel selection and the viewer count.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::buffer::{BufferConfig, ChunkStore, ChunkWriter};
use crate::channel::{ChannelList, ChannelSelection};
use crate::error::{Error, Result};
use crate::session::{SessionMode, StreamSession, ViewerCount};
use crate::stats::ServerStats;

/// Process-wide state shared by the supervisor and the HTTP layer
#[derive(Debug)]
pub struct Station {
    store: Arc<ChunkStore>,
    channels: ChannelList,
    selection: ChannelSelection,
    viewers: ViewerCount,

    /// Channel of the live feed and the position of its first chunk
    feed: Mutex<Option<(String, u64)>>,

    restarts: AtomicU64,
    next_session_id: AtomicU64,
}

impl Station {
    /// Create the station
    ///
    /// The initial selection is `initial` if given, otherwise the first
    /// entry of the channel list.
    pub fn new(channels: ChannelList, initial: Option<&str>, config: BufferConfig) -> Result<Self> {
        let initial = match initial {
            Some(name) if channels.contains(name) => name.to_string(),
            Some(name) => return Err(Error::UnknownChannel(name.to_string())),
            None => channels.first().ok_or(Error::NoChannels)?.to_string(),
        };

        Ok(Self {
            store: Arc::new(ChunkStore::with_config(config)),
            channels,
            selection: ChannelSelection::new(initial),
            viewers: ViewerCount::new(),
            feed: Mutex::new(None),
            restarts: AtomicU64::new(0),
            next_session_id: AtomicU64::new(1),
        })
    }

    pub fn store(&self) -> &Arc<ChunkStore> {
        &self.store
    }

    pub fn channels(&self) -> &ChannelList {
        &self.channels
    }

    pub fn selection(&self) -> &ChannelSelection {
        &self.selection
    }

    pub fn viewers(&self) -> &ViewerCount {
        &self.viewers
    }

    /// Currently selected channel
    pub fn current_channel(&self) -> Option<String> {
        self.selection.get()
    }

    /// Switch to a known channel
    ///
    /// Unknown channels are rejected without touching the selection.
    /// Returns true if the selection changed.
    pub fn select(&self, channel: &str) -> Result<bool> {
        if !self.channels.contains(channel) {
            return Err(Error::UnknownChannel(channel.to_string()));
        }

        let changed = self.selection.set(channel);
        if changed {
            tracing::info!(channel = channel, "Channel selected");
            // Let following sessions resync without waiting for the next chunk
            self.store.signal().pulse();
        }
        Ok(changed)
    }

    /// Request shutdown: set the sentinel and release every waiting session
    pub fn shutdown(&self) {
        self.selection.shutdown();
        self.store.signal().pulse();
    }

    /// Open a viewer session starting at the current write position
    pub fn open_session(self: &Arc<Self>, mode: SessionMode) -> StreamSession {
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        StreamSession::new(Arc::clone(self), session_id, mode)
    }

    /// Hand the store to a new feed for `channel`
    ///
    /// Supersedes the previous writer and records where the new feed starts,
    /// so sessions following the current channel can skip the old one.
    pub fn begin_feed(&self, channel: &str) -> ChunkWriter {
        let (writer, start) = self.store.take_over();
        *self.feed.lock() = Some((channel.to_string(), start));
        self.store.signal().pulse();
        writer
    }

    /// Forget the live feed, clearing the store
    pub fn end_feed(&self) {
        self.store.revoke_writer();
        *self.feed.lock() = None;
        self.store.clear();
    }

    /// Start position of the live feed, if it carries `channel`
    pub fn feed_start(&self, channel: &str) -> Option<u64> {
        match &*self.feed.lock() {
            Some((name, start)) if name == channel => Some(*start),
            _ => None,
        }
    }

    pub(crate) fn record_restart(&self) {
        self.restarts.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot for reporting
    pub fn stats(&self) -> ServerStats {
        ServerStats {
            current_channel: self.current_channel(),
            viewers: self.viewers.get(),
            channel_count: self.channels.len(),
            chunks_written: self.store.chunks_written(),
            restarts: self.restarts.load(Ordering::Relaxed),
        }
    }
}
