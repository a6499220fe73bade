//! Per-client stream session
//!
//! A session follows the chunk store from the write position it saw when it
//! opened. It parks on the store's pulse while it is caught up, delivers
//! chunks strictly in write order, and never tries to recover history it
//! missed: a session that falls a full ring behind jumps to whatever newer
//! chunk now occupies its slot.

use std::sync::Arc;

use bytes::Bytes;
use futures::Stream;

use super::context::{SessionContext, SessionMode};
use super::viewers::ViewerGuard;
use crate::stats::SessionStats;
use crate::station::Station;

/// One viewer's lazy, infinite view of the live feed
#[derive(Debug)]
pub struct StreamSession {
    station: Arc<Station>,
    context: SessionContext,

    /// Sequence number of the next chunk to deliver
    cursor: u64,

    /// Selection version the cursor was last synced to
    selection_version: u64,

    /// Waiting for the feed of the session's channel to start
    awaiting_feed: bool,

    stats: SessionStats,

    _viewer: ViewerGuard,
}

impl StreamSession {
    pub(crate) fn new(station: Arc<Station>, session_id: u64, mode: SessionMode) -> Self {
        let viewer = station.viewers().enter();
        let cursor = station.store().current_write_pos();
        let selection_version = station.selection().version();
        let context = SessionContext::new(session_id, station.current_channel(), mode);

        tracing::info!(
            session_id = session_id,
            channel = ?context.channel,
            mode = ?mode,
            viewers = station.viewers().get(),
            "Viewer joined"
        );

        Self {
            station,
            context,
            cursor,
            selection_version,
            awaiting_feed: true,
            stats: SessionStats::new(),
            _viewer: viewer,
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Sequence number of the next chunk this session expects
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Wait for and return the next chunk
    ///
    /// Returns `None` once the station shuts down.
    pub async fn next_chunk(&mut self) -> Option<Bytes> {
        let station = Arc::clone(&self.station);
        let store = station.store();
        let selection = station.selection();
        let follow = self.context.follows_current();

        loop {
            let cursor = self.cursor;
            let synced_version = self.selection_version;
            store
                .signal()
                .wait_until(|| {
                    store.current_write_pos() > cursor
                        || selection.is_shutdown()
                        || (follow && selection.version() != synced_version)
                })
                .await;

            if selection.is_shutdown() {
                return None;
            }

            let write_pos = store.current_write_pos();
            if !self.sync_feed(write_pos) {
                continue;
            }
            if self.cursor >= write_pos {
                continue;
            }

            match store.read_at(self.cursor) {
                Some(chunk) if chunk.seq == self.cursor => {
                    self.cursor += 1;
                    self.stats.record_sent(chunk.data.len());
                    return Some(chunk.data);
                }
                Some(chunk) if chunk.seq > self.cursor && chunk.seq < write_pos => {
                    tracing::debug!(
                        session_id = self.context.session_id,
                        expected = self.cursor,
                        found = chunk.seq,
                        "Session lapped by writer"
                    );
                    self.stats.laps += 1;
                    self.cursor = chunk.seq + 1;
                    self.stats.record_sent(chunk.data.len());
                    return Some(chunk.data);
                }
                _ => {
                    // Cleared, not yet published, or stale: skip the slot
                    self.cursor += 1;
                    self.stats.chunks_skipped += 1;
                }
            }
        }
    }

    /// Keep the session on its channel's feed
    ///
    /// Every session first waits for the feed of the channel it opened on.
    /// Following sessions wait again after each channel switch. Returns false
    /// while that feed has not started; the cursor is then held at the write
    /// position so nothing from the previous channel is delivered.
    fn sync_feed(&mut self, write_pos: u64) -> bool {
        let station = &self.station;
        let version = station.selection().version();
        if self.context.follows_current() && version != self.selection_version {
            self.selection_version = version;
            self.context.channel = station.current_channel();
            self.awaiting_feed = true;
            self.stats.resyncs += 1;
        }

        if !self.awaiting_feed {
            return true;
        }

        let mut start = match self.context.channel.as_deref() {
            Some(channel) => station.feed_start(channel),
            None => None,
        };

        // The selection moved on before this channel's feed ever started;
        // its pipeline will not be launched, so take the current one instead
        if start.is_none() && !self.context.follows_current() {
            let current = station.current_channel();
            if current.is_some() && current != self.context.channel {
                tracing::debug!(
                    session_id = self.context.session_id,
                    requested = ?self.context.channel,
                    current = ?current,
                    "Requested channel superseded before its feed started"
                );
                self.context.channel = current;
                start = self
                    .context
                    .channel
                    .as_deref()
                    .and_then(|channel| station.feed_start(channel));
            }
        }

        match start {
            Some(start) => {
                self.cursor = self.cursor.max(start);
                self.awaiting_feed = false;
                tracing::debug!(
                    session_id = self.context.session_id,
                    channel = ?self.context.channel,
                    cursor = self.cursor,
                    "Session synced to channel feed"
                );
                true
            }
            None => {
                self.cursor = self.cursor.max(write_pos);
                false
            }
        }
    }

    /// Turn the session into a stream of chunks
    ///
    /// Dropping the stream ends the session and releases its viewer slot.
    pub fn into_stream(self) -> impl Stream<Item = Bytes> + Send + 'static {
        futures::stream::unfold(self, |mut session| async move {
            let chunk = session.next_chunk().await?;
            Some((chunk, session))
        })
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        tracing::info!(
            session_id = self.context.session_id,
            chunks = self.stats.chunks_sent,
            bytes = self.stats.bytes_sent,
            laps = self.stats.laps,
            duration_secs = self.context.duration().as_secs(),
            // Our own guard has not been released yet
            viewers = self.station.viewers().get().saturating_sub(1),
            "Viewer left"
        );
    }
}
