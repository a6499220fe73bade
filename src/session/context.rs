//! Session context
//!
//! Identity and mode of one viewer session.

use std::time::{Duration, Instant};

/// How a session reacts to channel switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Restart the cursor whenever the selected channel changes (`/cur`)
    FollowCurrent,
    /// Keep reading the feed without resyncing (`/chan/{channel}`)
    Fixed,
}

/// Information about a session
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Unique session ID
    pub session_id: u64,

    /// Channel the session is reading; updated on resync in follow mode
    pub channel: Option<String>,

    /// Follow or fixed mode
    pub mode: SessionMode,

    /// When the session opened
    pub started_at: Instant,
}

impl SessionContext {
    /// Create a new context
    pub fn new(session_id: u64, channel: Option<String>, mode: SessionMode) -> Self {
        Self {
            session_id,
            channel,
            mode,
            started_at: Instant::now(),
        }
    }

    /// Whether the session restarts on channel switches
    pub fn follows_current(&self) -> bool {
        self.mode == SessionMode::FollowCurrent
    }

    /// Time since the session opened
    pub fn duration(&self) -> Duration {
        self.started_at.elapsed()
    }
}
