//! Statistics for viewer sessions and the server

/// Per-session statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Chunks delivered to the client
    pub chunks_sent: u64,
    /// Bytes delivered to the client
    pub bytes_sent: u64,
    /// Empty or not-yet-valid slots passed over
    pub chunks_skipped: u64,
    /// Times the writer lapped this session
    pub laps: u64,
    /// Times the cursor was reset after a channel switch
    pub resyncs: u64,
}

impl SessionStats {
    /// Create new stats tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a delivered chunk
    pub fn record_sent(&mut self, len: usize) {
        self.chunks_sent += 1;
        self.bytes_sent += len as u64;
    }
}

/// Server-wide snapshot, used to render the directory page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerStats {
    /// Currently selected channel (`None` while shutting down)
    pub current_channel: Option<String>,
    /// Active viewer sessions
    pub viewers: usize,
    /// Known channels
    pub channel_count: usize,
    /// Chunks written to the store since startup
    pub chunks_written: u64,
    /// Pipeline launches after the first one
    pub restarts: u64,
}
