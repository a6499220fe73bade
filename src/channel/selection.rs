//! Current channel selection
//!
//! Process-wide state written by channel-switch requests and read by the
//! supervisor and by sessions that follow the current channel. `None` is
//! the shutdown sentinel.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// The currently selected channel, or the shutdown sentinel
#[derive(Debug, Default)]
pub struct ChannelSelection {
    current: Mutex<Option<String>>,

    /// Incremented on every change, including shutdown
    version: AtomicU64,
}

impl ChannelSelection {
    /// Create a selection starting at `channel`
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            current: Mutex::new(Some(channel.into())),
            version: AtomicU64::new(0),
        }
    }

    /// Current channel, `None` once shutdown was requested
    pub fn get(&self) -> Option<String> {
        self.current.lock().clone()
    }

    /// Switch channels
    ///
    /// Returns true if the selection changed. Has no effect after shutdown.
    pub fn set(&self, channel: &str) -> bool {
        let mut current = self.current.lock();
        match current.as_deref() {
            None => false,
            Some(existing) if existing == channel => false,
            Some(_) => {
                *current = Some(channel.to_string());
                self.version.fetch_add(1, Ordering::AcqRel);
                true
            }
        }
    }

    /// Set the sentinel, asking the supervisor to tear down and exit
    pub fn shutdown(&self) {
        let mut current = self.current.lock();
        if current.take().is_some() {
            self.version.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Whether shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        self.current.lock().is_none()
    }

    /// Change counter, cheap to poll
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_changes_channel() {
        let selection = ChannelSelection::new("news");

        assert!(selection.set("sports"));
        assert_eq!(selection.get().as_deref(), Some("sports"));
        assert_eq!(selection.version(), 1);
    }

    #[test]
    fn test_set_same_channel_is_noop() {
        let selection = ChannelSelection::new("news");

        assert!(!selection.set("news"));
        assert_eq!(selection.version(), 0);
    }

    #[test]
    fn test_shutdown_is_sticky() {
        let selection = ChannelSelection::new("news");
        selection.shutdown();

        assert!(selection.is_shutdown());
        assert!(!selection.set("sports"));
        assert_eq!(selection.get(), None);

        // Shutting down twice only counts once
        selection.shutdown();
        assert_eq!(selection.version(), 1);
    }
}
