//! Error types
//!
//! A single error enum covers the failures the library can report. Transient
//! pipeline failures are not represented here: the supervisor recovers from
//! them by restarting and only logs them.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors reported by the library
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Underlying I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The channel list could not be read
    #[error("failed to read channel list {path}: {source}")]
    ChannelList {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The channel list had no usable entries
    #[error("channel list is empty")]
    NoChannels,

    /// A channel identifier not present in the channel list
    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    /// An external pipeline process could not be started
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The device-mode control program reported failure
    #[error("failed to set dtv mode {mode}: {status}")]
    DeviceMode { mode: String, status: ExitStatus },
}

impl Error {
    /// Whether this error should be reported to an HTTP client as "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::UnknownChannel(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_channel_is_not_found() {
        let err = Error::UnknownChannel("nope".into());
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "unknown channel: nope");
    }

    #[test]
    fn test_launch_error_display() {
        let err = Error::Launch {
            program: "gnutv".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file"),
        };
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "failed to launch gnutv: No such file");
    }
}
