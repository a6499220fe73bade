//! External command templates
//!
//! A template is a program plus arguments in which `{channels}` and
//! `{channel}` are replaced at launch time by the channel-list path and the
//! channel identifier.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use tokio::process::Command;

/// Placeholder for the channel-list file path
pub const CHANNELS_PLACEHOLDER: &str = "{channels}";

/// Placeholder for the channel identifier
pub const CHANNEL_PLACEHOLDER: &str = "{channel}";

/// Program and argument template for one pipeline stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    /// Program to run
    pub program: String,
    /// Arguments, possibly containing placeholders
    pub args: Vec<String>,
}

impl CommandTemplate {
    /// Create a template
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Default tuner: `gnutv` writing the raw transport stream to stdout
    pub fn tuner() -> Self {
        Self::new(
            "gnutv",
            ["-channels", CHANNELS_PLACEHOLDER, "-out", "stdout", CHANNEL_PLACEHOLDER],
        )
    }

    /// Default transcoder: `ffmpeg` remuxing stdin to MPEG-TS without re-encoding
    pub fn transcoder() -> Self {
        Self::new(
            "ffmpeg",
            [
                "-loglevel", "fatal", "-i", "-", "-acodec", "copy", "-vcodec", "copy", "-scodec",
                "copy", "-f", "mpegts", "-",
            ],
        )
    }

    /// Arguments with placeholders substituted
    pub fn render_args(&self, channels: &Path, channel: &str) -> Vec<String> {
        let channels = channels.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(CHANNELS_PLACEHOLDER, &channels)
                    .replace(CHANNEL_PLACEHOLDER, channel)
            })
            .collect()
    }

    /// Build the command for a channel
    pub fn command(&self, channels: &Path, channel: &str) -> Command {
        let mut command = Command::new(&self.program);
        command.args(self.render_args(channels, channel));
        command
    }
}

impl fmt::Display for CommandTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Error parsing an empty command line
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("command template is empty")]
pub struct EmptyCommand;

impl FromStr for CommandTemplate {
    type Err = EmptyCommand;

    /// Split on whitespace; the first word is the program
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let program = words.next().ok_or(EmptyCommand)?;
        Ok(Self::new(program, words))
    }
}
