//! Server configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::buffer::BufferConfig;
use crate::device::DeviceControl;
use crate::pipeline::{CommandTemplate, ProcessLauncher, DEFAULT_POLL_INTERVAL};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 2000;

/// Channel list location relative to the home directory
pub const DEFAULT_CHANNELS_FILE: &str = ".tzap/channels.conf";

/// Default channel list path, `~/.tzap/channels.conf`
pub fn default_channels_path() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(DEFAULT_CHANNELS_FILE),
        None => PathBuf::from(DEFAULT_CHANNELS_FILE),
    }
}

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Tuner channel list
    pub channels_path: PathBuf,

    /// Channel to start on (first list entry if `None`)
    pub initial_channel: Option<String>,

    /// How often the supervisor checks the pipeline and the selection
    pub poll_interval: Duration,

    /// Ring buffer sizing
    pub buffer: BufferConfig,

    /// Tuner command
    pub tuner: CommandTemplate,

    /// Transcoder command
    pub transcoder: CommandTemplate,

    /// Device-mode switch run before serving (`None` to skip)
    pub device: Option<DeviceControl>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            channels_path: default_channels_path(),
            initial_channel: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            buffer: BufferConfig::default(),
            tuner: CommandTemplate::tuner(),
            transcoder: CommandTemplate::transcoder(),
            device: Some(DeviceControl::default()),
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the channel list path
    pub fn channels_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.channels_path = path.into();
        self
    }

    /// Set the channel to start on
    pub fn initial_channel(mut self, channel: impl Into<String>) -> Self {
        self.initial_channel = Some(channel.into());
        self
    }

    /// Set the supervisor poll interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the ring buffer configuration
    pub fn buffer(mut self, buffer: BufferConfig) -> Self {
        self.buffer = buffer;
        self
    }

    /// Set the tuner command
    pub fn tuner(mut self, tuner: CommandTemplate) -> Self {
        self.tuner = tuner;
        self
    }

    /// Set the transcoder command
    pub fn transcoder(mut self, transcoder: CommandTemplate) -> Self {
        self.transcoder = transcoder;
        self
    }

    /// Set the device-mode switch
    pub fn device(mut self, device: DeviceControl) -> Self {
        self.device = Some(device);
        self
    }

    /// Do not switch the device mode at startup
    pub fn skip_device(mut self) -> Self {
        self.device = None;
        self
    }

    /// Launcher for the configured tuner and transcoder
    pub fn launcher(&self) -> ProcessLauncher {
        ProcessLauncher::new(self.channels_path.clone())
            .tuner(self.tuner.clone())
            .transcoder(self.transcoder.clone())
    }
}
