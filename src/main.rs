use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use dvbcast::buffer::BufferConfig;
use dvbcast::device::{DeviceControl, DtvMode, DEFAULT_CONTROL_PROGRAM};
use dvbcast::server::{default_channels_path, DEFAULT_PORT};
use dvbcast::{CommandTemplate, DvbServer, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "dvbcast")]
#[command(about = "Stream a live tuner feed over HTTP", long_about = None)]
struct Args {
    /// HTTP port
    #[arg(short, long, env = "DVBCAST_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address to bind to
    #[arg(long, env = "DVBCAST_BIND", default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Broadcast standard to switch the tuner to
    #[arg(short = 'D', long, env = "DVBCAST_DTVMODE", value_enum, ignore_case = true, default_value_t = DtvMode::Isdbt)]
    dtvmode: DtvMode,

    /// Tuner channel list (defaults to ~/.tzap/channels.conf)
    #[arg(long, env = "DVBCAST_CHANNELS")]
    channels: Option<PathBuf>,

    /// Channel to start on (defaults to the first list entry)
    #[arg(long, env = "DVBCAST_CHANNEL")]
    channel: Option<String>,

    /// Pipeline supervisor poll interval in milliseconds
    #[arg(long, env = "DVBCAST_POLL_MS", default_value_t = 250)]
    poll_ms: u64,

    /// Ring buffer size in chunks
    #[arg(long, env = "DVBCAST_BUFFER_SLOTS", default_value_t = dvbcast::buffer::DEFAULT_CAPACITY)]
    buffer_slots: usize,

    /// Do not run the device-mode control program
    #[arg(long, env = "DVBCAST_SKIP_DTVMODE")]
    skip_dtvmode: bool,

    /// Device-mode control program
    #[arg(long, env = "DVBCAST_MEDIACLIENT", default_value = DEFAULT_CONTROL_PROGRAM)]
    mediaclient: PathBuf,

    /// Tuner command, with {channels} and {channel} placeholders
    #[arg(long, env = "DVBCAST_TUNER")]
    tuner: Option<CommandTemplate>,

    /// Transcoder command
    #[arg(long, env = "DVBCAST_TRANSCODER")]
    transcoder: Option<CommandTemplate>,
}

impl Args {
    fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::with_addr(SocketAddr::new(self.bind, self.port))
            .channels_path(self.channels.unwrap_or_else(default_channels_path))
            .poll_interval(Duration::from_millis(self.poll_ms.max(1)))
            .buffer(BufferConfig::default().capacity(self.buffer_slots));

        if let Some(channel) = self.channel {
            config = config.initial_channel(channel);
        }
        if let Some(tuner) = self.tuner {
            config = config.tuner(tuner);
        }
        if let Some(transcoder) = self.transcoder {
            config = config.transcoder(transcoder);
        }

        if self.skip_dtvmode {
            config.skip_device()
        } else {
            config.device(DeviceControl::new(self.mediaclient, self.dtvmode))
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .init();

    let config = Args::parse().into_config();

    if let Some(device) = &config.device {
        if let Err(e) = device.apply().await {
            tracing::error!(error = %e, "Device mode switch failed");
            eprintln!("Error setting the dtv mode");
            return Ok(ExitCode::FAILURE);
        }
    }

    let channels_path = config.channels_path.clone();
    let server = DvbServer::new(config)
        .await
        .with_context(|| format!("failed to start with {}", channels_path.display()))?;

    info!(addr = %server.bind_addr(), "dvbcast starting");
    server.run().await?;
    info!("dvbcast stopped");

    Ok(ExitCode::SUCCESS)
}
