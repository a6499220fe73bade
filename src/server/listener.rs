//! HTTP server
//!
//! Binds the listener, starts the pipeline supervisor and serves the routes.
//! Shutdown sets the channel selection to the sentinel, which releases all
//! stream bodies and stops the supervisor; the server returns once the
//! supervisor has joined.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use super::config::ServerConfig;
use super::http::router;
use crate::channel::ChannelList;
use crate::error::Result;
use crate::pipeline::{PipelineLauncher, Supervisor};
use crate::station::Station;

/// Live TV streaming server
pub struct DvbServer {
    config: ServerConfig,
    station: Arc<Station>,
}

impl DvbServer {
    /// Load the channel list and create the server
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let channels = ChannelList::load(&config.channels_path).await?;
        tracing::info!(
            path = %config.channels_path.display(),
            channels = channels.len(),
            "Channel list loaded"
        );
        Self::with_channels(config, channels)
    }

    /// Create the server from an already parsed channel list
    pub fn with_channels(config: ServerConfig, channels: ChannelList) -> Result<Self> {
        let station = Station::new(channels, config.initial_channel.as_deref(), config.buffer)?;
        Ok(Self {
            config,
            station: Arc::new(station),
        })
    }

    /// Get a reference to the shared station state
    pub fn station(&self) -> &Arc<Station> {
        &self.station
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run until Ctrl-C
    pub async fn run(&self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run with the configured tuner and transcoder until `shutdown` resolves
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener, self.config.launcher(), shutdown).await
    }

    /// Serve on an existing listener with a custom pipeline launcher
    pub async fn serve<L, F>(&self, listener: TcpListener, launcher: L, shutdown: F) -> Result<()>
    where
        L: PipelineLauncher,
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(
            addr = %listener.local_addr()?,
            channel = ?self.station.current_channel(),
            "HTTP server listening"
        );

        let supervisor = Supervisor::new(Arc::clone(&self.station), launcher)
            .poll_interval(self.config.poll_interval)
            .spawn();

        let station = Arc::clone(&self.station);
        let result = axum::serve(listener, router(Arc::clone(&self.station)))
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received");
                station.shutdown();
            })
            .await;

        // Covers the case where serving failed before shutdown was requested
        self.station.shutdown();
        if let Err(e) = supervisor.await {
            tracing::error!(error = %e, "Supervisor task failed");
        }

        result?;
        Ok(())
    }
}
