//! Pipeline supervisor
//!
//! Keeps one pipeline running for the selected channel. On every poll tick
//! the supervisor checks whether the selection changed, whether either
//! process exited and whether the ingestor ran dry, and restarts the
//! pipeline when any of them happened. Polling keeps the two independent
//! triggers (process death and channel switches) on a single code path; the
//! poll interval bounds how long a switch takes to be noticed.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::launcher::{PipelineLauncher, ProcessExit, ProcessSet};
use crate::ingest::{IngestReport, Ingestor};
use crate::station::Station;

/// Default poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Supervisor lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    /// No channel selected, or shutting down
    Idle,
    /// Launching the pipeline for the selected channel
    Starting,
    /// Pipeline alive, ingestor active
    Running,
    /// Tearing down before a relaunch
    Restarting,
}

/// Why a running pipeline was torn down
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartReason {
    /// The selected channel differs from the running one
    ChannelChanged { from: String, to: String },
    /// A pipeline process exited
    ProcessExited(Vec<ProcessExit>),
    /// The ingestor stopped reading
    FeedEnded,
}

struct ActivePipeline {
    channel: String,
    processes: ProcessSet,
    ingestor: JoinHandle<IngestReport>,
}

impl ActivePipeline {
    fn teardown(mut self) {
        self.processes.kill();
        // The ingestor would also stop on its own once the pipe closes
        self.ingestor.abort();
    }
}

/// Owns the tuner/transcoder pipeline for the station
pub struct Supervisor<L: PipelineLauncher> {
    station: Arc<Station>,
    launcher: L,
    poll_interval: Duration,
    state: SupervisorState,
    active: Option<ActivePipeline>,
    launches: u64,
}

impl<L: PipelineLauncher> Supervisor<L> {
    /// Create a supervisor with the default poll interval
    pub fn new(station: Arc<Station>, launcher: L) -> Self {
        Self {
            station,
            launcher,
            poll_interval: DEFAULT_POLL_INTERVAL,
            state: SupervisorState::Idle,
            active: None,
            launches: 0,
        }
    }

    /// Set the poll interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Current state
    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Channel of the running pipeline
    pub fn active_channel(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.channel.as_str())
    }

    /// Successful pipeline launches so far
    pub fn launches(&self) -> u64 {
        self.launches
    }

    /// Run until the selection is set to the shutdown sentinel
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            "Supervisor started"
        );

        loop {
            ticker.tick().await;
            if self.tick() == SupervisorState::Idle {
                break;
            }
        }

        tracing::info!(launches = self.launches, "Supervisor stopped");
    }

    /// Spawn the supervisor loop as a background task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Evaluate liveness and selection once
    pub fn tick(&mut self) -> SupervisorState {
        let Some(channel) = self.station.current_channel() else {
            self.shutdown();
            return self.state;
        };

        if let Some(reason) = self.check_running(&channel) {
            self.state = SupervisorState::Restarting;
            self.restart(reason);
        }

        if self.active.is_none() {
            self.state = SupervisorState::Starting;
            self.start(&channel);
        }

        self.state
    }

    fn check_running(&mut self, channel: &str) -> Option<RestartReason> {
        let active = self.active.as_mut()?;

        if active.channel != channel {
            return Some(RestartReason::ChannelChanged {
                from: active.channel.clone(),
                to: channel.to_string(),
            });
        }

        if let Some(exits) = active.processes.poll_exit() {
            return Some(RestartReason::ProcessExited(exits));
        }

        if active.ingestor.is_finished() {
            return Some(RestartReason::FeedEnded);
        }

        None
    }

    fn restart(&mut self, reason: RestartReason) {
        let Some(active) = self.active.take() else {
            return;
        };

        match &reason {
            RestartReason::ChannelChanged { from, to } => {
                tracing::info!(from = %from, to = %to, "Switching channel");
            }
            RestartReason::ProcessExited(exits) => {
                let exits: Vec<String> = exits.iter().map(ToString::to_string).collect();
                tracing::warn!(
                    channel = %active.channel,
                    exits = ?exits,
                    "Pipeline process exited"
                );
            }
            RestartReason::FeedEnded => {
                tracing::warn!(channel = %active.channel, "Pipeline output ended");
            }
        }

        active.teardown();
    }

    fn start(&mut self, channel: &str) {
        let pipeline = match self.launcher.launch(channel) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                // Retried on the next tick while the channel stays selected
                tracing::error!(channel = channel, error = %e, "Failed to launch pipeline");
                return;
            }
        };

        let writer = self.station.begin_feed(channel);
        let ingestor = Ingestor::new(pipeline.output, writer).spawn();

        self.launches += 1;
        if self.launches > 1 {
            self.station.record_restart();
        }

        tracing::info!(
            channel = channel,
            processes = pipeline.processes.len(),
            "Pipeline started"
        );

        self.active = Some(ActivePipeline {
            channel: channel.to_string(),
            processes: pipeline.processes,
            ingestor,
        });
        self.state = SupervisorState::Running;
    }

    fn shutdown(&mut self) {
        if let Some(active) = self.active.take() {
            tracing::info!(channel = %active.channel, "Stopping pipeline");
            active.teardown();
        }
        self.station.end_feed();
        self.state = SupervisorState::Idle;
    }
}

impl<L: PipelineLauncher> Drop for Supervisor<L> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.teardown();
        }
    }
}
