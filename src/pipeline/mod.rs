//! External tuner/transcoder pipeline
//!
//! ```text
//!   tuner (gnutv) ──stdout──► transcoder (ffmpeg -c copy) ──stdout──► Ingestor
//!        ▲                            ▲
//!        └────────── Supervisor: poll, kill, relaunch ─────────┘
//! ```

pub mod command;
pub mod launcher;
pub mod supervisor;

pub use command::CommandTemplate;
pub use launcher::{FeedSource, Pipeline, PipelineLauncher, ProcessExit, ProcessLauncher, ProcessSet};
pub use supervisor::{RestartReason, Supervisor, SupervisorState, DEFAULT_POLL_INTERVAL};
