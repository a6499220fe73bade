//! # dvbcast
//!
//! Stream one live tuner feed over HTTP to any number of viewers.
//!
//! A supervisor keeps an external tuner → transcoder pipeline running for the
//! selected channel. The transcoder's MPEG-TS output is cut into fixed-size
//! chunks and written into a lossy ring buffer; every HTTP viewer follows the
//! ring with its own cursor, so a slow viewer drops chunks instead of holding
//! up the feed.
//!
//! ```no_run
//! use dvbcast::{DvbServer, ServerConfig};
//!
//! # async fn run() -> dvbcast::Result<()> {
//! let config = ServerConfig::default().channels_path("/home/tv/.tzap/channels.conf");
//! let server = DvbServer::new(config).await?;
//! server.run().await
//! # }
//! ```

pub mod buffer;
pub mod channel;
pub mod device;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod server;
pub mod session;
pub mod station;
pub mod stats;

pub use buffer::{BufferConfig, ChunkStore};
pub use channel::{ChannelList, ChannelSelection};
pub use device::{DeviceControl, DtvMode};
pub use error::{Error, Result};
pub use pipeline::{CommandTemplate, PipelineLauncher, ProcessLauncher, Supervisor};
pub use server::{DvbServer, ServerConfig};
pub use session::{SessionMode, StreamSession};
pub use station::Station;
