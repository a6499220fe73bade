//! Viewer sessions
//!
//! Each HTTP stream request gets one [`StreamSession`]: a private cursor into
//! the chunk store plus a viewer-count guard.

pub mod context;
pub mod stream;
pub mod viewers;

pub use context::{SessionContext, SessionMode};
pub use stream::StreamSession;
pub use viewers::{ViewerCount, ViewerGuard};
