//! HTTP front end: configuration, routes, directory page and the server loop

pub mod config;
pub mod http;
pub mod listener;
pub mod page;

pub use config::{default_channels_path, ServerConfig, DEFAULT_PORT};
pub use http::{router, TS_CONTENT_TYPE};
pub use listener::DvbServer;
