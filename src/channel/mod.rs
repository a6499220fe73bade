//! Channel list and channel selection

pub mod list;
pub mod selection;

pub use list::ChannelList;
pub use selection::ChannelSelection;
