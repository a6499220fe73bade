//! Lossy broadcast ring buffer
//!
//! The buffer carries the live feed from the single active ingestor to every
//! viewer session. Readers follow the writer at their own pace and never
//! make it wait for their I/O. Slots sit behind short-lived `RwLock`s, so a
//! write may wait out a reader's `Bytes` clone of the same slot; writes
//! themselves are serialized by the writer generation lock.
//!
//! # Architecture
//!
//! ```text
//!                          Arc<ChunkStore>
//!                     ┌─────────────────────────┐
//!                     │ slots: [RwLock<Slot>; N]│
//!                     │ write_seq: AtomicU64    │
//!                     │ generation: Mutex<u64>  │
//!                     │ pulse: Pulse            │
//!                     └───────────┬─────────────┘
//!                                 │
//!         ┌───────────────────────┼───────────────────────┐
//!         │                       │                       │
//!         ▼                       ▼                       ▼
//!    [Ingestor]             [StreamSession]         [StreamSession]
//!    writer.write()         read_at(cursor)         read_at(cursor)
//!         │                       │                       │
//!         └──► pulse() ──► wait_until(cursor != write_seq) ──► HTTP body
//! ```
//!
//! # Zero-Copy Design
//!
//! Chunks are `bytes::Bytes`. A reader clones the handle out of the slot, so
//! the chunk it holds stays valid even after the writer reuses the slot.

pub mod config;
pub mod signal;
pub mod store;

pub use config::{BufferConfig, DEFAULT_CAPACITY, DEFAULT_CHUNK_SIZE, TS_PACKET_SIZE};
pub use signal::Pulse;
pub use store::{Chunk, ChunkStore, ChunkWriter};
