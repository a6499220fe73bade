//! Chunk store implementation
//!
//! A fixed ring of slots holding the most recent chunks of the live feed.
//! Positions are sequence numbers that only ever grow; the slot for a
//! position is `seq % capacity`. Each slot remembers the sequence number of
//! the chunk it holds, so a reader can tell whether it found the chunk it
//! asked for, a newer one (it was lapped), or nothing usable.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::{Mutex, RwLock};

use super::config::BufferConfig;
use super::signal::Pulse;

/// A chunk read back from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Sequence number the chunk was written at
    pub seq: u64,
    /// Chunk payload
    pub data: Bytes,
}

#[derive(Debug, Default)]
struct Slot {
    seq: u64,
    data: Option<Bytes>,
}

/// Ring buffer shared by one writer and any number of readers
///
/// Slot locks are held only long enough to swap or clone a `Bytes` handle,
/// so readers never see a partially written chunk. The writer can wait on a
/// reader for the duration of one such clone, never for a slow consumer's
/// network I/O.
#[derive(Debug)]
pub struct ChunkStore {
    slots: Box<[RwLock<Slot>]>,

    /// Sequence number of the next chunk to be written
    write_seq: AtomicU64,

    /// Current writer generation; held across every write so a superseded
    /// writer can never land a chunk after its successor took over
    generation: Mutex<u64>,

    pulse: Pulse,

    config: BufferConfig,
}

impl ChunkStore {
    /// Create an empty store with default configuration
    pub fn new() -> Self {
        Self::with_config(BufferConfig::default())
    }

    /// Create an empty store with custom configuration
    pub fn with_config(config: BufferConfig) -> Self {
        let slots = (0..config.capacity.max(1))
            .map(|_| RwLock::new(Slot::default()))
            .collect();

        Self {
            slots,
            write_seq: AtomicU64::new(0),
            generation: Mutex::new(0),
            pulse: Pulse::new(),
            config,
        }
    }

    /// Get the store configuration
    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// The wake signal pulsed after every write and clear
    pub fn signal(&self) -> &Pulse {
        &self.pulse
    }

    /// Position the next chunk will be written at
    pub fn current_write_pos(&self) -> u64 {
        self.write_seq.load(Ordering::Acquire)
    }

    /// Total chunks written since the store was created
    pub fn chunks_written(&self) -> u64 {
        self.current_write_pos()
    }

    fn slot(&self, seq: u64) -> &RwLock<Slot> {
        &self.slots[(seq % self.slots.len() as u64) as usize]
    }

    /// Store a chunk at the write position, advance it and wake all readers
    ///
    /// Only one task may write at a time; use [`ChunkStore::writer`] to get a
    /// handle that enforces this across pipeline generations.
    pub fn write(&self, data: Bytes) -> u64 {
        let _generation = self.generation.lock();
        self.write_slot(data)
    }

    /// Caller must hold the generation lock
    fn write_slot(&self, data: Bytes) -> u64 {
        let seq = self.write_seq.load(Ordering::Relaxed);
        {
            let mut slot = self.slot(seq).write();
            slot.seq = seq;
            slot.data = Some(data);
        }
        self.write_seq.store(seq + 1, Ordering::Release);
        self.pulse.pulse();
        seq
    }

    /// Read whatever currently occupies the slot for `pos`
    ///
    /// Returns `None` for a slot that was never written or has been cleared.
    /// The returned chunk may carry a newer sequence number than `pos` if the
    /// writer has lapped the caller.
    pub fn read_at(&self, pos: u64) -> Option<Chunk> {
        let slot = self.slot(pos).read();
        slot.data.as_ref().map(|data| Chunk {
            seq: slot.seq,
            data: data.clone(),
        })
    }

    /// Empty every slot and wake all readers
    ///
    /// The write position is kept, so readers that are parked at it simply
    /// keep waiting for the next chunk.
    pub fn clear(&self) {
        for slot in self.slots.iter() {
            slot.write().data = None;
        }
        self.pulse.pulse();
    }

    /// Take over as the single writer
    ///
    /// Any previously issued writer becomes stale: its writes are dropped and
    /// it no longer clears the store when it goes away.
    pub fn writer(self: &Arc<Self>) -> ChunkWriter {
        self.take_over().0
    }

    /// Take over as the single writer, returning the position its first
    /// chunk will be written at
    ///
    /// No earlier writer can write once this returns, so everything at or
    /// after the returned position comes from the new writer.
    pub fn take_over(self: &Arc<Self>) -> (ChunkWriter, u64) {
        let mut current = self.generation.lock();
        *current += 1;
        let writer = ChunkWriter {
            store: Arc::clone(self),
            generation: *current,
            written: 0,
        };
        (writer, self.current_write_pos())
    }

    /// Revoke the current writer without issuing a new one
    pub fn revoke_writer(&self) {
        *self.generation.lock() += 1;
    }
}

impl Default for ChunkStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive write handle for one pipeline generation
///
/// Dropping the current writer clears the store, so sessions stop serving
/// stale data once the feed behind it is gone.
#[derive(Debug)]
pub struct ChunkWriter {
    store: Arc<ChunkStore>,
    generation: u64,
    written: u64,
}

impl ChunkWriter {
    /// Whether this writer still owns the store
    pub fn is_current(&self) -> bool {
        *self.store.generation.lock() == self.generation
    }

    /// Write a chunk; returns false once the writer has been superseded
    pub fn write(&mut self, data: Bytes) -> bool {
        let current = self.store.generation.lock();
        if *current != self.generation {
            return false;
        }
        self.store.write_slot(data);
        drop(current);
        self.written += 1;
        true
    }

    /// Chunks written through this handle
    pub fn written(&self) -> u64 {
        self.written
    }

    /// The store this writer feeds
    pub fn store(&self) -> &Arc<ChunkStore> {
        &self.store
    }
}

impl Drop for ChunkWriter {
    fn drop(&mut self) {
        let current = self.store.generation.lock();
        if *current == self.generation {
            self.store.clear();
        }
    }
}
