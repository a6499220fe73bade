//! Chunk store configuration

/// Size of one MPEG transport stream packet
pub const TS_PACKET_SIZE: usize = 188;

/// Default chunk size: 265 TS packets
pub const DEFAULT_CHUNK_SIZE: usize = 265 * TS_PACKET_SIZE;

/// Default number of ring slots
pub const DEFAULT_CAPACITY: usize = 200;

/// Configuration for the chunk store and the feed ingestor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferConfig {
    /// Number of slots in the ring
    pub capacity: usize,

    /// Bytes per chunk, always a positive multiple of [`TS_PACKET_SIZE`]
    pub chunk_size: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl BufferConfig {
    /// Set the number of ring slots (at least 1)
    pub fn capacity(mut self, slots: usize) -> Self {
        self.capacity = slots.max(1);
        self
    }

    /// Set the chunk size
    ///
    /// Rounded down to a multiple of the TS packet size so forwarded chunks
    /// always carry whole packets. Never smaller than one packet.
    pub fn chunk_size(mut self, size: usize) -> Self {
        let packets = (size / TS_PACKET_SIZE).max(1);
        self.chunk_size = packets * TS_PACKET_SIZE;
        self
    }
}
