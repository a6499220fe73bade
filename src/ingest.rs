//! Feed ingestor
//!
//! Pulls fixed-size chunks off the transcoder's output and publishes them to
//! the chunk store. The ingestor stops at the first short read; a trailing
//! partial chunk is dropped rather than forwarded.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;

use crate::buffer::ChunkWriter;

/// Read exactly `n` bytes from `source`
///
/// Returns `Ok(None)` if the source reaches end-of-stream before `n` bytes
/// were collected.
pub async fn hard_read<R>(source: &mut R, n: usize) -> std::io::Result<Option<Bytes>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(n);
    while buf.len() < n {
        let want = n - buf.len();
        let read = (&mut *source).take(want as u64).read_buf(&mut buf).await?;
        if read == 0 {
            return Ok(None);
        }
    }
    Ok(Some(buf.freeze()))
}

/// Why an ingestor stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestEnd {
    /// The source closed or returned a short read
    EndOfStream,
    /// Reading from the source failed
    ReadError,
    /// A newer pipeline generation took over the store
    Superseded,
}

/// Summary returned when an ingestor finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Chunks published to the store
    pub chunks: u64,
    /// Reason the ingestor stopped
    pub end: IngestEnd,
}

/// Copies one pipeline's output into the chunk store
pub struct Ingestor<R> {
    source: R,
    writer: ChunkWriter,
    chunk_size: usize,
}

impl<R> Ingestor<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Create an ingestor using the store's configured chunk size
    pub fn new(source: R, writer: ChunkWriter) -> Self {
        let chunk_size = writer.store().config().chunk_size;
        Self {
            source,
            writer,
            chunk_size,
        }
    }

    /// Run until the source ends
    ///
    /// The writer is dropped on return, which clears the store if this
    /// ingestor still owns it.
    pub async fn run(mut self) -> IngestReport {
        let end = loop {
            match hard_read(&mut self.source, self.chunk_size).await {
                Ok(Some(chunk)) => {
                    if !self.writer.write(chunk) {
                        break IngestEnd::Superseded;
                    }
                }
                Ok(None) => break IngestEnd::EndOfStream,
                Err(e) => {
                    tracing::debug!(error = %e, "Feed read failed");
                    break IngestEnd::ReadError;
                }
            }
        };

        let report = IngestReport {
            chunks: self.writer.written(),
            end,
        };

        tracing::info!(
            chunks = report.chunks,
            end = ?report.end,
            "Ingestor stopped"
        );

        report
    }

    /// Spawn the ingestor as a background task
    pub fn spawn(self) -> JoinHandle<IngestReport> {
        tokio::spawn(self.run())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::io::AsyncWriteExt;

    use super::*;
    use crate::buffer::{BufferConfig, ChunkStore, TS_PACKET_SIZE};

    fn store_with_chunk(packets: usize) -> Arc<ChunkStore> {
        let config = BufferConfig::default()
            .capacity(16)
            .chunk_size(packets * TS_PACKET_SIZE);
        Arc::new(ChunkStore::with_config(config))
    }

    #[tokio::test]
    async fn test_hard_read_exact() {
        let data = vec![7u8; 10];
        let mut source = &data[..];

        let chunk = hard_read(&mut source, 4).await.unwrap().unwrap();
        assert_eq!(chunk.len(), 4);

        let chunk = hard_read(&mut source, 6).await.unwrap().unwrap();
        assert_eq!(chunk.len(), 6);

        assert!(hard_read(&mut source, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_hard_read_incomplete() {
        let data = vec![1u8; 3];
        let mut source = &data[..];

        assert!(hard_read(&mut source, 4).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_hard_read_accumulates_small_writes() {
        let (mut tx, mut rx) = tokio::io::duplex(8);

        let producer = tokio::spawn(async move {
            for _ in 0..10 {
                tx.write_all(&[0x47; 5]).await.unwrap();
            }
        });

        let chunk = hard_read(&mut rx, 50).await.unwrap().unwrap();
        assert_eq!(chunk.len(), 50);
        producer.await.unwrap();
    }

    #[tokio::test]
    async fn test_ingestor_drops_short_trailing_chunk() {
        let store = store_with_chunk(2);
        let chunk_size = store.config().chunk_size;

        // Three whole chunks plus half a packet
        let data = vec![0x47u8; chunk_size * 3 + TS_PACKET_SIZE / 2];
        let ingestor = Ingestor::new(std::io::Cursor::new(data), store.writer());

        let report = ingestor.run().await;

        assert_eq!(report.chunks, 3);
        assert_eq!(report.end, IngestEnd::EndOfStream);
        assert_eq!(store.current_write_pos(), 3);
    }

    #[tokio::test]
    async fn test_every_chunk_has_configured_size() {
        for packets in [1, 3, 7] {
            let store = store_with_chunk(packets);
            let chunk_size = store.config().chunk_size;
            let (mut tx, rx) = tokio::io::duplex(1024);
            let handle = Ingestor::new(rx, store.writer()).spawn();

            tx.write_all(&vec![0x47u8; chunk_size * 2 + 5]).await.unwrap();

            // Wait for both whole chunks before checking the slots
            let probe = Arc::clone(&store);
            store
                .signal()
                .wait_until(|| probe.current_write_pos() >= 2)
                .await;
            for pos in 0..2 {
                assert_eq!(store.read_at(pos).unwrap().data.len(), chunk_size);
            }

            drop(tx);
            let report = handle.await.unwrap();
            assert_eq!(report.chunks, 2);
        }
    }

    #[tokio::test]
    async fn test_ingestor_clears_store_on_end() {
        let store = store_with_chunk(1);
        let data = vec![0x47u8; TS_PACKET_SIZE * 2];

        Ingestor::new(std::io::Cursor::new(data), store.writer())
            .run()
            .await;

        assert_eq!(store.current_write_pos(), 2);
        assert!(store.read_at(0).is_none());
        assert!(store.read_at(1).is_none());
    }

    #[tokio::test]
    async fn test_superseded_ingestor_stops() {
        let store = store_with_chunk(1);
        let (mut tx, rx) = tokio::io::duplex(4096);
        let handle = Ingestor::new(rx, store.writer()).spawn();

        let _newer = store.writer();
        tx.write_all(&[0x47u8; TS_PACKET_SIZE]).await.unwrap();

        let report = handle.await.unwrap();
        assert_eq!(report.end, IngestEnd::Superseded);
        assert_eq!(report.chunks, 0);
    }
}
