//! Chunked row streaming with backpressure.
//!
//! Row sources produce a bounded-channel stream of [`StreamChunk`]s: one
//! header sentinel first (no row payload), then one chunk per source row.
//! [`pipe_rows`] drains such a stream into a per-chunk handler, strictly
//! sequentially - the next chunk is not pulled until the handler for the
//! previous one has completed. Combined with the bounded channel this
//! preserves source row order and gives natural backpressure.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::core::value::Record;
use crate::error::Result;

/// Default bound for row stream channels.
pub const STREAM_BUFFER: usize = 64;

/// One unit of a row stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    /// Stream header sentinel. Precedes all rows and carries no payload.
    Header,

    /// One source row.
    Row(Record),
}

/// Receiving side of a row stream.
pub type RowStream = mpsc::Receiver<Result<StreamChunk>>;

/// Sending side of a row stream.
pub type RowStreamSender = mpsc::Sender<Result<StreamChunk>>;

/// Create a bounded row stream channel pair.
pub fn channel() -> (RowStreamSender, RowStream) {
    mpsc::channel(STREAM_BUFFER)
}

/// Build an in-memory row stream from pre-collected records.
///
/// Emits a header chunk followed by one chunk per record. Intended for
/// small inputs and tests; real sources should produce into a [`channel`]
/// from their own task.
pub fn from_records(records: Vec<Record>) -> RowStream {
    let (tx, rx) = mpsc::channel(records.len() + 1);
    // Capacity covers every chunk, so the sends cannot fail.
    tx.try_send(Ok(StreamChunk::Header)).ok();
    for record in records {
        tx.try_send(Ok(StreamChunk::Row(record))).ok();
    }
    rx
}

/// Per-row handler invoked by [`pipe_rows`].
#[async_trait]
pub trait ChunkHandler {
    /// Handle one source row. Returning an error aborts the pipe.
    async fn handle(&mut self, record: Record) -> Result<()>;
}

/// Pipe a row stream into a sequential per-row handler.
///
/// Header chunks are skipped. Stream-level errors abort the pipe and
/// propagate; so does the first handler error. Returns the number of rows
/// handled.
pub async fn pipe_rows<H>(stream: &mut RowStream, handler: &mut H) -> Result<u64>
where
    H: ChunkHandler + Send + ?Sized,
{
    let mut rows = 0u64;
    while let Some(chunk) = stream.recv().await {
        match chunk? {
            StreamChunk::Header => {}
            StreamChunk::Row(record) => {
                handler.handle(record).await?;
                rows += 1;
            }
        }
    }
    Ok(rows)
}
