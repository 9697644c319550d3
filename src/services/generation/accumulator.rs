//! Stream Accumulator
//!
//! Drains a generation byte stream into an append-only text buffer, invoking
//! the progress callback for every decoded chunk before awaiting the next one.

use futures_util::{Stream, StreamExt};
use thiserror::Error;

use abogabot_core::{GenerationError, GenerationResult};

use super::decoder::Utf8ChunkDecoder;

/// Failure while consuming a stream, with everything accumulated before it.
///
/// The accumulator never decides whether partial output stays visible; it
/// only hands it back.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{source}")]
pub struct AccumulatorError {
    pub partial: String,
    #[source]
    pub source: GenerationError,
}

/// Append-only buffer fed from a chunk stream.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    buffer: String,
    chunks: usize,
    decoder: Utf8ChunkDecoder,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text accumulated so far
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Number of `on_chunk` invocations so far
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    pub fn into_buffer(self) -> String {
        self.buffer
    }

    /// Consume `stream` to the end.
    ///
    /// Chunks are applied strictly in delivery order. Reads that decode to
    /// nothing (only part of a multi-byte character) produce no callback.
    /// Resolves with the full text, or fails with the partial buffer on the
    /// first stream or decode error.
    ///
    /// Taking `&mut self` lets a caller that abandons this future (timeout,
    /// cancellation) still inspect what had been accumulated.
    pub async fn consume<S, B, F>(
        &mut self,
        mut stream: S,
        mut on_chunk: F,
    ) -> Result<String, AccumulatorError>
    where
        S: Stream<Item = GenerationResult<B>> + Unpin,
        B: AsRef<[u8]>,
        F: FnMut(&str),
    {
        while let Some(item) = stream.next().await {
            let bytes = match item {
                Ok(bytes) => bytes,
                Err(e) => return Err(self.fail(e)),
            };
            let text = match self.decoder.decode(bytes.as_ref()) {
                Ok(text) => text,
                Err(e) => return Err(self.fail(e)),
            };
            if text.is_empty() {
                continue;
            }
            self.buffer.push_str(&text);
            self.chunks += 1;
            on_chunk(&text);
        }

        if let Err(e) = self.decoder.finish() {
            return Err(self.fail(e));
        }
        Ok(self.buffer.clone())
    }

    fn fail(&self, source: GenerationError) -> AccumulatorError {
        AccumulatorError {
            partial: self.buffer.clone(),
            source,
        }
    }
}
