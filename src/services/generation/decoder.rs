//! Incremental UTF-8 Decoder
//!
//! The generation stream has no framing, so a multi-byte character can be cut
//! anywhere between two network reads. The decoder emits the longest valid
//! prefix of each read and carries the incomplete tail (at most three bytes)
//! into the next call.

use abogabot_core::{GenerationError, GenerationResult};

/// Stateful decoder turning byte chunks into text chunks.
#[derive(Debug, Default)]
pub struct Utf8ChunkDecoder {
    pending: Vec<u8>,
}

impl Utf8ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk, prepending any bytes carried from the previous call.
    ///
    /// Returns an empty string when the chunk only extends a still-incomplete
    /// character. An invalid byte sequence is a `Decode` error.
    pub fn decode(&mut self, bytes: &[u8]) -> GenerationResult<String> {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(bytes);

        match String::from_utf8(input) {
            Ok(text) => Ok(text),
            Err(err) => {
                let utf8 = err.utf8_error();
                if utf8.error_len().is_some() {
                    return Err(GenerationError::decode(format!(
                        "invalid UTF-8 sequence after {} valid bytes",
                        utf8.valid_up_to()
                    )));
                }
                let mut valid = err.into_bytes();
                self.pending = valid.split_off(utf8.valid_up_to());
                String::from_utf8(valid).map_err(|e| GenerationError::decode(e.to_string()))
            }
        }
    }

    /// Whether an incomplete character is being carried.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Signal end of stream. A dangling partial character is a `Decode` error.
    pub fn finish(&mut self) -> GenerationResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let dangling = std::mem::take(&mut self.pending).len();
        Err(GenerationError::decode(format!(
            "stream ended inside a multi-byte character ({} dangling bytes)",
            dangling
        )))
    }
}
