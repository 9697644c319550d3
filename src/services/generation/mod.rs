//! Generation Service
//!
//! Streaming document generation: incremental UTF-8 decoding, chunk
//! accumulation, and the per-case single-flight controller.

pub mod accumulator;
pub mod controller;
pub mod decoder;

pub use accumulator::{AccumulatorError, StreamAccumulator};
pub use controller::{GenerationController, GenerationOptions};
pub use decoder::Utf8ChunkDecoder;
