//! AbogaBot Core
//!
//! Foundational types for the AbogaBot document client: case and revision
//! types, the generation/revision error taxonomy, the transport traits the
//! generation pipeline is written against, and client configuration data.
//! This crate performs no I/O.
//!
//! ## Module Organization
//!
//! - `error` - `GenerationError`, `RevisionError` and their result aliases
//! - `types` - `CaseId`, `RevisionSummary`, `Revision`, `RunState`, `RunSnapshot`
//! - `streaming` - `ChunkStream`, `GenerationTransport`, `RevisionStore`
//! - `config` - `ClientConfig`, `ProxyConfig`, `GenerateRoute`

pub mod config;
pub mod error;
pub mod streaming;
pub mod types;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{GenerationError, GenerationResult, RevisionError, RevisionResult};

// ── Domain Types ───────────────────────────────────────────────────────
pub use types::{CaseId, Revision, RevisionSummary, RunSnapshot, RunState};

// ── Transport Traits ───────────────────────────────────────────────────
pub use streaming::{ChunkStream, GenerationTransport, RevisionStore};

// ── Configuration ──────────────────────────────────────────────────────
pub use config::{ClientConfig, GenerateRoute, ProxyConfig, ProxyProtocol};
