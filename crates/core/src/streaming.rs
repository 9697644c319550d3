//! Transport Traits
//!
//! The two backend capabilities the generation core depends on. Both are
//! injected as trait objects so the controller and reconciler can be driven
//! by in-memory fakes in tests and by the REST binding in production.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

use crate::error::{GenerationResult, RevisionResult};
use crate::types::{CaseId, RevisionSummary};

/// Raw body of a generation response: a lazy, finite, non-restartable
/// sequence of byte chunks in delivery order.
///
/// An `Err` item is terminal; implementations must not yield after it.
/// Dropping the stream aborts the underlying connection.
pub type ChunkStream = BoxStream<'static, GenerationResult<Bytes>>;

/// Opens generation streams for a case.
#[async_trait]
pub trait GenerationTransport: Send + Sync {
    /// Issue the "start generation" request and hand back the response body.
    ///
    /// A non-success status must fail here, before any chunk is exposed.
    async fn open(&self, case_id: &CaseId) -> GenerationResult<ChunkStream>;
}

/// Read-only access to persisted revisions.
#[async_trait]
pub trait RevisionStore: Send + Sync {
    /// List revision summaries for a case, in whatever order the backend uses.
    async fn list_revisions(&self, case_id: &CaseId) -> RevisionResult<Vec<RevisionSummary>>;

    /// Fetch the body of one revision as plain text.
    async fn fetch_revision(&self, case_id: &CaseId, uuid: &str) -> RevisionResult<String>;
}
