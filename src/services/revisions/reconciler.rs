//! Revision Reconciler
//!
//! Resolves the newest persisted revision of a case and decides whether it may
//! replace what is displayed. A reconciliation that overlaps a generation run
//! for the same case is superseded: the run's buffer always wins.

use std::sync::Arc;

use abogabot_core::{CaseId, Revision, RevisionResult, RevisionStore, RevisionSummary};

use crate::services::generation::GenerationController;

/// Outcome of [`RevisionReconciler::reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// No run overlapped the fetch. `None` means the case has no revisions yet.
    Applied(Option<String>),
    /// A run was in flight, or started while fetching; the result was dropped.
    Superseded { epoch: u64 },
}

impl Reconciliation {
    pub fn is_superseded(&self) -> bool {
        matches!(self, Reconciliation::Superseded { .. })
    }
}

/// Reads persisted revisions, guarded against in-flight generation runs.
pub struct RevisionReconciler {
    store: Arc<dyn RevisionStore>,
    controller: Arc<GenerationController>,
}

impl RevisionReconciler {
    pub fn new(store: Arc<dyn RevisionStore>, controller: Arc<GenerationController>) -> Self {
        Self { store, controller }
    }

    /// Body of the newest revision, or `None` when the case has none.
    ///
    /// Listing and fetch failures are errors, never `None`.
    pub async fn latest(&self, case_id: &CaseId) -> RevisionResult<Option<String>> {
        Ok(self.latest_revision(case_id).await?.map(|r| r.body))
    }

    /// Like [`latest`](Self::latest) but keeps the revision id and timestamp.
    pub async fn latest_revision(&self, case_id: &CaseId) -> RevisionResult<Option<Revision>> {
        let summaries = self.store.list_revisions(case_id).await?;
        let count = summaries.len();
        let Some(newest) = newest_revision(summaries) else {
            tracing::debug!(case_id = %case_id, "no revisions");
            return Ok(None);
        };

        tracing::debug!(
            case_id = %case_id,
            revisions = count,
            uuid = %newest.uuid,
            "fetching newest revision"
        );
        let body = self.store.fetch_revision(case_id, &newest.uuid).await?;
        Ok(Some(Revision::from_summary(newest, body)))
    }

    /// Fetch the latest revision unless a generation run overlaps it.
    ///
    /// The case epoch is read before the fetch and compared afterwards, so a
    /// run started (and possibly already finished) in between still supersedes
    /// the stale result. A fetch error from a superseded reconciliation is
    /// dropped along with it.
    pub async fn reconcile(&self, case_id: &CaseId) -> RevisionResult<Reconciliation> {
        // Epoch first: a run accepted after this read either shows up as
        // running below or bumps the epoch seen after the fetch.
        let before = self.controller.epoch(case_id);
        if self.controller.is_running(case_id) {
            tracing::debug!(case_id = %case_id, epoch = before, "reconciliation skipped, run in flight");
            return Ok(Reconciliation::Superseded { epoch: before });
        }

        let fetched = self.latest(case_id).await;
        let after = self.controller.epoch(case_id);

        if after != before || self.controller.is_running(case_id) {
            tracing::info!(
                case_id = %case_id,
                before,
                after,
                "reconciliation superseded by generation run"
            );
            return Ok(Reconciliation::Superseded { epoch: after });
        }

        match fetched {
            Ok(body) => {
                tracing::info!(
                    case_id = %case_id,
                    empty = body.is_none(),
                    "reconciliation applied"
                );
                Ok(Reconciliation::Applied(body))
            }
            Err(e) => {
                tracing::warn!(case_id = %case_id, error = %e, "reconciliation failed");
                Err(e)
            }
        }
    }

    /// Revision summaries, newest first.
    pub async fn history(&self, case_id: &CaseId) -> RevisionResult<Vec<RevisionSummary>> {
        let mut summaries = self.store.list_revisions(case_id).await?;
        summaries.sort_by(|a, b| b.recency_key().cmp(&a.recency_key()));
        Ok(summaries)
    }

    /// Body of one specific revision.
    pub async fn revision(&self, case_id: &CaseId, uuid: &str) -> RevisionResult<String> {
        self.store.fetch_revision(case_id, uuid).await
    }
}

/// Pick the newest summary; equal timestamps resolve to the greater uuid.
pub fn newest_revision(summaries: Vec<RevisionSummary>) -> Option<RevisionSummary> {
    summaries
        .into_iter()
        .max_by(|a, b| a.recency_key().cmp(&b.recency_key()))
}
