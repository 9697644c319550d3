//! Revisions Service
//!
//! Access to persisted revisions and reconciliation against generation runs.

pub mod reconciler;

pub use reconciler::{newest_revision, Reconciliation, RevisionReconciler};
