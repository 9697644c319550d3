//! Services
//!
//! Business logic services for the application.
//! Services handle the generation pipeline and are called by the CLI.

pub mod document;
pub mod generation;
pub mod revisions;

pub use document::{DisplayedContent, DocumentView};
pub use generation::{GenerationController, GenerationOptions, StreamAccumulator};
pub use revisions::{Reconciliation, RevisionReconciler};
