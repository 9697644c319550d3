//! Document View
//!
//! Display state for one case: either the latest persisted revision or the
//! output of a generation run. Streaming output takes precedence over any
//! reconciliation that overlaps it, and partial output from a failed run is
//! kept visibly separate from a finished document.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;

use abogabot_core::{CaseId, GenerationError, GenerationResult};

use crate::services::generation::{GenerationController, GenerationOptions};
use crate::services::revisions::{Reconciliation, RevisionReconciler};
use crate::utils::error::AppResult;

/// What the document area currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayedContent {
    /// No revision exists and nothing has been generated
    Empty,
    /// Body of the newest persisted revision
    Persisted { text: String },
    /// Run in flight; text grows with every chunk
    Streaming { text: String },
    /// Run finished; treated as latest until the next reconciliation
    Generated { text: String },
    /// Run failed; `partial` is whatever arrived before the failure
    Incomplete { partial: String, error: String },
}

impl DisplayedContent {
    pub fn text(&self) -> &str {
        match self {
            DisplayedContent::Empty => "",
            DisplayedContent::Persisted { text }
            | DisplayedContent::Streaming { text }
            | DisplayedContent::Generated { text } => text,
            DisplayedContent::Incomplete { partial, .. } => partial,
        }
    }

    pub fn is_incomplete(&self) -> bool {
        matches!(self, DisplayedContent::Incomplete { .. })
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, DisplayedContent::Streaming { .. })
    }
}

/// Presenter-side state for one case's document area.
pub struct DocumentView {
    case_id: CaseId,
    controller: Arc<GenerationController>,
    reconciler: Arc<RevisionReconciler>,
    content: Mutex<DisplayedContent>,
}

impl DocumentView {
    pub fn new(
        case_id: impl Into<CaseId>,
        controller: Arc<GenerationController>,
        reconciler: Arc<RevisionReconciler>,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            controller,
            reconciler,
            content: Mutex::new(DisplayedContent::Empty),
        }
    }

    pub fn case_id(&self) -> &CaseId {
        &self.case_id
    }

    /// Current displayed content
    pub fn content(&self) -> DisplayedContent {
        self.lock().clone()
    }

    pub fn is_incomplete(&self) -> bool {
        self.lock().is_incomplete()
    }

    /// Reconcile with the backend and show the newest revision.
    ///
    /// A superseded reconciliation leaves the display untouched. On error the
    /// display is also left as is and the error returned.
    pub async fn refresh(&self) -> AppResult<Reconciliation> {
        let epoch = self.controller.epoch(&self.case_id);
        let outcome = self.reconciler.reconcile(&self.case_id).await?;

        if let Reconciliation::Applied(body) = &outcome {
            let mut content = self.lock();
            if self.controller.epoch(&self.case_id) != epoch
                || self.controller.is_running(&self.case_id)
            {
                return Ok(Reconciliation::Superseded {
                    epoch: self.controller.epoch(&self.case_id),
                });
            }
            *content = match body {
                Some(text) => DisplayedContent::Persisted { text: text.clone() },
                None => DisplayedContent::Empty,
            };
        }
        Ok(outcome)
    }

    /// Generate a new document, mirroring every chunk into the display.
    ///
    /// The display switches to `Streaming` only once the run is accepted; a
    /// rejected start leaves it untouched.
    pub async fn generate<F>(&self, on_chunk: F) -> GenerationResult<String>
    where
        F: FnMut(&str) + Send,
    {
        self.generate_with_options(GenerationOptions::default(), on_chunk)
            .await
    }

    pub async fn generate_with_options<F>(
        &self,
        options: GenerationOptions,
        mut on_chunk: F,
    ) -> GenerationResult<String>
    where
        F: FnMut(&str) + Send,
    {
        let mut previous: Option<DisplayedContent> = None;
        let mut mirrored = String::new();

        let result = self
            .controller
            .start_observed(
                &self.case_id,
                options,
                |_| {
                    previous = Some(self.replace(DisplayedContent::Streaming {
                        text: String::new(),
                    }));
                },
                |chunk| {
                    mirrored.push_str(chunk);
                    self.push_chunk(chunk);
                    on_chunk(chunk);
                },
            )
            .await;

        // Not accepted: the display belongs to whichever run is in flight.
        let Some(previous) = previous else {
            return result;
        };

        match &result {
            Ok(text) => {
                self.replace(DisplayedContent::Generated { text: text.clone() });
            }
            Err(GenerationError::Cancelled) => {
                self.replace(previous);
            }
            Err(e) => {
                self.replace(DisplayedContent::Incomplete {
                    partial: mirrored,
                    error: e.to_string(),
                });
            }
        }
        result
    }

    fn push_chunk(&self, chunk: &str) {
        let mut content = self.lock();
        match &mut *content {
            DisplayedContent::Streaming { text } => text.push_str(chunk),
            other => {
                *other = DisplayedContent::Streaming {
                    text: chunk.to_string(),
                }
            }
        }
    }

    fn replace(&self, next: DisplayedContent) -> DisplayedContent {
        std::mem::replace(&mut *self.lock(), next)
    }

    fn lock(&self) -> MutexGuard<'_, DisplayedContent> {
        self.content.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for DocumentView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentView")
            .field("case_id", &self.case_id)
            .field("content", &*self.lock())
            .finish()
    }
}
