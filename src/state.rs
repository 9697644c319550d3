//! Application State
//!
//! Wires the backend client into the generation controller and revision
//! reconciler and hands out per-case document views.

use std::sync::Arc;

use abogabot_api::LawsuitClient;
use abogabot_core::{CaseId, GenerationTransport, RevisionStore};

use crate::models::settings::AppConfig;
use crate::services::document::DocumentView;
use crate::services::generation::{GenerationController, GenerationOptions};
use crate::services::revisions::RevisionReconciler;
use crate::utils::error::{AppError, AppResult};

/// Shared services for one backend
pub struct AppState {
    config: AppConfig,
    controller: Arc<GenerationController>,
    reconciler: Arc<RevisionReconciler>,
}

impl AppState {
    /// Build state talking to the REST backend described by `config`
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        config.validate().map_err(AppError::validation)?;
        let client = Arc::new(LawsuitClient::new(config.to_client_config())?);
        tracing::debug!(
            api = %config.api_base_url,
            generator = config.generator_base_url.as_deref().unwrap_or(&config.api_base_url),
            "backend client ready"
        );
        Ok(Self::with_backend(config, client.clone(), client))
    }

    /// Build state over arbitrary transport and store implementations
    pub fn with_backend(
        config: AppConfig,
        transport: Arc<dyn GenerationTransport>,
        store: Arc<dyn RevisionStore>,
    ) -> Self {
        let controller = Arc::new(GenerationController::new(transport));
        let reconciler = Arc::new(RevisionReconciler::new(store, controller.clone()));
        Self {
            config,
            controller,
            reconciler,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn controller(&self) -> &Arc<GenerationController> {
        &self.controller
    }

    pub fn reconciler(&self) -> &Arc<RevisionReconciler> {
        &self.reconciler
    }

    /// Options for runs started from this state (configured timeout)
    pub fn generation_options(&self) -> GenerationOptions {
        GenerationOptions {
            timeout: self.config.generation_timeout(),
        }
    }

    /// Document view for one case, sharing this state's controller
    pub fn document(&self, case_id: impl Into<CaseId>) -> DocumentView {
        DocumentView::new(case_id, self.controller.clone(), self.reconciler.clone())
    }
}
