//! AbogaBot - Document Generation Client Library
//!
//! This library provides the streaming document-generation pipeline of the
//! AbogaBot legal-case client.
//! It includes:
//! - Generation services (decoder, accumulator, single-flight controller)
//! - Revision reconciliation against in-flight runs
//! - Per-case document view state
//! - Storage layer (JSON config)
//! - Data models and utilities

pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

pub use models::settings::{AppConfig, SettingsUpdate};
pub use services::{
    DisplayedContent, DocumentView, GenerationController, GenerationOptions, Reconciliation,
    RevisionReconciler,
};
pub use state::AppState;
pub use storage::ConfigService;
pub use utils::error::{AppError, AppResult};
