//! Data Models
//!
//! Contains the configuration data structures used by the application.

pub mod settings;

pub use settings::*;
