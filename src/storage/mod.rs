//! Storage Layer
//!
//! Handles the JSON config file.

pub mod config;

pub use config::*;
