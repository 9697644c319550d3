//! AbogaBot API
//!
//! REST binding to the AbogaBot lawsuit backend:
//! - Generation stream (`POST /lawsuit/{id}/generate`)
//! - Revision list and revision bodies (`GET /lawsuit/{id}/revisions[/{uuid}]`)
//!
//! Also includes the HTTP client factory and status-to-error mapping.

pub mod http_client;
pub mod lawsuit;
pub mod response;

// Re-export main types
pub use http_client::build_http_client;
pub use lawsuit::{ClientBuildError, LawsuitClient};
pub use response::{parse_generation_error, parse_revision_error, parse_revision_list};
