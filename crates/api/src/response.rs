//! Response Mapping
//!
//! Turns backend status codes and bodies into the core error taxonomy, and
//! parses the revision list payload.

use abogabot_core::{GenerationError, RevisionError, RevisionResult, RevisionSummary};

/// Map a non-success generation response to a `GenerationError`.
///
/// The backend puts a human-readable message in the body when it has one;
/// otherwise the canonical reason phrase is used.
pub fn parse_generation_error(status: u16, body: &str) -> GenerationError {
    GenerationError::transport(status, reason_or_phrase(status, body))
}

/// Map a non-success revision response to a `RevisionError`.
pub fn parse_revision_error(status: u16, body: &str) -> RevisionError {
    RevisionError::http(status, reason_or_phrase(status, body))
}

fn reason_or_phrase(status: u16, body: &str) -> String {
    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status))
}

/// Parse the body of `GET /lawsuit/{id}/revisions`.
pub fn parse_revision_list(body: &str) -> RevisionResult<Vec<RevisionSummary>> {
    serde_json::from_str(body).map_err(|e| {
        RevisionError::invalid_response(format!("Failed to parse revision list: {}", e))
    })
}
