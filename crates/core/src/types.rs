//! Domain Types
//!
//! Case identifiers, persisted revisions, and the observable state of a
//! generation run.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Opaque identifier of a lawsuit (case) on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CaseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CaseId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CaseId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&CaseId> for CaseId {
    fn from(id: &CaseId) -> Self {
        id.clone()
    }
}

impl From<i64> for CaseId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

/// Entry of the revision list endpoint (`GET /lawsuit/{id}/revisions`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionSummary {
    /// Revision identifier
    pub uuid: String,
    /// Creation time, as reported by the backend
    #[serde(deserialize_with = "deserialize_created_at")]
    pub created_at: NaiveDateTime,
}

impl RevisionSummary {
    /// Ordering key used to pick the newest revision: creation time first,
    /// revision id as a deterministic tie-breaker.
    pub fn recency_key(&self) -> (NaiveDateTime, &str) {
        (self.created_at, self.uuid.as_str())
    }
}

/// A persisted, immutable document revision with its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    pub id: String,
    pub created_at: NaiveDateTime,
    pub body: String,
}

impl Revision {
    pub fn from_summary(summary: RevisionSummary, body: impl Into<String>) -> Self {
        Self {
            id: summary.uuid,
            created_at: summary.created_at,
            body: body.into(),
        }
    }
}

/// Parse a backend timestamp.
///
/// The backend emits local ISO-8601 without offset and with nanosecond
/// precision (`2025-04-18T16:51:22.758209177`). Offset-qualified values are
/// accepted too and normalised to UTC.
pub fn parse_created_at(raw: &str) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_utc())
        .map_err(|e| format!("invalid createdAt '{}': {}", raw, e))
}

fn deserialize_created_at<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_created_at(&raw).map_err(serde::de::Error::custom)
}

/// Lifecycle state of a generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// No run known for the case
    Idle,
    /// Stream open, chunks being applied
    Running,
    /// Stream ended cleanly; buffer is the final text
    Succeeded,
    /// Stream failed; buffer holds partial output
    Failed,
}

impl RunState {
    /// Check if this state is a settled outcome
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Succeeded | RunState::Failed)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::Running => write!(f, "running"),
            RunState::Succeeded => write!(f, "succeeded"),
            RunState::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for RunState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(RunState::Idle),
            "running" => Ok(RunState::Running),
            "succeeded" => Ok(RunState::Succeeded),
            "failed" => Ok(RunState::Failed),
            _ => Err(format!("Unknown run state: {}", s)),
        }
    }
}

/// Read-only view of a generation run handed out to consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSnapshot {
    pub case_id: CaseId,
    pub state: RunState,
    /// Accumulated text; partial while running or after a failure
    pub buffer: String,
    pub started_at: DateTime<Utc>,
    /// Per-case sequence number of the run
    pub epoch: u64,
    /// Failure message when `state` is `Failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
