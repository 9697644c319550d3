//! Generation Controller
//!
//! Owns the per-case run table and drives one generation run per case at a
//! time: opens the transport stream, feeds it through a [`StreamAccumulator`],
//! forwards every chunk to the caller, and records the outcome.
//!
//! Consumers only observe runs through `is_running`, `state`, `snapshot`,
//! the `on_chunk` callback and the returned future; the table itself is never
//! handed out.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio_util::sync::CancellationToken;

use abogabot_core::{
    CaseId, GenerationError, GenerationResult, GenerationTransport, RunSnapshot, RunState,
};

use super::accumulator::StreamAccumulator;

/// Per-call options for a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationOptions {
    /// Abort the transport and fail the run once this elapses.
    /// `None` waits for the backend indefinitely.
    pub timeout: Option<Duration>,
}

impl GenerationOptions {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

struct RunEntry {
    state: RunState,
    buffer: String,
    started_at: DateTime<Utc>,
    epoch: u64,
    error: Option<String>,
    cancel: CancellationToken,
}

impl RunEntry {
    fn snapshot(&self, case_id: &CaseId) -> RunSnapshot {
        RunSnapshot {
            case_id: case_id.clone(),
            state: self.state,
            buffer: self.buffer.clone(),
            started_at: self.started_at,
            epoch: self.epoch,
            error: self.error.clone(),
        }
    }
}

/// Single-flight generation orchestrator keyed by case.
pub struct GenerationController {
    transport: Arc<dyn GenerationTransport>,
    runs: DashMap<CaseId, RunEntry>,
    /// Bumped on every accepted `start`; survives discarded runs.
    epochs: DashMap<CaseId, u64>,
}

impl GenerationController {
    pub fn new(transport: Arc<dyn GenerationTransport>) -> Self {
        Self {
            transport,
            runs: DashMap::new(),
            epochs: DashMap::new(),
        }
    }

    /// Start a run for `case_id` with no timeout.
    ///
    /// See [`start_with_options`](Self::start_with_options).
    pub async fn start<F>(&self, case_id: impl Into<CaseId>, on_chunk: F) -> GenerationResult<String>
    where
        F: FnMut(&str) + Send,
    {
        self.start_with_options(case_id, GenerationOptions::default(), on_chunk)
            .await
    }

    /// Start a run and drive it to completion.
    ///
    /// Fails fast with `Conflict` (opening no stream) while another run for
    /// the same case is in flight. Every decoded chunk is passed to `on_chunk`
    /// unchanged and in order. Resolves with the final text.
    ///
    /// Dropping the returned future aborts the transport stream and discards
    /// the run; nothing about it is recorded afterwards.
    pub async fn start_with_options<F>(
        &self,
        case_id: impl Into<CaseId>,
        options: GenerationOptions,
        on_chunk: F,
    ) -> GenerationResult<String>
    where
        F: FnMut(&str) + Send,
    {
        self.start_observed(case_id, options, |_| {}, on_chunk)
            .await
    }

    /// Like [`start_with_options`](Self::start_with_options), additionally
    /// calling `on_accept` with the run's epoch once the run is registered
    /// and before the transport is opened. A rejected start never calls it.
    pub async fn start_observed<A, F>(
        &self,
        case_id: impl Into<CaseId>,
        options: GenerationOptions,
        on_accept: A,
        mut on_chunk: F,
    ) -> GenerationResult<String>
    where
        A: FnOnce(u64) + Send,
        F: FnMut(&str) + Send,
    {
        let case_id = case_id.into();
        let (epoch, cancel) = self.begin(&case_id)?;
        on_accept(epoch);
        let guard = RunGuard {
            runs: &self.runs,
            case_id: &case_id,
            epoch,
            armed: true,
        };
        tracing::info!(case_id = %case_id, epoch, "generation started");

        let mut accumulator = StreamAccumulator::new();
        let outcome = self
            .drive(&case_id, epoch, &cancel, options.timeout, &mut accumulator, &mut on_chunk)
            .await;

        match outcome {
            Ok(text) => {
                guard.disarm();
                self.settle(&case_id, epoch, RunState::Succeeded, text.clone(), None);
                tracing::info!(
                    case_id = %case_id,
                    epoch,
                    chunks = accumulator.chunk_count(),
                    bytes = text.len(),
                    "generation succeeded"
                );
                Ok(text)
            }
            Err(GenerationError::Cancelled) => {
                // Guard drop discards the run.
                tracing::info!(case_id = %case_id, epoch, "generation cancelled");
                Err(GenerationError::Cancelled)
            }
            Err(err) => {
                guard.disarm();
                let partial = accumulator.into_buffer();
                tracing::warn!(
                    case_id = %case_id,
                    epoch,
                    partial_bytes = partial.len(),
                    error = %err,
                    "generation failed"
                );
                self.settle(&case_id, epoch, RunState::Failed, partial, Some(err.to_string()));
                Err(err)
            }
        }
    }

    /// Register a new Running entry, or reject if one is already running.
    fn begin(&self, case_id: &CaseId) -> GenerationResult<(u64, CancellationToken)> {
        let cancel = CancellationToken::new();
        match self.runs.entry(case_id.clone()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().state == RunState::Running {
                    tracing::warn!(case_id = %case_id, "generation already running, rejecting start");
                    return Err(GenerationError::conflict(case_id));
                }
                let epoch = self.bump_epoch(case_id);
                occupied.insert(Self::running_entry(epoch, cancel.clone()));
                Ok((epoch, cancel))
            }
            Entry::Vacant(vacant) => {
                let epoch = self.bump_epoch(case_id);
                vacant.insert(Self::running_entry(epoch, cancel.clone()));
                Ok((epoch, cancel))
            }
        }
    }

    fn running_entry(epoch: u64, cancel: CancellationToken) -> RunEntry {
        RunEntry {
            state: RunState::Running,
            buffer: String::new(),
            started_at: Utc::now(),
            epoch,
            error: None,
            cancel,
        }
    }

    fn bump_epoch(&self, case_id: &CaseId) -> u64 {
        let mut epoch = self.epochs.entry(case_id.clone()).or_insert(0);
        *epoch += 1;
        *epoch
    }

    async fn drive<F>(
        &self,
        case_id: &CaseId,
        epoch: u64,
        cancel: &CancellationToken,
        timeout: Option<Duration>,
        accumulator: &mut StreamAccumulator,
        on_chunk: &mut F,
    ) -> GenerationResult<String>
    where
        F: FnMut(&str) + Send,
    {
        let run = async {
            let stream = self.transport.open(case_id).await?;
            accumulator
                .consume(stream, |chunk| {
                    self.record_chunk(case_id, epoch, chunk);
                    on_chunk(chunk);
                })
                .await
                .map_err(|e| e.source)
        };

        let deadline = async {
            match timeout {
                Some(after) => tokio::time::sleep(after).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GenerationError::Cancelled),
            _ = deadline => Err(GenerationError::Timeout {
                after_ms: timeout.map(|t| t.as_millis() as u64).unwrap_or_default(),
            }),
            result = run => result,
        }
    }

    /// Mirror a chunk into the run table so snapshots show live progress.
    fn record_chunk(&self, case_id: &CaseId, epoch: u64, chunk: &str) {
        if let Some(mut entry) = self.runs.get_mut(case_id) {
            if entry.epoch == epoch && entry.state == RunState::Running {
                entry.buffer.push_str(chunk);
            }
        }
    }

    fn settle(
        &self,
        case_id: &CaseId,
        epoch: u64,
        state: RunState,
        buffer: String,
        error: Option<String>,
    ) {
        if let Some(mut entry) = self.runs.get_mut(case_id) {
            if entry.epoch == epoch {
                entry.state = state;
                entry.buffer = buffer;
                entry.error = error;
            }
        }
    }

    /// Whether a run for this case is in flight.
    pub fn is_running(&self, case_id: &CaseId) -> bool {
        self.state(case_id) == RunState::Running
    }

    /// State of the most recent run, `Idle` if none is recorded.
    pub fn state(&self, case_id: &CaseId) -> RunState {
        self.runs
            .get(case_id)
            .map(|entry| entry.state)
            .unwrap_or(RunState::Idle)
    }

    /// Read-only copy of the most recent run, including a failed run's
    /// partial buffer.
    pub fn snapshot(&self, case_id: &CaseId) -> Option<RunSnapshot> {
        self.runs.get(case_id).map(|entry| entry.snapshot(case_id))
    }

    /// Sequence number of the latest accepted run for the case (0 if none).
    pub fn epoch(&self, case_id: &CaseId) -> u64 {
        self.epochs.get(case_id).map(|e| *e).unwrap_or(0)
    }

    /// Cases with a run in flight
    pub fn running_cases(&self) -> Vec<CaseId> {
        self.runs
            .iter()
            .filter(|entry| entry.state == RunState::Running)
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Ask the in-flight run for `case_id` to stop.
    ///
    /// The run's `start` future settles with `Cancelled` and the run is
    /// discarded. Returns false when nothing was running.
    pub fn cancel(&self, case_id: &CaseId) -> bool {
        match self.runs.get(case_id) {
            Some(entry) if entry.state == RunState::Running => {
                entry.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    /// Forget a settled run (the view showing it went away).
    ///
    /// Returns false while the run is still in flight or when there is none.
    pub fn discard(&self, case_id: &CaseId) -> bool {
        self.runs
            .remove_if(case_id, |_, entry| entry.state != RunState::Running)
            .is_some()
    }
}

impl std::fmt::Debug for GenerationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationController")
            .field("runs", &self.runs.len())
            .field("running", &self.running_cases())
            .finish()
    }
}

/// Discards the run if `start` is abandoned before it settles.
struct RunGuard<'a> {
    runs: &'a DashMap<CaseId, RunEntry>,
    case_id: &'a CaseId,
    epoch: u64,
    armed: bool,
}

impl RunGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let epoch = self.epoch;
        if self
            .runs
            .remove_if(self.case_id, |_, entry| {
                entry.epoch == epoch && entry.state == RunState::Running
            })
            .is_some()
        {
            tracing::debug!(case_id = %self.case_id, epoch, "run discarded");
        }
    }
}
