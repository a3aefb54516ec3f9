//! Sync coordination: staleness checks, window selection, and the
//! single-flight rule.
//!
//! The coordinator moves through Idle → Syncing → Idle on success and
//! Idle → Syncing → Error on a remote failure. Error is not terminal - the
//! next trigger runs again from idle behavior. At most one sync holds the
//! in-progress flag; a second trigger while syncing is a no-op that reports
//! the current state rather than queueing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::SyncConfig;
use crate::error::Result;
use crate::http::RecordSource;
use crate::persistence::WorkoutStore;
use crate::types::{SyncOutcome, SyncReport, SyncState};

/// Coordinator state, observable at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncPhase {
    Idle,
    Syncing,
    Error,
}

/// Reconciles the remote source with the local store under the incremental
/// sync policy.
pub struct SyncCoordinator<S> {
    store: Arc<WorkoutStore>,
    source: S,
    config: SyncConfig,
    in_progress: AtomicBool,
    phase: Mutex<SyncPhase>,
}

impl<S: RecordSource> SyncCoordinator<S> {
    pub fn new(store: Arc<WorkoutStore>, source: S, config: SyncConfig) -> Self {
        Self {
            store,
            source,
            config,
            in_progress: AtomicBool::new(false),
            phase: Mutex::new(SyncPhase::Idle),
        }
    }

    /// Current phase.
    pub fn phase(&self) -> SyncPhase {
        *self.phase.lock().expect("phase lock poisoned")
    }

    /// True when the cache is older than the configured interval (or has
    /// never been populated).
    pub fn is_due(&self, now: DateTime<Utc>) -> Result<bool> {
        let state = self.store.sync_state()?;
        Ok(state.is_due(now, self.config.sync_interval()))
    }

    /// Run a sync only when the cache is stale.
    pub async fn sync_if_due(&self, now: DateTime<Utc>) -> Result<SyncReport> {
        if !self.is_due(now)? {
            let state = self.store.sync_state()?;
            info!(
                "[Sync] Not due - last sync {:?} ({} records cached)",
                state.last_sync, state.total_records
            );
            return Ok(self.report(SyncOutcome::NotDue, 0, 0, &state));
        }
        self.run(now, false).await
    }

    /// Explicit manual sync, ignoring the staleness check.
    pub async fn sync(&self, now: DateTime<Utc>) -> Result<SyncReport> {
        self.run(now, false).await
    }

    /// Refetch the full remote history, ignoring the incremental window.
    /// Idempotent upsert keeps this loss- and duplicate-free.
    pub async fn force_full_sync(&self, now: DateTime<Utc>) -> Result<SyncReport> {
        self.run(now, true).await
    }

    /// Incremental window: everything on or after the last sync minus the
    /// safety overlap, truncated to a calendar date for the remote filter.
    /// First-ever syncs fetch the full history.
    fn window(&self, state: &SyncState) -> Option<NaiveDate> {
        state
            .last_sync
            .map(|last| (last - self.config.sync_overlap()).date_naive())
    }

    async fn run(&self, now: DateTime<Utc>, full: bool) -> Result<SyncReport> {
        // Single-flight: only the trigger that wins this exchange syncs
        if self
            .in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            let state = self.store.sync_state()?;
            info!("[Sync] Already running, trigger ignored");
            return Ok(self.report(SyncOutcome::AlreadyRunning, 0, 0, &state));
        }

        self.set_phase(SyncPhase::Syncing);
        let result = self.perform(now, full).await;
        match &result {
            Ok(_) => self.set_phase(SyncPhase::Idle),
            Err(e) => {
                warn!("[Sync] Failed: {}", e);
                self.set_phase(SyncPhase::Error);
            }
        }
        self.in_progress.store(false, Ordering::SeqCst);
        result
    }

    async fn perform(&self, now: DateTime<Utc>, full: bool) -> Result<SyncReport> {
        let state = self.store.sync_state()?;
        let since = if full { None } else { self.window(&state) };
        info!(
            "[Sync] Starting ({}) - window since {:?}",
            if full { "full" } else { "incremental" },
            since
        );

        // No store lock is held while the fetch is in flight
        let records = self.source.fetch_records_since(since).await?;
        let inserted = self.store.upsert(&records)?;
        let total = self.store.count()?;
        self.store.update_sync_state(now, total)?;

        info!(
            "[Sync] Complete: {} fetched, {} new, {} total",
            records.len(),
            inserted,
            total
        );

        Ok(SyncReport {
            outcome: SyncOutcome::Synced,
            fetched: records.len() as u64,
            inserted: inserted as u64,
            total_records: total,
            last_sync: Some(now),
        })
    }

    fn set_phase(&self, phase: SyncPhase) {
        *self.phase.lock().expect("phase lock poisoned") = phase;
    }

    fn report(&self, outcome: SyncOutcome, fetched: u64, inserted: u64, state: &SyncState) -> SyncReport {
        SyncReport {
            outcome,
            fetched,
            inserted,
            total_records: state.total_records,
            last_sync: state.last_sync,
        }
    }
}
