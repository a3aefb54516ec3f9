//! Sync engine configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Tunables for the remote client and sync policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Logbook API base URL
    pub base_url: String,
    /// API version tag used in the Accept header
    pub api_version: String,
    /// Workout category to fetch (the dashboard only tracks the rower)
    pub workout_type: String,
    /// Results per page, capped at 250 by the remote API
    pub page_size: u32,
    /// Retry attempts per page request before surfacing a remote failure
    pub max_retries: u32,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Hours between automatic syncs
    pub sync_interval_hours: i64,
    /// Hours of overlap behind the last sync when choosing the incremental
    /// fetch window, to tolerate clock skew and late-arriving records
    pub sync_overlap_hours: i64,
}

impl SyncConfig {
    /// Staleness threshold as a duration.
    pub fn sync_interval(&self) -> Duration {
        Duration::hours(self.sync_interval_hours)
    }

    /// Incremental-window safety overlap as a duration.
    pub fn sync_overlap(&self) -> Duration {
        Duration::hours(self.sync_overlap_hours)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: "https://log.concept2.com/api".to_string(),
            api_version: "v1".to_string(),
            workout_type: "rower".to_string(),
            page_size: 250,
            max_retries: 3,
            request_timeout_secs: 30,
            sync_interval_hours: 24,
            sync_overlap_hours: 6,
        }
    }
}
