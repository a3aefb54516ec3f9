//! Wire models for the logbook API and sync-state types.
//!
//! The wire structs mirror the remote JSON exactly and are converted into
//! [`WorkoutRecord`]s at the client boundary; nothing downstream of the
//! remote client sees raw API shapes.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use ergstats::WorkoutRecord;
use log::warn;
use serde::{Deserialize, Serialize};

// ============================================================================
// Remote wire models
// ============================================================================

/// One page of workout results from the remote API.
#[derive(Debug, Deserialize)]
pub struct ResultsPage {
    pub data: Vec<ApiResult>,
    pub meta: Option<PageMeta>,
}

#[derive(Debug, Deserialize)]
pub struct PageMeta {
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub total: u32,
    pub current_page: u32,
    pub total_pages: u32,
}

/// A workout result as the remote API serializes it.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResult {
    pub id: i64,
    /// "YYYY-MM-DD HH:MM:SS" or "YYYY-MM-DD", local convention
    pub date: String,
    /// Distance in meters
    pub distance: f64,
    /// Elapsed time in tenths of a second
    pub time: f64,
    /// Machine category ("rower", "skierg", ...)
    #[serde(rename = "type")]
    pub machine: Option<String>,
    pub stroke_rate: Option<f64>,
    pub calories_total: Option<u32>,
}

impl ApiResult {
    /// Convert a wire result into a local record, or None (with a warning)
    /// when the remote date is unparseable.
    pub fn into_record(self) -> Option<WorkoutRecord> {
        let date = parse_remote_date(&self.date)?;
        let duration_s = (self.time / 10.0).max(0.0);
        let mut record = WorkoutRecord::new(
            self.id,
            date,
            self.distance,
            duration_s,
            self.machine.unwrap_or_else(|| "rower".to_string()),
        );
        record.stroke_rate = self.stroke_rate;
        record.calories = self.calories_total;
        Some(record)
    }
}

fn parse_remote_date(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    if let Ok(d) = chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    warn!("[Types] Dropping result with unparseable date: {:?}", raw);
    None
}

// ============================================================================
// Sync state
// ============================================================================

/// Cache freshness: when the last successful sync finished and how many
/// records the store held afterwards. Persisted as a single row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    /// UTC timestamp of the last successful sync, None if never synced
    pub last_sync: Option<DateTime<Utc>>,
    /// Record count at the end of that sync
    pub total_records: u64,
}

impl SyncState {
    pub fn never_synced() -> Self {
        Self {
            last_sync: None,
            total_records: 0,
        }
    }

    /// A sync is due when it never ran or when the last one is older than
    /// the configured interval.
    pub fn is_due(&self, now: DateTime<Utc>, interval: Duration) -> bool {
        match self.last_sync {
            None => true,
            Some(last) => now - last > interval,
        }
    }
}

/// How a sync trigger resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncOutcome {
    /// Records were fetched and merged
    Synced,
    /// The cache was fresh enough; nothing fetched
    NotDue,
    /// Another sync held the in-progress flag; this trigger was a no-op
    AlreadyRunning,
}

/// Result of one sync trigger, for the staleness indicator in the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    /// Records fetched from the remote (including already-cached ones)
    pub fetched: u64,
    /// Records newly inserted into the store
    pub inserted: u64,
    /// Store total after the sync
    pub total_records: u64,
    pub last_sync: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn api_result(id: i64, date: &str) -> ApiResult {
        ApiResult {
            id,
            date: date.to_string(),
            distance: 2000.0,
            time: 4800.0,
            machine: Some("rower".to_string()),
            stroke_rate: Some(26.0),
            calories_total: Some(160),
        }
    }

    #[test]
    fn test_into_record_converts_tenths() {
        let record = api_result(1, "2024-03-01 06:30:00").into_record().unwrap();
        assert_eq!(record.duration_s, 480.0);
        assert_eq!(record.pace_500m, Some(120.0));
        assert_eq!(record.stroke_rate, Some(26.0));
        assert_eq!(record.calories, Some(160));
    }

    #[test]
    fn test_into_record_accepts_date_only() {
        let record = api_result(2, "2024-03-01").into_record().unwrap();
        assert_eq!(record.date.date(), chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_into_record_drops_garbage_dates() {
        assert!(api_result(3, "not-a-date").into_record().is_none());
    }

    #[test]
    fn test_sync_due_when_never_synced() {
        let state = SyncState::never_synced();
        assert!(state.is_due(Utc::now(), Duration::hours(24)));
    }

    #[test]
    fn test_sync_due_after_interval() {
        let last = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let state = SyncState {
            last_sync: Some(last),
            total_records: 50,
        };
        // 23 hours later: fresh
        assert!(!state.is_due(last + Duration::hours(23), Duration::hours(24)));
        // 25 hours later: due
        assert!(state.is_due(last + Duration::hours(25), Duration::hours(24)));
    }
}
