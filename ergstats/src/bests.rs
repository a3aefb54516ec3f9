//! Personal-best detection over canonical benchmark distances.
//!
//! Logged distances rarely hit a benchmark exactly (a "2K" may be stored as
//! 2000m or 2012m depending on how the session ended), so buckets match by a
//! relative tolerance band around the target rather than exact equality.

use chrono::NaiveDateTime;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::format::{format_duration, format_pace};
use crate::record::WorkoutRecord;

/// Canonical benchmark distances in meters (500m through half marathon).
pub const BENCHMARK_DISTANCES: &[f64] = &[
    500.0, 1000.0, 2000.0, 5000.0, 6000.0, 10000.0, 21097.0,
];

/// Relative tolerance around a benchmark distance (±1% of target).
pub const DISTANCE_TOLERANCE: f64 = 0.01;

/// Best effort within one benchmark bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalBest {
    /// Benchmark distance in meters
    pub distance_m: u32,
    /// Identity of the record holding the best
    pub record_id: i64,
    /// When the best was set
    pub date: NaiveDateTime,
    /// Elapsed time in seconds
    pub duration_s: f64,
    /// Pace in seconds per 500m
    pub pace_500m: Option<f64>,
    /// Time formatted for display (H:MM:SS.t)
    pub time_display: String,
    /// Pace formatted for display (M:SS.t), "N/A" when undefined
    pub pace_display: String,
}

/// Personal-bests table, ordered by ascending benchmark distance.
/// Buckets with no matching workout are omitted rather than reported empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalBests {
    pub entries: Vec<PersonalBest>,
}

impl PersonalBests {
    /// Look up the best for a benchmark distance, if any workout matched it.
    pub fn best_at(&self, distance_m: u32) -> Option<&PersonalBest> {
        self.entries.iter().find(|e| e.distance_m == distance_m)
    }
}

/// Find the fastest workout within each benchmark bucket.
///
/// A workout matches a bucket when its distance is within the tolerance band
/// of the target; the minimum duration wins. A strictly worse later effort
/// never displaces an existing best.
pub fn personal_bests(records: &[WorkoutRecord]) -> PersonalBests {
    let mut entries = Vec::new();

    for &target in BENCHMARK_DISTANCES {
        let band = target * DISTANCE_TOLERANCE;
        let best = records
            .iter()
            .filter(|r| (r.distance_m - target).abs() <= band && r.duration_s > 0.0)
            .min_by(|a, b| {
                a.duration_s
                    .partial_cmp(&b.duration_s)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

        if let Some(r) = best {
            entries.push(PersonalBest {
                distance_m: target as u32,
                record_id: r.id,
                date: r.date,
                duration_s: r.duration_s,
                pace_500m: r.pace_500m,
                time_display: format_duration(r.duration_s),
                pace_display: r
                    .pace_500m
                    .map(format_pace)
                    .unwrap_or_else(|| "N/A".to_string()),
            });
        }
    }

    debug!(
        "[Bests] {} of {} benchmark buckets populated from {} records",
        entries.len(),
        BENCHMARK_DISTANCES.len(),
        records.len()
    );

    PersonalBests { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn workout(id: i64, day: u32, distance_m: f64, duration_s: f64) -> WorkoutRecord {
        let date = NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        WorkoutRecord::new(id, date, distance_m, duration_s, "rower")
    }

    #[test]
    fn test_empty_records_empty_table() {
        let bests = personal_bests(&[]);
        assert!(bests.entries.is_empty());
    }

    #[test]
    fn test_single_2k_workout() {
        let records = vec![workout(7, 1, 2000.0, 480.0)];
        let bests = personal_bests(&records);
        let best = bests.best_at(2000).expect("2K bucket populated");
        assert_eq!(best.record_id, 7);
        assert_eq!(best.duration_s, 480.0);
        assert_eq!(best.pace_500m, Some(120.0));
        assert_eq!(best.time_display, "8:00.0");
        // No other buckets appear
        assert_eq!(bests.entries.len(), 1);
    }

    #[test]
    fn test_tolerance_band_matches_inexact_distance() {
        // 2012m finishes inside the ±1% band around 2000m
        let records = vec![workout(1, 1, 2012.0, 470.0)];
        let bests = personal_bests(&records);
        assert!(bests.best_at(2000).is_some());
        // 2100m does not
        let records = vec![workout(2, 1, 2100.0, 470.0)];
        let bests = personal_bests(&records);
        assert!(bests.best_at(2000).is_none());
    }

    #[test]
    fn test_better_time_replaces_worse_never_displaces() {
        let mut records = vec![workout(1, 1, 5000.0, 1250.0)];
        let bests = personal_bests(&records);
        assert_eq!(bests.best_at(5000).unwrap().record_id, 1);

        // A faster 5K takes the bucket
        records.push(workout(2, 2, 5000.0, 1200.0));
        let bests = personal_bests(&records);
        assert_eq!(bests.best_at(5000).unwrap().record_id, 2);

        // A slower 5K changes nothing
        records.push(workout(3, 3, 5000.0, 1300.0));
        let bests = personal_bests(&records);
        assert_eq!(bests.best_at(5000).unwrap().record_id, 2);
    }

    #[test]
    fn test_zero_duration_workouts_ignored() {
        let records = vec![workout(1, 1, 2000.0, 0.0)];
        let bests = personal_bests(&records);
        assert!(bests.entries.is_empty());
    }
}
