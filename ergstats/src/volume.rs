//! Training volume aggregated per ISO week and per calendar month.

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::record::WorkoutRecord;

/// Volume totals for one period (an ISO week or a calendar month).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeBucket {
    /// Period label: "2024-W09" for weeks, "2024-03" for months
    pub period: String,
    pub total_distance_km: f64,
    pub total_time_hours: f64,
    pub workouts: u32,
    pub avg_pace_500m: Option<f64>,
}

/// Aggregate volume per ISO week, in chronological order.
pub fn weekly_volume(records: &[WorkoutRecord]) -> Vec<VolumeBucket> {
    aggregate(records, |r| {
        let iso = r.day().iso_week();
        format!("{}-W{:02}", iso.year(), iso.week())
    })
}

/// Aggregate volume per calendar month, in chronological order.
pub fn monthly_volume(records: &[WorkoutRecord]) -> Vec<VolumeBucket> {
    aggregate(records, |r| {
        format!("{}-{:02}", r.day().year(), r.day().month())
    })
}

fn aggregate(
    records: &[WorkoutRecord],
    period_of: impl Fn(&WorkoutRecord) -> String,
) -> Vec<VolumeBucket> {
    #[derive(Default)]
    struct Accum {
        distance_m: f64,
        time_s: f64,
        workouts: u32,
        pace_sum: f64,
        pace_count: u32,
    }

    let mut buckets: BTreeMap<String, Accum> = BTreeMap::new();
    for r in records {
        let acc = buckets.entry(period_of(r)).or_default();
        acc.distance_m += r.distance_m;
        acc.time_s += r.duration_s;
        acc.workouts += 1;
        if let Some(p) = r.pace_500m {
            acc.pace_sum += p;
            acc.pace_count += 1;
        }
    }

    // Zero-padded labels sort lexicographically in date order
    buckets
        .into_iter()
        .map(|(period, acc)| VolumeBucket {
            period,
            total_distance_km: acc.distance_m / 1000.0,
            total_time_hours: acc.time_s / 3600.0,
            workouts: acc.workouts,
            avg_pace_500m: if acc.pace_count > 0 {
                Some(acc.pace_sum / acc.pace_count as f64)
            } else {
                None
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn workout(id: i64, y: i32, m: u32, d: u32, distance_m: f64) -> WorkoutRecord {
        let date = NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        WorkoutRecord::new(id, date, distance_m, distance_m / 4.0, "rower")
    }

    #[test]
    fn test_empty_records() {
        assert!(weekly_volume(&[]).is_empty());
        assert!(monthly_volume(&[]).is_empty());
    }

    #[test]
    fn test_monthly_buckets() {
        let records = vec![
            workout(1, 2024, 2, 28, 5000.0),
            workout(2, 2024, 3, 1, 6000.0),
            workout(3, 2024, 3, 15, 4000.0),
        ];
        let monthly = monthly_volume(&records);
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].period, "2024-02");
        assert_eq!(monthly[1].period, "2024-03");
        assert!((monthly[1].total_distance_km - 10.0).abs() < 1e-9);
        assert_eq!(monthly[1].workouts, 2);
    }

    #[test]
    fn test_weekly_buckets_in_order() {
        // 2024-01-07 is a Sunday (W01), 2024-01-08 a Monday (W02)
        let records = vec![
            workout(1, 2024, 1, 8, 5000.0),
            workout(2, 2024, 1, 7, 3000.0),
        ];
        let weekly = weekly_volume(&records);
        assert_eq!(weekly.len(), 2);
        assert_eq!(weekly[0].period, "2024-W01");
        assert_eq!(weekly[1].period, "2024-W02");
    }
}
