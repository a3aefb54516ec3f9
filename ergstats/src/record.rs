//! Core workout record type shared by the analytics and sync layers.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One completed rowing session as cached locally.
///
/// Records are remote-authoritative: the identity is assigned by the logbook
/// service and a stored record is never mutated after insertion. Distance and
/// duration are never negative; pace is undefined when either is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    /// Remote-assigned unique identifier
    pub id: i64,
    /// Date/time of the workout (timezone-naive local convention)
    pub date: NaiveDateTime,
    /// Total distance in meters
    pub distance_m: f64,
    /// Total duration in seconds
    pub duration_s: f64,
    /// Average pace in seconds per 500m, None when duration or distance is zero
    pub pace_500m: Option<f64>,
    /// Average stroke rate in strokes per minute
    pub stroke_rate: Option<f64>,
    /// Total calories
    pub calories: Option<u32>,
    /// Workout category tag from the remote service (e.g. "rower")
    pub workout_type: String,
}

impl WorkoutRecord {
    /// Build a record with clamped non-negative distance/duration and a pace
    /// derived from them when the remote omits one.
    pub fn new(
        id: i64,
        date: NaiveDateTime,
        distance_m: f64,
        duration_s: f64,
        workout_type: impl Into<String>,
    ) -> Self {
        let distance_m = distance_m.max(0.0);
        let duration_s = duration_s.max(0.0);
        Self {
            id,
            date,
            distance_m,
            duration_s,
            pace_500m: Self::derive_pace(distance_m, duration_s),
            stroke_rate: None,
            calories: None,
            workout_type: workout_type.into(),
        }
    }

    /// Average pace in seconds per 500m, or None when it is undefined.
    pub fn derive_pace(distance_m: f64, duration_s: f64) -> Option<f64> {
        if distance_m > 0.0 && duration_s > 0.0 {
            Some(duration_s / distance_m * 500.0)
        } else {
            None
        }
    }

    /// Calendar date of the workout.
    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(7, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_pace_derivation() {
        // 2000m in 480s is a 2:00/500m split
        let r = WorkoutRecord::new(1, date(2024, 3, 1), 2000.0, 480.0, "rower");
        assert_eq!(r.pace_500m, Some(120.0));
    }

    #[test]
    fn test_pace_undefined_for_zero_duration() {
        let r = WorkoutRecord::new(2, date(2024, 3, 1), 2000.0, 0.0, "rower");
        assert_eq!(r.pace_500m, None);
    }

    #[test]
    fn test_negative_inputs_clamped() {
        let r = WorkoutRecord::new(3, date(2024, 3, 1), -100.0, -5.0, "rower");
        assert_eq!(r.distance_m, 0.0);
        assert_eq!(r.duration_s, 0.0);
        assert_eq!(r.pace_500m, None);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let r = WorkoutRecord::new(4, date(2024, 3, 1), 5000.0, 1200.0, "rower");
        let json = serde_json::to_string(&r).unwrap();
        let parsed: WorkoutRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, r);
    }
}
