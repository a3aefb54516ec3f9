//! High-level summary statistics over a set of workouts.
//!
//! Empty input is not an error: the summary degrades to a zeroed result so
//! the dashboard can always render.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::record::WorkoutRecord;

/// Days without a workout before the summary raises the staleness warning.
pub const STALE_AFTER_DAYS: i64 = 3;

/// Aggregate statistics for a record set, as shown on the dashboard header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    /// Number of workouts analyzed
    pub total_workouts: u32,
    /// Total distance in kilometers
    pub total_distance_km: f64,
    /// Total time in hours
    pub total_time_hours: f64,
    /// Total calories across workouts that reported them
    pub total_calories: u64,
    /// Mean distance in meters
    pub avg_distance_m: f64,
    /// Mean duration in seconds
    pub avg_duration_s: f64,
    /// Mean pace in seconds per 500m, over workouts with a defined pace
    pub avg_pace_500m: Option<f64>,
    /// Mean stroke rate, over workouts that reported one
    pub avg_stroke_rate: Option<f64>,
    /// Mean calories, over workouts that reported them
    pub avg_calories: Option<f64>,
    /// Date of the earliest workout
    pub first_workout: Option<NaiveDate>,
    /// Date of the most recent workout
    pub last_workout: Option<NaiveDate>,
    /// Whole days between the most recent workout and now
    pub days_since_last: Option<i64>,
    /// True when days_since_last exceeds the staleness threshold
    pub stale: bool,
    /// Workout count per category tag
    pub workout_type_breakdown: BTreeMap<String, u32>,
}

impl SummaryStats {
    fn empty() -> Self {
        Self {
            total_workouts: 0,
            total_distance_km: 0.0,
            total_time_hours: 0.0,
            total_calories: 0,
            avg_distance_m: 0.0,
            avg_duration_s: 0.0,
            avg_pace_500m: None,
            avg_stroke_rate: None,
            avg_calories: None,
            first_workout: None,
            last_workout: None,
            days_since_last: None,
            stale: false,
            workout_type_breakdown: BTreeMap::new(),
        }
    }
}

/// Compute summary statistics over a record set.
///
/// `now` is the reference time for the days-since-last-workout staleness
/// check; passing it in keeps the computation deterministic.
pub fn compute_summary(records: &[WorkoutRecord], now: NaiveDateTime) -> SummaryStats {
    if records.is_empty() {
        return SummaryStats::empty();
    }

    let n = records.len() as f64;
    let total_distance_m: f64 = records.iter().map(|r| r.distance_m).sum();
    let total_time_s: f64 = records.iter().map(|r| r.duration_s).sum();

    let paces: Vec<f64> = records.iter().filter_map(|r| r.pace_500m).collect();
    let stroke_rates: Vec<f64> = records.iter().filter_map(|r| r.stroke_rate).collect();
    let calories: Vec<u32> = records.iter().filter_map(|r| r.calories).collect();

    let mut breakdown: BTreeMap<String, u32> = BTreeMap::new();
    for r in records {
        *breakdown.entry(r.workout_type.clone()).or_insert(0) += 1;
    }

    let first = records.iter().map(WorkoutRecord::day).min();
    let last = records.iter().map(WorkoutRecord::day).max();
    let days_since_last = last.map(|d| (now.date() - d).num_days());
    let stale = days_since_last.is_some_and(|d| d > STALE_AFTER_DAYS);

    debug!(
        "[Summary] {} workouts, {:.1} km total, stale={}",
        records.len(),
        total_distance_m / 1000.0,
        stale
    );

    SummaryStats {
        total_workouts: records.len() as u32,
        total_distance_km: total_distance_m / 1000.0,
        total_time_hours: total_time_s / 3600.0,
        total_calories: calories.iter().map(|&c| c as u64).sum(),
        avg_distance_m: total_distance_m / n,
        avg_duration_s: total_time_s / n,
        avg_pace_500m: mean(&paces),
        avg_stroke_rate: mean(&stroke_rates),
        avg_calories: mean(&calories.iter().map(|&c| c as f64).collect::<Vec<_>>()),
        first_workout: first,
        last_workout: last,
        days_since_last,
        stale,
        workout_type_breakdown: breakdown,
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
