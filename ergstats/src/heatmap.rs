//! Calendar heatmap aggregation: distance per day, densified over a range.
//!
//! The dashboard renders a GitHub-style calendar, so the output must have an
//! entry for every day in the display range - rest days carry an explicit
//! zero rather than being absent.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::record::WorkoutRecord;

/// Total distance for one calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    pub date: NaiveDate,
    pub distance_m: f64,
}

/// One ISO week row of the calendar matrix, Monday through Sunday.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapWeek {
    /// ISO week label, e.g. "2024-W09"
    pub week: String,
    /// Distance per weekday, index 0 = Monday
    pub days: [f64; 7],
}

/// Dense daily volumes plus the week-by-weekday matrix built from them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapData {
    pub days: Vec<HeatmapCell>,
    pub weeks: Vec<HeatmapWeek>,
}

impl HeatmapData {
    fn empty() -> Self {
        Self {
            days: Vec::new(),
            weeks: Vec::new(),
        }
    }
}

/// Sum distance per calendar date over the display range.
///
/// The range defaults to the span of the record set; a requested range of N
/// days always yields exactly N day entries. With no records and no range
/// there is nothing to display and the result is empty.
pub fn daily_heatmap(
    records: &[WorkoutRecord],
    range: Option<(NaiveDate, NaiveDate)>,
) -> HeatmapData {
    let mut per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for r in records {
        *per_day.entry(r.day()).or_insert(0.0) += r.distance_m;
    }

    let (start, end) = match range {
        Some((from, to)) => (from, to),
        None => match (per_day.keys().next(), per_day.keys().next_back()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return HeatmapData::empty(),
        },
    };
    if start > end {
        return HeatmapData::empty();
    }

    let mut days = Vec::new();
    let mut day = start;
    loop {
        days.push(HeatmapCell {
            date: day,
            distance_m: per_day.get(&day).copied().unwrap_or(0.0),
        });
        if day == end {
            break;
        }
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    let weeks = build_week_matrix(&days);
    HeatmapData { days, weeks }
}

fn build_week_matrix(days: &[HeatmapCell]) -> Vec<HeatmapWeek> {
    let mut weeks: Vec<HeatmapWeek> = Vec::new();
    for cell in days {
        let iso = cell.date.iso_week();
        let label = format!("{}-W{:02}", iso.year(), iso.week());
        if weeks.last().map(|w| w.week.as_str()) != Some(label.as_str()) {
            weeks.push(HeatmapWeek {
                week: label,
                days: [0.0; 7],
            });
        }
        let weekday = cell.date.weekday().num_days_from_monday() as usize;
        if let Some(week) = weeks.last_mut() {
            week.days[weekday] += cell.distance_m;
        }
    }
    weeks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workout(id: i64, date: NaiveDate, distance_m: f64) -> WorkoutRecord {
        WorkoutRecord::new(
            id,
            date.and_hms_opt(6, 0, 0).unwrap(),
            distance_m,
            distance_m / 4.0,
            "rower",
        )
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_empty_records_without_range() {
        let data = daily_heatmap(&[], None);
        assert!(data.days.is_empty());
        assert!(data.weeks.is_empty());
    }

    #[test]
    fn test_requested_range_is_dense() {
        // 10-day range, workouts on two of the days
        let records = vec![
            workout(1, day(2024, 3, 2), 5000.0),
            workout(2, day(2024, 3, 8), 8000.0),
        ];
        let data = daily_heatmap(&records, Some((day(2024, 3, 1), day(2024, 3, 10))));
        assert_eq!(data.days.len(), 10);
        assert_eq!(data.days[0].distance_m, 0.0);
        assert_eq!(data.days[1].distance_m, 5000.0);
        assert_eq!(data.days[7].distance_m, 8000.0);
        assert_eq!(data.days[9].distance_m, 0.0);
    }

    #[test]
    fn test_empty_records_with_range_all_zero() {
        let data = daily_heatmap(&[], Some((day(2024, 3, 1), day(2024, 3, 7))));
        assert_eq!(data.days.len(), 7);
        assert!(data.days.iter().all(|c| c.distance_m == 0.0));
    }

    #[test]
    fn test_same_day_workouts_sum() {
        let records = vec![
            workout(1, day(2024, 3, 2), 5000.0),
            workout(2, day(2024, 3, 2), 2000.0),
        ];
        let data = daily_heatmap(&records, None);
        assert_eq!(data.days.len(), 1);
        assert_eq!(data.days[0].distance_m, 7000.0);
    }

    #[test]
    fn test_week_matrix_places_weekdays() {
        // 2024-03-04 is a Monday
        let records = vec![
            workout(1, day(2024, 3, 4), 3000.0),
            workout(2, day(2024, 3, 6), 4000.0),
        ];
        let data = daily_heatmap(&records, Some((day(2024, 3, 4), day(2024, 3, 10))));
        assert_eq!(data.weeks.len(), 1);
        let week = &data.weeks[0];
        assert_eq!(week.week, "2024-W10");
        assert_eq!(week.days[0], 3000.0); // Monday
        assert_eq!(week.days[2], 4000.0); // Wednesday
        assert_eq!(week.days[6], 0.0); // Sunday
    }

    #[test]
    fn test_range_spanning_weeks() {
        let records = vec![workout(1, day(2024, 1, 1), 2000.0)];
        let data = daily_heatmap(&records, Some((day(2024, 1, 1), day(2024, 1, 14))));
        assert_eq!(data.days.len(), 14);
        assert_eq!(data.weeks.len(), 2);
    }
}
