//! Pace-to-color normalization for the dashboard's gradient markers.
//!
//! Maps pace onto [0, 1] monotonically: the fastest observed pace lands at 0
//! (the "fast" end of the color ramp) and the slowest at 1. With fewer than
//! two distinct paces the bounds fall back to a fixed range so normalization
//! never divides by zero.

use serde::{Deserialize, Serialize};

use crate::record::WorkoutRecord;

/// Fallback normalization bounds in seconds per 500m (2:00 to 3:00 splits).
pub const FALLBACK_RANGE: (f64, f64) = (120.0, 180.0);

/// Normalization bounds for mapping pace to a color ramp position.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaceColorScale {
    /// Fastest pace mapped to 0
    pub min_pace: f64,
    /// Slowest pace mapped to 1
    pub max_pace: f64,
    /// True when the fixed fallback bounds were used
    pub fallback: bool,
}

impl PaceColorScale {
    /// Position of a pace on the ramp, clamped to [0, 1].
    /// Lower (faster) pace maps toward 0.
    pub fn normalize(&self, pace_500m: f64) -> f64 {
        ((pace_500m - self.min_pace) / (self.max_pace - self.min_pace)).clamp(0.0, 1.0)
    }
}

/// Derive normalization bounds from the paces observed in a record set.
pub fn pace_color_scale(records: &[WorkoutRecord]) -> PaceColorScale {
    let mut min_pace = f64::INFINITY;
    let mut max_pace = f64::NEG_INFINITY;
    for pace in records.iter().filter_map(|r| r.pace_500m) {
        min_pace = min_pace.min(pace);
        max_pace = max_pace.max(pace);
    }

    if min_pace < max_pace {
        PaceColorScale {
            min_pace,
            max_pace,
            fallback: false,
        }
    } else {
        PaceColorScale {
            min_pace: FALLBACK_RANGE.0,
            max_pace: FALLBACK_RANGE.1,
            fallback: true,
        }
    }
}
