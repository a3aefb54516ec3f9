//! # Ergstats
//!
//! Analytics engine for rowing workout data: pure, deterministic functions
//! over a set of [`WorkoutRecord`]s that derive everything the dashboard
//! displays.
//!
//! ## Analyses
//!
//! - **Summary statistics**: totals, means, staleness flag ([`summary`])
//! - **Personal bests**: fastest effort per benchmark distance ([`bests`])
//! - **Trend models**: linear/polynomial pace regression and rolling
//!   average ([`trend`])
//! - **Training clusters**: K-Means classification with stable semantic
//!   labels ([`cluster`])
//! - **Calendar heatmap**: gap-free daily volume ([`heatmap`])
//! - **Volume aggregates**: weekly and monthly totals ([`volume`])
//! - **Pace color scale**: monotonic pace normalization ([`colorscale`])
//!
//! Every entry point degrades gracefully on empty or tiny input - an
//! insufficient record set produces a flagged, well-formed result, never an
//! error. Nothing here performs I/O or mutates its input.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use ergstats::{compute_summary, personal_bests, WorkoutRecord};
//!
//! let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(6, 0, 0).unwrap();
//! let records = vec![WorkoutRecord::new(1, date, 2000.0, 480.0, "rower")];
//!
//! let now = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap().and_hms_opt(6, 0, 0).unwrap();
//! let summary = compute_summary(&records, now);
//! assert_eq!(summary.total_workouts, 1);
//!
//! let bests = personal_bests(&records);
//! assert!(bests.best_at(2000).is_some());
//! ```

pub mod bests;
pub mod cluster;
pub mod colorscale;
pub mod format;
pub mod heatmap;
pub mod record;
pub mod summary;
pub mod trend;
pub mod volume;

pub use bests::{personal_bests, PersonalBest, PersonalBests, BENCHMARK_DISTANCES};
pub use cluster::{
    cluster_workouts, ClusterAnalysis, ClusterAssignment, ClusterProfile, ElbowPoint,
    CLUSTER_COUNT,
};
pub use colorscale::{pace_color_scale, PaceColorScale, FALLBACK_RANGE};
pub use format::{format_duration, format_pace};
pub use heatmap::{daily_heatmap, HeatmapCell, HeatmapData, HeatmapWeek};
pub use record::WorkoutRecord;
pub use summary::{compute_summary, SummaryStats, STALE_AFTER_DAYS};
pub use trend::{pace_trend, RegressionModel, TrendAnalysis, TrendPoint, ROLLING_WINDOW};
pub use volume::{monthly_volume, weekly_volume, VolumeBucket};
