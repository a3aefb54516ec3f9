//! Pace trend modeling: linear and polynomial regression plus rolling average.
//!
//! Fits are ordinary least squares over pace vs. a day index counted from the
//! first workout. Fewer than two pace-bearing points is not an error: the
//! result is flagged insufficient with R² pinned to 0.

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::record::WorkoutRecord;

/// Trailing rolling-average window, in workouts.
pub const ROLLING_WINDOW: usize = 10;

/// Minimum workouts in the window before a rolling value is emitted.
pub const ROLLING_MIN_POINTS: usize = 3;

/// Degree of the polynomial trend model.
pub const POLY_DEGREE: usize = 3;

/// A fitted regression model: coefficients in ascending-power order
/// (c0 + c1·x + c2·x² + …) and the coefficient of determination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionModel {
    pub coefficients: Vec<f64>,
    /// R² in [0, 1]; 0 when the fit is degenerate or undefined
    pub r_squared: f64,
}

impl RegressionModel {
    fn degenerate() -> Self {
        Self {
            coefficients: Vec::new(),
            r_squared: 0.0,
        }
    }

    /// Evaluate the model at x.
    pub fn predict(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * x + c)
    }
}

/// One observation with its fitted values, in date order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: NaiveDate,
    /// Days since the first workout in the set
    pub day_index: f64,
    pub pace_500m: f64,
    pub linear_fit: f64,
    pub poly_fit: f64,
    /// Trailing rolling average, None until the window holds enough points
    pub rolling_avg: Option<f64>,
}

/// Full trend analysis over a record set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendAnalysis {
    /// True when fewer than 2 pace-bearing workouts were available
    pub insufficient_data: bool,
    pub points: Vec<TrendPoint>,
    pub linear: RegressionModel,
    pub polynomial: RegressionModel,
    /// Linear slope in pace-seconds per day
    pub slope_per_day: f64,
    /// Linear slope extrapolated to a 30-day month
    pub pace_change_per_month: f64,
    /// True when pace is trending down (faster) over time
    pub improving: bool,
}

impl TrendAnalysis {
    fn insufficient() -> Self {
        Self {
            insufficient_data: true,
            points: Vec::new(),
            linear: RegressionModel::degenerate(),
            polynomial: RegressionModel::degenerate(),
            slope_per_day: 0.0,
            pace_change_per_month: 0.0,
            improving: false,
        }
    }
}

/// Fit pace-over-time trend models for a record set.
pub fn pace_trend(records: &[WorkoutRecord]) -> TrendAnalysis {
    let mut observations: Vec<(NaiveDate, f64)> = records
        .iter()
        .filter_map(|r| r.pace_500m.map(|p| (r.day(), p)))
        .collect();
    observations.sort_by_key(|&(d, _)| d);

    if observations.len() < 2 {
        return TrendAnalysis::insufficient();
    }

    let first_day = observations[0].0;
    let x: Vec<f64> = observations
        .iter()
        .map(|&(d, _)| (d - first_day).num_days() as f64)
        .collect();
    let y: Vec<f64> = observations.iter().map(|&(_, p)| p).collect();

    let linear = fit_polynomial(&x, &y, 1);
    // Degree capped below the point count so the normal equations stay solvable
    let poly_degree = POLY_DEGREE.min(observations.len() - 1);
    let polynomial = fit_polynomial(&x, &y, poly_degree);

    let rolling = rolling_average(&y, ROLLING_WINDOW, ROLLING_MIN_POINTS);

    let points = observations
        .iter()
        .enumerate()
        .map(|(i, &(date, pace))| TrendPoint {
            date,
            day_index: x[i],
            pace_500m: pace,
            linear_fit: linear.predict(x[i]),
            poly_fit: polynomial.predict(x[i]),
            rolling_avg: rolling[i],
        })
        .collect();

    let slope_per_day = linear.coefficients.get(1).copied().unwrap_or(0.0);

    debug!(
        "[Trend] {} points, slope {:.4} s/day, linear R²={:.3}, poly R²={:.3}",
        observations.len(),
        slope_per_day,
        linear.r_squared,
        polynomial.r_squared
    );

    TrendAnalysis {
        insufficient_data: false,
        points,
        linear,
        polynomial,
        slope_per_day,
        pace_change_per_month: slope_per_day * 30.0,
        improving: slope_per_day < 0.0,
    }
}

/// Least-squares polynomial fit via the normal equations.
///
/// Falls back to a constant-mean model when the system is singular (e.g. all
/// observations on the same day), so the caller always gets a usable model.
fn fit_polynomial(x: &[f64], y: &[f64], degree: usize) -> RegressionModel {
    let coefficients = match solve_normal_equations(x, y, degree) {
        Some(c) => c,
        None => {
            let mean = y.iter().sum::<f64>() / y.len() as f64;
            vec![mean]
        }
    };

    let model = RegressionModel {
        r_squared: 0.0,
        coefficients,
    };
    let r2 = r_squared(x, y, &model);
    RegressionModel {
        r_squared: r2,
        ..model
    }
}

fn solve_normal_equations(x: &[f64], y: &[f64], degree: usize) -> Option<Vec<f64>> {
    let m = degree + 1;

    // Accumulate sums of x powers and x-power-weighted y
    let mut power_sums = vec![0.0f64; 2 * degree + 1];
    let mut rhs = vec![0.0f64; m];
    for (&xi, &yi) in x.iter().zip(y) {
        let mut p = 1.0;
        for (k, sum) in power_sums.iter_mut().enumerate() {
            *sum += p;
            if k < m {
                rhs[k] += yi * p;
            }
            p *= xi;
        }
    }

    let mut a: Vec<Vec<f64>> = (0..m)
        .map(|i| (0..m).map(|j| power_sums[i + j]).collect())
        .collect();
    let mut b = rhs;

    // Gaussian elimination with partial pivoting
    for col in 0..m {
        let pivot = (col..m)
            .max_by(|&i, &j| {
                a[i][col]
                    .abs()
                    .partial_cmp(&a[j][col].abs())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(col);
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..m {
            let factor = a[row][col] / a[col][col];
            for k in col..m {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    // Back substitution
    let mut coeffs = vec![0.0f64; m];
    for row in (0..m).rev() {
        let mut acc = b[row];
        for k in (row + 1)..m {
            acc -= a[row][k] * coeffs[k];
        }
        coeffs[row] = acc / a[row][row];
    }
    Some(coeffs)
}

/// Coefficient of determination, clamped to [0, 1].
/// Defined as 0 when the observations have no variance.
fn r_squared(x: &[f64], y: &[f64], model: &RegressionModel) -> f64 {
    let mean_y = y.iter().sum::<f64>() / y.len() as f64;
    let ss_tot: f64 = y.iter().map(|&v| (v - mean_y).powi(2)).sum();
    if ss_tot <= 0.0 {
        return 0.0;
    }
    let ss_res: f64 = x
        .iter()
        .zip(y)
        .map(|(&xi, &yi)| (yi - model.predict(xi)).powi(2))
        .sum();
    (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
}

/// Trailing rolling average: each position averages up to `window` values
/// ending there, emitting None until `min_points` values are available.
fn rolling_average(values: &[f64], window: usize, min_points: usize) -> Vec<Option<f64>> {
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            if slice.len() >= min_points {
                Some(slice.iter().sum::<f64>() / slice.len() as f64)
            } else {
                None
            }
        })
        .collect()
}
