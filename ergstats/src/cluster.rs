//! K-Means training-type classification of workouts.
//!
//! Workouts cluster on standardized {distance, duration}. Raw K-Means
//! cluster indices are arbitrary, so a relabeling pass orders clusters by
//! ascending mean distance: rank 0 is always "Sprint" and the top rank is
//! always "Long Endurance", stable across runs and input orderings.
//!
//! Centroids are seeded from quantiles of the distance-sorted record set
//! rather than randomly, which makes the whole computation deterministic and
//! invariant under row permutation.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::record::WorkoutRecord;

/// Target number of training clusters.
pub const CLUSTER_COUNT: usize = 4;

/// Largest k evaluated for the elbow curve.
pub const ELBOW_MAX_K: usize = 8;

const MAX_ITERATIONS: usize = 100;

/// Cluster membership for one record, after semantic relabeling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAssignment {
    pub record_id: i64,
    /// Cluster rank: 0 = shortest mean distance
    pub cluster: u32,
    pub label: String,
}

/// Aggregate profile of one cluster, in rank order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterProfile {
    pub cluster: u32,
    pub label: String,
    pub count: u32,
    pub avg_distance_m: f64,
    pub avg_duration_s: f64,
    pub avg_pace_500m: Option<f64>,
}

/// Inertia at one candidate k, for elbow-method display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElbowPoint {
    pub k: u32,
    pub inertia: f64,
}

/// Full clustering result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAnalysis {
    /// True when fewer than 2 records were available to cluster
    pub insufficient_data: bool,
    /// Clusters actually used: min(CLUSTER_COUNT, record count)
    pub effective_k: u32,
    pub assignments: Vec<ClusterAssignment>,
    /// Profiles ordered by ascending mean distance
    pub profiles: Vec<ClusterProfile>,
    pub elbow: Vec<ElbowPoint>,
}

impl ClusterAnalysis {
    fn insufficient() -> Self {
        Self {
            insufficient_data: true,
            effective_k: 0,
            assignments: Vec::new(),
            profiles: Vec::new(),
            elbow: Vec::new(),
        }
    }
}

/// Classify workouts into training clusters.
///
/// Degrades gracefully: k shrinks to the record count when fewer than
/// CLUSTER_COUNT records exist, and fewer than 2 records yields an
/// insufficient-data result instead of failing.
pub fn cluster_workouts(records: &[WorkoutRecord]) -> ClusterAnalysis {
    if records.len() < 2 {
        return ClusterAnalysis::insufficient();
    }

    let features = standardize(records);
    let k = CLUSTER_COUNT.min(records.len());
    let seed_order = distance_sorted_order(records);

    let (raw_assignments, _inertia) = k_means(&features, k, &seed_order);

    // Rank raw cluster indices by ascending mean distance
    let rank_of = rank_clusters_by_distance(records, &raw_assignments, k);
    let labels = labels_for(k);

    let assignments: Vec<ClusterAssignment> = records
        .iter()
        .zip(&raw_assignments)
        .map(|(r, &raw)| {
            let rank = rank_of[raw];
            ClusterAssignment {
                record_id: r.id,
                cluster: rank as u32,
                label: labels[rank].to_string(),
            }
        })
        .collect();

    let profiles = build_profiles(records, &assignments, k, &labels);

    // Elbow curve over k = 2..min(ELBOW_MAX_K, n-1)
    let elbow: Vec<ElbowPoint> = (2..=ELBOW_MAX_K.min(records.len() - 1))
        .map(|k2| {
            let (_, inertia) = k_means(&features, k2, &seed_order);
            ElbowPoint {
                k: k2 as u32,
                inertia,
            }
        })
        .collect();

    debug!(
        "[Cluster] {} records into {} clusters: {:?}",
        records.len(),
        k,
        profiles
            .iter()
            .map(|p| (p.label.as_str(), p.count))
            .collect::<Vec<_>>()
    );

    ClusterAnalysis {
        insufficient_data: false,
        effective_k: k as u32,
        assignments,
        profiles,
        elbow,
    }
}

/// Semantic labels for k clusters, shortest mean distance first.
fn labels_for(k: usize) -> Vec<&'static str> {
    match k {
        0 | 1 => vec!["Steady-State"],
        2 => vec!["Sprint", "Long Endurance"],
        3 => vec!["Sprint", "Steady-State", "Long Endurance"],
        _ => vec![
            "Sprint",
            "5K Steady-State",
            "10K Steady-State",
            "Long Endurance",
        ],
    }
}

/// Zero-mean unit-variance {distance, duration} feature vectors.
/// A feature with zero variance standardizes to all zeros.
fn standardize(records: &[WorkoutRecord]) -> Vec<[f64; 2]> {
    let n = records.len() as f64;
    let raw: Vec<[f64; 2]> = records
        .iter()
        .map(|r| [r.distance_m, r.duration_s])
        .collect();

    let mut means = [0.0f64; 2];
    for f in &raw {
        means[0] += f[0];
        means[1] += f[1];
    }
    means[0] /= n;
    means[1] /= n;

    let mut stds = [0.0f64; 2];
    for f in &raw {
        stds[0] += (f[0] - means[0]).powi(2);
        stds[1] += (f[1] - means[1]).powi(2);
    }
    stds[0] = (stds[0] / n).sqrt();
    stds[1] = (stds[1] / n).sqrt();

    raw.iter()
        .map(|f| {
            [
                if stds[0] > 0.0 {
                    (f[0] - means[0]) / stds[0]
                } else {
                    0.0
                },
                if stds[1] > 0.0 {
                    (f[1] - means[1]) / stds[1]
                } else {
                    0.0
                },
            ]
        })
        .collect()
}

/// Record indices ordered by (distance, duration, id). The total order makes
/// quantile seeding independent of the input row order.
fn distance_sorted_order(records: &[WorkoutRecord]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = &records[a];
        let rb = &records[b];
        ra.distance_m
            .partial_cmp(&rb.distance_m)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                ra.duration_s
                    .partial_cmp(&rb.duration_s)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
            .then(ra.id.cmp(&rb.id))
    });
    order
}

fn squared_distance(a: &[f64; 2], b: &[f64; 2]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

/// Lloyd's algorithm with quantile seeding. Returns per-point cluster
/// indices and the final inertia (sum of squared distances to centroids).
fn k_means(features: &[[f64; 2]], k: usize, seed_order: &[usize]) -> (Vec<usize>, f64) {
    let n = features.len();

    // Seed centroid j at the midpoint of the j-th quantile of the sorted set
    let mut centroids: Vec<[f64; 2]> = (0..k)
        .map(|j| features[seed_order[(2 * j + 1) * n / (2 * k)]])
        .collect();

    let mut assignments = vec![0usize; n];
    for _ in 0..MAX_ITERATIONS {
        // Assignment step: nearest centroid, ties to the lower index
        let mut changed = false;
        for (i, f) in features.iter().enumerate() {
            let mut best = 0;
            let mut best_dist = squared_distance(f, &centroids[0]);
            for (c, centroid) in centroids.iter().enumerate().skip(1) {
                let d = squared_distance(f, centroid);
                if d < best_dist {
                    best = c;
                    best_dist = d;
                }
            }
            if assignments[i] != best {
                assignments[i] = best;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        // Update step: mean of members; an emptied cluster keeps its centroid
        let mut sums = vec![[0.0f64; 2]; k];
        let mut counts = vec![0usize; k];
        for (f, &c) in features.iter().zip(&assignments) {
            sums[c][0] += f[0];
            sums[c][1] += f[1];
            counts[c] += 1;
        }
        for c in 0..k {
            if counts[c] > 0 {
                centroids[c] = [sums[c][0] / counts[c] as f64, sums[c][1] / counts[c] as f64];
            }
        }
    }

    let inertia = features
        .iter()
        .zip(&assignments)
        .map(|(f, &c)| squared_distance(f, &centroids[c]))
        .sum();

    (assignments, inertia)
}

/// Map raw cluster index -> rank, ranked by ascending mean distance.
fn rank_clusters_by_distance(
    records: &[WorkoutRecord],
    assignments: &[usize],
    k: usize,
) -> Vec<usize> {
    let mut sums = vec![0.0f64; k];
    let mut counts = vec![0usize; k];
    for (r, &c) in records.iter().zip(assignments) {
        sums[c] += r.distance_m;
        counts[c] += 1;
    }
    let means: Vec<f64> = (0..k)
        .map(|c| {
            if counts[c] > 0 {
                sums[c] / counts[c] as f64
            } else {
                f64::INFINITY
            }
        })
        .collect();

    let mut by_mean: Vec<usize> = (0..k).collect();
    by_mean.sort_by(|&a, &b| {
        means[a]
            .partial_cmp(&means[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut rank_of = vec![0usize; k];
    for (rank, &raw) in by_mean.iter().enumerate() {
        rank_of[raw] = rank;
    }
    rank_of
}

fn build_profiles(
    records: &[WorkoutRecord],
    assignments: &[ClusterAssignment],
    k: usize,
    labels: &[&'static str],
) -> Vec<ClusterProfile> {
    (0..k)
        .map(|rank| {
            let members: Vec<&WorkoutRecord> = records
                .iter()
                .zip(assignments)
                .filter(|(_, a)| a.cluster as usize == rank)
                .map(|(r, _)| r)
                .collect();
            let count = members.len();
            let paces: Vec<f64> = members.iter().filter_map(|r| r.pace_500m).collect();
            ClusterProfile {
                cluster: rank as u32,
                label: labels[rank].to_string(),
                count: count as u32,
                avg_distance_m: if count > 0 {
                    members.iter().map(|r| r.distance_m).sum::<f64>() / count as f64
                } else {
                    0.0
                },
                avg_duration_s: if count > 0 {
                    members.iter().map(|r| r.duration_s).sum::<f64>() / count as f64
                } else {
                    0.0
                },
                avg_pace_500m: if paces.is_empty() {
                    None
                } else {
                    Some(paces.iter().sum::<f64>() / paces.len() as f64)
                },
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn workout(id: i64, distance_m: f64, duration_s: f64) -> WorkoutRecord {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(6, 0, 0)
            .unwrap();
        WorkoutRecord::new(id, date, distance_m, duration_s, "rower")
    }

    /// Four well-separated training groups of three workouts each.
    fn four_group_records() -> Vec<WorkoutRecord> {
        let mut records = Vec::new();
        let mut id = 0;
        for (base_dist, base_dur) in [
            (500.0, 105.0),
            (5000.0, 1250.0),
            (10000.0, 2600.0),
            (18000.0, 4900.0),
        ] {
            for j in 0..3 {
                id += 1;
                records.push(workout(
                    id,
                    base_dist + j as f64 * 20.0,
                    base_dur + j as f64 * 8.0,
                ));
            }
        }
        records
    }

    #[test]
    fn test_insufficient_data_below_two_records() {
        assert!(cluster_workouts(&[]).insufficient_data);
        let one = vec![workout(1, 2000.0, 480.0)];
        assert!(cluster_workouts(&one).insufficient_data);
    }

    #[test]
    fn test_effective_k_shrinks_with_small_input() {
        let records = vec![workout(1, 500.0, 110.0), workout(2, 10000.0, 2600.0)];
        let analysis = cluster_workouts(&records);
        assert!(!analysis.insufficient_data);
        assert_eq!(analysis.effective_k, 2);
        assert_eq!(analysis.profiles.len(), 2);
        assert_eq!(analysis.profiles[0].label, "Sprint");
        assert_eq!(analysis.profiles[1].label, "Long Endurance");
    }

    #[test]
    fn test_labels_ordered_by_mean_distance() {
        let analysis = cluster_workouts(&four_group_records());
        assert_eq!(analysis.effective_k, 4);
        let mean_dists: Vec<f64> = analysis.profiles.iter().map(|p| p.avg_distance_m).collect();
        assert!(mean_dists.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(analysis.profiles[0].label, "Sprint");
        assert_eq!(analysis.profiles[3].label, "Long Endurance");
        // The shortest workouts all land in the Sprint cluster
        for a in &analysis.assignments {
            if a.record_id <= 3 {
                assert_eq!(a.label, "Sprint");
            }
        }
    }

    #[test]
    fn test_labels_stable_under_row_permutation() {
        let records = four_group_records();
        let baseline: HashMap<i64, String> = cluster_workouts(&records)
            .assignments
            .into_iter()
            .map(|a| (a.record_id, a.label))
            .collect();

        // Reverse and rotate the rows; semantic labels must not move
        let mut shuffled = records.clone();
        shuffled.reverse();
        shuffled.rotate_left(5);
        let permuted: HashMap<i64, String> = cluster_workouts(&shuffled)
            .assignments
            .into_iter()
            .map(|a| (a.record_id, a.label))
            .collect();

        assert_eq!(baseline, permuted);
    }

    #[test]
    fn test_elbow_curve_present_and_decreasing() {
        let analysis = cluster_workouts(&four_group_records());
        assert!(!analysis.elbow.is_empty());
        assert_eq!(analysis.elbow[0].k, 2);
        // More clusters never fit worse on this well-separated data
        let inertias: Vec<f64> = analysis.elbow.iter().map(|e| e.inertia).collect();
        assert!(inertias.windows(2).all(|w| w[1] <= w[0] + 1e-9));
    }

    #[test]
    fn test_profile_counts_cover_all_records() {
        let analysis = cluster_workouts(&four_group_records());
        let total: u32 = analysis.profiles.iter().map(|p| p.count).sum();
        assert_eq!(total, 12);
    }
}
