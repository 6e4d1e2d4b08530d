//! # Segment Reduction
//!
//! Reduces an ordered distance/elevation profile plus a set of requested
//! checkpoint distances into discrete route segments.
//!
//! ## Algorithm
//!
//! 1. Resolve each requested checkpoint distance to the profile index whose
//!    cumulative distance is closest (minimum absolute difference, first
//!    occurrence on a tie), not the first index past the target.
//! 2. Synthesize implicit checkpoints at the first and last profile index,
//!    so N user checkpoints always yield N+1 segments labeled
//!    Start → CP1, CP1 → CP2, …, CPn → Finish.
//! 3. For each index pair, accumulate elevation gain and loss from the
//!    per-sample deltas and attach the per-segment terrain label
//!    (smooth trail when none is supplied).
//!
//! Two checkpoints closer together than the profile's sampling resolution
//! can resolve to the same index and produce a zero-distance segment. This
//! is a documented limitation of closest-index selection; downstream code
//! must tolerate zero-distance segments rather than this module rejecting
//! them.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::geo_utils::elevation_change;
use crate::{RoutePoint, Terrain};

/// A route portion between two consecutive checkpoints.
///
/// Produced by [`reduce`] and read-only downstream: the pace model, the
/// simulator, and the allocator all consume segments without mutating them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Label of the checkpoint this segment starts from ("Start", "CP1", ...)
    pub from_label: String,
    /// Label of the checkpoint this segment ends at ("CP1", ..., "Finish")
    pub to_label: String,
    /// Horizontal distance in kilometers. May be zero for degenerate
    /// checkpoints; never negative.
    pub distance_km: f64,
    /// Total elevation gain in meters (sum of positive per-sample deltas).
    pub elevation_gain_m: f64,
    /// Total elevation loss in meters (sum of absolute negative deltas).
    pub elevation_loss_m: f64,
    /// Terrain classification for the whole segment.
    pub terrain: Terrain,
}

impl Segment {
    /// Net gradient as a decimal fraction (0.10 = 10%).
    ///
    /// Zero-distance segments report a gradient of 0.0 rather than dividing
    /// by zero.
    pub fn gradient(&self) -> f64 {
        if self.distance_km > 0.0 {
            (self.elevation_gain_m - self.elevation_loss_m) / (self.distance_km * 1000.0)
        } else {
            0.0
        }
    }

    /// Net elevation change in meters (gain minus loss).
    pub fn net_elevation_m(&self) -> f64 {
        self.elevation_gain_m - self.elevation_loss_m
    }
}

/// Resolve requested checkpoint distances to profile indices.
///
/// Returns the full index sequence including the implicit start (0) and
/// finish (last index). Each requested distance maps to the index with the
/// minimum absolute distance difference; ties break to the first occurrence.
pub fn checkpoint_indices(distances: &[f64], checkpoint_distances: &[f64]) -> Vec<usize> {
    let mut indices = Vec::with_capacity(checkpoint_distances.len() + 2);
    indices.push(0);

    for &target in checkpoint_distances {
        let mut closest_idx = 0;
        let mut closest_diff = f64::INFINITY;
        for (i, &d) in distances.iter().enumerate() {
            let diff = (d - target).abs();
            if diff < closest_diff {
                closest_diff = diff;
                closest_idx = i;
            }
        }
        indices.push(closest_idx);
    }

    indices.push(distances.len().saturating_sub(1));
    indices
}

/// Build checkpoint labels: Start, CP1 … CPn, Finish.
pub fn checkpoint_labels(num_checkpoints: usize) -> Vec<String> {
    let mut labels = Vec::with_capacity(num_checkpoints + 2);
    labels.push("Start".to_string());
    for i in 0..num_checkpoints {
        labels.push(format!("CP{}", i + 1));
    }
    labels.push("Finish".to_string());
    labels
}

/// Reduce a route profile and checkpoint distances into segments.
///
/// `terrains` supplies one terrain label per segment; missing entries
/// default to [`Terrain::SmoothTrail`].
///
/// # Errors
///
/// Rejects an empty profile and profiles whose cumulative distances go
/// backwards. Duplicate checkpoint resolutions (zero-distance segments) are
/// permitted.
///
/// # Example
///
/// ```rust
/// use pace_planner::{segments, RoutePoint, Terrain};
///
/// let profile: Vec<RoutePoint> = (0..=20)
///     .map(|i| RoutePoint::new(f64::from(i) * 0.5, 1000.0 + f64::from(i) * 10.0))
///     .collect();
///
/// let segs = segments::reduce(&profile, &[5.0], &[Terrain::RockyRunnable]).unwrap();
/// assert_eq!(segs.len(), 2);
/// assert_eq!(segs[0].from_label, "Start");
/// assert_eq!(segs[1].to_label, "Finish");
/// ```
pub fn reduce(
    profile: &[RoutePoint],
    checkpoint_distances: &[f64],
    terrains: &[Terrain],
) -> Result<Vec<Segment>, PlanError> {
    if profile.is_empty() {
        return Err(PlanError::EmptyProfile);
    }

    for pair in profile.windows(2) {
        if pair[1].distance_km < pair[0].distance_km {
            return Err(PlanError::NonMonotonicProfile {
                previous: pair[0].distance_km,
                current: pair[1].distance_km,
            });
        }
    }

    let distances: Vec<f64> = profile.iter().map(|p| p.distance_km).collect();
    let indices = checkpoint_indices(&distances, checkpoint_distances);
    let labels = checkpoint_labels(checkpoint_distances.len());

    let mut segments = Vec::with_capacity(indices.len() - 1);
    for i in 0..indices.len() - 1 {
        let start_idx = indices[i];
        let end_idx = indices[i + 1];

        let distance_km = if end_idx > start_idx {
            distances[end_idx] - distances[start_idx]
        } else {
            0.0
        };
        let (gain, loss) = if end_idx > start_idx {
            elevation_change(profile, start_idx, end_idx)
        } else {
            (0.0, 0.0)
        };

        segments.push(Segment {
            from_label: labels[i].clone(),
            to_label: labels[i + 1].clone(),
            distance_km,
            elevation_gain_m: gain,
            elevation_loss_m: loss,
            terrain: terrains.get(i).copied().unwrap_or(Terrain::SmoothTrail),
        });
    }

    Ok(segments)
}

// =============================================================================
// Unit Tests
// =============================================================================
