//! # Effort Thresholds
//!
//! Characterizes a route's pacing envelope for one athlete: at what target
//! time does the plan tip from "mostly steady" into "mostly push", and at
//! what target into "mostly protect"?
//!
//! Each side is a 20-iteration binary search over candidate target times
//! (faster side in `[0.5 × natural, natural]`, slower side in
//! `[natural, 1.5 × natural]`). Every probe reruns the allocator's
//! capacity/cost math via [`adjustment_profile`] and counts the fraction of
//! segments whose adjustment crosses the 10% push/protect line, so the
//! reported thresholds always agree with what a real allocation would
//! label.
//!
//! Reported times include checkpoint dwell, matching the total race time a
//! user would actually enter as a target.

use serde::{Deserialize, Serialize};

use crate::allocate::{adjustment_profile, PUSH_PROTECT_FRACTION};
use crate::simulate::Simulation;
use crate::AthleteProfile;

const SEARCH_ITERATIONS: usize = 20;

/// Fraction of segments that must cross the push/protect line for a target
/// to count as a threshold.
const MAJORITY_FRACTION: f64 = 0.5;

/// Pacing envelope summary for a route and athlete. All times are total
/// race times in minutes, dwell included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffortThresholds {
    pub natural_time_min: f64,
    /// Fastest reasonable target: below this, most segments become pushes.
    pub push_threshold_min: f64,
    /// Slowest reasonable target: above this, most segments become protects.
    pub protect_threshold_min: f64,
}

/// Fraction of segments whose allocated adjustment would reach the
/// push/protect line at the given target moving time.
fn adjusted_fraction(natural: &Simulation, athlete: &AthleteProfile, target_moving_min: f64) -> f64 {
    if natural.segments.is_empty() {
        return 0.0;
    }

    let delta = natural.total_time_min - target_moving_min;
    let speeding_up = delta > 0.0;

    let budget = natural.total_time_min * athlete.fitness_level.deviation_budget();
    let delta = delta.abs().min(budget);

    let profiles: Vec<_> = natural
        .segments
        .iter()
        .map(|s| adjustment_profile(&s.segment, athlete, s.effort_at_start))
        .collect();

    let capacities: Vec<f64> = natural
        .segments
        .iter()
        .zip(&profiles)
        .map(|(s, p)| p.capacity_min(s.prediction.time_min, speeding_up))
        .collect();

    let total_weight: f64 = capacities
        .iter()
        .zip(&profiles)
        .map(|(cap, p)| cap / p.effort_cost)
        .sum();
    if total_weight <= 0.0 {
        return 0.0;
    }

    let crossed = natural
        .segments
        .iter()
        .zip(profiles.iter().zip(&capacities))
        .filter(|(sim, (profile, capacity))| {
            let natural_time = sim.prediction.time_min;
            if natural_time <= 0.0 {
                return false;
            }
            let weight = *capacity / profile.effort_cost;
            let share = (delta * weight / total_weight).min(**capacity);
            share >= natural_time * PUSH_PROTECT_FRACTION
        })
        .count();

    crossed as f64 / natural.segments.len() as f64
}

/// Find the push and protect thresholds for a route.
///
/// `num_checkpoints × avg_cp_time_min` of dwell is added to every reported
/// time. Returns `None` when the natural time is non-positive or any
/// computed value is not finite, so callers never see a NaN.
pub fn classify(
    natural: &Simulation,
    athlete: &AthleteProfile,
    num_checkpoints: usize,
    avg_cp_time_min: f64,
) -> Option<EffortThresholds> {
    let natural_moving = natural.total_time_min;
    if !(natural_moving > 0.0) {
        return None;
    }

    // Faster side: the highest target where a majority of segments push
    let mut lo = natural_moving * 0.5;
    let mut hi = natural_moving;
    for _ in 0..SEARCH_ITERATIONS {
        let mid = (lo + hi) / 2.0;
        if adjusted_fraction(natural, athlete, mid) >= MAJORITY_FRACTION {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let push_moving = lo;

    // Slower side: the lowest target where a majority of segments protect
    let mut lo = natural_moving;
    let mut hi = natural_moving * 1.5;
    for _ in 0..SEARCH_ITERATIONS {
        let mid = (lo + hi) / 2.0;
        if adjusted_fraction(natural, athlete, mid) >= MAJORITY_FRACTION {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    let protect_moving = hi;

    let dwell = num_checkpoints as f64 * avg_cp_time_min;
    let thresholds = EffortThresholds {
        natural_time_min: natural_moving + dwell,
        push_threshold_min: push_moving + dwell,
        protect_threshold_min: protect_moving + dwell,
    };

    let all_finite = thresholds.natural_time_min.is_finite()
        && thresholds.push_threshold_min.is_finite()
        && thresholds.protect_threshold_min.is_finite();
    if !all_finite {
        return None;
    }

    Some(thresholds)
}

// =============================================================================
// Unit Tests
// =============================================================================
