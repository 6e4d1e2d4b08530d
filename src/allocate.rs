//! # Effort Allocation
//!
//! The inverse problem: given a target moving time and the natural-pacing
//! baseline, redistribute time across segments so the total matches the
//! target, within what the athlete can physiologically absorb.
//!
//! ## Approach
//!
//! Cost-weighted proportional allocation, not an LP optimum:
//!
//! 1. `delta = natural_total − target`. Within ±30 s the natural plan is
//!    returned unchanged.
//! 2. Each segment gets adjustment bounds and an effort cost from its
//!    gradient class (steep climb / descent / flat) and the athlete's
//!    tiers; late segments get more expensive when fatigue is on.
//! 3. `|delta|` is clamped to a global fitness budget; an infeasible target
//!    is surfaced through [`Allocation::target_met`], never hidden.
//! 4. Each segment absorbs `|delta| × weight/Σweights` (weight =
//!    capacity / cost), capped at its own capacity.
//! 5. Segments adjusted by ≥ 10% of their natural time are labeled
//!    [`EffortLevel::Push`] or [`EffortLevel::Protect`].
//!
//! The per-segment capacity/cost computation lives in
//! [`adjustment_profile`], shared with the threshold search so that
//! classification always matches what allocation would actually do.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::segments::Segment;
use crate::simulate::Simulation;
use crate::AthleteProfile;

/// Targets within this band of the natural time skip allocation entirely.
pub const DELTA_TOLERANCE_MIN: f64 = 0.5;

/// Fraction of natural segment time an adjustment must reach to be labeled
/// push or protect.
pub const PUSH_PROTECT_FRACTION: f64 = 0.10;

/// Gradient above which a segment is priced as a steep climb.
const STEEP_CLIMB_GRADIENT: f64 = 0.08;
/// Gradient below which a segment is priced as a descent.
const DESCENT_GRADIENT: f64 = -0.05;

/// How hard a segment is being asked to deviate from natural pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffortLevel {
    /// Meaningfully faster than natural.
    Push,
    /// At or near natural pacing.
    Steady,
    /// Meaningfully slower than natural.
    Protect,
}

impl std::fmt::Display for EffortLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EffortLevel::Push => write!(f, "push"),
            EffortLevel::Steady => write!(f, "steady"),
            EffortLevel::Protect => write!(f, "protect"),
        }
    }
}

/// How much one segment's time can move and what it costs to move it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjustmentProfile {
    /// Lower bound on segment time as a multiple of natural time.
    pub min_mult: f64,
    /// Upper bound on segment time as a multiple of natural time.
    pub max_mult: f64,
    /// Relative price of adjusting this segment; higher = adjusted less.
    pub effort_cost: f64,
}

impl AdjustmentProfile {
    /// Minutes this segment can give up (speeding up) or absorb (slowing
    /// down), given its natural time.
    pub fn capacity_min(&self, natural_time_min: f64, speeding_up: bool) -> f64 {
        if speeding_up {
            natural_time_min * (1.0 - self.min_mult)
        } else {
            natural_time_min * (self.max_mult - 1.0)
        }
    }
}

/// Compute the adjustment bounds and effort cost for one segment.
///
/// Classification is by gradient: steep climbs (> 8%) price by climbing
/// ability, descents (< −5%) by technical skill, everything else at a fixed
/// baseline. With fatigue enabled the cost ramps up with how late the
/// segment sits in the cumulative-effort sequence, biasing allocation
/// toward adjusting early segments first.
pub fn adjustment_profile(
    segment: &Segment,
    athlete: &AthleteProfile,
    effort_before_segment: f64,
) -> AdjustmentProfile {
    let gradient = segment.gradient();

    let (min_mult, max_mult, mut effort_cost) = if gradient > STEEP_CLIMB_GRADIENT {
        let (min_mult, max_mult) = athlete.climbing_ability.adjustment_bounds();
        (min_mult, max_mult, athlete.climbing_ability.adjustment_cost())
    } else if gradient < DESCENT_GRADIENT {
        let skill = athlete.skill_level;
        let (min_mult, max_mult) = if skill >= 0.8 {
            (0.80, 1.20)
        } else if skill >= 0.6 {
            (0.85, 1.20)
        } else if skill >= 0.4 {
            (0.90, 1.25)
        } else {
            (0.95, 1.30)
        };
        // Novices pay more to adjust descents
        (min_mult, max_mult, 1.0 + (1.0 - skill) * 0.8)
    } else {
        (0.80, 1.25, 1.0)
    };

    if athlete.fatigue_enabled {
        let fff = athlete.fitness_level.fatigue_cost_factor();
        let ramp = (1.0 + (effort_before_segment / 100.0) * (fff - 1.0)).min(fff);
        effort_cost *= ramp;
    }

    AdjustmentProfile { min_mult, max_mult, effort_cost }
}

/// One segment of an allocated plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocatedSegment {
    /// Allocated segment time in minutes.
    pub time_min: f64,
    /// Pace required to hit the allocated time, min/km.
    pub required_pace_min_per_km: f64,
    /// Minutes moved relative to natural; negative means faster.
    pub adjustment_min: f64,
    pub effort_level: EffortLevel,
}

/// Result of effort allocation over a whole course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    /// One entry per segment, same order as the input.
    pub segments: Vec<AllocatedSegment>,
    /// False when the requested delta exceeded the fitness budget and was
    /// clamped; the plan then under- or overshoots the target.
    pub target_met: bool,
    /// True when no segment had any adjustment capacity and the natural
    /// plan was returned unchanged.
    pub degenerate: bool,
    /// Delta the caller asked for: natural total minus target, minutes.
    pub requested_delta_min: f64,
    /// Delta actually distributed after clamping and capacity caps.
    pub applied_delta_min: f64,
}

impl Allocation {
    /// Total allocated moving time in minutes.
    pub fn total_time_min(&self) -> f64 {
        self.segments.iter().map(|s| s.time_min).sum()
    }
}

fn steady_allocation(natural: &Simulation, requested_delta_min: f64, degenerate: bool) -> Allocation {
    let segments = natural
        .segments
        .iter()
        .map(|s| AllocatedSegment {
            time_min: s.prediction.time_min,
            required_pace_min_per_km: s.prediction.pace_min_per_km,
            adjustment_min: 0.0,
            effort_level: EffortLevel::Steady,
        })
        .collect();

    Allocation {
        segments,
        target_met: !degenerate,
        degenerate,
        requested_delta_min,
        applied_delta_min: 0.0,
    }
}

/// Distribute the gap between the natural total and a target moving time
/// across segments.
///
/// `target_moving_time_min` excludes checkpoint dwell; the caller subtracts
/// dwell from the user's total target before calling.
pub fn allocate_effort(
    target_moving_time_min: f64,
    natural: &Simulation,
    athlete: &AthleteProfile,
) -> Allocation {
    let natural_total = natural.total_time_min;
    let requested_delta = natural_total - target_moving_time_min;

    if requested_delta.abs() < DELTA_TOLERANCE_MIN {
        return steady_allocation(natural, requested_delta, false);
    }

    let speeding_up = requested_delta > 0.0;

    // Global fitness budget on total deviation
    let budget = natural_total * athlete.fitness_level.deviation_budget();
    let mut delta = requested_delta.abs();
    let target_met = delta <= budget;
    if !target_met {
        warn!(
            "target delta {:.1} min exceeds fitness budget {:.1} min; clamping",
            delta, budget
        );
        delta = budget;
    }

    // Per-segment capacity and cost, shared with the threshold search
    let profiles: Vec<AdjustmentProfile> = natural
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
        warn!("no adjustment capacity on any segment; returning natural pacing");
        return steady_allocation(natural, requested_delta, true);
    }

    let mut segments = Vec::with_capacity(natural.segments.len());
    let mut applied = 0.0;

    for (sim, (profile, capacity)) in natural.segments.iter().zip(profiles.iter().zip(&capacities)) {
        let natural_time = sim.prediction.time_min;
        let weight = capacity / profile.effort_cost;
        let share = (delta * weight / total_weight).min(*capacity);

        let signed = if speeding_up { -share } else { share };
        let time_min = natural_time + signed;
        applied += share;

        let effort_level = if natural_time > 0.0 && share >= natural_time * PUSH_PROTECT_FRACTION {
            if speeding_up { EffortLevel::Push } else { EffortLevel::Protect }
        } else {
            EffortLevel::Steady
        };

        let required_pace = if sim.segment.distance_km > 0.0 {
            time_min / sim.segment.distance_km
        } else {
            sim.prediction.pace_min_per_km
        };

        segments.push(AllocatedSegment {
            time_min,
            required_pace_min_per_km: required_pace,
            adjustment_min: signed,
            effort_level,
        });
    }

    Allocation {
        segments,
        target_met,
        degenerate: false,
        requested_delta_min: requested_delta,
        applied_delta_min: if speeding_up { -applied } else { applied },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulate::natural_pacing;
    use crate::{ClimbingAbility, FitnessLevel, Terrain};

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn segment(name: &str, distance_km: f64, gain: f64, loss: f64) -> Segment {
        Segment {
            from_label: "Start".to_string(),
            to_label: name.to_string(),
            distance_km,
            elevation_gain_m: gain,
            elevation_loss_m: loss,
            terrain: Terrain::SmoothTrail,
        }
    }

    fn athlete() -> AthleteProfile {
        AthleteProfile {
            base_pace_min_per_km: 6.0,
            climbing_ability: ClimbingAbility::Moderate,
            fitness_level: FitnessLevel::Recreational,
            skill_level: 0.5,
            fatigue_enabled: false,
        }
    }

    fn course() -> Simulation {
        let segs = vec![
            segment("CP1", 10.0, 900.0, 0.0),
            segment("CP2", 10.0, 50.0, 50.0),
            segment("CP3", 10.0, 0.0, 900.0),
        ];
        natural_pacing(&segs, &athlete()).unwrap()
    }

    #[test]
    fn test_target_near_natural_returns_steady() {
        let natural = course();
        let alloc = allocate_effort(natural.total_time_min + 0.3, &natural, &athlete());

        assert!(alloc.target_met);
        assert!(!alloc.degenerate);
        assert_eq!(alloc.applied_delta_min, 0.0);
        for (a, n) in alloc.segments.iter().zip(&natural.segments) {
            assert_eq!(a.effort_level, EffortLevel::Steady);
            assert!(approx_eq(a.time_min, n.prediction.time_min, 1e-9));
        }
    }

    #[test]
    fn test_faster_target_reduces_total_time() {
        let natural = course();
        let target = natural.total_time_min - 10.0;
        let alloc = allocate_effort(target, &natural, &athlete());

        assert!(alloc.target_met);
        assert!(approx_eq(alloc.total_time_min(), target, 0.1));
        assert!(alloc.segments.iter().all(|s| s.adjustment_min <= 0.0));
    }

    #[test]
    fn test_slower_target_increases_total_time() {
        let natural = course();
        let target = natural.total_time_min + 15.0;
        let alloc = allocate_effort(target, &natural, &athlete());

        assert!(alloc.target_met);
        assert!(approx_eq(alloc.total_time_min(), target, 0.1));
        assert!(alloc.segments.iter().all(|s| s.adjustment_min >= 0.0));
    }

    #[test]
    fn test_budget_clamping() {
        let natural = course();
        // Recreational budget is 25% of natural time; ask for 90% faster
        let target = natural.total_time_min * 0.1;
        let alloc = allocate_effort(target, &natural, &athlete());

        assert!(!alloc.target_met);
        let budget = natural.total_time_min * 0.25;
        let total_adjustment: f64 = alloc.segments.iter().map(|s| s.adjustment_min.abs()).sum();
        assert!(total_adjustment <= budget + 1e-9);
    }

    #[test]
    fn test_push_labels_on_aggressive_target() {
        let natural = course();
        let target = natural.total_time_min * 0.80;
        let alloc = allocate_effort(target, &natural, &athlete());

        assert!(alloc.segments.iter().any(|s| s.effort_level == EffortLevel::Push));
    }

    #[test]
    fn test_protect_labels_on_slow_target() {
        let natural = course();
        let target = natural.total_time_min * 1.20;
        let alloc = allocate_effort(target, &natural, &athlete());

        assert!(alloc.segments.iter().any(|s| s.effort_level == EffortLevel::Protect));
    }

    #[test]
    fn test_zero_capacity_falls_back_to_natural() {
        // A course of only zero-distance segments has no capacity at all
        let segs = vec![segment("CP1", 0.0, 0.0, 0.0), segment("CP2", 0.0, 0.0, 0.0)];
        let natural = natural_pacing(&segs, &athlete()).unwrap();
        let alloc = allocate_effort(natural.total_time_min - 5.0, &natural, &athlete());

        assert!(alloc.degenerate);
        assert!(!alloc.target_met);
        assert!(alloc.segments.iter().all(|s| s.effort_level == EffortLevel::Steady));
    }

    #[test]
    fn test_cheap_segments_absorb_more() {
        // Flat segments (cost 1.0) should absorb more of the delta than a
        // steep climb priced at the moderate climbing cost of 1.1.
        let segs = vec![
            segment("CP1", 10.0, 1000.0, 0.0), // 10% climb
            segment("CP2", 10.0, 0.0, 0.0),
        ];
        let ath = athlete();
        let natural = natural_pacing(&segs, &ath).unwrap();

        let p_climb = adjustment_profile(&segs[0], &ath, 0.0);
        let p_flat = adjustment_profile(&segs[1], &ath, 0.0);
        assert!(p_climb.effort_cost > p_flat.effort_cost);

        let alloc = allocate_effort(natural.total_time_min - 8.0, &natural, &ath);
        let per_natural: Vec<f64> = alloc
            .segments
            .iter()
            .zip(&natural.segments)
            .map(|(a, n)| a.adjustment_min.abs() / n.prediction.time_min)
            .collect();
        // The flat segment gives up a larger fraction of its time
        assert!(per_natural[1] > per_natural[0]);
    }

    #[test]
    fn test_fatigue_ramp_biases_early_segments() {
        let mut ath = athlete();
        ath.fatigue_enabled = true;

        let seg = segment("CP1", 10.0, 0.0, 0.0);
        let early = adjustment_profile(&seg, &ath, 0.0);
        let late = adjustment_profile(&seg, &ath, 80.0);

        assert!(late.effort_cost > early.effort_cost);
        // Ramp saturates at the fitness fatigue factor (recreational 1.3)
        let saturated = adjustment_profile(&seg, &ath, 500.0);
        assert!(approx_eq(saturated.effort_cost, 1.3, 1e-9));
    }

    #[test]
    fn test_descent_bounds_by_skill_band() {
        let seg = segment("CP1", 10.0, 0.0, 800.0); // -8% descent
        let mut ath = athlete();

        ath.skill_level = 0.9;
        let expert = adjustment_profile(&seg, &ath, 0.0);
        assert_eq!((expert.min_mult, expert.max_mult), (0.80, 1.20));

        ath.skill_level = 0.2;
        let novice = adjustment_profile(&seg, &ath, 0.0);
        assert_eq!((novice.min_mult, novice.max_mult), (0.95, 1.30));
        assert!(novice.effort_cost > expert.effort_cost);
    }

    #[test]
    fn test_no_segment_exceeds_its_capacity() {
        let natural = course();
        let target = natural.total_time_min * 0.75;
        let alloc = allocate_effort(target, &natural, &athlete());

        for (a, n) in alloc.segments.iter().zip(&natural.segments) {
            let profile = adjustment_profile(&n.segment, &athlete(), n.effort_at_start);
            let capacity = profile.capacity_min(n.prediction.time_min, true);
            assert!(a.adjustment_min.abs() <= capacity + 1e-9);
        }
    }
}
