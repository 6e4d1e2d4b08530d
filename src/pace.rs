//! # Segment Pace Model
//!
//! The forward physiological model: given one segment, an athlete profile,
//! and the effort already absorbed, predict the pace the athlete would run.
//!
//! ## Model
//!
//! Additive base time, then multiplicative adjustment:
//!
//! ```text
//! base_time   = horizontal_time + climb_time − descent_savings
//! final_time  = base_time × terrain_factor × fatigue_mult × skill_bonus
//! final_pace  = min(final_time / distance, 2.5 × base_pace)
//! ```
//!
//! - Climb time uses a tiered vertical speed scaled by a piecewise-linear
//!   gradient efficiency curve; the optimal climbing zone is 6–12%.
//! - Descent savings apply only to segments that are net descents, with the
//!   downhill speed multiplier capped by terrain and raised by skill.
//! - The terrain efficiency factor (≥ 1.0) amplifies with gradient and is
//!   discounted by technical skill.
//! - Fatigue kicks in once cumulative km-effort passes the athlete's
//!   Fatigue Onset Point and grows as `1 + α·((E−FOP)/FOP)^β`.
//!
//! [`predict`] is a pure function: identical inputs always produce
//! identical outputs, and nothing here touches process-wide state.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::segments::Segment;
use crate::{AthleteProfile, Terrain};

/// Hard ceiling on predicted pace, as a multiple of the athlete's base pace.
/// Keeps extreme terrain from producing absurd paces on very long races.
pub const PACE_CAP_FACTOR: f64 = 2.5;

/// How much gradient amplifies terrain difficulty (gamma).
const TERRAIN_GRADIENT_GAMMA: f64 = 1.25;

/// Terrain effect weighting on climbs vs descents.
const TERRAIN_CLIMB_WEIGHT: f64 = 0.7;
const TERRAIN_DESCENT_WEIGHT: f64 = 1.0;

/// Universal speed-up for skilled athletes: 0–3% from novice to expert.
const SKILL_EFFICIENCY_GAIN: f64 = 0.03;

/// km-effort divisors: one km-effort per 100 m of ascent / 200 m of descent.
const EFFORT_ASCENT_DIVISOR: f64 = 100.0;
const EFFORT_DESCENT_DIVISOR: f64 = 200.0;

/// Prediction for a single segment.
///
/// Produced once per segment per calculation run and never mutated after
/// creation. Times are minutes; paces are minutes per kilometer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentPrediction {
    /// Final predicted pace after all adjustments and the cap.
    pub pace_min_per_km: f64,
    /// Pace with elevation effects only, before terrain/fatigue/skill.
    pub elevation_adjusted_pace: f64,
    /// Display-only fatigue penalty in seconds per kilometer. Already baked
    /// into the final pace; never re-added to the time total.
    pub fatigue_seconds_per_km: f64,
    /// Terrain efficiency factor applied (≥ 1.0).
    pub terrain_factor: f64,
    /// Whether the 2.5× base-pace cap was hit.
    pub pace_capped: bool,
    /// Segment time in minutes at the final pace.
    pub time_min: f64,
}

/// km-effort contributed by one segment:
/// `distance + ascent/100 + descent/200`.
pub fn segment_effort_km(segment: &Segment) -> f64 {
    segment.distance_km
        + segment.elevation_gain_m / EFFORT_ASCENT_DIVISOR
        + segment.elevation_loss_m / EFFORT_DESCENT_DIVISOR
}

/// Gradient-aware vertical speed in m/h.
///
/// Efficiency varies with gradient: barely a penalty below 3%, peak
/// efficiency in the 6–12% optimal climbing zone, then a forced slowdown on
/// very steep ground. Above 12% technical skill adds up to +0.05 efficiency,
/// ramped over 12–25% and capped so total efficiency never exceeds 1.0.
pub fn vertical_speed(base_speed_m_per_h: f64, gradient: f64, skill_level: f64) -> f64 {
    let gradient_pct = gradient.abs() * 100.0;

    let mut efficiency = if gradient_pct < 3.0 {
        0.90
    } else if gradient_pct < 6.0 {
        0.90 + (gradient_pct - 3.0) / 3.0 * 0.05
    } else if gradient_pct <= 12.0 {
        0.95 + (gradient_pct - 6.0) / 6.0 * 0.05
    } else if gradient_pct <= 18.0 {
        1.0 - (gradient_pct - 12.0) / 6.0 * 0.15
    } else if gradient_pct <= 25.0 {
        0.85 - (gradient_pct - 18.0) / 7.0 * 0.15
    } else {
        0.70
    };

    if gradient_pct > 12.0 {
        let skill_bonus = skill_level * 0.05 * ((gradient_pct - 12.0) / 13.0).min(1.0);
        efficiency = (efficiency + skill_bonus).min(1.0);
    }

    base_speed_m_per_h * efficiency
}

/// Downhill speed multiplier (≥ 1.0) for a net-descent segment.
///
/// The gradient sets a base multiplier (peaking at 1.20 around 10–15%, with
/// steeper descents forcing a slowdown), which is then scaled toward 1.0 by
/// a terrain-specific cap. Skill recovers part of the terrain headroom:
/// `cap' = min(1, cap + skill × 0.3 × (1 − cap))`.
pub fn downhill_multiplier(gradient: f64, terrain: Terrain, skill_level: f64) -> f64 {
    if gradient >= 0.0 {
        return 1.0;
    }

    let gradient_pct = gradient.abs() * 100.0;
    let base_multiplier = if gradient_pct <= 5.0 {
        1.05
    } else if gradient_pct <= 10.0 {
        1.15
    } else if gradient_pct <= 15.0 {
        1.20
    } else {
        // Very steep: forced to slow down
        1.10
    };

    let base_cap = terrain.downhill_speed_cap();
    let skill_bonus = skill_level * 0.3 * (1.0 - base_cap);
    let terrain_cap = (base_cap + skill_bonus).min(1.0);

    1.0 + (base_multiplier - 1.0) * terrain_cap
}

/// Terrain efficiency factor (TEF) for a segment, ≥ 1.0.
///
/// The base terrain multiplier is amplified by gradient, weighted by travel
/// direction (70% effect on climbs, 100% on descents), and finally
/// discounted by skill: `1 + (factor − 1) × (1 − skill)`.
pub fn terrain_efficiency_factor(
    terrain: Terrain,
    gradient: f64,
    skill_level: f64,
    is_descent: bool,
) -> f64 {
    let scaled = terrain.base_factor() * (1.0 + TERRAIN_GRADIENT_GAMMA * gradient.abs());

    let direction_weight = if is_descent { TERRAIN_DESCENT_WEIGHT } else { TERRAIN_CLIMB_WEIGHT };
    let direction_adjusted = 1.0 + (scaled - 1.0) * direction_weight;

    let skill_adjusted = 1.0 + (direction_adjusted - 1.0) * (1.0 - skill_level);

    // Terrain can only slow down, never beat smooth trail
    skill_adjusted.max(1.0)
}

/// Fatigue multiplier for the given cumulative km-effort.
///
/// Returns 1.0 when fatigue is disabled or effort is at or below the
/// athlete's Fatigue Onset Point; beyond it grows as
/// `1 + α × ((E − FOP) / FOP)^β`.
pub fn fatigue_multiplier(athlete: &AthleteProfile, cumulative_effort: f64) -> f64 {
    if !athlete.fatigue_enabled {
        return 1.0;
    }

    let params = athlete.fitness_level.fatigue_params();
    if cumulative_effort <= params.onset_km_effort {
        return 1.0;
    }

    let overshoot = (cumulative_effort - params.onset_km_effort) / params.onset_km_effort;
    1.0 + params.alpha * overshoot.powf(params.beta)
}

/// Predict the pace and time for one segment.
///
/// `cumulative_effort` is the km-effort absorbed over all segments strictly
/// before this one; this segment's own effort must not be included.
///
/// # Errors
///
/// Returns [`PlanError::NegativeDistance`] for a negative segment distance
/// (a contract violation by the caller). Zero-distance segments return the
/// base pace unchanged with no adjustments.
///
/// # Example
///
/// ```rust
/// use pace_planner::{pace, segments::Segment, AthleteProfile, Terrain};
///
/// let seg = Segment {
///     from_label: "Start".into(),
///     to_label: "Finish".into(),
///     distance_km: 10.0,
///     elevation_gain_m: 500.0,
///     elevation_loss_m: 100.0,
///     terrain: Terrain::RockyRunnable,
/// };
///
/// let athlete = AthleteProfile::default();
/// let prediction = pace::predict(&seg, &athlete, 0.0).unwrap();
/// assert!(prediction.pace_min_per_km > athlete.base_pace_min_per_km);
/// ```
pub fn predict(
    segment: &Segment,
    athlete: &AthleteProfile,
    cumulative_effort: f64,
) -> Result<SegmentPrediction, PlanError> {
    if segment.distance_km < 0.0 {
        return Err(PlanError::NegativeDistance(segment.distance_km));
    }

    let base_pace = athlete.base_pace_min_per_km;

    if segment.distance_km == 0.0 {
        return Ok(SegmentPrediction {
            pace_min_per_km: base_pace,
            elevation_adjusted_pace: base_pace,
            fatigue_seconds_per_km: 0.0,
            terrain_factor: 1.0,
            pace_capped: false,
            time_min: 0.0,
        });
    }

    let gradient = segment.gradient();
    let is_descent = segment.elevation_loss_m > segment.elevation_gain_m;

    // 1. Horizontal movement time (minutes)
    let horizontal_time = segment.distance_km * base_pace;

    // 2. Climbing time from vertical speed (minutes)
    let climb_time = if segment.elevation_gain_m > 0.0 {
        let speed = vertical_speed(
            athlete.climbing_ability.vertical_speed_m_per_h(),
            gradient,
            athlete.skill_level,
        );
        segment.elevation_gain_m / speed * 60.0
    } else {
        0.0
    };

    // 3. Descent time savings, only on net descents
    let descent_savings = if segment.elevation_loss_m > 0.0 && is_descent {
        let mult = downhill_multiplier(gradient, segment.terrain, athlete.skill_level);
        horizontal_time * (1.0 - 1.0 / mult)
    } else {
        0.0
    };

    let base_segment_time = horizontal_time + climb_time - descent_savings;
    let elevation_adjusted_pace = base_segment_time / segment.distance_km;

    let terrain_factor =
        terrain_efficiency_factor(segment.terrain, gradient, athlete.skill_level, is_descent);
    let skill_bonus = 1.0 - athlete.skill_level * SKILL_EFFICIENCY_GAIN;
    let fatigue_mult = fatigue_multiplier(athlete, cumulative_effort);

    let adjusted_time = base_segment_time * terrain_factor * fatigue_mult * skill_bonus;
    let mut pace = adjusted_time / segment.distance_km;

    // Display-only: how much fatigue costs per km on top of the elevation pace
    let fatigue_seconds_per_km = (elevation_adjusted_pace * fatigue_mult - elevation_adjusted_pace) * 60.0;

    let max_pace = base_pace * PACE_CAP_FACTOR;
    let pace_capped = pace > max_pace;
    if pace_capped {
        warn!(
            "pace capped on {} -> {}: {:.2} min/km limited to {:.2} min/km",
            segment.from_label, segment.to_label, pace, max_pace
        );
        pace = max_pace;
    }

    Ok(SegmentPrediction {
        pace_min_per_km: pace,
        elevation_adjusted_pace,
        fatigue_seconds_per_km,
        terrain_factor,
        pace_capped,
        time_min: segment.distance_km * pace,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClimbingAbility, FitnessLevel};

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    fn segment(distance_km: f64, gain: f64, loss: f64, terrain: Terrain) -> Segment {
        Segment {
            from_label: "Start".to_string(),
            to_label: "Finish".to_string(),
            distance_km,
            elevation_gain_m: gain,
            elevation_loss_m: loss,
            terrain,
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

    #[test]
    fn test_zero_distance_returns_base_pace() {
        let seg = segment(0.0, 0.0, 0.0, Terrain::Scrambling);
        let p = predict(&seg, &athlete(), 50.0).unwrap();
        assert_eq!(p.pace_min_per_km, 6.0);
        assert_eq!(p.elevation_adjusted_pace, 6.0);
        assert_eq!(p.fatigue_seconds_per_km, 0.0);
        assert_eq!(p.terrain_factor, 1.0);
        assert!(!p.pace_capped);
        assert_eq!(p.time_min, 0.0);
    }

    #[test]
    fn test_negative_distance_rejected() {
        let seg = segment(-1.0, 0.0, 0.0, Terrain::SmoothTrail);
        assert_eq!(predict(&seg, &athlete(), 0.0), Err(PlanError::NegativeDistance(-1.0)));
    }

    #[test]
    fn test_flat_smooth_segment_near_base_pace() {
        let seg = segment(10.0, 0.0, 0.0, Terrain::SmoothTrail);
        let p = predict(&seg, &athlete(), 0.0).unwrap();
        // Only the global skill bonus applies: 6.0 × (1 − 0.5×0.03)
        assert!(approx_eq(p.pace_min_per_km, 6.0 * 0.985, 1e-9));
        assert_eq!(p.terrain_factor, 1.0);
        assert!(!p.pace_capped);
    }

    #[test]
    fn test_gain_monotonicity() {
        // Increasing gain never decreases the predicted pace
        for ability in [
            ClimbingAbility::Conservative,
            ClimbingAbility::Moderate,
            ClimbingAbility::Strong,
            ClimbingAbility::VeryStrong,
            ClimbingAbility::Elite,
        ] {
            let mut ath = athlete();
            ath.climbing_ability = ability;

            let mut last_pace = 0.0;
            for gain in [0.0, 100.0, 300.0, 600.0, 1000.0, 1500.0, 2200.0, 3000.0] {
                let seg = segment(10.0, gain, 50.0, Terrain::SmoothTrail);
                let p = predict(&seg, &ath, 0.0).unwrap();
                assert!(
                    p.pace_min_per_km >= last_pace - 1e-9,
                    "pace regressed at gain {gain} for {ability:?}"
                );
                last_pace = p.pace_min_per_km;
            }
        }
    }

    #[test]
    fn test_terrain_ordering() {
        let skill = 0.3;
        let tf = |t| terrain_efficiency_factor(t, 0.0, skill, false);
        assert!(tf(Terrain::Scrambling) > tf(Terrain::Technical));
        assert!(tf(Terrain::Technical) > tf(Terrain::SmoothTrail));
        assert_eq!(tf(Terrain::SmoothTrail), 1.0);
        // Road can't beat smooth trail: clamp keeps the factor at 1.0
        assert_eq!(tf(Terrain::Road), 1.0);
    }

    #[test]
    fn test_pace_cap_invariant() {
        // Extreme climb on scrambling terrain with a weak climber
        let seg = segment(2.0, 2000.0, 0.0, Terrain::Scrambling);
        let mut ath = athlete();
        ath.climbing_ability = ClimbingAbility::Conservative;
        ath.skill_level = 0.0;

        let p = predict(&seg, &ath, 0.0).unwrap();
        assert!(p.pace_capped);
        assert!(approx_eq(p.pace_min_per_km, 6.0 * PACE_CAP_FACTOR, 1e-9));
        assert!(approx_eq(p.time_min, 2.0 * 15.0, 1e-9));
    }

    #[test]
    fn test_descent_savings_only_on_net_descents() {
        let descent = segment(10.0, 100.0, 500.0, Terrain::SmoothTrail);
        let climb = segment(10.0, 500.0, 100.0, Terrain::SmoothTrail);

        let p_descent = predict(&descent, &athlete(), 0.0).unwrap();
        let p_climb = predict(&climb, &athlete(), 0.0).unwrap();
        assert!(p_descent.pace_min_per_km < p_climb.pace_min_per_km);
    }

    #[test]
    fn test_downhill_multiplier_gradient_bands() {
        // Road terrain (cap 1.0) exposes the raw gradient bands
        assert!(approx_eq(downhill_multiplier(-0.03, Terrain::Road, 0.0), 1.05, 1e-9));
        assert!(approx_eq(downhill_multiplier(-0.08, Terrain::Road, 0.0), 1.15, 1e-9));
        assert!(approx_eq(downhill_multiplier(-0.12, Terrain::Road, 0.0), 1.20, 1e-9));
        // Past 15% the descent forces a slowdown relative to the peak
        assert!(approx_eq(downhill_multiplier(-0.20, Terrain::Road, 0.0), 1.10, 1e-9));
        // Uphill gradient is not a downhill
        assert_eq!(downhill_multiplier(0.05, Terrain::Road, 0.0), 1.0);
    }

    #[test]
    fn test_downhill_skill_raises_terrain_cap() {
        let novice = downhill_multiplier(-0.12, Terrain::Technical, 0.0);
        let expert = downhill_multiplier(-0.12, Terrain::Technical, 1.0);
        assert!(expert > novice);
        // Expert cap on technical: 0.70 + 0.3×0.30 = 0.79
        assert!(approx_eq(expert, 1.0 + 0.20 * 0.79, 1e-9));
    }

    #[test]
    fn test_vertical_speed_optimal_zone() {
        // 12% is the peak of the efficiency curve
        let at_12 = vertical_speed(800.0, 0.12, 0.0);
        assert!(approx_eq(at_12, 800.0, 1e-9));
        assert!(vertical_speed(800.0, 0.06, 0.0) < at_12);
        assert!(vertical_speed(800.0, 0.20, 0.0) < at_12);
        // Extremely steep bottoms out at 70%
        assert!(approx_eq(vertical_speed(800.0, 0.40, 0.0), 560.0, 1e-9));
    }

    #[test]
    fn test_vertical_speed_skill_bonus_on_steep_ground() {
        let novice = vertical_speed(800.0, 0.20, 0.0);
        let expert = vertical_speed(800.0, 0.20, 1.0);
        assert!(expert > novice);
        // Bonus never pushes efficiency past 1.0
        assert!(vertical_speed(800.0, 0.13, 1.0) <= 800.0);
    }

    #[test]
    fn test_fatigue_multiplier_before_and_after_onset() {
        let mut ath = athlete();
        ath.fatigue_enabled = true;

        // Recreational onset is 37.5 km-effort
        assert_eq!(fatigue_multiplier(&ath, 0.0), 1.0);
        assert_eq!(fatigue_multiplier(&ath, 37.5), 1.0);
        // One FOP beyond onset: 1 + 0.10 × 1.0
        assert!(approx_eq(fatigue_multiplier(&ath, 75.0), 1.1, 1e-9));

        ath.fatigue_enabled = false;
        assert_eq!(fatigue_multiplier(&ath, 200.0), 1.0);
    }

    #[test]
    fn test_fatigue_seconds_reported_but_not_double_counted() {
        let mut ath = athlete();
        ath.fatigue_enabled = true;

        let seg = segment(10.0, 0.0, 0.0, Terrain::SmoothTrail);
        let fresh = predict(&seg, &ath, 0.0).unwrap();
        let tired = predict(&seg, &ath, 75.0).unwrap();

        assert_eq!(fresh.fatigue_seconds_per_km, 0.0);
        assert!(tired.fatigue_seconds_per_km > 0.0);
        // The reported seconds match the multiplier applied to the pace
        assert!(approx_eq(tired.pace_min_per_km, fresh.pace_min_per_km * 1.1, 1e-9));
    }

    #[test]
    fn test_segment_effort_km() {
        let seg = segment(10.0, 500.0, 100.0, Terrain::SmoothTrail);
        // 10 + 500/100 + 100/200 = 15.5
        assert!(approx_eq(segment_effort_km(&seg), 15.5, 1e-9));
    }

    #[test]
    fn test_predict_is_pure() {
        let seg = segment(12.0, 400.0, 300.0, Terrain::Technical);
        let ath = athlete();
        let a = predict(&seg, &ath, 30.0).unwrap();
        let b = predict(&seg, &ath, 30.0).unwrap();
        assert_eq!(a, b);
    }
}
