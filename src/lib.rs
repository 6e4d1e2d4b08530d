//! # Pace Planner
//!
//! Pacing and effort allocation for trail and ultra races.
//!
//! This library provides:
//! - Geometry reduction from GPS tracks or elevation profiles into segments
//! - A forward physiological pace model (terrain, gradient, fatigue, skill)
//! - Inverse effort allocation toward a target finish time
//! - Route pacing-envelope thresholds, nutrition targets, and drop-bag plans
//!
//! ## Features
//!
//! - **`parallel`** - Enable batch planning with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use pace_planner::{
//!     plan_race, AthleteProfile, PacingMode, PlanConfig,
//!     segments::Segment, Terrain,
//! };
//!
//! let segments = vec![
//!     Segment {
//!         from_label: "Start".into(),
//!         to_label: "CP1".into(),
//!         distance_km: 10.0,
//!         elevation_gain_m: 500.0,
//!         elevation_loss_m: 100.0,
//!         terrain: Terrain::RockyRunnable,
//!     },
//!     Segment {
//!         from_label: "CP1".into(),
//!         to_label: "Finish".into(),
//!         distance_km: 10.0,
//!         elevation_gain_m: 100.0,
//!         elevation_loss_m: 500.0,
//!         terrain: Terrain::SmoothTrail,
//!     },
//! ];
//!
//! let athlete = AthleteProfile::default();
//! let plan = plan_race(&segments, &athlete, PacingMode::BasePace, &PlanConfig::default()).unwrap();
//!
//! assert_eq!(plan.segments.len(), 2);
//! assert!(plan.summary.total_time_min > 0.0);
//! ```

use serde::{Deserialize, Serialize};

pub mod allocate;
pub mod error;
pub mod geo_utils;
pub mod pace;
pub mod predict;
pub mod report;
pub mod segments;
pub mod simulate;
pub mod thresholds;

pub use allocate::{allocate_effort, Allocation, EffortLevel};
pub use error::PlanError;
pub use report::{dropbag_plan, DropBag, RacePlan, SegmentPlan};
pub use simulate::{natural_pacing, Simulation};
pub use thresholds::EffortThresholds;

use chrono::NaiveTime;

// ============================================================================
// Core Types
// ============================================================================

/// A raw GPS sample: position plus elevation.
///
/// # Example
/// ```
/// use pace_planner::TrackPoint;
/// let point = TrackPoint::new(45.9237, 6.8694, 1035.0); // Chamonix
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Elevation in meters.
    pub elevation: f64,
}

impl TrackPoint {
    pub fn new(latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self { latitude, longitude, elevation }
    }

    /// Check the point has finite, in-range coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.elevation.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// One sample of a distance/elevation profile. Cumulative distance must be
/// non-decreasing along the profile; the reducer rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub distance_km: f64,
    pub elevation_m: f64,
}

impl RoutePoint {
    pub fn new(distance_km: f64, elevation_m: f64) -> Self {
        Self { distance_km, elevation_m }
    }
}

/// Ground surface of a segment, from easiest to hardest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Road,
    DirtRoad,
    RockyRunnable,
    Technical,
    VeryTechnical,
    Scrambling,
    /// Default surface. Unrecognized terrain strings deserialize to this.
    #[serde(other)]
    SmoothTrail,
}

impl Terrain {
    /// Base pace multiplier versus ideal smooth trail. Road sits below 1.0
    /// but the overall terrain factor is clamped to ≥ 1.0 downstream.
    pub fn base_factor(self) -> f64 {
        match self {
            Terrain::Road => 0.95,
            Terrain::SmoothTrail => 1.0,
            Terrain::DirtRoad => 1.05,
            Terrain::RockyRunnable => 1.15,
            Terrain::Technical => 1.325,
            Terrain::VeryTechnical => 1.65,
            Terrain::Scrambling => 2.0,
        }
    }

    /// How much of the gradient's downhill speed-up this surface allows.
    pub fn downhill_speed_cap(self) -> f64 {
        match self {
            Terrain::Road => 1.0,
            Terrain::SmoothTrail => 0.95,
            Terrain::DirtRoad => 0.90,
            Terrain::RockyRunnable => 0.80,
            Terrain::Technical => 0.70,
            Terrain::VeryTechnical => 0.60,
            Terrain::Scrambling => 0.50,
        }
    }
}

/// Climbing strength tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClimbingAbility {
    Conservative,
    Moderate,
    Strong,
    VeryStrong,
    Elite,
}

impl ClimbingAbility {
    /// Sustainable vertical ascent rate in meters per hour.
    pub fn vertical_speed_m_per_h(self) -> f64 {
        match self {
            ClimbingAbility::Conservative => 600.0,
            ClimbingAbility::Moderate => 800.0,
            ClimbingAbility::Strong => 1000.0,
            ClimbingAbility::VeryStrong => 1250.0,
            ClimbingAbility::Elite => 1500.0,
        }
    }

    /// (min_mult, max_mult) time bounds for adjusting a steep-climb segment
    /// relative to its natural time.
    pub fn adjustment_bounds(self) -> (f64, f64) {
        match self {
            ClimbingAbility::Conservative => (0.90, 1.35),
            ClimbingAbility::Moderate => (0.85, 1.30),
            ClimbingAbility::Strong => (0.80, 1.25),
            ClimbingAbility::VeryStrong => (0.75, 1.20),
            ClimbingAbility::Elite => (0.70, 1.15),
        }
    }

    /// Relative price of buying time on a steep climb; stronger climbers
    /// adjust more cheaply.
    pub fn adjustment_cost(self) -> f64 {
        match self {
            ClimbingAbility::Conservative => 1.2,
            ClimbingAbility::Moderate => 1.1,
            ClimbingAbility::Strong => 1.0,
            ClimbingAbility::VeryStrong => 0.85,
            ClimbingAbility::Elite => 0.75,
        }
    }
}

/// Endurance fitness tier. Controls fatigue onset and the deviation budget
/// available when chasing a target time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessLevel {
    Untrained,
    Recreational,
    Trained,
    Elite,
}

/// Fatigue curve parameters for one fitness tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FatigueParams {
    /// Cumulative km-effort below which no fatigue penalty applies.
    pub onset_km_effort: f64,
    pub alpha: f64,
    pub beta: f64,
}

impl FitnessLevel {
    pub fn fatigue_params(self) -> FatigueParams {
        match self {
            FitnessLevel::Untrained => FatigueParams { onset_km_effort: 25.0, alpha: 0.12, beta: 1.0 },
            FitnessLevel::Recreational => FatigueParams { onset_km_effort: 37.5, alpha: 0.10, beta: 1.0 },
            FitnessLevel::Trained => FatigueParams { onset_km_effort: 55.0, alpha: 0.08, beta: 0.95 },
            FitnessLevel::Elite => FatigueParams { onset_km_effort: 75.0, alpha: 0.06, beta: 0.90 },
        }
    }

    /// Fraction of natural total time this athlete can deviate by when
    /// chasing a target.
    pub fn deviation_budget(self) -> f64 {
        match self {
            FitnessLevel::Untrained => 0.15,
            FitnessLevel::Recreational => 0.25,
            FitnessLevel::Trained => 0.35,
            FitnessLevel::Elite => 0.50,
        }
    }

    /// Ceiling of the late-race effort-cost ramp used during allocation.
    pub fn fatigue_cost_factor(self) -> f64 {
        match self {
            FitnessLevel::Untrained => 1.5,
            FitnessLevel::Recreational => 1.3,
            FitnessLevel::Trained => 1.15,
            FitnessLevel::Elite => 1.05,
        }
    }
}

/// Immutable description of the athlete being planned for. Passed by
/// reference into pure functions; nothing in the engine mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AthleteProfile {
    /// Sustainable flat pace in minutes per kilometer.
    pub base_pace_min_per_km: f64,
    pub climbing_ability: ClimbingAbility,
    pub fitness_level: FitnessLevel,
    /// Technical skill from 0.0 (novice) to 1.0 (expert).
    pub skill_level: f64,
    pub fatigue_enabled: bool,
}

impl Default for AthleteProfile {
    fn default() -> Self {
        Self {
            base_pace_min_per_km: 6.0,
            climbing_ability: ClimbingAbility::Moderate,
            fitness_level: FitnessLevel::Recreational,
            skill_level: 0.5,
            fatigue_enabled: true,
        }
    }
}

impl AthleteProfile {
    /// Validate field ranges before planning.
    pub fn validate(&self) -> Result<(), PlanError> {
        if !(self.base_pace_min_per_km > 0.0) || !self.base_pace_min_per_km.is_finite() {
            return Err(PlanError::InvalidAthlete(format!(
                "base pace must be a positive finite number of min/km, got {}",
                self.base_pace_min_per_km
            )));
        }
        if !(0.0..=1.0).contains(&self.skill_level) {
            return Err(PlanError::InvalidAthlete(format!(
                "skill level must be within 0.0..=1.0, got {}",
                self.skill_level
            )));
        }
        Ok(())
    }
}

/// How the plan is paced: run at the natural sustainable effort, or chase an
/// externally imposed total race time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PacingMode {
    BasePace,
    /// Target total race time in minutes, checkpoint dwell included.
    TargetTime(f64),
}

/// Plan-wide options: checkpoint dwell, nutrition rates, and race start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Minutes spent at each checkpoint.
    pub avg_checkpoint_time_min: f64,
    pub carbs_per_hour_g: f64,
    pub water_per_hour_ml: f64,
    /// When set, segment carb targets also get a gel count.
    pub carbs_per_gel_g: Option<f64>,
    /// When set, each segment reports the clock time at its end.
    pub race_start: Option<NaiveTime>,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            avg_checkpoint_time_min: 5.0,
            carbs_per_hour_g: 60.0,
            water_per_hour_ml: 500.0,
            carbs_per_gel_g: None,
            race_start: None,
        }
    }
}

// ============================================================================
// Planning Entry Points
// ============================================================================

/// Plan a race over pre-reduced segments.
///
/// In [`PacingMode::BasePace`] the plan is the natural simulation. In
/// [`PacingMode::TargetTime`] the checkpoint dwell is subtracted from the
/// target, the remaining moving time is allocated across segments, and the
/// route's effort thresholds are computed alongside.
///
/// # Errors
///
/// Rejects invalid athletes, empty courses, and targets at or below the total
/// checkpoint dwell time.
pub fn plan_race(
    course: &[segments::Segment],
    athlete: &AthleteProfile,
    mode: PacingMode,
    config: &PlanConfig,
) -> Result<RacePlan, PlanError> {
    athlete.validate()?;
    let natural = simulate::natural_pacing(course, athlete)?;

    match mode {
        PacingMode::BasePace => Ok(report::assemble(&natural, None, None, config)),
        PacingMode::TargetTime(target_total_min) => {
            let num_checkpoints = course.len().saturating_sub(1);
            let dwell_min = num_checkpoints as f64 * config.avg_checkpoint_time_min;
            if target_total_min <= dwell_min {
                return Err(PlanError::TargetBelowDwell {
                    target_min: target_total_min,
                    dwell_min,
                });
            }

            let allocation = allocate::allocate_effort(target_total_min - dwell_min, &natural, athlete);
            let thresholds = thresholds::classify(
                &natural,
                athlete,
                num_checkpoints,
                config.avg_checkpoint_time_min,
            );
            Ok(report::assemble(&natural, Some(&allocation), thresholds, config))
        }
    }
}

/// Plan a race straight from a GPS track.
///
/// The track is collapsed into a distance/elevation profile, cut into
/// segments at the requested checkpoint distances, and planned with
/// [`plan_race`]. `terrains` supplies one surface per segment; missing
/// entries default to smooth trail.
pub fn plan_race_from_track(
    track: &[TrackPoint],
    checkpoint_distances: &[f64],
    terrains: &[Terrain],
    athlete: &AthleteProfile,
    mode: PacingMode,
    config: &PlanConfig,
) -> Result<RacePlan, PlanError> {
    let profile = geo_utils::track_to_profile(track);
    let course = segments::reduce(&profile, checkpoint_distances, terrains)?;
    plan_race(&course, athlete, mode, config)
}

/// One request of a planning batch.
#[cfg(feature = "parallel")]
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    pub course: Vec<segments::Segment>,
    pub athlete: AthleteProfile,
    pub mode: PacingMode,
    pub config: PlanConfig,
}

/// Plan many independent races in parallel.
///
/// Each request is stateless, so requests are simply fanned out with rayon;
/// results come back in input order.
#[cfg(feature = "parallel")]
pub fn plan_race_batch(requests: &[PlanRequest]) -> Vec<Result<RacePlan, PlanError>> {
    use rayon::prelude::*;

    requests
        .par_iter()
        .map(|r| plan_race(&r.course, &r.athlete, r.mode, &r.config))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
