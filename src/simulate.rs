//! # Natural Pacing Simulation
//!
//! Runs the segment pace model over an entire course in order, threading
//! cumulative km-effort so fatigue in late segments reflects the ground
//! already covered. The result is the "natural" race: how the athlete would
//! run at their sustainable base effort with no time target.
//!
//! Ordering matters here. Each segment is predicted with the effort
//! accumulated strictly *before* it; its own km-effort is added to the
//! running total only afterwards. Reordering segments changes the outcome,
//! which is exactly the point of a fatigue model.

use serde::{Deserialize, Serialize};

use crate::error::PlanError;
use crate::pace::{self, SegmentPrediction};
use crate::segments::Segment;
use crate::AthleteProfile;

/// One simulated segment: the input geometry plus the model's prediction
/// and the effort state at its start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedSegment {
    pub segment: Segment,
    pub prediction: SegmentPrediction,
    /// km-effort accumulated before this segment started.
    pub effort_at_start: f64,
    /// Race time in minutes when this segment started (moving time only).
    pub elapsed_at_start_min: f64,
}

/// Full natural-pacing simulation of a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub segments: Vec<SimulatedSegment>,
    /// Total moving time in minutes, excluding checkpoint dwell.
    pub total_time_min: f64,
    pub total_distance_km: f64,
    pub total_gain_m: f64,
    pub total_loss_m: f64,
    /// km-effort for the whole course.
    pub total_effort_km: f64,
}

impl Simulation {
    /// Average moving pace over the course, or 0 for an empty course.
    pub fn average_pace_min_per_km(&self) -> f64 {
        if self.total_distance_km > 0.0 {
            self.total_time_min / self.total_distance_km
        } else {
            0.0
        }
    }
}

/// Simulate the athlete running every segment at natural effort.
///
/// # Errors
///
/// Returns [`PlanError::EmptyProfile`] for an empty segment list and
/// propagates any per-segment prediction error.
pub fn natural_pacing(
    segments: &[Segment],
    athlete: &AthleteProfile,
) -> Result<Simulation, PlanError> {
    if segments.is_empty() {
        return Err(PlanError::EmptyProfile);
    }

    let mut simulated = Vec::with_capacity(segments.len());
    let mut cumulative_effort = 0.0;
    let mut elapsed_min = 0.0;
    let mut total_distance = 0.0;
    let mut total_gain = 0.0;
    let mut total_loss = 0.0;

    for segment in segments {
        let prediction = pace::predict(segment, athlete, cumulative_effort)?;

        simulated.push(SimulatedSegment {
            segment: segment.clone(),
            prediction: prediction.clone(),
            effort_at_start: cumulative_effort,
            elapsed_at_start_min: elapsed_min,
        });

        elapsed_min += prediction.time_min;
        cumulative_effort += pace::segment_effort_km(segment);
        total_distance += segment.distance_km;
        total_gain += segment.elevation_gain_m;
        total_loss += segment.elevation_loss_m;
    }

    Ok(Simulation {
        segments: simulated,
        total_time_min: elapsed_min,
        total_distance_km: total_distance,
        total_gain_m: total_gain,
        total_loss_m: total_loss,
        total_effort_km: cumulative_effort,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
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

    fn athlete(fatigue: bool) -> AthleteProfile {
        AthleteProfile {
            base_pace_min_per_km: 6.0,
            climbing_ability: ClimbingAbility::Moderate,
            fitness_level: FitnessLevel::Recreational,
            skill_level: 0.5,
            fatigue_enabled: fatigue,
        }
    }

    #[test]
    fn test_empty_course_rejected() {
        assert_eq!(natural_pacing(&[], &athlete(false)), Err(PlanError::EmptyProfile));
    }

    #[test]
    fn test_totals_accumulate() {
        let segs = vec![
            segment("A", 10.0, 300.0, 100.0),
            segment("B", 15.0, 200.0, 400.0),
        ];
        let sim = natural_pacing(&segs, &athlete(false)).unwrap();

        assert_eq!(sim.segments.len(), 2);
        assert!(approx_eq(sim.total_distance_km, 25.0, 1e-9));
        assert!(approx_eq(sim.total_gain_m, 500.0, 1e-9));
        assert!(approx_eq(sim.total_loss_m, 500.0, 1e-9));
        // Effort: (10 + 3 + 0.5) + (15 + 2 + 2) = 32.5
        assert!(approx_eq(sim.total_effort_km, 32.5, 1e-9));

        let sum: f64 = sim.segments.iter().map(|s| s.prediction.time_min).sum();
        assert!(approx_eq(sim.total_time_min, sum, 1e-9));
    }

    #[test]
    fn test_effort_threaded_in_order() {
        let segs = vec![
            segment("A", 20.0, 1000.0, 0.0),
            segment("B", 20.0, 0.0, 1000.0),
        ];
        let sim = natural_pacing(&segs, &athlete(true)).unwrap();

        assert_eq!(sim.segments[0].effort_at_start, 0.0);
        // Segment A contributes 20 + 10 = 30 km-effort
        assert!(approx_eq(sim.segments[1].effort_at_start, 30.0, 1e-9));
        assert!(approx_eq(
            sim.segments[1].elapsed_at_start_min,
            sim.segments[0].prediction.time_min,
            1e-9
        ));
    }

    #[test]
    fn test_segment_effort_excludes_own_contribution() {
        // Two identical flat segments long enough to cross the fatigue onset.
        // The first must be predicted fatigue-free even though its own effort
        // would exceed the onset point.
        let segs = vec![segment("A", 50.0, 0.0, 0.0), segment("B", 50.0, 0.0, 0.0)];
        let sim = natural_pacing(&segs, &athlete(true)).unwrap();

        assert_eq!(sim.segments[0].prediction.fatigue_seconds_per_km, 0.0);
        assert!(sim.segments[1].prediction.fatigue_seconds_per_km > 0.0);
        assert!(
            sim.segments[1].prediction.pace_min_per_km > sim.segments[0].prediction.pace_min_per_km
        );
    }

    #[test]
    fn test_fatigue_off_makes_identical_segments_identical() {
        let segs = vec![segment("A", 30.0, 0.0, 0.0), segment("B", 30.0, 0.0, 0.0)];
        let sim = natural_pacing(&segs, &athlete(false)).unwrap();
        assert_eq!(sim.segments[0].prediction, sim.segments[1].prediction);
    }

    #[test]
    fn test_average_pace() {
        let segs = vec![segment("A", 10.0, 0.0, 0.0)];
        let sim = natural_pacing(&segs, &athlete(false)).unwrap();
        assert!(approx_eq(
            sim.average_pace_min_per_km(),
            sim.total_time_min / 10.0,
            1e-9
        ));
    }
}
