//! # Plan Reporting
//!
//! Turns the numeric engine output into the quantities a runner actually
//! reads off a pace chart: cumulative times, clock time of day, per-segment
//! nutrition targets, and drop-bag contents.
//!
//! The canonical engine output stays minute-valued floats; everything here
//! is derived presentation. Formatting helpers follow race-chart
//! conventions: `HH:MM:SS` for durations, `M:SS` for paces, both truncating
//! (not rounding) the sub-unit remainder.

use chrono::{Duration, NaiveTime};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::allocate::{Allocation, EffortLevel};
use crate::error::PlanError;
use crate::pace;
use crate::simulate::Simulation;
use crate::thresholds::EffortThresholds;
use crate::PlanConfig;

// =============================================================================
// Time Formatting and Parsing
// =============================================================================

/// Format a duration in minutes as `HH:MM:SS`.
pub fn format_hms(minutes: f64) -> String {
    let hours = (minutes / 60.0) as u64;
    let mins = (minutes % 60.0) as u64;
    let secs = ((minutes % 1.0) * 60.0) as u64;
    format!("{hours:02}:{mins:02}:{secs:02}")
}

/// Format a pace in min/km as `M:SS`.
pub fn format_pace(min_per_km: f64) -> String {
    let mins = min_per_km as u64;
    let secs = ((min_per_km % 1.0) * 60.0) as u64;
    format!("{mins}:{secs:02}")
}

/// Parse `HH:MM:SS` or `HH:MM` into minutes.
pub fn parse_hms(input: &str) -> Result<f64, PlanError> {
    let malformed = || PlanError::MalformedTime {
        input: input.to_string(),
        expected: "HH:MM:SS or HH:MM",
    };

    let parts: Vec<&str> = input.split(':').collect();
    if parts.len() != 2 && parts.len() != 3 {
        return Err(malformed());
    }

    let mut fields = [0u32; 3];
    for (slot, part) in fields.iter_mut().zip(&parts) {
        *slot = part.parse().map_err(|_| malformed())?;
    }
    let (hours, mins, secs) = (fields[0], fields[1], fields[2]);
    if mins >= 60 || secs >= 60 {
        return Err(malformed());
    }

    Ok(hours as f64 * 60.0 + mins as f64 + secs as f64 / 60.0)
}

/// Parse `MM:SS` into a pace in min/km.
pub fn parse_pace(input: &str) -> Result<f64, PlanError> {
    let malformed = || PlanError::MalformedTime {
        input: input.to_string(),
        expected: "MM:SS",
    };

    let (mins, secs) = input.split_once(':').ok_or_else(malformed)?;
    let mins: u32 = mins.parse().map_err(|_| malformed())?;
    let secs: u32 = secs.parse().map_err(|_| malformed())?;
    if secs >= 60 {
        return Err(malformed());
    }

    Ok(mins as f64 + secs as f64 / 60.0)
}

// =============================================================================
// Nutrition
// =============================================================================

/// Carbohydrate target in grams for one segment, rounded to the nearest 10 g.
pub fn carbs_target_g(segment_time_min: f64, carbs_per_hour_g: f64) -> f64 {
    let hours = segment_time_min / 60.0;
    (hours * carbs_per_hour_g / 10.0).round() * 10.0
}

/// Water target in liters for one segment, rounded to the nearest 0.1 L.
pub fn water_target_l(segment_time_min: f64, water_per_hour_ml: f64) -> f64 {
    let hours = segment_time_min / 60.0;
    (hours * water_per_hour_ml / 1000.0 * 10.0).round() / 10.0
}

/// Gel count covering a carbohydrate target.
pub fn gels_for(carbs_g: f64, carbs_per_gel_g: f64) -> u32 {
    (carbs_g / carbs_per_gel_g).round() as u32
}

// =============================================================================
// Assembled Plan
// =============================================================================

/// One row of the final pace chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentPlan {
    pub from_label: String,
    pub to_label: String,
    pub distance_km: f64,
    pub elevation_gain_m: f64,
    pub elevation_loss_m: f64,
    pub pace_min_per_km: f64,
    pub elevation_adjusted_pace: f64,
    pub fatigue_seconds_per_km: f64,
    pub terrain_factor: f64,
    pub pace_capped: bool,
    pub effort_level: EffortLevel,
    pub time_min: f64,
    /// Race time at the end of this segment, dwell included.
    pub cumulative_time_min: f64,
    /// km-effort this segment contributes.
    pub effort_km: f64,
    /// km-effort absorbed through the end of this segment.
    pub cumulative_effort_km: f64,
    pub carbs_g: f64,
    pub water_l: f64,
    pub num_gels: Option<u32>,
    /// Clock time at the end of this segment, when a race start is set.
    pub time_of_day: Option<NaiveTime>,
}

/// Aggregate totals for a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub total_distance_km: f64,
    pub total_gain_m: f64,
    pub total_loss_m: f64,
    pub moving_time_min: f64,
    /// Total checkpoint dwell in minutes.
    pub checkpoint_time_min: f64,
    /// Moving time plus dwell.
    pub total_time_min: f64,
    pub average_pace_min_per_km: f64,
    pub total_carbs_g: f64,
    pub total_water_l: f64,
}

/// Complete race plan: per-segment chart plus totals and, in target mode,
/// the route's effort envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RacePlan {
    pub segments: Vec<SegmentPlan>,
    pub summary: PlanSummary,
    /// False only when a requested target exceeded the athlete's budget.
    pub target_met: bool,
    pub thresholds: Option<EffortThresholds>,
}

/// Supplies to stage in one drop bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropBag {
    /// "Start" or the checkpoint label the bag waits at.
    pub checkpoint: String,
    pub carbs_g: f64,
    pub water_l: f64,
    pub num_gels: Option<u32>,
    /// Carbs actually carried once rounded to whole gels.
    pub actual_carbs_g: Option<f64>,
}

/// Build the final plan from a simulation and an optional allocation.
///
/// Cumulative times insert `avg_checkpoint_time_min` of dwell before every
/// segment after the first. Clock times wrap past midnight.
pub fn assemble(
    natural: &Simulation,
    allocation: Option<&Allocation>,
    thresholds: Option<EffortThresholds>,
    config: &PlanConfig,
) -> RacePlan {
    let mut segments = Vec::with_capacity(natural.segments.len());
    let mut cumulative_min = 0.0;
    let mut checkpoint_min = 0.0;
    let mut total_carbs = 0.0;
    let mut total_water = 0.0;

    for (i, sim) in natural.segments.iter().enumerate() {
        let (time_min, pace, effort_level) = match allocation {
            Some(alloc) => {
                let a = &alloc.segments[i];
                (a.time_min, a.required_pace_min_per_km, a.effort_level)
            }
            None => (
                sim.prediction.time_min,
                sim.prediction.pace_min_per_km,
                EffortLevel::Steady,
            ),
        };

        if i > 0 {
            cumulative_min += config.avg_checkpoint_time_min;
            checkpoint_min += config.avg_checkpoint_time_min;
        }
        cumulative_min += time_min;

        let carbs = carbs_target_g(time_min, config.carbs_per_hour_g);
        let water = water_target_l(time_min, config.water_per_hour_ml);
        total_carbs += carbs;
        total_water += water;

        let num_gels = config
            .carbs_per_gel_g
            .filter(|g| *g > 0.0)
            .map(|g| gels_for(carbs, g));

        let time_of_day = config
            .race_start
            .map(|start| start + Duration::seconds((cumulative_min * 60.0).round() as i64));

        let effort_km = pace::segment_effort_km(&sim.segment);

        segments.push(SegmentPlan {
            from_label: sim.segment.from_label.clone(),
            to_label: sim.segment.to_label.clone(),
            distance_km: sim.segment.distance_km,
            elevation_gain_m: sim.segment.elevation_gain_m,
            elevation_loss_m: sim.segment.elevation_loss_m,
            pace_min_per_km: pace,
            elevation_adjusted_pace: sim.prediction.elevation_adjusted_pace,
            fatigue_seconds_per_km: sim.prediction.fatigue_seconds_per_km,
            terrain_factor: sim.prediction.terrain_factor,
            pace_capped: sim.prediction.pace_capped,
            effort_level,
            time_min,
            cumulative_time_min: cumulative_min,
            effort_km,
            cumulative_effort_km: sim.effort_at_start + effort_km,
            carbs_g: carbs,
            water_l: water,
            num_gels,
            time_of_day,
        });
    }

    let moving_time_min: f64 = segments.iter().map(|s| s.time_min).sum();
    let average_pace = if natural.total_distance_km > 0.0 {
        moving_time_min / natural.total_distance_km
    } else {
        0.0
    };

    RacePlan {
        segments,
        summary: PlanSummary {
            total_distance_km: natural.total_distance_km,
            total_gain_m: natural.total_gain_m,
            total_loss_m: natural.total_loss_m,
            moving_time_min,
            checkpoint_time_min: checkpoint_min,
            total_time_min: moving_time_min + checkpoint_min,
            average_pace_min_per_km: average_pace,
            total_carbs_g: total_carbs,
            total_water_l: total_water,
        },
        target_met: allocation.map_or(true, |a| a.target_met),
        thresholds,
    }
}

/// Plan drop-bag contents from a finished pace chart.
///
/// `checkpoint_dropbags[i]` says whether checkpoint `i` (0 = CP1) has a
/// bag. The start always carries the first segment's nutrition; every later
/// segment's nutrition goes into the bag at the nearest preceding drop-bag
/// checkpoint. Segments before the first drop bag beyond what the start
/// covers have nowhere to go and are skipped with a warning.
pub fn dropbag_plan(
    segments: &[SegmentPlan],
    checkpoint_dropbags: &[bool],
    carbs_per_gel_g: Option<f64>,
) -> Vec<DropBag> {
    let mut bags = Vec::new();
    let Some(first) = segments.first() else {
        return bags;
    };

    let gel_info = |carbs: f64| {
        carbs_per_gel_g.filter(|g| *g > 0.0).map(|g| {
            let n = gels_for(carbs, g);
            (n, (n as f64 * g * 100.0).round() / 100.0)
        })
    };

    let start_gels = gel_info(first.carbs_g);
    bags.push(DropBag {
        checkpoint: "Start".to_string(),
        carbs_g: first.carbs_g.round(),
        water_l: (first.water_l * 10.0).round() / 10.0,
        num_gels: start_gels.map(|(n, _)| n),
        actual_carbs_g: start_gels.map(|(_, c)| c),
    });

    let bag_checkpoints: Vec<usize> = checkpoint_dropbags
        .iter()
        .enumerate()
        .filter_map(|(i, has)| has.then_some(i))
        .collect();
    if bag_checkpoints.is_empty() {
        return bags;
    }

    // Accumulate each later segment into the nearest preceding bag
    let mut carbs = vec![0.0; bag_checkpoints.len()];
    let mut water = vec![0.0; bag_checkpoints.len()];
    for (seg_idx, seg) in segments.iter().enumerate().skip(1) {
        let checkpoint_idx = seg_idx - 1;
        match bag_checkpoints.iter().rposition(|&cp| cp <= checkpoint_idx) {
            Some(slot) => {
                carbs[slot] += seg.carbs_g;
                water[slot] += seg.water_l;
            }
            None => warn!(
                "segment {} -> {} precedes the first drop bag; nutrition not staged",
                seg.from_label, seg.to_label
            ),
        }
    }

    for (slot, &cp) in bag_checkpoints.iter().enumerate() {
        let carb_target = carbs[slot].round();
        let gels = gel_info(carb_target);
        bags.push(DropBag {
            checkpoint: format!("CP{}", cp + 1),
            carbs_g: carb_target,
            water_l: (water[slot] * 10.0).round() / 10.0,
            num_gels: gels.map(|(n, _)| n),
            actual_carbs_g: gels.map(|(_, c)| c),
        });
    }

    bags
}

// =============================================================================
// Unit Tests
// =============================================================================
