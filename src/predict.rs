//! # Performance Prediction
//!
//! Derives a sustainable base pace for a goal distance from one known race
//! result, using the Riegel power model with an extra endurance downshift
//! for ultra distances.
//!
//! ## Model
//!
//! Riegel: `t2 = t1 × (d2/d1)^1.06`. The 1.06 exponent holds well up to the
//! marathon; beyond 42.2 km intensity drops further than it predicts, so
//! ultra targets apply an additional `(d2/d1)^0.09` slowdown (equivalent to
//! raising the exponent to 1.15).

use crate::error::PlanError;

/// Riegel fatigue exponent, valid through marathon distance.
pub const RIEGEL_EXPONENT: f64 = 1.06;

/// Extra exponent applied past marathon distance.
const ULTRA_EXPONENT: f64 = 1.15;

const MARATHON_KM: f64 = 42.2;

/// Predicted race time in minutes for `target_km`, given a reference
/// performance of `reference_time_min` over `reference_km`.
pub fn race_time(
    reference_km: f64,
    reference_time_min: f64,
    target_km: f64,
) -> Result<f64, PlanError> {
    if reference_km <= 0.0 || target_km <= 0.0 {
        return Err(PlanError::InvalidInput(format!(
            "distances must be positive, got reference {reference_km} km and target {target_km} km"
        )));
    }
    if reference_time_min <= 0.0 {
        return Err(PlanError::InvalidInput(format!(
            "reference time must be positive, got {reference_time_min} min"
        )));
    }

    let ratio = target_km / reference_km;
    let mut time = reference_time_min * ratio.powf(RIEGEL_EXPONENT);

    // Ultra downshift: past the marathon, sustainable intensity falls
    // faster than Riegel alone predicts
    if target_km > MARATHON_KM {
        time *= ratio.powf(ULTRA_EXPONENT - RIEGEL_EXPONENT);
    }

    Ok(time)
}

/// Sustainable flat base pace (min/km) for `target_km`, derived from a
/// reference performance.
pub fn base_pace(
    reference_km: f64,
    reference_time_min: f64,
    target_km: f64,
) -> Result<f64, PlanError> {
    let time = race_time(reference_km, reference_time_min, target_km)?;
    Ok(time / target_km)
}

// =============================================================================
// Unit Tests
// =============================================================================
