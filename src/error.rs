//! # Error Types
//!
//! Error taxonomy for the pacing engine.
//!
//! The engine distinguishes hard input rejections from soft degradations:
//! invalid inputs (negative distances, malformed time strings, unreachable
//! target times) are rejected immediately with a [`PlanError`], while an
//! infeasible-but-parseable target time or a zero-capacity allocation degrade
//! to documented fallback behaviour and are surfaced as flags on the result,
//! never as errors.

use thiserror::Error;

/// Errors returned by the pacing engine.
///
/// All variants represent contract violations at the input boundary. The
/// engine itself is pure computation and has no I/O failure modes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    /// The route profile contained no points.
    #[error("route profile is empty")]
    EmptyProfile,

    /// Cumulative distances in the route profile went backwards.
    #[error("route distances must be non-decreasing: {previous:.3} km followed by {current:.3} km")]
    NonMonotonicProfile { previous: f64, current: f64 },

    /// A segment was constructed with a negative distance.
    #[error("segment distance must not be negative: {0:.3} km")]
    NegativeDistance(f64),

    /// The athlete profile failed validation.
    #[error("invalid athlete profile: {0}")]
    InvalidAthlete(String),

    /// The requested target time leaves no moving time after checkpoint dwell.
    #[error("target time {target_min:.1} min must exceed total checkpoint dwell of {dwell_min:.1} min")]
    TargetBelowDwell { target_min: f64, dwell_min: f64 },

    /// A time or pace string did not match the expected format.
    #[error("malformed time string {input:?}: expected {expected}")]
    MalformedTime { input: String, expected: &'static str },

    /// Any other invalid input with a descriptive reason.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
