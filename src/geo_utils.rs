//! # Geographic Utilities
//!
//! Core geographic computation for GPS track reduction.
//!
//! This module provides the distance and elevation primitives the segment
//! reducer is built on. All functions operate on plain slices and perform no
//! I/O.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_km`] | Great-circle distance between two GPS points in km |
//! | [`cumulative_distances`] | Running distance at each point of a track |
//! | [`track_to_profile`] | Collapse a GPS track into a distance/elevation profile |
//! | [`elevation_change`] | Per-sample elevation gain and loss over an index range |
//! | [`total_elevation_change`] | Gain and loss over a whole profile |
//!
//! ## Algorithm Notes
//!
//! ### Haversine Formula
//!
//! Great-circle distance on a spherical Earth. Accurate to within 0.3% for
//! practical GPS data, and the standard choice for running-distance
//! computation.
//!
//! ### Elevation Accumulation
//!
//! Gain and loss are accumulated independently from every consecutive pair
//! of samples. Summing a net change at a coarser grain would understate
//! total climbing on rolling terrain, so the per-sample deltas are the
//! source of truth.

use geo::{Distance, Haversine, Point};

use crate::{RoutePoint, TrackPoint};

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance between two GPS points in kilometers.
///
/// Uses the haversine formula on a spherical Earth. WGS84 latitude and
/// longitude in degrees are expected, as produced by GPS receivers.
///
/// # Example
///
/// ```rust
/// use pace_planner::{TrackPoint, geo_utils};
///
/// // One degree of longitude at the equator is ~111.19 km
/// let a = TrackPoint::new(0.0, 0.0, 0.0);
/// let b = TrackPoint::new(0.0, 1.0, 0.0);
/// let dist = geo_utils::haversine_km(&a, &b);
/// assert!((dist - 111.19).abs() / 111.19 < 0.005);
/// ```
#[inline]
pub fn haversine_km(p1: &TrackPoint, p2: &TrackPoint) -> f64 {
    let point1 = Point::new(p1.longitude, p1.latitude);
    let point2 = Point::new(p2.longitude, p2.latitude);
    Haversine::distance(point1, point2) / 1000.0
}

/// Cumulative distance in kilometers at each point of a GPS track.
///
/// The first entry is always 0.0; entry `i` is the summed haversine distance
/// over points `[0, i]`. Returns an empty vector for an empty track.
pub fn cumulative_distances(track: &[TrackPoint]) -> Vec<f64> {
    if track.is_empty() {
        return vec![];
    }

    let mut distances = Vec::with_capacity(track.len());
    distances.push(0.0);

    let mut cumulative = 0.0;
    for pair in track.windows(2) {
        cumulative += haversine_km(&pair[0], &pair[1]);
        distances.push(cumulative);
    }

    distances
}

/// Collapse a GPS track into an ordered distance/elevation profile.
///
/// This is the track-file side of geometry reduction: once a profile exists,
/// the rest of the engine never looks at latitude or longitude again.
/// Invalid points are skipped.
///
/// # Example
///
/// ```rust
/// use pace_planner::{TrackPoint, geo_utils};
///
/// let track = vec![
///     TrackPoint::new(46.0, 7.0, 1200.0),
///     TrackPoint::new(46.01, 7.0, 1250.0),
///     TrackPoint::new(46.02, 7.0, 1220.0),
/// ];
///
/// let profile = geo_utils::track_to_profile(&track);
/// assert_eq!(profile.len(), 3);
/// assert_eq!(profile[0].distance_km, 0.0);
/// assert!(profile[2].distance_km > profile[1].distance_km);
/// ```
pub fn track_to_profile(track: &[TrackPoint]) -> Vec<RoutePoint> {
    let valid: Vec<TrackPoint> = track.iter().filter(|p| p.is_valid()).copied().collect();
    let distances = cumulative_distances(&valid);

    valid
        .iter()
        .zip(distances)
        .map(|(p, d)| RoutePoint::new(d, p.elevation))
        .collect()
}

// =============================================================================
// Elevation Functions
// =============================================================================

/// Elevation gain and loss between two profile indices, in meters.
///
/// Accumulates positive deltas into gain and absolute negative deltas into
/// loss over every consecutive pair in `[start_idx, end_idx]`. The two are
/// tracked independently; this is NOT the net elevation change.
///
/// Indices past the end of the profile are clamped.
pub fn elevation_change(profile: &[RoutePoint], start_idx: usize, end_idx: usize) -> (f64, f64) {
    let end_idx = end_idx.min(profile.len().saturating_sub(1));
    let mut gain = 0.0;
    let mut loss = 0.0;

    for i in start_idx..end_idx {
        let delta = profile[i + 1].elevation_m - profile[i].elevation_m;
        if delta > 0.0 {
            gain += delta;
        } else {
            loss += -delta;
        }
    }

    (gain, loss)
}

/// Total elevation gain and loss over a whole profile, in meters.
pub fn total_elevation_change(profile: &[RoutePoint]) -> (f64, f64) {
    if profile.is_empty() {
        return (0.0, 0.0);
    }
    elevation_change(profile, 0, profile.len() - 1)
}

// =============================================================================
// Unit Tests
// =============================================================================
