//! Great-circle distance and distance badge text.
//!
//! # Invariants
//! - One Earth radius constant is used for every distance in the crate.
//! - Missing coordinates produce `None`, never an error.

use crate::model::household::{GeoPoint, Household, LocationPrecision};

/// Mean Earth radius in miles used by every haversine computation.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

const NEAR_THRESHOLD_MILES: f64 = 0.1;

/// Haversine distance between two points, in miles.
pub fn haversine_miles(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_MILES * c
}

/// Distance from the viewer to a household, or `None` when either side has
/// no coordinates.
pub fn household_distance(household: &Household, viewer: Option<GeoPoint>) -> Option<f64> {
    let viewer = viewer?;
    let location = household.location?;
    Some(haversine_miles(viewer, location))
}

/// Formats the distance badge.
///
/// - `< 0.1 miles` below the near threshold, `~{x.y} miles` otherwise.
/// - ZIP-approximate locations get an ` (approx)` suffix.
/// - `None` distance means no badge.
pub fn distance_label(distance_miles: Option<f64>, precision: LocationPrecision) -> Option<String> {
    let distance = distance_miles?;
    let mut label = if distance < NEAR_THRESHOLD_MILES {
        "< 0.1 miles".to_string()
    } else {
        format!("~{distance:.1} miles")
    };
    if precision == LocationPrecision::ZipApproximate {
        label.push_str(" (approx)");
    }
    Some(label)
}
