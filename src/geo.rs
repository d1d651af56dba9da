//! Great-circle distance between two coordinates.

use crate::constants::geo::EARTH_RADIUS_KM;
use crate::types::{Degrees, Kilometers};

/// Haversine distance in kilometers between `(lng1, lat1)` and `(lng2, lat2)`.
///
/// Inputs are signed decimal degrees. The function is symmetric in its two
/// coordinate pairs, returns zero for identical coordinates, and cannot fail
/// for any finite input.
pub fn distance_km(lng1: Degrees, lat1: Degrees, lng2: Degrees, lat2: Degrees) -> Kilometers {
    fn haversine(theta: f64) -> f64 {
        let h = (theta / 2.0).sin();
        h * h
    }
    let (lng1, lat1) = (lng1.to_radians(), lat1.to_radians());
    let (lng2, lat2) = (lng2.to_radians(), lat2.to_radians());
    let dlng = (lng1 - lng2).abs();
    let dlat = (lat1 - lat2).abs();
    let hav = haversine(dlat) + lat1.cos() * lat2.cos() * haversine(dlng);
    2.0 * EARTH_RADIUS_KM * hav.sqrt().asin()
}
