//! Great-circle distance helpers.
//!
//! All distances in this system are statute miles: geofence radii come from
//! dispatcher-facing configuration and FMCSA paperwork is mile-based.

use geo::{HaversineDistance, Point};

/// Meters per statute mile.
const METERS_PER_MILE: f64 = 1609.344;

/// Haversine distance between two WGS84 coordinates, in statute miles.
pub fn distance_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    // geo points are (x, y) = (lon, lat)
    let a = Point::new(lon1, lat1);
    let b = Point::new(lon2, lat2);
    a.haversine_distance(&b) / METERS_PER_MILE
}

/// Whether a point lies within `radius_miles` of a reference point.
///
/// Boundary is inclusive: a point exactly on the radius is inside.
pub fn within_radius(lat: f64, lon: f64, center_lat: f64, center_lon: f64, radius_miles: f64) -> bool {
    distance_miles(lat, lon, center_lat, center_lon) <= radius_miles
}

#[cfg(test)]
mod tests {
    use super::*;

    // Boise downtown to Boise airport, roughly 3.4 miles.
    const DOWNTOWN: (f64, f64) = (43.6150, -116.2023);
    const AIRPORT: (f64, f64) = (43.5644, -116.2228);

    #[test]
    fn test_distance_zero_for_same_point() {
        let d = distance_miles(DOWNTOWN.0, DOWNTOWN.1, DOWNTOWN.0, DOWNTOWN.1);
        assert!(d.abs() < 1e-9);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let d1 = distance_miles(DOWNTOWN.0, DOWNTOWN.1, AIRPORT.0, AIRPORT.1);
        let d2 = distance_miles(AIRPORT.0, AIRPORT.1, DOWNTOWN.0, DOWNTOWN.1);
        assert!((d1 - d2).abs() < 1e-9);
    }

    #[test]
    fn test_distance_known_pair() {
        let d = distance_miles(DOWNTOWN.0, DOWNTOWN.1, AIRPORT.0, AIRPORT.1);
        assert!(d > 3.0 && d < 4.0, "expected ~3.4 miles, got {}", d);
    }

    #[test]
    fn test_within_radius_inside() {
        // ~0.07 miles north of downtown
        assert!(within_radius(43.6160, -116.2023, DOWNTOWN.0, DOWNTOWN.1, 0.5));
    }

    #[test]
    fn test_within_radius_outside() {
        assert!(!within_radius(AIRPORT.0, AIRPORT.1, DOWNTOWN.0, DOWNTOWN.1, 0.5));
    }

    #[test]
    fn test_within_radius_boundary_inclusive() {
        let d = distance_miles(DOWNTOWN.0, DOWNTOWN.1, AIRPORT.0, AIRPORT.1);
        assert!(within_radius(AIRPORT.0, AIRPORT.1, DOWNTOWN.0, DOWNTOWN.1, d + 1e-9));
    }
}
