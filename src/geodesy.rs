// Distances between GPS fixes

use geo::{Distance, Geodesic, Point};
use serde::{Deserialize, Serialize};
use uom::si::f64::Length;
use uom::si::length::{foot, meter};

/// A latitude/longitude pair in decimal degrees
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    fn to_geo(self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }
}

/// Geodesic distance on the WGS-84 ellipsoid. Coordinates are not validated.
pub fn distance(p1: GeoPoint, p2: GeoPoint) -> Length {
    Length::new::<meter>(Geodesic::distance(p1.to_geo(), p2.to_geo()))
}

pub fn distance_feet(p1: GeoPoint, p2: GeoPoint) -> f64 {
    distance(p1, p2).get::<foot>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        let p = GeoPoint::new(36.5667, -79.2064);
        assert_eq!(distance_feet(p, p), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = GeoPoint::new(27.4544, -81.3484);
        let b = GeoPoint::new(27.4551, -81.3470);
        let ab = distance_feet(a, b);
        let ba = distance_feet(b, a);
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn test_equator_arc_matches_semi_major_axis() {
        // Along the equator the geodesic is the equator itself: a * dlambda
        let d_lng = 0.001_f64;
        let expected_m = 6_378_137.0 * d_lng.to_radians();
        let got_ft = distance_feet(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, d_lng));
        assert!((got_ft - expected_m / 0.3048).abs() < 0.01);
    }

    #[test]
    fn test_one_arc_minute_of_latitude_is_about_a_nautical_mile() {
        let a = GeoPoint::new(45.0, 0.0);
        let b = GeoPoint::new(45.0 + 1.0 / 60.0, 0.0);
        let ft = distance_feet(a, b);
        // 1 nmi = 6076.1 ft, ellipsoid varies it slightly with latitude
        assert!((ft - 6076.1).abs() < 15.0, "got {ft}");
    }
}
