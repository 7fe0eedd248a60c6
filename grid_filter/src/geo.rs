//! Spherical earth helpers: km per degree, great circles and IMG Mercator y.

use std::f64::consts::PI;

/// Mean earth radius.
pub const EARTH_RADIUS_KM: f64 = 6371.0087714;

/// Length of one degree of arc on the mean sphere.
pub const KM_PER_DEGREE: f64 = EARTH_RADIUS_KM * PI / 180.0;

/// Latitude for a spherical Mercator (IMG) y value in degrees.
#[inline]
pub fn img_to_lat(y: f64) -> f64 {
    2.0 * y.to_radians().exp().atan().to_degrees() - 90.0
}

/// Spherical Mercator (IMG) y for a latitude; infinite at the poles.
#[inline]
pub fn lat_to_img(lat: f64) -> f64 {
    (0.5 * (lat + 90.0)).to_radians().tan().ln().to_degrees()
}

/// Haversine distance between two lon/lat points in degrees.
pub fn great_circle_km(lon0: f64, lat0: f64, lon1: f64, lat1: f64) -> f64 {
    let (lat0, lat1) = (lat0.to_radians(), lat1.to_radians());
    let half_dlat = 0.5 * (lat1 - lat0);
    let half_dlon = 0.5 * (lon1 - lon0).to_radians();
    let h = half_dlat.sin().powi(2) + lat0.cos() * lat1.cos() * half_dlon.sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_km_per_degree() {
        assert!((KM_PER_DEGREE - 111.19508).abs() < 1e-4);
    }

    #[test]
    fn test_img_lat_inverse() {
        for lat in [-80.0, -45.0, -1.0, 0.0, 12.5, 72.0] {
            let back = img_to_lat(lat_to_img(lat));
            assert!((back - lat).abs() < 1e-9, "lat {lat} -> {back}");
        }
        assert_eq!(lat_to_img(0.0), 0.0);
    }

    #[test]
    fn test_img_stretches_high_latitudes() {
        assert!(lat_to_img(60.0) > 60.0);
        assert!(lat_to_img(89.9) > 300.0);
    }

    #[test]
    fn test_great_circle_along_equator() {
        let d = great_circle_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - KM_PER_DEGREE).abs() < 1e-9);
    }

    #[test]
    fn test_great_circle_meridian_convergence() {
        let at_equator = great_circle_km(0.0, 0.0, 10.0, 0.0);
        let at_sixty = great_circle_km(0.0, 60.0, 10.0, 60.0);
        assert!(at_sixty < 0.51 * at_equator);
        assert!(at_sixty > 0.49 * at_equator);
    }

    #[test]
    fn test_great_circle_antipodes() {
        let d = great_circle_km(0.0, 0.0, 180.0, 0.0);
        assert!((d - PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }
}
