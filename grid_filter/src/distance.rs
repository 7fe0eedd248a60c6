//! Distance metrics between a filter center and an input node.

use crate::geo;

/// Distance model selected once at setup.
///
/// Cartesian variants work in grid units (or km after scaling); the spherical
/// variant works in km on lon/lat degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceMetric {
    Cartesian,
    /// Isotropic degrees-to-km scaling.
    ScaledCartesian { scale: f64 },
    /// Independent x and y scales (flat-earth approximation).
    FlatEarth { x_scale: f64, y_scale: f64 },
    /// Great-circle km; points beyond a pole are reflected across it.
    Spherical,
    /// Inside (0) or outside (infinity) an axis-aligned box with the given
    /// half-widths in scaled units.
    Rectangular {
        x_half: f64,
        y_half: f64,
        x_scale: f64,
        y_scale: f64,
    },
}

impl DistanceMetric {
    pub fn distance(&self, x0: f64, y0: f64, x1: f64, y1: f64) -> f64 {
        match *self {
            Self::Cartesian => (x0 - x1).hypot(y0 - y1),
            Self::ScaledCartesian { scale } => scale * (x0 - x1).hypot(y0 - y1),
            Self::FlatEarth { x_scale, y_scale } => {
                (x_scale * (x0 - x1)).hypot(y_scale * (y0 - y1))
            }
            Self::Spherical => {
                let (x1, y1) = reflect_across_pole(x1, y1);
                geo::great_circle_km(x0, y0, x1, y1)
            }
            Self::Rectangular {
                x_half,
                y_half,
                x_scale,
                y_scale,
            } => {
                let inside =
                    (x_scale * (x0 - x1)).abs() <= x_half && (y_scale * (y0 - y1)).abs() <= y_half;
                if inside {
                    0.0
                } else {
                    f64::INFINITY
                }
            }
        }
    }
}

/// A latitude past a pole becomes the point on the far side of it.
#[inline]
fn reflect_across_pole(lon: f64, lat: f64) -> (f64, f64) {
    if lat.abs() > 90.0 {
        (lon + 180.0, (180.0 - lat.abs()).copysign(lat))
    } else {
        (lon, lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::KM_PER_DEGREE;

    #[test]
    fn test_cartesian() {
        assert_eq!(DistanceMetric::Cartesian.distance(0.0, 0.0, 3.0, 4.0), 5.0);
    }

    #[test]
    fn test_scaled_cartesian() {
        let m = DistanceMetric::ScaledCartesian { scale: 2.0 };
        assert_eq!(m.distance(1.0, 1.0, 4.0, 5.0), 10.0);
    }

    #[test]
    fn test_flat_earth_scales_axes_independently() {
        let m = DistanceMetric::FlatEarth {
            x_scale: 0.5,
            y_scale: 2.0,
        };
        assert_eq!(m.distance(0.0, 0.0, 2.0, 0.0), 1.0);
        assert_eq!(m.distance(0.0, 0.0, 0.0, 2.0), 4.0);
    }

    #[test]
    fn test_spherical_one_degree() {
        let d = DistanceMetric::Spherical.distance(10.0, 0.0, 10.0, 1.0);
        assert!((d - KM_PER_DEGREE).abs() < 1e-9);
    }

    #[test]
    fn test_spherical_reflects_across_pole() {
        // 91N at lon 0 is 89N at lon 180, one degree past the pole from 89N at lon 180
        let reflected = DistanceMetric::Spherical.distance(180.0, 89.0, 0.0, 91.0);
        assert!(reflected.abs() < 1e-6);

        let across = DistanceMetric::Spherical.distance(0.0, 89.0, 0.0, 91.0);
        assert!((across - 2.0 * KM_PER_DEGREE).abs() < 1e-6);

        let south = DistanceMetric::Spherical.distance(0.0, -89.5, 0.0, -90.5);
        assert!((south - KM_PER_DEGREE).abs() < 1e-6);
    }

    #[test]
    fn test_rectangular_is_binary() {
        let m = DistanceMetric::Rectangular {
            x_half: 2.0,
            y_half: 1.0,
            x_scale: 1.0,
            y_scale: 1.0,
        };
        assert_eq!(m.distance(0.0, 0.0, 2.0, 1.0), 0.0);
        assert_eq!(m.distance(0.0, 0.0, -1.5, 0.5), 0.0);
        assert!(m.distance(0.0, 0.0, 0.0, 1.5).is_infinite());
        assert!(m.distance(0.0, 0.0, 2.5, 0.0).is_infinite());
    }
}
