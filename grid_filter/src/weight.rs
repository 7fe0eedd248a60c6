//! Kernel weight functions.

use std::f64::consts::PI;

use crate::config::FilterKind;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightFunction {
    /// 1 everywhere inside the footprint.
    Unit,
    /// `1 + cos(pi * r * inv_scale)`.
    CosineBell { inv_scale: f64 },
    /// `exp(r^2 * inv_scale)` with a negative `inv_scale`.
    Gaussian { inv_scale: f64 },
}

impl WeightFunction {
    /// Weight function for a filter of full `width`.
    ///
    /// Rectangular filters evaluate on offsets normalized to `[-1, 1]`, so
    /// their scale does not depend on the width.
    pub fn for_filter(kind: FilterKind, width: f64, rectangular: bool) -> Self {
        match kind {
            FilterKind::Cosine => Self::CosineBell {
                inv_scale: if rectangular { 1.0 } else { 2.0 / width },
            },
            // Full width spans six sigma
            FilterKind::Gaussian => Self::Gaussian {
                inv_scale: if rectangular {
                    -4.5
                } else {
                    -18.0 / (width * width)
                },
            },
            _ => Self::Unit,
        }
    }

    #[inline]
    pub fn weight(&self, r: f64) -> f64 {
        match *self {
            Self::Unit => 1.0,
            Self::CosineBell { inv_scale } => 1.0 + (PI * r * inv_scale).cos(),
            Self::Gaussian { inv_scale } => (r * r * inv_scale).exp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_for_order_statistics_and_boxcar() {
        for kind in [FilterKind::Boxcar, FilterKind::Median, FilterKind::Max] {
            assert_eq!(WeightFunction::for_filter(kind, 10.0, false), WeightFunction::Unit);
        }
        assert_eq!(WeightFunction::Unit.weight(123.0), 1.0);
    }

    #[test]
    fn test_cosine_bell_vanishes_at_edge() {
        let w = WeightFunction::for_filter(FilterKind::Cosine, 10.0, false);
        assert!((w.weight(0.0) - 2.0).abs() < 1e-12);
        assert!((w.weight(2.5) - 1.0).abs() < 1e-12);
        assert!(w.weight(5.0).abs() < 1e-12);
    }

    #[test]
    fn test_gaussian_three_sigma_at_edge() {
        let w = WeightFunction::for_filter(FilterKind::Gaussian, 6.0, false);
        assert_eq!(w.weight(0.0), 1.0);
        // sigma = 1
        assert!((w.weight(1.0) - (-0.5f64).exp()).abs() < 1e-12);
        assert!((w.weight(3.0) - (-4.5f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_rectangular_normalized_scales() {
        let cos = WeightFunction::for_filter(FilterKind::Cosine, 10.0, true);
        assert!(cos.weight(1.0).abs() < 1e-12);
        let gauss = WeightFunction::for_filter(FilterKind::Gaussian, 10.0, true);
        assert!((gauss.weight(1.0) - (-4.5f64).exp()).abs() < 1e-12);
    }
}
