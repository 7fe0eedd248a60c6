pub trait FloatExt: Sized {
    /// Equal within the crate-wide [`crate::EPSILON`].
    fn approximately_eq(self, other: Self) -> bool;

    /// Equal within an explicit absolute tolerance.
    fn approx_eq_within(self, other: Self, tolerance: Self) -> bool;

    /// True when the value lies within `tolerance` of an integer.
    fn is_integral_within(self, tolerance: Self) -> bool;
}

impl FloatExt for f32 {
    fn approximately_eq(self, other: Self) -> bool {
        (self - other).abs() < crate::EPSILON as f32
    }

    fn approx_eq_within(self, other: Self, tolerance: Self) -> bool {
        (self - other).abs() <= tolerance
    }

    fn is_integral_within(self, tolerance: Self) -> bool {
        (self - self.round()).abs() <= tolerance
    }
}

impl FloatExt for f64 {
    fn approximately_eq(self, other: Self) -> bool {
        (self - other).abs() < crate::EPSILON
    }

    fn approx_eq_within(self, other: Self, tolerance: Self) -> bool {
        (self - other).abs() <= tolerance
    }

    fn is_integral_within(self, tolerance: Self) -> bool {
        (self - self.round()).abs() <= tolerance
    }
}
