pub mod bit_set;
pub mod buffer2;
pub mod float_ext;
pub mod parallel;

pub use bit_set::BitSet;
pub use buffer2::Buffer2;
pub use float_ext::FloatExt;

pub const EPSILON: f64 = 1e-6;

/// A buffer could not be reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Failed to allocate {bytes} bytes")]
pub struct AllocError {
    pub bytes: usize,
}
