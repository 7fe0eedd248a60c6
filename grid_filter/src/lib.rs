//! Grid filter - spatial filtering of regular 2D grids.
//!
//! Applies convolution filters (boxcar, cosine arch, Gaussian, custom kernels)
//! and order-statistic filters (median, mode, extremes) to a grid under
//! Cartesian or geographic distances, optionally onto a different output
//! lattice and optionally as a high-pass.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use grid_filter::{DistanceMode, FilterConfig, FilterKind, GridFilter};
//!
//! let config = FilterConfig::new(FilterKind::Gaussian, 200.0)
//!     .with_distance(DistanceMode::Spherical)
//!     .with_threads(8);
//! let output = GridFilter::new(config)?.apply(&grid)?;
//!
//! println!("{} nodes without estimate", output.report.n_nan);
//! ```

mod aggregator;
mod area_weight;
mod config;
mod distance;
mod engine;
mod error;
pub mod geo;
mod grid;
mod highpass;
mod plan;
pub mod statistics;
mod weight;
mod window;

#[cfg(feature = "bench")]
pub mod bench;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Grids
// ============================================================================

pub use grid::{Grid, GridHeader, Region, Registration, GEOMETRY_TOLERANCE};

// ============================================================================
// Configuration
// ============================================================================

pub use config::{
    DistanceMode, FilterConfig, FilterKind, Increment, ModeTieBreak, NanPolicy, OutputLattice,
};

// ============================================================================
// Filtering
// ============================================================================

pub use area_weight::AreaWeightGrid;
pub use distance::DistanceMetric;
pub use engine::{FilterOutput, FilterReport, GridFilter};
pub use error::{Error, Result};
pub use highpass::{BilinearResampler, Resample};
pub use plan::{FilterClass, RankStatistic, WeightedStatistic};
pub use weight::WeightFunction;
pub use window::{EffortLevel, FilterWindow, WindowParams};

pub use common::Buffer2;
