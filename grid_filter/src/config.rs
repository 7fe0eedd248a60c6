//! Configuration types for grid filtering.
//!
//! [`FilterConfig`] is a plain value passed into [`GridFilter`](crate::GridFilter);
//! nothing here is global. All fields except `kind` and `width` have serde
//! defaults, so a minimal JSON configuration is `{"kind": "boxcar", "width": 3}`.

use common::FloatExt;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::error::{Error, Result};
use crate::grid::Region;

// ============================================================================
// Enums
// ============================================================================

/// Filter operation applied over each footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum FilterKind {
    /// Unit weights inside the footprint.
    Boxcar,
    /// Cosine-arch weights, zero at the footprint edge.
    Cosine,
    /// Gaussian weights, the full width spans six sigma.
    Gaussian,
    /// Weights supplied as a grid; switches to operator mode if they sum to zero.
    Custom,
    /// Supplied weights summing to zero; output is never normalized.
    Operator,
    /// Generalized median at [`FilterConfig::quantile`].
    Median,
    /// Shortest-half mode estimate.
    Mode,
    Min,
    /// Lowest value among the non-negative samples.
    MinPositive,
    Max,
    /// Highest value among the non-positive samples.
    MaxNegative,
    /// Area-weighted quantile regardless of distance mode.
    SphericalMedian,
    /// Area-weighted mode regardless of distance mode.
    SphericalMode,
}

impl FilterKind {
    /// Weights come from a caller-supplied grid rather than the width.
    pub fn is_custom(self) -> bool {
        matches!(self, Self::Custom | Self::Operator)
    }

    /// Rank-based output rather than a weighted sum.
    pub fn is_order_statistic(self) -> bool {
        !matches!(
            self,
            Self::Boxcar | Self::Cosine | Self::Gaussian | Self::Custom | Self::Operator
        )
    }
}

/// How offsets between nodes are turned into distances.
///
/// The declaration order matters: modes after [`DistanceMode::Cartesian`] are
/// geographic, and modes after [`DistanceMode::FlatEarthFixed`] have a
/// latitude-dependent footprint.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Default,
    Display,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum DistanceMode {
    /// Widths are odd node counts; converted to Cartesian units at setup.
    Pixel,
    #[default]
    Cartesian,
    /// Degrees scaled to km, isotropic.
    GeoCartesian,
    /// Flat earth with the longitude scale of the output mid-latitude.
    FlatEarthFixed,
    /// Flat earth with the longitude scale of each output row.
    FlatEarthVariable,
    /// Great-circle distances.
    Spherical,
    /// Great-circle distances on spherical Mercator (IMG) y coordinates.
    Mercator,
}

impl DistanceMode {
    #[inline]
    pub fn is_geographic(self) -> bool {
        self > Self::Cartesian
    }

    /// Footprint width in columns changes from row to row.
    #[inline]
    pub fn is_latitude_dependent(self) -> bool {
        self > Self::FlatEarthFixed
    }
}

/// Treatment of missing input samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NanPolicy {
    /// Skip missing samples; the node is NaN only if nothing usable remains.
    #[default]
    Ignore,
    /// A node whose co-located input is missing stays missing.
    Replace,
    /// Any missing sample inside the footprint makes the node missing.
    Preserve,
}

/// Representative value when a mode filter finds several equally short intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ModeTieBreak {
    #[default]
    Mean,
    Smallest,
    Largest,
}

// ============================================================================
// Output lattice
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Increment {
    pub x: f64,
    pub y: f64,
}

/// Where the filtered values are produced. Every field falls back to the input grid.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputLattice {
    pub region: Option<Region>,
    pub increment: Option<Increment>,
    /// Produce the opposite registration of the input.
    pub toggle_registration: bool,
}

impl OutputLattice {
    /// Nothing overridden: output nodes coincide with input nodes.
    pub fn is_input_lattice(&self) -> bool {
        self.region.is_none() && self.increment.is_none() && !self.toggle_registration
    }
}

// ============================================================================
// Filter configuration
// ============================================================================

fn default_quantile() -> f64 {
    0.5
}

fn default_threads() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub kind: FilterKind,
    /// Full filter width in distance units (node count for pixel mode).
    /// Ignored by custom and operator filters.
    pub width: f64,
    /// Full y width; makes the filter rectangular.
    #[serde(default)]
    pub width_y: Option<f64>,
    /// Return the input minus the low-pass result.
    #[serde(default)]
    pub highpass: bool,
    #[serde(default)]
    pub distance: DistanceMode,
    #[serde(default)]
    pub output: OutputLattice,
    #[serde(default)]
    pub nan_policy: NanPolicy,
    /// Quantile for median-type filters, in `[0, 1]`.
    #[serde(default = "default_quantile")]
    pub quantile: f64,
    #[serde(default)]
    pub mode_tie_break: ModeTieBreak,
    /// Worker threads; clamped to the number of output rows.
    #[serde(default = "default_threads")]
    pub threads: usize,
}

impl FilterConfig {
    pub fn new(kind: FilterKind, width: f64) -> Self {
        Self {
            kind,
            width,
            width_y: None,
            highpass: false,
            distance: DistanceMode::default(),
            output: OutputLattice::default(),
            nan_policy: NanPolicy::default(),
            quantile: default_quantile(),
            mode_tie_break: ModeTieBreak::default(),
            threads: default_threads(),
        }
    }

    pub fn with_distance(mut self, distance: DistanceMode) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_width_y(mut self, width_y: f64) -> Self {
        self.width_y = Some(width_y);
        self
    }

    pub fn with_nan_policy(mut self, nan_policy: NanPolicy) -> Self {
        self.nan_policy = nan_policy;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_quantile(mut self, quantile: f64) -> Self {
        self.quantile = quantile;
        self
    }

    pub fn with_mode_tie_break(mut self, tie_break: ModeTieBreak) -> Self {
        self.mode_tie_break = tie_break;
        self
    }

    pub fn with_output(mut self, output: OutputLattice) -> Self {
        self.output = output;
        self
    }

    pub fn with_highpass(mut self, highpass: bool) -> Self {
        self.highpass = highpass;
        self
    }

    /// Check everything that does not depend on the input grid.
    pub fn validate(&self) -> Result<()> {
        let cartesian_only = self.distance <= DistanceMode::Cartesian;

        if !self.kind.is_custom() {
            check_width("width", self.width, self.distance)?;
        }
        if let Some(width_y) = self.width_y {
            check_width("width_y", width_y, self.distance)?;
            if !cartesian_only {
                return Err(Error::config(format!(
                    "rectangular filters require pixel or cartesian distances, got {}",
                    self.distance
                )));
            }
        }
        if self.kind.is_custom() && !cartesian_only {
            return Err(Error::config(format!(
                "{} filters require pixel or cartesian distances, got {}",
                self.kind, self.distance
            )));
        }
        if !(0.0..=1.0).contains(&self.quantile) {
            return Err(Error::config(format!(
                "quantile must be in [0, 1], got {}",
                self.quantile
            )));
        }
        if self.highpass && self.output.region.is_some() && self.output.increment.is_some() {
            return Err(Error::config(
                "high-pass output cannot override both the output region and increment",
            ));
        }
        if let Some(inc) = self.output.increment {
            if !(inc.x > 0.0 && inc.y > 0.0 && inc.x.is_finite() && inc.y.is_finite()) {
                return Err(Error::config(format!(
                    "output increments must be positive, got {}/{}",
                    inc.x, inc.y
                )));
            }
        }
        Ok(())
    }
}

fn check_width(name: &str, width: f64, distance: DistanceMode) -> Result<()> {
    if !(width > 0.0 && width.is_finite()) {
        return Err(Error::config(format!(
            "{name} must be positive, got {width}"
        )));
    }
    if distance == DistanceMode::Pixel {
        let odd = width.is_integral_within(common::EPSILON) && (width.round() as i64) % 2 == 1;
        if !odd {
            return Err(Error::config(format!(
                "pixel {name} must be an odd number of nodes, got {width}"
            )));
        }
    }
    Ok(())
}
