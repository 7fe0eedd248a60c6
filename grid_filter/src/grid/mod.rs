//! Regular 2D grids: header geometry and row-major values.
//!
//! Row 0 is the northern edge and column 0 the western edge. Node coordinates
//! follow the grid registration: gridline nodes sit on the region boundary,
//! pixel nodes sit half an increment inside it.


use std::fmt;

use common::{Buffer2, FloatExt};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::error::{Error, Result};

/// Relative tolerance (fraction of an increment) used when comparing grid geometry.
pub const GEOMETRY_TOLERANCE: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Registration {
    /// Nodes on the grid lines; boundary nodes lie on the region edge.
    #[default]
    Gridline,
    /// Nodes at cell centers.
    Pixel,
}

impl Registration {
    /// Offset of the first node from the region edge, in increments.
    #[inline]
    pub fn node_offset(self) -> f64 {
        match self {
            Self::Gridline => 0.0,
            Self::Pixel => 0.5,
        }
    }

    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            Self::Gridline => Self::Pixel,
            Self::Pixel => Self::Gridline,
        }
    }
}

/// West/east/south/north bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl Region {
    pub const fn new(west: f64, east: f64, south: f64, north: f64) -> Self {
        Self {
            west,
            east,
            south,
            north,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Whether `other` lies inside `self` allowing `tolerance` slack on every side.
    /// With `check_x == false` only the y-extent is compared (periodic longitude).
    pub fn contains(&self, other: &Region, tolerance: f64, check_x: bool) -> bool {
        let y_ok = other.south >= self.south - tolerance && other.north <= self.north + tolerance;
        let x_ok = !check_x
            || (other.west >= self.west - tolerance && other.east <= self.east + tolerance);
        x_ok && y_ok
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}/{}", self.west, self.east, self.south, self.north)
    }
}

/// Whole increments that fit in `extent`.
fn whole_steps(extent: f64, inc: f64) -> usize {
    (extent / inc + GEOMETRY_TOLERANCE).floor() as usize
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridHeader {
    pub n_columns: usize,
    pub n_rows: usize,
    pub registration: Registration,
    pub x_inc: f64,
    pub y_inc: f64,
    pub region: Region,
    /// Value that marks a missing node in addition to IEEE NaN.
    pub nan_value: f32,
}

impl GridHeader {
    /// Derive the node counts for `region` sampled at the given increments.
    ///
    /// A region that is not a whole number of increments wide or tall is
    /// shrunk from the east and south to the last whole increment.
    pub fn new(region: Region, x_inc: f64, y_inc: f64, registration: Registration) -> Result<Self> {
        if !(x_inc > 0.0 && y_inc > 0.0 && x_inc.is_finite() && y_inc.is_finite()) {
            return Err(Error::InvalidGrid(format!(
                "increments must be positive, got {x_inc}/{y_inc}"
            )));
        }
        if !(region.width() >= 0.0 && region.height() >= 0.0) {
            return Err(Error::InvalidGrid(format!("degenerate region {region}")));
        }

        let pixel = usize::from(registration == Registration::Pixel);
        let x_steps = whole_steps(region.width(), x_inc);
        let y_steps = whole_steps(region.height(), y_inc);
        let n_columns = (x_steps + 1).saturating_sub(pixel);
        let n_rows = (y_steps + 1).saturating_sub(pixel);
        if n_columns == 0 || n_rows == 0 {
            return Err(Error::InvalidGrid(format!(
                "region {region} holds no {registration} nodes at {x_inc}/{y_inc}"
            )));
        }

        // East and south move in so the region spans whole increments
        let mut snapped = region;
        let (x_extent, y_extent) = (x_steps as f64 * x_inc, y_steps as f64 * y_inc);
        if !x_extent.approx_eq_within(region.width(), GEOMETRY_TOLERANCE * x_inc) {
            snapped.east = region.west + x_extent;
        }
        if !y_extent.approx_eq_within(region.height(), GEOMETRY_TOLERANCE * y_inc) {
            snapped.south = region.north - y_extent;
        }
        if snapped != region {
            tracing::warn!(
                "Region {} is not a multiple of {}/{}, adjusted to {}",
                region,
                x_inc,
                y_inc,
                snapped
            );
        }
        let region = snapped;

        Ok(Self {
            n_columns,
            n_rows,
            registration,
            x_inc,
            y_inc,
            region,
            nan_value: f32::NAN,
        })
    }

    pub fn with_nan_value(mut self, nan_value: f32) -> Self {
        self.nan_value = nan_value;
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.n_columns * self.n_rows
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// x coordinate of a column. The last column is pinned to the east edge.
    #[inline]
    pub fn col_to_x(&self, col: usize) -> f64 {
        let off = self.registration.node_offset();
        if col + 1 == self.n_columns {
            self.region.east - off * self.x_inc
        } else {
            self.region.west + (col as f64 + off) * self.x_inc
        }
    }

    /// y coordinate of a row. The last row is pinned to the south edge.
    #[inline]
    pub fn row_to_y(&self, row: usize) -> f64 {
        let off = self.registration.node_offset();
        if row + 1 == self.n_rows {
            self.region.south + off * self.y_inc
        } else {
            self.region.north - (row as f64 + off) * self.y_inc
        }
    }

    /// x of a possibly out-of-range column, without pinning to the east edge.
    #[inline]
    pub fn x_at(&self, col: i64) -> f64 {
        self.region.west + (col as f64 + self.registration.node_offset()) * self.x_inc
    }

    /// y of a possibly out-of-range row, without pinning to the south edge.
    #[inline]
    pub fn y_at(&self, row: i64) -> f64 {
        self.region.north - (row as f64 + self.registration.node_offset()) * self.y_inc
    }

    /// Nearest column for `x`; may fall outside `[0, n_columns)`.
    #[inline]
    pub fn x_to_col(&self, x: f64) -> i64 {
        ((x - self.region.west) / self.x_inc - self.registration.node_offset() + 0.5).floor() as i64
    }

    /// Nearest row for `y`; may fall outside `[0, n_rows)`.
    #[inline]
    pub fn y_to_row(&self, y: f64) -> i64 {
        ((self.region.north - y) / self.y_inc - self.registration.node_offset() + 0.5).floor()
            as i64
    }

    /// Whether the grid spans a full 360 degrees of longitude.
    pub fn is_global_longitude(&self) -> bool {
        self.region
            .width()
            .approx_eq_within(360.0, GEOMETRY_TOLERANCE * self.x_inc)
    }

    /// Absolute tolerance for coordinate comparisons on this lattice.
    #[inline]
    pub fn tolerance(&self) -> f64 {
        GEOMETRY_TOLERANCE * self.x_inc.min(self.y_inc)
    }

    /// Same lattice: node `(col, row)` is the same location in both grids.
    pub fn is_coregistered(&self, other: &GridHeader) -> bool {
        let tol = self.tolerance();
        self.registration == other.registration
            && self.n_columns == other.n_columns
            && self.n_rows == other.n_rows
            && self.x_inc.approx_eq_within(other.x_inc, tol)
            && self.y_inc.approx_eq_within(other.y_inc, tol)
            && self.region.west.approx_eq_within(other.region.west, tol)
            && self.region.north.approx_eq_within(other.region.north, tol)
    }

    #[inline]
    pub fn is_missing(&self, value: f32) -> bool {
        value.is_nan() || value == self.nan_value
    }
}

/// Header plus row-major node values.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    header: GridHeader,
    data: Buffer2<f32>,
}

impl Grid {
    pub fn new(header: GridHeader, values: Vec<f32>) -> Result<Self> {
        if values.len() != header.len() {
            return Err(Error::InvalidGrid(format!(
                "expected {}x{} = {} values, got {}",
                header.n_columns,
                header.n_rows,
                header.len(),
                values.len()
            )));
        }
        let data = Buffer2::new(header.n_columns, header.n_rows, values);
        Ok(Self { header, data })
    }

    /// Grid with every node set to `value`; allocation failure is reported.
    pub fn filled(header: GridHeader, value: f32) -> Result<Self> {
        let data = Buffer2::try_new_filled(header.n_columns, header.n_rows, value)
            .map_err(Error::alloc("grid values"))?;
        Ok(Self { header, data })
    }

    /// Grid whose node `(col, row)` is `f(x, y)` at that node's coordinates.
    pub fn from_fn(header: GridHeader, mut f: impl FnMut(f64, f64) -> f32) -> Self {
        let data = Buffer2::from_fn(header.n_columns, header.n_rows, |col, row| {
            f(header.col_to_x(col), header.row_to_y(row))
        });
        Self { header, data }
    }

    #[inline]
    pub fn header(&self) -> &GridHeader {
        &self.header
    }

    #[inline]
    pub fn data(&self) -> &Buffer2<f32> {
        &self.data
    }

    #[inline]
    pub(crate) fn data_mut(&mut self) -> &mut Buffer2<f32> {
        &mut self.data
    }

    #[inline]
    pub fn value(&self, col: usize, row: usize) -> f32 {
        self.data[(col, row)]
    }

    /// Value at a node, treating the header's NaN sentinel as missing.
    #[inline]
    pub fn sample(&self, col: usize, row: usize) -> Option<f32> {
        let v = self.data[(col, row)];
        (!self.header.is_missing(v)).then_some(v)
    }
}
