//! Filter footprint and its weight matrix.
//!
//! The matrix is indexed by offsets from the origin input node (the input node
//! nearest the output node): column `i` in `[-x_half, x_half]`, row `j` in
//! `[-y_half, y_half]` with negative `j` to the north. Entries `<= 0` lie
//! outside the filter.

use std::fmt;

use common::Buffer2;

use crate::config::DistanceMode;
use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::geo;
use crate::weight::WeightFunction;

/// Weight of a matrix entry outside the filter.
pub const OUTSIDE: f64 = -1.0;

/// How often the weight matrix is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EffortLevel {
    /// Supplied weights, never rebuilt.
    Custom = 0,
    /// Built once for the whole grid.
    Global = 1,
    /// Rebuilt for every output row.
    PerRow = 2,
    /// Rebuilt for every output node.
    PerNode = 3,
}

impl EffortLevel {
    pub fn select(custom: bool, aligned: bool, mode: DistanceMode) -> Self {
        if custom {
            Self::Custom
        } else if aligned && mode <= DistanceMode::FlatEarthFixed {
            Self::Global
        } else if aligned {
            Self::PerRow
        } else {
            Self::PerNode
        }
    }
}

impl fmt::Display for EffortLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

/// Everything the matrix builder needs besides the output location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowParams {
    pub mode: DistanceMode,
    pub metric: DistanceMetric,
    pub weight: WeightFunction,
    /// Nodes farther than this are outside.
    pub half_width: f64,
    pub rectangular: bool,
    /// Input increments.
    pub dx: f64,
    pub dy: f64,
    /// Input y range; rows beyond it are outside for latitude-dependent modes.
    pub y_min: f64,
    pub y_max: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterWindow {
    max_x_half: usize,
    y_half: usize,
    /// Active x half-width; may shrink below `max_x_half` with latitude.
    x_half: usize,
    /// Offsets `i * dx` and `j * dy` for `i, j >= 0`.
    x_offsets: Vec<f64>,
    y_offsets: Vec<f64>,
    weights: Buffer2<f64>,
}

impl FilterWindow {
    pub fn new(max_x_half: usize, y_half: usize, dx: f64, dy: f64) -> Result<Self> {
        let weights = Buffer2::try_new_filled(2 * max_x_half + 1, 2 * y_half + 1, OUTSIDE)
            .map_err(Error::alloc("weight matrix"))?;
        Ok(Self {
            max_x_half,
            y_half,
            x_half: max_x_half,
            x_offsets: (0..=max_x_half).map(|i| i as f64 * dx).collect(),
            y_offsets: (0..=y_half).map(|j| j as f64 * dy).collect(),
            weights,
        })
    }

    /// Window holding supplied weights; dimensions must be odd.
    pub fn from_weights(weights: Buffer2<f64>) -> Self {
        debug_assert!(weights.width() % 2 == 1 && weights.height() % 2 == 1);
        let max_x_half = (weights.width() - 1) / 2;
        let y_half = (weights.height() - 1) / 2;
        Self {
            max_x_half,
            y_half,
            x_half: max_x_half,
            x_offsets: Vec::new(),
            y_offsets: Vec::new(),
            weights,
        }
    }

    #[inline]
    pub fn y_half(&self) -> usize {
        self.y_half
    }

    #[inline]
    pub fn set_x_half(&mut self, x_half: usize) {
        self.x_half = x_half.min(self.max_x_half);
    }

    #[inline]
    pub fn weight(&self, i: i64, j: i64) -> f64 {
        let col = (i + self.max_x_half as i64) as usize;
        let row = (j + self.y_half as i64) as usize;
        self.weights[(col, row)]
    }

    /// Fill the active part of the matrix.
    ///
    /// `center_y` is the output node's y in input coordinates (IMG y for
    /// Mercator). `x_off` and `y_off` are the output node's offsets from the
    /// origin input node.
    pub fn build(&mut self, params: &WindowParams, center_y: f64, x_off: f64, y_off: f64) {
        let origin_y = center_y - y_off;
        let mercator = params.mode == DistanceMode::Mercator;
        let center_y = if mercator {
            geo::img_to_lat(center_y)
        } else {
            center_y
        };
        let check_rows = params.mode.is_latitude_dependent();
        let tolerance = 1e-4 * params.dy;

        let x_half = self.x_half as i64;
        let y_half = self.y_half as i64;
        let inv_x_half = if x_half > 0 { 1.0 / x_half as f64 } else { 0.0 };
        let inv_y_half = if y_half > 0 { 1.0 / y_half as f64 } else { 0.0 };

        for j in -y_half..=y_half {
            let dy = self.y_offsets[j.unsigned_abs() as usize];
            let y = if j < 0 { origin_y + dy } else { origin_y - dy };
            let row = (j + y_half) as usize;
            let first = self.max_x_half - self.x_half;
            let cells = &mut self.weights.row_mut(row)[first..first + 2 * self.x_half + 1];

            if check_rows && (y < params.y_min - tolerance || y > params.y_max + tolerance) {
                cells.fill(OUTSIDE);
                continue;
            }
            let y = if mercator { geo::img_to_lat(y) } else { y };
            let ry = inv_y_half * j as f64;

            for (cell, i) in cells.iter_mut().zip(-x_half..=x_half) {
                let dx = self.x_offsets[i.unsigned_abs() as usize];
                let x = if i < 0 { -dx } else { dx };
                let r = params.metric.distance(x_off, center_y, x, y);
                *cell = if params.rectangular {
                    if r > 0.0 {
                        OUTSIDE
                    } else {
                        params.weight.weight(inv_x_half * i as f64) * params.weight.weight(ry)
                    }
                } else if r > params.half_width {
                    OUTSIDE
                } else {
                    params.weight.weight(r)
                };
            }
        }
    }
}
