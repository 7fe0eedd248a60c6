//! Filter setup: everything fixed before the rows are processed.
//!
//! A [`FilterPlan`] is built once per run from the configuration and the input
//! grid and is shared read-only by all row workers.

use common::{Buffer2, FloatExt};

use crate::area_weight::AreaWeightGrid;
use crate::config::{DistanceMode, FilterConfig, FilterKind, ModeTieBreak, NanPolicy};
use crate::distance::DistanceMetric;
use crate::error::{Error, Result};
use crate::geo::{self, KM_PER_DEGREE};
use crate::grid::{Grid, GridHeader, GEOMETRY_TOLERANCE};
use crate::statistics::Extreme;
use crate::weight::WeightFunction;
use crate::window::{EffortLevel, FilterWindow, WindowParams};

/// Custom weights summing to less than this are treated as an operator.
const ZERO_SUM_TOLERANCE: f64 = 1e-8;

/// Unweighted order statistic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RankStatistic {
    Quantile(f64),
    Mode(ModeTieBreak),
    Extreme(Extreme),
}

/// Order statistic over area-weighted samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightedStatistic {
    Quantile(f64),
    Mode,
}

/// How footprint samples are reduced to one value, fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterClass {
    /// Normalized weighted mean.
    Convolution,
    /// Raw weighted sum of a zero-sum kernel.
    Operator,
    OrderStatistic(RankStatistic),
    WeightedOrderStatistic(WeightedStatistic),
}

impl FilterClass {
    fn select(config: &FilterConfig, operator: bool) -> Self {
        let geographic = config.distance.is_geographic();
        let q = config.quantile;
        match config.kind {
            FilterKind::Boxcar | FilterKind::Cosine | FilterKind::Gaussian => Self::Convolution,
            FilterKind::Custom | FilterKind::Operator => {
                if operator {
                    Self::Operator
                } else {
                    Self::Convolution
                }
            }
            FilterKind::Median if !geographic => Self::OrderStatistic(RankStatistic::Quantile(q)),
            FilterKind::Mode if !geographic => {
                Self::OrderStatistic(RankStatistic::Mode(config.mode_tie_break))
            }
            FilterKind::Median | FilterKind::SphericalMedian => {
                Self::WeightedOrderStatistic(WeightedStatistic::Quantile(q))
            }
            FilterKind::Mode | FilterKind::SphericalMode => {
                Self::WeightedOrderStatistic(WeightedStatistic::Mode)
            }
            FilterKind::Min => Self::OrderStatistic(RankStatistic::Extreme(Extreme::Min)),
            FilterKind::MinPositive => {
                Self::OrderStatistic(RankStatistic::Extreme(Extreme::MinPositive))
            }
            FilterKind::Max => Self::OrderStatistic(RankStatistic::Extreme(Extreme::Max)),
            FilterKind::MaxNegative => {
                Self::OrderStatistic(RankStatistic::Extreme(Extreme::MaxNegative))
            }
        }
    }

    #[inline]
    pub fn is_operator(&self) -> bool {
        matches!(self, Self::Operator)
    }
}

/// Distance scales of the x and y axes, km per degree for geographic modes.
#[derive(Debug, Clone, Copy)]
struct Scales {
    x: f64,
    y: f64,
    /// y scale used when sizing the footprint of each row.
    row_y: f64,
}

fn max_abs_lat_cos(south: f64, north: f64) -> f64 {
    if south.abs() > north {
        south.to_radians().cos()
    } else {
        north.to_radians().cos()
    }
}

fn scales(config: &FilterConfig, width: f64, input: &GridHeader, output: &GridHeader) -> Scales {
    let km = KM_PER_DEGREE;
    let (x, y) = match config.distance {
        DistanceMode::Pixel | DistanceMode::Cartesian => (1.0, 1.0),
        DistanceMode::GeoCartesian => (km, km),
        DistanceMode::FlatEarthFixed => {
            let mid = 0.5 * (output.region.south + output.region.north);
            (km * mid.to_radians().cos(), km)
        }
        DistanceMode::FlatEarthVariable => (
            km * max_abs_lat_cos(output.region.south, output.region.north),
            km,
        ),
        DistanceMode::Spherical => (
            km * max_abs_lat_cos(input.region.south, input.region.north),
            km,
        ),
        DistanceMode::Mercator => {
            let max_y = input.region.south.abs().max(input.region.north.abs());
            let max_lat = geo::img_to_lat(max_y);
            let merc_range = geo::lat_to_img(max_lat + 0.5 * width / km) - geo::lat_to_img(max_lat);
            let s = 0.5 * width / merc_range;
            (s, s)
        }
    };
    let row_y = if config.distance == DistanceMode::Mercator {
        km
    } else {
        y
    };
    Scales { x, y, row_y }
}

/// Offset of an output node from the input lattice when it is zero or half an
/// increment; any other offset needs per-node weights.
fn lattice_offset(delta: f64, inc: f64) -> Option<f64> {
    let frac = (delta / inc).rem_euclid(1.0);
    if frac < GEOMETRY_TOLERANCE || frac > 1.0 - GEOMETRY_TOLERANCE {
        Some(0.0)
    } else if (frac - 0.5).abs() < GEOMETRY_TOLERANCE {
        Some(0.5 * inc)
    } else {
        None
    }
}

/// Half-width in nodes for a filter `width` across `n` input nodes.
///
/// Footprints wider than the grid, or a vanishing scale, collapse to the whole
/// grid; an even node count is rounded up to the next odd window.
fn half_width_nodes(width: f64, inc: f64, scale: f64, n: usize, round_up_even: bool) -> usize {
    let half = (width / (inc * scale) / 2.0).ceil();
    let fits = scale.is_finite()
        && !scale.approximately_eq(0.0)
        && half.is_finite()
        && half >= 0.0
        && 2.0 * half + 1.0 <= n as f64;
    if fits {
        return half as usize;
    }
    let mut h = (n - 1) / 2;
    if round_up_even && n % 2 == 0 {
        h += 1;
    }
    h
}

#[derive(Debug)]
pub struct FilterPlan<'a> {
    pub input: &'a Grid,
    pub output: GridHeader,
    pub area: AreaWeightGrid,
    pub class: FilterClass,
    pub nan_policy: NanPolicy,
    pub effort: EffortLevel,
    pub params: WindowParams,
    /// y scale used for the per-row footprint width.
    pub row_y_scale: f64,
    pub max_x_half: usize,
    pub y_half: usize,
    /// Matrix shared by all workers for the custom and global levels.
    pub shared_window: Option<FilterWindow>,
    /// Output grid spacing is an integer multiple of the input spacing.
    pub aligned: bool,
    /// Offset of every output node from its origin input node when aligned.
    pub x_fix: f64,
    pub y_fix: f64,
    /// Origin input column and x offset of each output column.
    pub col_origin: Vec<i64>,
    pub x_shift: Vec<f64>,
    /// Columns per 360 degrees for geographic wrap-around.
    pub nx_wrap: Option<i64>,
    pub n_workers: usize,
}

impl<'a> FilterPlan<'a> {
    pub fn new(
        config: &FilterConfig,
        input: &'a Grid,
        custom_weights: Option<&Buffer2<f32>>,
    ) -> Result<Self> {
        config.validate()?;
        let in_h = input.header();
        let mode = config.distance;

        let output = output_header(config, in_h)?;
        let full_360 = mode.is_geographic() && in_h.is_global_longitude();
        if !in_h.region.contains(&output.region, in_h.tolerance(), !full_360) {
            return Err(Error::Domain {
                output: output.region,
                input: in_h.region,
            });
        }

        let coregistered = in_h.is_coregistered(&output);
        if config.nan_policy == NanPolicy::Replace && !coregistered {
            return Err(Error::config(
                "NaN policy replace requires co-registered input and output grids",
            ));
        }
        let offsets = if (output.x_inc / in_h.x_inc).is_integral_within(GEOMETRY_TOLERANCE)
            && (output.y_inc / in_h.y_inc).is_integral_within(GEOMETRY_TOLERANCE)
        {
            lattice_offset(output.col_to_x(0) - in_h.x_at(0), in_h.x_inc)
                .zip(lattice_offset(output.row_to_y(0) - in_h.y_at(0), in_h.y_inc))
        } else {
            None
        };
        let aligned = offsets.is_some();

        // Supplied weights
        let mut operator = false;
        let custom = if config.kind.is_custom() {
            let weights = custom_weights.ok_or_else(|| {
                Error::config(format!("{} filter requires a weight grid", config.kind))
            })?;
            if weights.width() % 2 == 0 || weights.height() % 2 == 0 {
                return Err(Error::config(format!(
                    "weight grid must have odd dimensions, got {}x{}",
                    weights.width(),
                    weights.height()
                )));
            }
            if !coregistered {
                return Err(Error::config(format!(
                    "{} filter requires co-registered input and output grids",
                    config.kind
                )));
            }
            let weights = weights.map(|&w| w as f64);
            let sum: f64 = weights.iter().sum();
            operator = config.kind == FilterKind::Operator;
            if !operator && sum.abs() < ZERO_SUM_TOLERANCE {
                tracing::warn!("Custom filter weights sum to zero; switching to operator mode");
                operator = true;
            }
            Some(weights)
        } else {
            None
        };

        // Pixel widths count input nodes
        let (width, width_y) = if mode == DistanceMode::Pixel {
            (
                config.width * in_h.x_inc,
                config.width_y.map(|w| w * in_h.x_inc),
            )
        } else {
            (config.width, config.width_y)
        };
        let rectangular = width_y.is_some();
        let scales = scales(config, width, in_h, &output);

        let metric = if let Some(width_y) = width_y {
            DistanceMetric::Rectangular {
                x_half: 0.5 * width,
                y_half: 0.5 * width_y,
                x_scale: scales.x,
                y_scale: scales.y,
            }
        } else {
            match mode {
                DistanceMode::Pixel | DistanceMode::Cartesian => DistanceMetric::Cartesian,
                DistanceMode::GeoCartesian => DistanceMetric::ScaledCartesian { scale: scales.x },
                DistanceMode::FlatEarthFixed | DistanceMode::FlatEarthVariable => {
                    DistanceMetric::FlatEarth {
                        x_scale: scales.x,
                        y_scale: scales.y,
                    }
                }
                DistanceMode::Spherical | DistanceMode::Mercator => DistanceMetric::Spherical,
            }
        };

        let params = WindowParams {
            mode,
            metric,
            weight: WeightFunction::for_filter(config.kind, width, rectangular),
            half_width: 0.5 * width,
            rectangular,
            dx: in_h.x_inc,
            dy: in_h.y_inc,
            y_min: in_h.region.south,
            y_max: in_h.region.north,
        };

        let (max_x_half, y_half) = match &custom {
            Some(weights) => ((weights.width() - 1) / 2, (weights.height() - 1) / 2),
            None => (
                half_width_nodes(width, in_h.x_inc, scales.x, in_h.n_columns, true),
                half_width_nodes(
                    width_y.unwrap_or(width),
                    in_h.y_inc,
                    scales.y,
                    in_h.n_rows,
                    false,
                ),
            ),
        };

        let effort = EffortLevel::select(custom.is_some(), aligned, mode);
        let class = FilterClass::select(config, operator);

        let (x_fix, y_fix) = offsets.unwrap_or((0.0, 0.0));

        let mut col_origin = Vec::with_capacity(output.n_columns);
        let mut x_shift = Vec::with_capacity(output.n_columns);
        for col in 0..output.n_columns {
            let x_out = output.col_to_x(col);
            let origin = in_h.x_to_col(x_out - x_fix);
            col_origin.push(origin);
            x_shift.push(if aligned { x_fix } else { x_out - in_h.x_at(origin) });
        }

        let nx_wrap = mode
            .is_geographic()
            .then(|| (360.0 / in_h.x_inc).round() as i64);

        let shared_window = match (effort, custom) {
            (EffortLevel::Custom, Some(weights)) => Some(FilterWindow::from_weights(weights)),
            (EffortLevel::Global, _) => {
                let mut window = FilterWindow::new(max_x_half, y_half, in_h.x_inc, in_h.y_inc)?;
                window.build(&params, y_fix, x_fix, y_fix);
                Some(window)
            }
            _ => None,
        };

        let n_workers = config.threads.clamp(1, output.n_rows);

        tracing::info!(
            "Input {}x{}, output {}x{}, filter (max) {}x{}",
            in_h.n_columns,
            in_h.n_rows,
            output.n_columns,
            output.n_rows,
            2 * max_x_half + 1,
            2 * y_half + 1
        );
        if config.kind.is_order_statistic() && config.quantile != 0.5 {
            tracing::info!(
                "Filter type is {} [using {}% quantile]",
                config.kind,
                100.0 * config.quantile
            );
        } else {
            tracing::info!("Filter type is {}", config.kind);
        }
        if effort == EffortLevel::PerNode {
            tracing::warn!(
                "Output spacing is not a multiple of the input spacing; \
                 weights are recomputed for every output node"
            );
        }
        tracing::debug!("Effort level {}, class {:?}", effort, class);
        tracing::info!("Calculations will be distributed over {} threads", n_workers);

        let area = AreaWeightGrid::new(in_h, mode)?;

        Ok(Self {
            input,
            output,
            area,
            class,
            nan_policy: config.nan_policy,
            effort,
            params,
            row_y_scale: scales.row_y,
            max_x_half,
            y_half,
            shared_window,
            aligned,
            x_fix,
            y_fix,
            col_origin,
            x_shift,
            nx_wrap,
            n_workers,
        })
    }

    /// Origin input row for an output y.
    #[inline]
    pub fn row_origin(&self, y_out: f64) -> i64 {
        self.input.header().y_to_row(y_out - self.y_fix)
    }

    /// Active x half-width at an output latitude for latitude-dependent modes.
    pub fn row_x_half(&self, lat_out: f64) -> usize {
        if !self.params.mode.is_latitude_dependent() {
            return self.max_x_half;
        }
        let mut y = lat_out.abs();
        if self.params.mode == DistanceMode::Spherical {
            y += self.params.half_width / self.row_y_scale;
        }
        if y >= 90.0 {
            return self.max_x_half;
        }
        let nodes = (self.params.half_width
            / (self.params.dx * self.row_y_scale * y.to_radians().cos()))
        .round();
        self.max_x_half.min(nodes as usize)
    }

    /// Window parameters for an output latitude.
    pub fn row_params(&self, lat_out: f64) -> WindowParams {
        let mut params = self.params;
        if self.params.mode == DistanceMode::FlatEarthVariable && !self.params.rectangular {
            params.metric = DistanceMetric::FlatEarth {
                x_scale: KM_PER_DEGREE * lat_out.to_radians().cos(),
                y_scale: KM_PER_DEGREE,
            };
        }
        params
    }
}

fn output_header(config: &FilterConfig, input: &GridHeader) -> Result<GridHeader> {
    let lattice = &config.output;
    if lattice.is_input_lattice() {
        return Ok(input.clone());
    }
    let region = lattice.region.unwrap_or(input.region);
    let (x_inc, y_inc) = lattice
        .increment
        .map_or((input.x_inc, input.y_inc), |inc| (inc.x, inc.y));
    let registration = if lattice.toggle_registration {
        input.registration.toggled()
    } else {
        input.registration
    };
    Ok(GridHeader::new(region, x_inc, y_inc, registration)?.with_nan_value(input.nan_value))
}
