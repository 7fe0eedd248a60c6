//! Per-node filtering over a range of output rows.
//!
//! Each worker owns its scratch (weight matrix for the per-row and per-node
//! levels, sample buffers, visited-column set) and writes only the output rows
//! it was handed.

use std::ops::{AddAssign, Range};

use common::BitSet;

use crate::config::{DistanceMode, NanPolicy};
use crate::error::{Error, Result};
use crate::geo;
use crate::plan::{FilterClass, FilterPlan, RankStatistic, WeightedStatistic};
use crate::statistics::{self, Observation};
use crate::window::{EffortLevel, FilterWindow};

/// Per-worker counters, summed after the join.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Output nodes set to NaN.
    pub n_nan: u64,
    /// Modes found at nodes with more than one equally short interval.
    pub n_multiple_modes: u64,
}

impl AddAssign for Tally {
    fn add_assign(&mut self, other: Self) {
        self.n_nan += other.n_nan;
        self.n_multiple_modes += other.n_multiple_modes;
    }
}

/// Running state of one output node.
enum Accumulator<'s> {
    Sum { value: f64, weight: f64 },
    Samples(&'s mut Vec<f64>),
    Weighted(&'s mut Vec<Observation>),
}

pub struct RowWorker<'p, 'a> {
    plan: &'p FilterPlan<'a>,
    /// Private matrix for the per-row and per-node levels.
    window: Option<FilterWindow>,
    visited: BitSet,
    samples: Vec<f64>,
    observations: Vec<Observation>,
    tally: Tally,
}

impl<'p, 'a> RowWorker<'p, 'a> {
    pub fn new(plan: &'p FilterPlan<'a>) -> Result<Self> {
        let in_h = plan.input.header();
        let window = match plan.effort {
            EffortLevel::PerRow | EffortLevel::PerNode => Some(FilterWindow::new(
                plan.max_x_half,
                plan.y_half,
                in_h.x_inc,
                in_h.y_inc,
            )?),
            EffortLevel::Custom | EffortLevel::Global => None,
        };

        let capacity = (2 * plan.max_x_half + 1) * (2 * plan.y_half + 1);
        let mut samples = Vec::new();
        let mut observations = Vec::new();
        match plan.class {
            FilterClass::OrderStatistic(_) => samples
                .try_reserve_exact(capacity)
                .map_err(|_| Error::Allocation {
                    what: "sample buffer",
                    bytes: capacity * std::mem::size_of::<f64>(),
                })?,
            FilterClass::WeightedOrderStatistic(_) => observations
                .try_reserve_exact(capacity)
                .map_err(|_| Error::Allocation {
                    what: "observation buffer",
                    bytes: capacity * std::mem::size_of::<Observation>(),
                })?,
            FilterClass::Convolution | FilterClass::Operator => {}
        }

        Ok(Self {
            plan,
            window,
            visited: BitSet::new(in_h.n_columns),
            samples,
            observations,
            tally: Tally::default(),
        })
    }

    /// Filter output rows `rows` into `out`, which holds exactly those rows.
    pub fn run(mut self, rows: Range<usize>, out: &mut [f32]) -> Tally {
        let width = self.plan.output.n_columns;
        debug_assert_eq!(out.len(), rows.len() * width);
        for (row, values) in rows.zip(out.chunks_exact_mut(width)) {
            self.filter_row(row, values);
        }
        self.tally
    }

    fn filter_row(&mut self, row_out: usize, out: &mut [f32]) {
        let plan = self.plan;
        let in_h = plan.input.header();
        let mode = plan.params.mode;

        let y_out = plan.output.row_to_y(row_out);
        let lat_out = if mode == DistanceMode::Mercator {
            geo::img_to_lat(y_out)
        } else {
            y_out
        };
        let row_origin = plan.row_origin(y_out);
        let params = plan.row_params(lat_out);

        let x_half = plan.row_x_half(lat_out);
        if let Some(window) = self.window.as_mut() {
            window.set_x_half(x_half);
        }
        let visit_check = 2 * x_half + 1 >= in_h.n_columns;

        let y_shift = if plan.aligned {
            plan.y_fix
        } else {
            y_out - in_h.y_at(row_origin)
        };
        if plan.effort == EffortLevel::PerRow {
            if let Some(window) = self.window.as_mut() {
                window.build(&params, y_out, plan.x_fix, plan.y_fix);
            }
        }

        tracing::trace!("Processing output row {} (origin row {})", row_out, row_origin);

        for (col_out, cell) in out.iter_mut().enumerate() {
            if plan.nan_policy == NanPolicy::Replace
                && plan.input.header().is_missing(plan.input.value(col_out, row_out))
            {
                *cell = plan.output.nan_value;
                self.tally.n_nan += 1;
                continue;
            }
            if plan.effort == EffortLevel::PerNode {
                if let Some(window) = self.window.as_mut() {
                    window.build(&params, y_out, plan.x_shift[col_out], y_shift);
                }
            }
            let value = self.filter_node(plan.col_origin[col_out], row_origin, x_half, visit_check);
            *cell = match value {
                Some(v) => v as f32,
                None => {
                    self.tally.n_nan += 1;
                    plan.output.nan_value
                }
            };
        }
    }

    /// Scan the footprint of one node. `None` means the node is missing.
    fn filter_node(
        &mut self,
        col_origin: i64,
        row_origin: i64,
        x_half: usize,
        visit_check: bool,
    ) -> Option<f64> {
        let plan = self.plan;
        let input = plan.input;
        let in_h = input.header();
        let n_columns = in_h.n_columns as i64;
        let n_rows = in_h.n_rows as i64;
        let operator = plan.class.is_operator();
        let window = match (self.window.as_ref(), plan.shared_window.as_ref()) {
            (Some(own), _) => own,
            (None, Some(shared)) => shared,
            (None, None) => return None,
        };

        let mut acc = match plan.class {
            FilterClass::Convolution | FilterClass::Operator => Accumulator::Sum {
                value: 0.0,
                weight: 0.0,
            },
            FilterClass::OrderStatistic(_) => {
                self.samples.clear();
                Accumulator::Samples(&mut self.samples)
            }
            FilterClass::WeightedOrderStatistic(_) => {
                self.observations.clear();
                Accumulator::Weighted(&mut self.observations)
            }
        };

        let x_half = x_half as i64;
        let y_half = window.y_half() as i64;
        for j in -y_half..=y_half {
            let row_in = row_origin + j;
            if row_in < 0 || row_in >= n_rows {
                continue;
            }
            if visit_check {
                self.visited.clear();
            }
            for i in -x_half..=x_half {
                let mut col_in = col_origin + i;
                if let Some(nx_wrap) = plan.nx_wrap {
                    if col_in < 0 {
                        col_in += nx_wrap;
                    } else if col_in >= nx_wrap {
                        col_in -= nx_wrap;
                    }
                }
                if col_in < 0 || col_in >= n_columns {
                    continue;
                }
                let (col, row) = (col_in as usize, row_in as usize);
                if visit_check && !self.visited.insert_new(col) {
                    continue;
                }

                let k = window.weight(i, j);
                if k <= 0.0 && !operator {
                    continue;
                }
                let Some(v) = input.sample(col, row) else {
                    if plan.nan_policy == NanPolicy::Preserve {
                        return None;
                    }
                    continue;
                };

                let w = k * plan.area.get(col, row);
                match &mut acc {
                    Accumulator::Sum { value, weight } => {
                        *value += v as f64 * w;
                        *weight += w;
                    }
                    Accumulator::Samples(samples) => samples.push(v as f64),
                    Accumulator::Weighted(observations) => observations.push(Observation {
                        value: v as f64,
                        weight: w,
                    }),
                }
            }
        }

        match (acc, plan.class) {
            (Accumulator::Sum { value, .. }, FilterClass::Operator) => Some(value),
            (Accumulator::Sum { value, weight }, _) => (weight != 0.0).then(|| value / weight),
            (Accumulator::Samples(samples), FilterClass::OrderStatistic(stat)) => {
                if samples.is_empty() {
                    return None;
                }
                Some(match stat {
                    RankStatistic::Quantile(q) => statistics::quantile(samples, q),
                    RankStatistic::Mode(tie_break) => {
                        let est = statistics::mode(samples, tie_break);
                        if est.multiplicity > 1 {
                            self.tally.n_multiple_modes += est.multiplicity as u64;
                        }
                        est.value
                    }
                    RankStatistic::Extreme(kind) => statistics::extreme(samples, kind),
                })
            }
            (Accumulator::Weighted(observations), FilterClass::WeightedOrderStatistic(stat)) => {
                if observations.is_empty() {
                    return None;
                }
                Some(match stat {
                    WeightedStatistic::Quantile(q) => {
                        statistics::weighted_quantile(observations, q)
                    }
                    WeightedStatistic::Mode => statistics::weighted_mode(observations),
                })
            }
            _ => None,
        }
    }
}
