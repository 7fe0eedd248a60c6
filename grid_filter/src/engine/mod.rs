//! Filter entry point: plan, run the row workers, join, optional high-pass.


use common::{parallel, Buffer2};

use crate::aggregator::{RowWorker, Tally};
use crate::config::FilterConfig;
use crate::error::Result;
use crate::grid::Grid;
use crate::highpass::{self, BilinearResampler, Resample};
use crate::plan::{FilterClass, FilterPlan};
use crate::window::EffortLevel;

/// Summary of a filter run.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterReport {
    /// Output nodes that could not be estimated and were set to NaN.
    pub n_nan: u64,
    /// Total modes counted at nodes where several modes tied.
    pub n_multiple_modes: u64,
    pub effort_level: EffortLevel,
    pub class: FilterClass,
    /// Maximum footprint in input nodes.
    pub window_columns: usize,
    pub window_rows: usize,
    pub n_workers: usize,
    pub highpass: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutput {
    pub grid: Grid,
    pub report: FilterReport,
}

/// A configured filter, reusable across input grids.
#[derive(Debug, Clone)]
pub struct GridFilter {
    config: FilterConfig,
    custom_weights: Option<Buffer2<f32>>,
}

impl GridFilter {
    pub fn new(config: FilterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            custom_weights: None,
        })
    }

    /// Weight grid for custom and operator filters; row 0 is north.
    pub fn with_custom_weights(mut self, weights: Buffer2<f32>) -> Self {
        self.custom_weights = Some(weights);
        self
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Filter `input`, resampling bilinearly for high-pass output on another lattice.
    pub fn apply(&self, input: &Grid) -> Result<FilterOutput> {
        let resampler = BilinearResampler::new(self.config.distance.is_geographic());
        self.apply_with_resampler(input, &resampler)
    }

    pub fn apply_with_resampler(
        &self,
        input: &Grid,
        resampler: &dyn Resample,
    ) -> Result<FilterOutput> {
        let plan = FilterPlan::new(&self.config, input, self.custom_weights.as_ref())?;
        let mut output = Grid::filled(plan.output.clone(), plan.output.nan_value)?;
        let width = plan.output.n_columns;

        tracing::debug!(
            "Row ranges {:?}",
            parallel::row_ranges(plan.output.n_rows, plan.n_workers)
        );
        let results = parallel::run_row_ranges(
            output.data_mut().values_mut(),
            width,
            plan.n_workers,
            |rows, chunk| RowWorker::new(&plan).map(|worker| worker.run(rows, chunk)),
        )?;

        let mut tally = Tally::default();
        for result in results {
            tally += result?;
        }
        if tally.n_nan > 0 {
            tracing::warn!("Unable to estimate value at {} nodes, set to NaN", tally.n_nan);
        }
        if tally.n_multiple_modes > 0 {
            tracing::info!(
                "{} separate modes found by the mode filter",
                tally.n_multiple_modes
            );
        }

        let report = FilterReport {
            n_nan: tally.n_nan,
            n_multiple_modes: tally.n_multiple_modes,
            effort_level: plan.effort,
            class: plan.class,
            window_columns: 2 * plan.max_x_half + 1,
            window_rows: 2 * plan.y_half + 1,
            n_workers: plan.n_workers,
            highpass: self.config.highpass,
        };

        let grid = if self.config.highpass {
            highpass::finish_highpass(input, output, resampler)?
        } else {
            output
        };
        Ok(FilterOutput { grid, report })
    }
}
