//! High-pass output: input minus the low-pass result.
//!
//! When the low-pass grid was produced on a different lattice it is first
//! resampled back onto the input lattice through a [`Resample`] implementation.

use crate::error::{Error, Result};
use crate::grid::{Grid, GridHeader};

/// Resamples a grid onto another lattice.
pub trait Resample {
    fn resample(&self, grid: &Grid, target: &GridHeader) -> Result<Grid>;
}

/// Bilinear interpolation between the four surrounding nodes.
///
/// Targets farther than half a cell outside the source are missing, as is any
/// target whose interpolation touches a missing node. Periodic sources wrap in
/// longitude.
#[derive(Debug, Clone, Copy, Default)]
pub struct BilinearResampler {
    geographic: bool,
}

impl BilinearResampler {
    pub fn new(geographic: bool) -> Self {
        Self { geographic }
    }
}

/// Interpolation position along one axis: lower node, upper node, fraction.
fn axis_position(f: f64, n: usize, period: Option<usize>) -> Option<(usize, usize, f64)> {
    if let Some(period) = period {
        let f = f.rem_euclid(period as f64);
        let i0 = (f.floor() as usize).min(period - 1);
        return Some((i0, (i0 + 1) % period, f - i0 as f64));
    }
    let tolerance = 1e-4;
    let last = (n - 1) as f64;
    if f < -0.5 - tolerance || f > last + 0.5 + tolerance {
        return None;
    }
    let f = f.clamp(0.0, last);
    let i0 = f.floor() as usize;
    let i1 = (i0 + 1).min(n - 1);
    Some((i0, i1, f - i0 as f64))
}

impl Resample for BilinearResampler {
    fn resample(&self, grid: &Grid, target: &GridHeader) -> Result<Grid> {
        let src = grid.header();
        let offset = src.registration.node_offset();
        let period = (self.geographic && src.is_global_longitude())
            .then(|| (360.0 / src.x_inc).round() as usize);
        let target = target.clone().with_nan_value(src.nan_value);
        let missing = target.nan_value;

        let interpolate = |x: f64, y: f64| -> f32 {
            let fx = (x - src.region.west) / src.x_inc - offset;
            let fy = (src.region.north - y) / src.y_inc - offset;
            let (Some((c0, c1, t)), Some((r0, r1, u))) = (
                axis_position(fx, src.n_columns, period),
                axis_position(fy, src.n_rows, None),
            ) else {
                return missing;
            };

            let corners = [
                (c0, r0, (1.0 - t) * (1.0 - u)),
                (c1, r0, t * (1.0 - u)),
                (c0, r1, (1.0 - t) * u),
                (c1, r1, t * u),
            ];
            let mut sum = 0.0;
            for (col, row, w) in corners {
                if w == 0.0 {
                    continue;
                }
                match grid.sample(col, row) {
                    Some(v) => sum += w * v as f64,
                    None => return missing,
                }
            }
            sum as f32
        };

        let values = (0..target.n_rows)
            .flat_map(|row| (0..target.n_columns).map(move |col| (col, row)))
            .map(|(col, row)| interpolate(target.col_to_x(col), target.row_to_y(row)))
            .collect();
        Grid::new(target, values)
    }
}

/// `input - lowpass` on the input lattice.
pub(crate) fn finish_highpass(
    input: &Grid,
    lowpass: Grid,
    resampler: &dyn Resample,
) -> Result<Grid> {
    let header = input.header();
    let lowpass = if header.is_coregistered(lowpass.header()) {
        lowpass
    } else {
        tracing::info!("Resampling low-pass result onto the input lattice for high-pass output");
        let resampled = resampler.resample(&lowpass, header)?;
        if !header.is_coregistered(resampled.header()) {
            return Err(Error::InvalidGrid(
                "resampled low-pass grid does not match the input lattice".into(),
            ));
        }
        resampled
    };

    tracing::info!("Subtracting low-pass filtered data from input grid");
    let low_h = lowpass.header();
    let values = input
        .data()
        .iter()
        .zip(lowpass.data().iter())
        .map(|(&o, &l)| {
            if header.is_missing(o) || low_h.is_missing(l) {
                header.nan_value
            } else {
                o - l
            }
        })
        .collect();
    Grid::new(header.clone(), values)
}
