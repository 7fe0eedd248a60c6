//! Test helpers: tracing setup and small synthetic grids.

#![allow(dead_code)]

use crate::grid::{Grid, GridHeader, Region, Registration};

/// Initialize tracing subscriber for tests.
/// Safe to call multiple times - will only initialize once.
/// Respects RUST_LOG env var, defaults to "info".
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Unit-spaced pixel grid with `values` in row-major order, row 0 north.
pub fn pixel_grid(n_columns: usize, n_rows: usize, values: Vec<f32>) -> Grid {
    let region = Region::new(0.0, n_columns as f64, 0.0, n_rows as f64);
    let header = GridHeader::new(region, 1.0, 1.0, Registration::Pixel).unwrap();
    Grid::new(header, values).unwrap()
}

pub fn constant_pixel_grid(n_columns: usize, n_rows: usize, value: f32) -> Grid {
    pixel_grid(n_columns, n_rows, vec![value; n_columns * n_rows])
}

/// Global lon/lat grid evaluated from `f(lon, lat)`.
pub fn global_grid(inc: f64, registration: Registration, f: impl FnMut(f64, f64) -> f32) -> Grid {
    let region = Region::new(0.0, 360.0, -90.0, 90.0);
    let header = GridHeader::new(region, inc, inc, registration).unwrap();
    Grid::from_fn(header, f)
}

/// Deterministic pseudo-random values in `[0, 100)`.
pub fn noise(n: usize, seed: u64) -> Vec<f32> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) % 10_000) as f32 / 100.0
        })
        .collect()
}

/// Values of a grid with missing nodes mapped to `None`.
pub fn samples(grid: &Grid) -> Vec<Option<f32>> {
    let h = grid.header();
    (0..h.n_rows)
        .flat_map(|row| (0..h.n_columns).map(move |col| (col, row)))
        .map(|(col, row)| grid.sample(col, row))
        .collect()
}
