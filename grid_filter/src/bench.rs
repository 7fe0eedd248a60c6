//! Benchmark module for grid filtering.
//! Run with: cargo bench --package grid_filter --features bench

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput};

use crate::config::{DistanceMode, FilterConfig, FilterKind};
use crate::engine::GridFilter;
use crate::grid::{Grid, GridHeader, Region, Registration};

fn cartesian_grid(size: usize) -> Grid {
    let region = Region::new(0.0, size as f64, 0.0, size as f64);
    let header = GridHeader::new(region, 1.0, 1.0, Registration::Pixel)
        .expect("benchmark grid header");
    Grid::from_fn(header, |x, y| ((x * 0.37).sin() * (y * 0.21).cos() * 100.0) as f32)
}

fn global_grid(inc: f64) -> Grid {
    let region = Region::new(0.0, 360.0, -90.0, 90.0);
    let header = GridHeader::new(region, inc, inc, Registration::Gridline)
        .expect("benchmark grid header");
    Grid::from_fn(header, |lon, lat| {
        (lon.to_radians().sin() * lat.to_radians().cos() * 1000.0) as f32
    })
}

/// Register grid filter benchmarks with Criterion.
pub fn benchmarks(c: &mut Criterion) {
    let grid = cartesian_grid(512);
    let mut group = c.benchmark_group("cartesian_filter");
    group.sample_size(10);
    group.throughput(Throughput::Elements(grid.header().len() as u64));

    for kind in [FilterKind::Gaussian, FilterKind::Median, FilterKind::Mode] {
        for threads in [1, 4] {
            let config = FilterConfig::new(kind, 9.0).with_threads(threads);
            let filter = GridFilter::new(config).expect("valid benchmark config");
            group.bench_function(
                BenchmarkId::new(kind.to_string(), format!("{}threads", threads)),
                |b| b.iter(|| black_box(filter.apply(black_box(&grid)))),
            );
        }
    }
    group.finish();

    let grid = global_grid(0.5);
    let mut group = c.benchmark_group("spherical_filter");
    group.sample_size(10);
    group.throughput(Throughput::Elements(grid.header().len() as u64));

    for mode in [DistanceMode::FlatEarthVariable, DistanceMode::Spherical] {
        let config = FilterConfig::new(FilterKind::Gaussian, 300.0)
            .with_distance(mode)
            .with_threads(4);
        let filter = GridFilter::new(config).expect("valid benchmark config");
        group.bench_function(BenchmarkId::new("gaussian_300km", mode.to_string()), |b| {
            b.iter(|| black_box(filter.apply(black_box(&grid))))
        });
    }
    group.finish();
}
