//! Per-node area weights of the input grid.
//!
//! Geographic nodes are weighted by the solid angle of their cell, which
//! shrinks toward the poles. Cartesian nodes are weighted by cell area, with
//! gridline boundary nodes sharing their cell with the outside of the grid.

use common::Buffer2;

use crate::config::DistanceMode;
use crate::error::{Error, Result};
use crate::geo;
use crate::grid::{GridHeader, Registration};

#[derive(Debug, Clone, PartialEq)]
pub struct AreaWeightGrid {
    weights: Buffer2<f64>,
}

impl AreaWeightGrid {
    pub fn new(header: &GridHeader, mode: DistanceMode) -> Result<Self> {
        let mut weights = Buffer2::try_new_filled(header.n_columns, header.n_rows, 0.0)
            .map_err(Error::alloc("area weights"))?;

        let column_weights = column_weights(header, mode);
        for (row, values) in weights.rows_mut().enumerate() {
            let row_weight = row_weight(header, mode, row);
            for (w, &col_weight) in values.iter_mut().zip(&column_weights) {
                *w = row_weight * col_weight;
            }
        }

        if let Some(bad) = weights.iter().position(|w| !(*w > 0.0)) {
            return Err(Error::InvalidGrid(format!(
                "non-positive area weight at node {} (row {}); is the latitude range valid?",
                bad,
                bad / header.n_columns
            )));
        }
        Ok(Self { weights })
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> f64 {
        self.weights[(col, row)]
    }

    #[cfg(test)]
    pub(crate) fn weights(&self) -> &Buffer2<f64> {
        &self.weights
    }
}

fn is_gridline_edge(header: &GridHeader, index: usize, len: usize) -> bool {
    header.registration == Registration::Gridline && (index == 0 || index + 1 == len)
}

fn column_weights(header: &GridHeader, mode: DistanceMode) -> Vec<f64> {
    let n = header.n_columns;
    if mode.is_geographic() {
        // The east column of a 360-degree gridline grid is never sampled, so the
        // west column represents its whole cell
        let periodic = header.is_global_longitude();
        let dx = header.x_inc.to_radians();
        (0..n)
            .map(|col| {
                if !periodic && is_gridline_edge(header, col, n) {
                    0.5 * dx
                } else {
                    dx
                }
            })
            .collect()
    } else {
        (0..n)
            .map(|col| {
                if is_gridline_edge(header, col, n) {
                    0.5 * header.x_inc
                } else {
                    header.x_inc
                }
            })
            .collect()
    }
}

fn row_weight(header: &GridHeader, mode: DistanceMode, row: usize) -> f64 {
    if !mode.is_geographic() {
        return if is_gridline_edge(header, row, header.n_rows) {
            0.5 * header.y_inc
        } else {
            header.y_inc
        };
    }

    let y = header.row_to_y(row);
    let half = 0.5 * header.y_inc;
    let (mut south, mut north) = (y - half, y + half);
    if header.registration == Registration::Gridline {
        south = south.max(header.region.south);
        north = north.min(header.region.north);
    }
    if mode == DistanceMode::Mercator {
        south = geo::img_to_lat(south);
        north = geo::img_to_lat(north);
    }
    let south = south.clamp(-90.0, 90.0);
    let north = north.clamp(-90.0, 90.0);
    north.to_radians().sin() - south.to_radians().sin()
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;
    use crate::grid::Region;

    fn global(inc: f64, registration: Registration) -> GridHeader {
        GridHeader::new(Region::new(0.0, 360.0, -90.0, 90.0), inc, inc, registration).unwrap()
    }

    #[test]
    fn test_all_weights_positive() {
        for registration in [Registration::Gridline, Registration::Pixel] {
            for mode in [DistanceMode::Cartesian, DistanceMode::Spherical] {
                let header = global(10.0, registration);
                let area = AreaWeightGrid::new(&header, mode).unwrap();
                assert!(area.weights().iter().all(|&w| w > 0.0));
            }
        }
    }

    #[test]
    fn test_global_geographic_sums_to_sphere() {
        for registration in [Registration::Gridline, Registration::Pixel] {
            let header = global(5.0, registration);
            let area = AreaWeightGrid::new(&header, DistanceMode::Spherical).unwrap();
            // The duplicated east column of a gridline grid is never sampled
            let sampled_columns = match registration {
                Registration::Gridline => header.n_columns - 1,
                Registration::Pixel => header.n_columns,
            };
            let total: f64 = area
                .weights()
                .chunks_exact(header.n_columns)
                .map(|row| row[..sampled_columns].iter().sum::<f64>())
                .sum();
            assert!((total - 4.0 * PI).abs() < 1e-9, "{registration}: {total}");
        }
    }

    #[test]
    fn test_pole_rows_use_cap_area() {
        let header = global(2.0, Registration::Gridline);
        let area = AreaWeightGrid::new(&header, DistanceMode::Spherical).unwrap();
        let dx = 2.0f64.to_radians();
        let cap = 1.0 - 1.0f64.to_radians().cos();
        assert!((area.get(0, 0) - cap * dx).abs() < 1e-15);
        assert!((area.get(5, header.n_rows - 1) - cap * dx).abs() < 1e-15);
        // Equator gets the widest band
        let equator = header.n_rows / 2;
        assert!(area.get(5, equator) > area.get(5, 10));
    }

    #[test]
    fn test_cartesian_gridline_edges_share_weight() {
        let region = Region::new(0.0, 4.0, 0.0, 2.0);
        let header = GridHeader::new(region, 1.0, 0.5, Registration::Gridline).unwrap();
        let area = AreaWeightGrid::new(&header, DistanceMode::Cartesian).unwrap();
        assert_eq!(area.get(2, 2), 0.5);
        assert_eq!(area.get(0, 2), 0.25);
        assert_eq!(area.get(2, 0), 0.25);
        assert_eq!(area.get(0, 0), 0.125);
        assert_eq!(area.get(4, 4), 0.125);
    }

    #[test]
    fn test_cartesian_pixel_is_constant() {
        let header = GridHeader::new(Region::new(0.0, 4.0, 0.0, 2.0), 1.0, 0.5, Registration::Pixel)
            .unwrap();
        let area = AreaWeightGrid::new(&header, DistanceMode::Pixel).unwrap();
        assert!(area.weights().iter().all(|&w| w == 0.5));
    }

    #[test]
    fn test_regional_gridline_halves_edge_columns() {
        let header =
            GridHeader::new(Region::new(0.0, 10.0, -5.0, 5.0), 1.0, 1.0, Registration::Gridline)
                .unwrap();
        let area = AreaWeightGrid::new(&header, DistanceMode::GeoCartesian).unwrap();
        assert!((area.get(0, 5) - 0.5 * area.get(1, 5)).abs() < 1e-15);
        assert!((area.get(10, 5) - 0.5 * area.get(1, 5)).abs() < 1e-15);
    }

    #[test]
    fn test_mercator_rows_use_true_latitudes() {
        let y = geo::lat_to_img(60.0);
        let header = GridHeader::new(
            Region::new(0.0, 10.0, -y, y),
            1.0,
            1.0,
            Registration::Pixel,
        )
        .unwrap();
        let area = AreaWeightGrid::new(&header, DistanceMode::Mercator).unwrap();
        // Equal Mercator spacing covers less true latitude toward the poles
        let middle = header.n_rows / 2;
        assert!(area.get(0, 0) < area.get(0, middle));
        assert!(area.weights().iter().all(|&w| w > 0.0));
    }

    #[test]
    fn test_invalid_latitudes_rejected() {
        let header =
            GridHeader::new(Region::new(0.0, 10.0, 80.0, 100.0), 1.0, 1.0, Registration::Pixel)
                .unwrap();
        assert!(matches!(
            AreaWeightGrid::new(&header, DistanceMode::Spherical),
            Err(Error::InvalidGrid(_))
        ));
    }
}
