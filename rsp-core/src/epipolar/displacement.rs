//! Conversion between absolute epipolar-frame positions and the
//! displacement grids the external resampler consumes.

use ndarray::Array3;

use crate::geometry::AffineTransform;

/// A 2-band displacement grid: band 0 is row displacement, band 1 is
/// column displacement, relative to the grid's own epipolar-frame affine.
#[derive(Debug, Clone)]
pub struct DisplacementGrid {
    pub data: Array3<f64>,
    pub transform: AffineTransform,
}

impl DisplacementGrid {
    pub fn zeros(nb_rows: usize, nb_cols: usize, epi_step: f64) -> Self {
        Self {
            data: Array3::zeros((2, nb_rows, nb_cols)),
            transform: AffineTransform::epipolar(epi_step),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        let dims = self.data.dim();
        (dims.1, dims.2)
    }
}

/// A 3-band absolute-position grid: row, col, altitude.
#[derive(Debug, Clone)]
pub struct PositionGrid {
    pub data: Array3<f64>,
    pub transform: AffineTransform,
}

impl PositionGrid {
    pub fn zeros(nb_rows: usize, nb_cols: usize, epi_step: f64) -> Self {
        Self {
            data: Array3::zeros((3, nb_rows, nb_cols)),
            transform: AffineTransform::epipolar(epi_step),
        }
    }
}

/// Subtract each grid cell's physical-frame coordinate from its absolute
/// position, turning a `PositionGrid` into a `DisplacementGrid`.
pub fn positions_to_displacement_grid(
    left: &PositionGrid,
    right: &PositionGrid,
    epi_step: f64,
) -> (DisplacementGrid, DisplacementGrid) {
    (
        subtract_physical(left, epi_step),
        subtract_physical(right, epi_step),
    )
}

fn subtract_physical(grid: &PositionGrid, epi_step: f64) -> DisplacementGrid {
    let (_, nb_rows, nb_cols) = grid.data.dim();
    let mut out = DisplacementGrid::zeros(nb_rows, nb_cols, epi_step);
    for row in 0..nb_rows {
        for col in 0..nb_cols {
            let (row_geo, col_geo) = grid.transform.index_to_physical(row as f64, col as f64);
            out.data[[0, row, col]] = grid.data[[0, row, col]] - row_geo;
            out.data[[1, row, col]] = grid.data[[1, row, col]] - col_geo;
        }
    }
    out
}

/// The inverse of `positions_to_displacement_grid`: add each grid cell's
/// physical-frame coordinate back to its displacement. Used to exercise
/// round-trip idempotence in tests.
pub fn to_position_grid(displacement: &DisplacementGrid) -> PositionGrid {
    let (nb_rows, nb_cols) = displacement.shape();
    let epi_step = displacement.transform.a;
    let mut out = PositionGrid::zeros(nb_rows, nb_cols, epi_step);
    for row in 0..nb_rows {
        for col in 0..nb_cols {
            let (row_geo, col_geo) = displacement.transform.index_to_physical(row as f64, col as f64);
            out.data[[0, row, col]] = displacement.data[[0, row, col]] + row_geo;
            out.data[[1, row, col]] = displacement.data[[1, row, col]] + col_geo;
        }
    }
    out
}
