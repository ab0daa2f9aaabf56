//! The grid walker: sweeps the epipolar lattice, producing left and right
//! displacement grids and the mean baseline-to-height ratio.

use super::displacement::DisplacementGrid;
use super::planner::prepare_rectification;
use super::primitives::{epipolar_angle, local_epipolar_segment, move_along_axis};
use super::{coloc, EpiPoint};
use crate::elevation::Elevation;
use crate::error::Result;
use crate::geometry::ImageGeometry;
use crate::sensor::RpcModel;

/// Output of `compute_stereo_grids`.
pub struct StereoGrids {
    pub left: DisplacementGrid,
    pub right: DisplacementGrid,
    pub rectified_rows: usize,
    pub rectified_cols: usize,
    pub mean_baseline_ratio: f64,
}

/// Walk the epipolar lattice of a stereo pair, producing displacement
/// grids for both images and the mean baseline-to-height ratio.
pub fn compute_stereo_grids(
    left_image: &ImageGeometry,
    rpc_left: &RpcModel,
    right_image: &ImageGeometry,
    rpc_right: &RpcModel,
    elevation: &dyn Elevation,
    epi_step: f64,
    elevation_offset: f64,
) -> Result<StereoGrids> {
    let plan = prepare_rectification(left_image, rpc_left, rpc_right, elevation, epi_step, elevation_offset)?;
    let (nb_rows, nb_cols) = plan.grid_size;

    let alt = elevation.sample(rpc_left.lon_offset(), rpc_left.lat_offset());
    let mean_spacing = 0.5 * (left_image.pixel_size_col.abs() + left_image.pixel_size_row.abs());

    let mut left_grid = DisplacementGrid::zeros(nb_rows, nb_cols, epi_step);
    let mut right_grid = DisplacementGrid::zeros(nb_rows, nb_cols, epi_step);

    let start_left = plan.footprint[0];
    let start_right = coloc(rpc_left, rpc_right, &[start_left], alt)?[0];

    // Seed the origin of every row (column 0 of the lattice) by walking
    // across the epipolar direction, starting from the left footprint.
    let mut left_origins = vec![start_left];
    let mut right_origins = vec![start_right];
    for _ in 0..nb_rows.saturating_sub(1) {
        let current = *left_origins.last().unwrap();
        let (local_start, local_end) = local_epipolar_segment(rpc_left, rpc_right, &[current], alt, elevation_offset)?;
        let alpha = epipolar_angle(&local_start, &local_end);
        let (next_left, next_right) =
            move_along_axis(rpc_left, rpc_right, &[current], &alpha, 1, mean_spacing, epi_step, alt)?;
        left_origins.push(next_left[0]);
        right_origins.push(next_right[0]);
    }

    let mut left_coords = left_origins;
    let mut right_coords = right_origins;
    let mut baseline_sum = 0.0;

    for col in 0..nb_cols {
        for row in 0..nb_rows {
            let (lrow, lcol) = left_grid.transform.index_to_physical(row as f64, col as f64);
            let (rrow, rcol) = right_grid.transform.index_to_physical(row as f64, col as f64);
            left_grid.data[[0, row, col]] = left_coords[row].row - lrow;
            left_grid.data[[1, row, col]] = left_coords[row].col - lcol;
            right_grid.data[[0, row, col]] = right_coords[row].row - rrow;
            right_grid.data[[1, row, col]] = right_coords[row].col - rcol;
        }

        let (local_start, local_end) = local_epipolar_segment(rpc_left, rpc_right, &left_coords, alt, elevation_offset)?;
        for (s, e) in local_start.iter().zip(local_end.iter()) {
            let d = ((e.col - s.col).powi(2) + (e.row - s.row).powi(2)).sqrt();
            baseline_sum += d / (2.0 * elevation_offset);
        }

        let alpha = epipolar_angle(&local_start, &local_end);
        let (next_left, next_right) =
            move_along_axis(rpc_left, rpc_right, &left_coords, &alpha, 0, mean_spacing, epi_step, alt)?;
        left_coords = next_left;
        right_coords = next_right;
    }

    let mean_baseline_ratio = baseline_sum / (nb_rows * nb_cols) as f64;

    Ok(StereoGrids {
        left: left_grid,
        right: right_grid,
        rectified_rows: plan.rectified_size.0,
        rectified_cols: plan.rectified_size.1,
        mean_baseline_ratio,
    })
}
