//! Local epipolar-line geometry: the finite-difference tangent at a point,
//! its signed angle, and stepping one grid cell along or across it.

use std::f64::consts::{FRAC_PI_2, PI};

use super::{coloc, EpiPoint};
use crate::error::{EpipolarError, Result};
use crate::sensor::RpcModel;

/// Estimate the local epipolar line in the left image passing through
/// `points`, by bracketing the corresponding right-image point at
/// `elevation - elevation_offset` and `elevation + elevation_offset`.
///
/// `coloc` always returns the altitude it was called with, so the "ground
/// elevation" of the right correspondent is simply `elevation` itself.
pub fn local_epipolar_segment(
    left: &RpcModel,
    right: &RpcModel,
    points: &[EpiPoint],
    elevation: f64,
    elevation_offset: f64,
) -> Result<(Vec<EpiPoint>, Vec<EpiPoint>)> {
    let right_corr = coloc(left, right, points, elevation)?;
    let start = coloc(right, left, &right_corr, elevation - elevation_offset)?;
    let end = coloc(right, left, &right_corr, elevation + elevation_offset)?;
    Ok((start, end))
}

/// Signed angle of the line from `start` to `end`, in `(-pi/2, 3*pi/2]`.
pub fn epipolar_angle(start: &[EpiPoint], end: &[EpiPoint]) -> Vec<f64> {
    start
        .iter()
        .zip(end.iter())
        .map(|(s, e)| {
            if e.col == s.col {
                if e.row > s.row {
                    FRAC_PI_2
                } else {
                    -FRAC_PI_2
                }
            } else {
                let slope = (e.row - s.row) / (e.col - s.col);
                if e.col > s.col {
                    slope.atan()
                } else {
                    PI + slope.atan()
                }
            }
        })
        .collect()
}

/// Step one epipolar grid cell from `current_left`, either along the
/// local epipolar line (`axis = 0`) or across to the next line
/// (`axis = 1`), and colocate the new left position into the right image.
pub fn move_along_axis(
    left: &RpcModel,
    right: &RpcModel,
    current_left: &[EpiPoint],
    angles: &[f64],
    axis: i32,
    spacing: f64,
    epi_step: f64,
    elevation: f64,
) -> Result<(Vec<EpiPoint>, Vec<EpiPoint>)> {
    if axis != 0 && axis != 1 {
        return Err(EpipolarError::InvalidAxis(axis).into());
    }
    if current_left.len() != angles.len() {
        return Err(EpipolarError::DimensionMismatch(current_left.len(), angles.len()).into());
    }

    let next_left: Vec<EpiPoint> = current_left
        .iter()
        .zip(angles.iter())
        .map(|(p, &alpha)| {
            let alpha_prime = alpha + (axis as f64) * FRAC_PI_2;
            let dcol = epi_step * spacing * alpha_prime.cos();
            let drow = epi_step * spacing * alpha_prime.sin();
            EpiPoint::new(p.row + drow, p.col + dcol, p.alt)
        })
        .collect();

    let next_right = coloc(left, right, &next_left, elevation)?;
    Ok((next_left, next_right))
}
