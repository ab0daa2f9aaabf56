//! The rectification planner: chooses grid spacing, computes the
//! epipolar-frame bounding box of the left image, and returns the grid
//! and rectified-image shapes plus the left-image footprint corners.

use super::primitives::{epipolar_angle, local_epipolar_segment};
use super::EpiPoint;
use crate::elevation::Elevation;
use crate::error::Result;
use crate::geometry::ImageGeometry;
use crate::sensor::RpcModel;

/// Output of `prepare_rectification`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectificationPlan {
    pub grid_pixel_size: (f64, f64),
    pub grid_size: (usize, usize),
    pub rectified_size: (usize, usize),
    /// Left-image footprint corners, in left-image georeferenced frame,
    /// in `[upper-left, lower-left, lower-right, upper-right]` order.
    pub footprint: [EpiPoint; 4],
}

/// Determine the size and spacing of the epipolar grids, and the
/// upper-left origin (and other corners) of the stereo-rectified left
/// image, from the left image's geometry and both RPC models.
pub fn prepare_rectification(
    left_image: &ImageGeometry,
    rpc_left: &RpcModel,
    rpc_right: &RpcModel,
    elevation: &dyn Elevation,
    epi_step: f64,
    elevation_offset: f64,
) -> Result<RectificationPlan> {
    let mean_spacing = 0.5 * (left_image.pixel_size_col.abs() + left_image.pixel_size_row.abs());
    let grid_pixel_size = (epi_step * mean_spacing, epi_step * mean_spacing);

    let alt = elevation.sample(rpc_left.lon_offset(), rpc_left.lat_offset());

    let (origin_row, origin_col) = left_image.transform_index_to_physical_point(0.0, 0.0);
    let origin = EpiPoint::new(origin_row, origin_col, alt);

    let (local_start, local_end) = local_epipolar_segment(rpc_left, rpc_right, &[origin], alt, elevation_offset)?;
    let alpha = epipolar_angle(&local_start, &local_end)[0];

    let along_x = alpha.cos();
    let along_y = alpha.sin();
    let ortho_x = -alpha.sin();
    let ortho_y = alpha.cos();

    let nb_cols = left_image.nb_columns as f64;
    let nb_rows = left_image.nb_rows as f64;
    let pixel_size_col = left_image.pixel_size_col;
    let pixel_size_row = left_image.pixel_size_row;

    let ulx = 0.0;
    let uly = 0.0;
    let urx = along_x * nb_cols * pixel_size_col;
    let ury = ortho_x * nb_cols * pixel_size_col;
    let llx = along_y * nb_rows * pixel_size_row;
    let lly = ortho_y * nb_rows * pixel_size_row;
    let lrx = along_x * nb_cols * pixel_size_col + along_y * nb_rows * pixel_size_row;
    let lry = ortho_x * nb_cols * pixel_size_col + ortho_y * nb_rows * pixel_size_row;

    let minx = ulx.min(urx).min(llx).min(lrx);
    let miny = uly.min(ury).min(lly).min(lry);
    let maxx = ulx.max(urx).max(llx).max(lrx);
    let maxy = uly.max(ury).max(lly).max(lry);

    let rectified_rows = ((maxy - miny) / mean_spacing) as usize;
    let rectified_cols = ((maxx - minx) / mean_spacing) as usize;

    let mean_alt = (local_start[0].alt + local_end[0].alt) / 2.0;

    let ul = EpiPoint::new(
        origin_row + (along_y * minx + ortho_y * miny),
        origin_col + (along_x * minx + ortho_x * miny),
        mean_alt,
    );
    let lr = EpiPoint::new(
        origin_row + (along_y * (maxx + epi_step) + ortho_y * (maxy + epi_step)),
        origin_col + (along_x * (maxx + epi_step) + ortho_x * (maxy + epi_step)),
        mean_alt,
    );
    let ur = EpiPoint::new(
        origin_row + (along_y * minx + ortho_y * (maxy + epi_step)),
        origin_col + (along_x * minx + ortho_x * (maxy + epi_step)),
        mean_alt,
    );
    let ll = EpiPoint::new(
        origin_row + (along_y * (maxx + epi_step) + ortho_y * miny),
        origin_col + (along_x * (maxx + epi_step) + ortho_x * miny),
        mean_alt,
    );

    let grid_size = (
        (rectified_rows as f64 / epi_step) as usize + 2,
        (rectified_cols as f64 / epi_step) as usize + 2,
    );

    Ok(RectificationPlan {
        grid_pixel_size,
        grid_size,
        rectified_size: (rectified_rows, rectified_cols),
        footprint: [ul, ll, lr, ur],
    })
}

/// Reproject the left-image epipolar footprint back to lon/lat, returning
/// `[lat_min, lon_min, lat_max, lon_max]` (order pinned; preserved
/// verbatim despite the lon/lat naming suggesting otherwise).
pub fn get_epipolar_extent(
    left_image: &ImageGeometry,
    rpc_left: &RpcModel,
    rpc_right: &RpcModel,
    elevation: &dyn Elevation,
    epi_step: f64,
    elevation_offset: f64,
    margin: f64,
) -> Result<[f64; 4]> {
    let plan = prepare_rectification(left_image, rpc_left, rpc_right, elevation, epi_step, elevation_offset)?;

    let row: Vec<f64> = plan.footprint.iter().map(|p| p.row).collect();
    let col: Vec<f64> = plan.footprint.iter().map(|p| p.col).collect();
    let (lon, lat) = rpc_left.direct_loc_h(&row, &col, 0.0)?;

    let lon_min = lon.iter().cloned().fold(f64::INFINITY, f64::min);
    let lon_max = lon.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let lat_min = lat.iter().cloned().fold(f64::INFINITY, f64::min);
    let lat_max = lat.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    Ok([lat_min - margin, lon_min - margin, lat_max + margin, lon_max + margin])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elevation::ConstantElevation;
    use crate::geometry::AffineTransform;
    use crate::sensor::{ForwardCoefficients, InverseCoefficients, Normalization};

    fn identity_normalization() -> Normalization {
        Normalization {
            lon_offset: 0.0,
            lon_scale: 1000.0,
            lat_offset: 0.0,
            lat_scale: 1000.0,
            alt_offset: 0.0,
            alt_scale: 1000.0,
            col_offset: 500.0,
            col_scale: 500.0,
            row_offset: 500.0,
            row_scale: 500.0,
        }
    }

    fn identity_rpc() -> RpcModel {
        let mut num_col = [0.0; 20];
        num_col[1] = 1.0;
        let mut den_col = [0.0; 20];
        den_col[0] = 1.0;
        let mut num_row = [0.0; 20];
        num_row[2] = 1.0;
        let mut den_row = [0.0; 20];
        den_row[0] = 1.0;
        let inverse = InverseCoefficients {
            num_col,
            den_col,
            num_row,
            den_row,
        };
        let forward = ForwardCoefficients {
            num_lon: num_col,
            den_lon: den_col,
            num_lat: num_row,
            den_lat: den_row,
        };
        RpcModel::from_bidirectional(identity_normalization(), inverse, forward).unwrap()
    }

    fn image_1000x1000_1m() -> ImageGeometry {
        ImageGeometry {
            nb_rows: 1000,
            nb_columns: 1000,
            pixel_size_row: 1.0,
            pixel_size_col: 1.0,
            transform: AffineTransform {
                a: 1.0,
                b: 0.0,
                c: 0.0,
                d: 0.0,
                e: 1.0,
                f: 0.0,
            },
        }
    }

    #[test]
    fn grid_shape_law_holds() {
        let rpc = identity_rpc();
        let image = image_1000x1000_1m();
        let elevation = ConstantElevation(0.0);
        let plan = prepare_rectification(&image, &rpc, &rpc, &elevation, 30.0, 50.0).unwrap();

        let expected_grid_rows = plan.rectified_size.0 / 30 + 2;
        let expected_grid_cols = plan.rectified_size.1 / 30 + 2;
        assert_eq!(plan.grid_size, (expected_grid_rows, expected_grid_cols));
    }

    #[test]
    fn self_stereo_rectified_size_matches_square_image() {
        // With left_rpc == right_rpc the local epipolar segment degenerates
        // to a single point (no baseline), but the bounding-box rotation
        // this produces still preserves a square image's extent.
        let rpc = identity_rpc();
        let image = image_1000x1000_1m();
        let elevation = ConstantElevation(0.0);
        let plan = prepare_rectification(&image, &rpc, &rpc, &elevation, 30.0, 50.0).unwrap();
        assert_eq!(plan.rectified_size.0, 1000);
        assert_eq!(plan.rectified_size.1, 1000);
    }
}
