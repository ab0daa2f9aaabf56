//! Colocation: project a batch of points from one sensor, through ground,
//! into another sensor.

use super::EpiPoint;
use crate::error::Result;
use crate::sensor::RpcModel;

/// Project `points` (sensor positions in `src`'s image) to ground via
/// `src`, then back to sensor positions in `dst`'s image. Altitude is
/// carried through unchanged.
pub fn coloc(src: &RpcModel, dst: &RpcModel, points: &[EpiPoint], alt: f64) -> Result<Vec<EpiPoint>> {
    let row: Vec<f64> = points.iter().map(|p| p.row).collect();
    let col: Vec<f64> = points.iter().map(|p| p.col).collect();
    let (lon, lat) = src.direct_loc_h(&row, &col, alt)?;
    let (row2, col2) = dst.inverse_loc(&lon, &lat, alt)?;
    Ok(row2
        .into_iter()
        .zip(col2)
        .map(|(r, c)| EpiPoint::new(r, c, alt))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{ForwardCoefficients, InverseCoefficients, Normalization};

    fn identity_normalization() -> Normalization {
        Normalization {
            lon_offset: 0.0,
            lon_scale: 1.0,
            lat_offset: 0.0,
            lat_scale: 1.0,
            alt_offset: 0.0,
            alt_scale: 1.0,
            col_offset: 0.0,
            col_scale: 1.0,
            row_offset: 0.0,
            row_scale: 1.0,
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

    #[test]
    fn self_stereo_coloc_is_identity() {
        let rpc = identity_rpc();
        let points = vec![EpiPoint::new(0.1, 0.2, 0.0), EpiPoint::new(-0.3, 0.4, 0.0)];
        let out = coloc(&rpc, &rpc, &points, 0.0).unwrap();
        for (a, b) in points.iter().zip(out.iter()) {
            assert!((a.row - b.row).abs() < 1e-6);
            assert!((a.col - b.col).abs() < 1e-6);
            assert_eq!(b.alt, 0.0);
        }
    }
}
