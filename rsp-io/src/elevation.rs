//! `DtmElevation`: an `Elevation` backed by a single-band raster, sampled
//! by inverting the raster's own geotransform and taking the nearest cell.

use std::path::Path;

use gdal::Dataset;
use rsp_core::Elevation;

use crate::error::{IoError, Result};

/// A digital terrain model raster, queried by lon/lat through
/// [`Elevation::sample`].
pub struct DtmElevation {
    dataset: Dataset,
    geo_transform: [f64; 6],
    nb_columns: usize,
    nb_rows: usize,
}

impl DtmElevation {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let dataset = Dataset::open(path)?;
        let geo_transform = dataset.geo_transform().map_err(|_| IoError::NoGeoTransform)?;
        let (nb_columns, nb_rows) = dataset.raster_size();
        Ok(Self {
            dataset,
            geo_transform,
            nb_columns,
            nb_rows,
        })
    }

    /// Invert the raster's affine geotransform to map a physical `(x, y)`
    /// (i.e. `(lon, lat)` in the raster's own CRS) to fractional pixel
    /// `(col, row)` indices.
    fn physical_to_index(&self, x: f64, y: f64) -> (f64, f64) {
        let gt = &self.geo_transform;
        let det = gt[1] * gt[5] - gt[2] * gt[4];
        let dx = x - gt[0];
        let dy = y - gt[3];
        let col = (gt[5] * dx - gt[2] * dy) / det;
        let row = (-gt[4] * dx + gt[1] * dy) / det;
        (col, row)
    }
}

impl Elevation for DtmElevation {
    fn sample(&self, lon: f64, lat: f64) -> f64 {
        let (col, row) = self.physical_to_index(lon, lat);
        let col = (col.round() as i64).clamp(0, self.nb_columns as i64 - 1) as usize;
        let row = (row.round() as i64).clamp(0, self.nb_rows as i64 - 1) as usize;

        let Ok(band) = self.dataset.rasterband(1) else {
            tracing::warn!("DtmElevation: failed to open raster band 1");
            return f64::NAN;
        };
        match band.read_as::<f64>((col as isize, row as isize), (1, 1), (1, 1), None) {
            Ok(buffer) => buffer.data()[0],
            Err(err) => {
                tracing::warn!(%err, "DtmElevation: pixel read failed");
                f64::NAN
            }
        }
    }
}
