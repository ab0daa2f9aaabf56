//! `Image`: a GDAL-backed raster handle that derives the `ImageGeometry`
//! and (when present) the `RpcModel` the core needs from a raw dataset.

use std::path::Path;

use gdal::Dataset;
use ndarray::Array3;
use rsp_core::{AffineTransform, ImageGeometry, RpcModel};

use crate::error::{IoError, Result};
use crate::metadata::extract_rpc_model;

/// An opened georeferenced raster, with lazily-extracted RPC metadata.
pub struct Image {
    dataset: Dataset,
    geometry: ImageGeometry,
    rpc: Option<RpcModel>,
}

impl Image {
    /// Open `path` with GDAL, deriving image geometry from the dataset's
    /// geotransform and attempting to extract an `RpcModel` from its `RPC`
    /// metadata domain (absent, not fatal, if the dataset carries none).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_convention(path, false)
    }

    /// Like [`Image::open`], but forwarding `topleftconvention` to RPC
    /// extraction (see [`extract_rpc_model`]).
    pub fn open_with_convention<P: AsRef<Path>>(path: P, topleftconvention: bool) -> Result<Self> {
        let dataset = Dataset::open(path)?;
        let geometry = geometry_from_dataset(&dataset)?;
        let rpc = match extract_rpc_model(&dataset, topleftconvention) {
            Ok(model) => Some(model),
            Err(IoError::NoRpcMetadata) => None,
            Err(other) => return Err(other),
        };
        Ok(Self { dataset, geometry, rpc })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn geometry(&self) -> &ImageGeometry {
        &self.geometry
    }

    pub fn rpc_model(&self) -> Option<&RpcModel> {
        self.rpc.as_ref()
    }

    pub fn size(&self) -> (usize, usize) {
        (self.geometry.nb_columns, self.geometry.nb_rows)
    }

    pub fn band_count(&self) -> usize {
        self.dataset.raster_count() as usize
    }

    /// Read the full raster as `u8`, shape `(bands, height, width)`.
    pub fn read_u8(&self) -> Result<Array3<u8>> {
        self.read_window_u8(0, 0, self.geometry.nb_columns, self.geometry.nb_rows)
    }

    pub fn read_window_u8(&self, x_off: usize, y_off: usize, width: usize, height: usize) -> Result<Array3<u8>> {
        self.read_window::<u8>(x_off, y_off, width, height)
    }

    /// Read the full raster as `u16`, shape `(bands, height, width)`.
    pub fn read_u16(&self) -> Result<Array3<u16>> {
        self.read_window_u16(0, 0, self.geometry.nb_columns, self.geometry.nb_rows)
    }

    pub fn read_window_u16(&self, x_off: usize, y_off: usize, width: usize, height: usize) -> Result<Array3<u16>> {
        self.read_window::<u16>(x_off, y_off, width, height)
    }

    /// Read the full raster as `f32`, shape `(bands, height, width)`.
    pub fn read_f32(&self) -> Result<Array3<f32>> {
        self.read_window_f32(0, 0, self.geometry.nb_columns, self.geometry.nb_rows)
    }

    pub fn read_window_f32(&self, x_off: usize, y_off: usize, width: usize, height: usize) -> Result<Array3<f32>> {
        self.read_window::<f32>(x_off, y_off, width, height)
    }

    fn read_window<T>(&self, x_off: usize, y_off: usize, width: usize, height: usize) -> Result<Array3<T>>
    where
        T: gdal::raster::GdalType + Copy + Default,
    {
        if x_off + width > self.geometry.nb_columns || y_off + height > self.geometry.nb_rows {
            return Err(IoError::InvalidDimensions);
        }
        let band_count = self.band_count();
        let mut data = Array3::<T>::from_elem((band_count, height, width), T::default());
        for band_idx in 0..band_count {
            let band = self.dataset.rasterband(band_idx + 1)?;
            let buffer = band.read_as::<T>(
                (x_off as isize, y_off as isize),
                (width, height),
                (width, height),
                None,
            )?;
            for row in 0..height {
                for col in 0..width {
                    data[[band_idx, row, col]] = buffer.data()[row * width + col];
                }
            }
        }
        Ok(data)
    }
}

fn geometry_from_dataset(dataset: &Dataset) -> Result<ImageGeometry> {
    let (nb_columns, nb_rows) = dataset.raster_size();
    let gt = dataset.geo_transform().map_err(|_| IoError::NoGeoTransform)?;
    // GDAL's geotransform is (x0, dx, 0, y0, 0, dy) mapping (col, row) -> (x, y);
    // rsp-core's AffineTransform maps (row, col) -> (row_geo, col_geo), so swap.
    let transform = AffineTransform {
        a: gt[1],
        b: gt[2],
        c: gt[0],
        d: gt[4],
        e: gt[5],
        f: gt[3],
    };
    let pixel_size_col = gt[1].abs();
    let pixel_size_row = gt[5].abs();
    Ok(ImageGeometry {
        nb_rows,
        nb_columns,
        pixel_size_row,
        pixel_size_col,
        transform,
    })
}
