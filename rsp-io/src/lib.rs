//! GDAL-backed collaborators for `rsp-core`: reading georeferenced imagery
//! and embedded RPC metadata, sampling a DTM raster as an `Elevation`, and
//! writing displacement grids back out as GeoTIFFs.

pub mod elevation;
pub mod error;
pub mod grid_writer;
pub mod image;
pub mod metadata;

pub use elevation::DtmElevation;
pub use error::{IoError, Result};
pub use grid_writer::write_epipolar_grid;
pub use image::Image;
pub use metadata::extract_rpc_model;
