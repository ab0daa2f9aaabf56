use thiserror::Error;

/// Errors surfaced by the `rsp-io` collaborators (image reads, RPC metadata
/// extraction, DTM sampling, grid writes).
#[derive(Error, Debug)]
pub enum IoError {
    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("invalid image dimensions")]
    InvalidDimensions,

    #[error("missing RPC metadata domain on dataset")]
    NoRpcMetadata,

    #[error("missing RPC parameter: {0}")]
    MissingRpcField(String),

    #[error("failed to parse RPC parameter {0}: {1}")]
    InvalidRpcField(String, String),

    #[error("dataset has no geotransform")]
    NoGeoTransform,

    #[error(transparent)]
    Core(#[from] rsp_core::RspError),
}

pub type Result<T> = std::result::Result<T, IoError>;
