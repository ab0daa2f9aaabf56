use thiserror::Error;

/// Common errors across the rectification core.
#[derive(Error, Debug)]
pub enum RspError {
    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),

    #[error("epipolar geometry error: {0}")]
    Epipolar(#[from] EpipolarError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("numerical error: {0}")]
    Numerical(String),
}

#[derive(Error, Debug)]
pub enum ProjectionError {
    /// Kept for API completeness: unreachable through the safe `RpcModel`
    /// constructors, since `Coefficients` always carries an inverse direction.
    #[error("RPC model has no inverse (ground-to-sensor) coefficients")]
    MissingInverseCoefficients,

    #[error("dimension mismatch: expected {0} elements, got {1}")]
    DimensionMismatch(usize, usize),
}

#[derive(Error, Debug)]
pub enum EpipolarError {
    #[error("invalid axis {0}, expected 0 (along) or 1 (across)")]
    InvalidAxis(i32),

    #[error("dimension mismatch: expected {0} elements, got {1}")]
    DimensionMismatch(usize, usize),
}

pub type Result<T> = std::result::Result<T, RspError>;
