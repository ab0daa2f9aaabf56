//! The numerics-critical geometric core of a satellite-image stereo
//! rectification toolkit: the Rational Polynomial Camera (RPC) model and
//! the epipolar grid generator built on top of it.
//!
//! This crate is pure arrays and closed-form/iterative numerics — no I/O,
//! no raster formats, no file dialects. Collaborators (image readers, DTM
//! samplers, grid writers) live in `rsp-io` and talk to this crate through
//! [`geometry::ImageGeometry`] and [`elevation::Elevation`].

pub mod elevation;
pub mod epipolar;
pub mod error;
pub mod geometry;
pub mod monomial;
pub mod sensor;

pub use elevation::{ConstantElevation, Elevation};
pub use epipolar::{
    coloc, compute_stereo_grids, epipolar_angle, get_epipolar_extent, local_epipolar_segment,
    move_along_axis, positions_to_displacement_grid, prepare_rectification, to_position_grid,
    DisplacementGrid, EpiPoint, PositionGrid, RectificationPlan, StereoGrids,
};
pub use error::{EpipolarError, ProjectionError, Result, RspError};
pub use geometry::{AffineTransform, ImageGeometry};
pub use sensor::{Coefficients, ForwardCoefficients, InverseCoefficients, Jacobian, Normalization, RpcModel};
