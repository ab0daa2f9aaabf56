//! The Rational Polynomial Camera (RPC) sensor model.

pub mod rpc;

pub use rpc::{Coefficients, ForwardCoefficients, InverseCoefficients, Jacobian, Normalization, RpcModel};
