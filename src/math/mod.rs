//! Numerical utilities: least squares via SVD.

pub mod ols;

pub use ols::*;
