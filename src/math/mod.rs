//! Mathematical utilities: least squares and small array helpers.

pub mod ols;

pub use ols::*;
