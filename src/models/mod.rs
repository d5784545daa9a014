//! Regression model handles used by the plotting functions.

pub mod model;

pub use model::*;
