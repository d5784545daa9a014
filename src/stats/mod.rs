//! Descriptive and inferential statistics for group comparisons.
//!
//! - `two_sample`: rank-sum, t-test and Mann-Whitney U
//! - `summary`: boxplot statistics (quartiles, whiskers, fliers)

pub mod summary;
pub mod two_sample;

pub use summary::*;
pub use two_sample::*;
