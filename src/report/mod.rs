//! Reporting utilities: formatted terminal output for generation runs and plots.

pub mod format;

pub use format::*;
