//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - input shapes (`Arrays`, `Groups`)
//! - configuration enums (`NoiseType`, `StatTest`)
//! - small value types (`FigSize`, `TestOutcome`)

pub mod types;

pub use types::*;
