//! `phenoplot` library crate.
//!
//! The binary (`phenoplot`) is a thin wrapper around this library so that:
//!
//! - generation, fitting and plotting are testable without spawning processes
//! - the plot functions can be called directly with in-memory data

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod stats;
