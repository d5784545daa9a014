//! Input/output helpers.
//!
//! - phenotype CSV ingest + validation (`ingest`)
//! - phenotype CSV export (`export`)
//! - plot summary JSON read/write (`summary`)

pub mod export;
pub mod ingest;
pub mod summary;

pub use export::*;
pub use ingest::*;
pub use summary::*;
