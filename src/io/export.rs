//! Export generated data to CSV.
//!
//! One row per sample: the independent variables `x1..xp` followed by the
//! `phenotype` column. Values use Rust's shortest round-trip float formatting so
//! `read_phenotype_csv` recovers them exactly.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::data::PhenotypeData;
use crate::error::AppError;

/// Write generated data to a CSV file.
pub fn write_phenotype_csv(path: &Path, data: &PhenotypeData) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create data CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);

    let mut header: Vec<String> = (1..=data.x.ncols()).map(|j| format!("x{j}")).collect();
    header.push("phenotype".to_string());
    writeln!(out, "{}", header.join(","))
        .map_err(|e| AppError::io(format!("Failed to write data CSV header: {e}")))?;

    for (row, y) in data.x.row_iter().zip(&data.y) {
        let mut cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        cells.push(y.to_string());
        writeln!(out, "{}", cells.join(","))
            .map_err(|e| AppError::io(format!("Failed to write data CSV row: {e}")))?;
    }

    out.flush()
        .map_err(|e| AppError::io(format!("Failed to flush data CSV '{}': {e}", path.display())))?;
    log::info!("Wrote {} rows to {}", data.y.len(), path.display());
    Ok(())
}
