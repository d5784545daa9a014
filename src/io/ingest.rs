//! CSV ingest and validation for phenotype tables.
//!
//! Expected schema: one or more numeric feature columns followed by a final
//! `phenotype` column. Unlike row-filtering ingest, any malformed row is a hard
//! error: the plots need every observation aligned across columns.

use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::error::AppError;
use crate::math::min_max;

/// Column-major phenotype table read from CSV.
#[derive(Debug, Clone, PartialEq)]
pub struct PhenotypeTable {
    /// Feature column names in file order (phenotype excluded).
    pub feature_names: Vec<String>,
    /// One vector per feature column.
    pub features: Vec<Vec<f64>>,
    pub phenotype: Vec<f64>,
}

impl PhenotypeTable {
    pub fn n_samples(&self) -> usize {
        self.phenotype.len()
    }

    pub fn n_features(&self) -> usize {
        self.features.len()
    }

    /// Feature column by zero-based index.
    pub fn feature(&self, j: usize) -> Result<&[f64], AppError> {
        self.features.get(j).map(Vec::as_slice).ok_or_else(|| {
            AppError::config(format!(
                "Column {} requested but the data has {} feature column(s).",
                j + 1,
                self.features.len()
            ))
        })
    }

    pub fn phenotype_range(&self) -> Option<(f64, f64)> {
        min_max(&self.phenotype)
    }
}

/// Read a CSV written by `write_phenotype_csv` (or any file with that schema).
pub fn read_phenotype_csv(path: &Path) -> Result<PhenotypeTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::config(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let feature_names = validate_headers(&headers)?;
    let width = headers.len();

    let mut features = vec![Vec::new(); width - 1];
    let mut phenotype = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // +2: 1-based lines, header on line 1.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::config(format!("Line {line}: CSV parse error: {e}")))?;
        if record.len() != width {
            return Err(AppError::config(format!(
                "Line {line}: expected {width} fields, found {}.",
                record.len()
            )));
        }
        for (j, cell) in record.iter().enumerate() {
            let value = parse_cell(cell).map_err(|e| {
                AppError::config(format!("Line {line}, column '{}': {e}", &headers[j]))
            })?;
            if j + 1 == width {
                phenotype.push(value);
            } else {
                features[j].push(value);
            }
        }
    }

    if phenotype.is_empty() {
        return Err(AppError::config(format!("CSV '{}' has no data rows.", path.display())));
    }
    log::debug!(
        "Read {} rows x {} feature column(s) from {}",
        phenotype.len(),
        feature_names.len(),
        path.display()
    );

    Ok(PhenotypeTable {
        feature_names,
        features,
        phenotype,
    })
}

fn validate_headers(headers: &StringRecord) -> Result<Vec<String>, AppError> {
    let names: Vec<String> = headers.iter().map(normalize_header_name).collect();
    match names.split_last() {
        Some((last, rest)) if last == "phenotype" && !rest.is_empty() => {
            if let Some(empty) = rest.iter().position(String::is_empty) {
                return Err(AppError::config(format!("CSV header column {} is empty.", empty + 1)));
            }
            Ok(rest.to_vec())
        }
        Some((last, _)) if last == "phenotype" => {
            Err(AppError::config("CSV needs at least one feature column before `phenotype`."))
        }
        _ => Err(AppError::config("CSV header must end with a `phenotype` column.")),
    }
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports may prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn parse_cell(cell: &str) -> Result<f64, String> {
    let value: f64 = cell
        .parse()
        .map_err(|_| format!("'{cell}' is not a number"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("'{cell}' is not finite"))
    }
}
