//! Shared data-preparation steps used by the subcommand handlers.
//!
//! Keeping these in one place avoids duplicating the core workflow:
//! CSV -> validated table -> column selection / group split -> plot inputs.

use std::path::Path;

use crate::data::{PhenotypeConfig, PhenotypeData, generate_random_phenotype};
use crate::domain::{Arrays, Groups};
use crate::error::AppError;
use crate::io::{PhenotypeTable, read_phenotype_csv, write_phenotype_csv};
use crate::stats::quantile_sorted;

/// Generate data and, when requested, write it to CSV.
pub fn run_generate(config: &PhenotypeConfig, out: Option<&Path>) -> Result<PhenotypeData, AppError> {
    let data = generate_random_phenotype(config)?;
    if let Some(path) = out {
        write_phenotype_csv(path, &data)?;
    }
    Ok(data)
}

pub fn load_table(path: &Path) -> Result<PhenotypeTable, AppError> {
    let table = read_phenotype_csv(path)?;
    log::info!(
        "Loaded {} samples with {} feature column(s) from {}",
        table.n_samples(),
        table.n_features(),
        path.display()
    );
    Ok(table)
}

/// Pick 1-based feature columns (all of them when `columns` is `None`).
///
/// Returns the chosen arrays together with their 1-based indices.
pub fn select_columns(table: &PhenotypeTable, columns: Option<&[usize]>) -> Result<(Arrays, Vec<usize>), AppError> {
    let indices: Vec<usize> = match columns {
        Some(cols) if cols.is_empty() => return Err(AppError::config("--columns must name at least one column.")),
        Some(cols) => cols.to_vec(),
        None => (1..=table.n_features()).collect(),
    };
    let mut selected = Vec::with_capacity(indices.len());
    for &c in &indices {
        if c == 0 {
            return Err(AppError::config("Columns are 1-based; 0 is not a valid column."));
        }
        selected.push(table.feature(c - 1)?.to_vec());
    }
    let arrays = match selected.len() {
        1 => Arrays::One(selected.remove(0)),
        _ => Arrays::Many(selected),
    };
    Ok((arrays, indices))
}

/// Split observations into phenotype above its median (`true`) and the rest.
pub fn median_split(phenotype: &[f64]) -> Result<Groups, AppError> {
    if phenotype.is_empty() {
        return Err(AppError::config("Cannot split an empty phenotype."));
    }
    let mut sorted = phenotype.to_vec();
    sorted.sort_by(f64::total_cmp);
    let median = quantile_sorted(&sorted, 0.5);
    log::debug!("Phenotype median for grouping: {median}");
    Ok(Groups::Boolean(phenotype.iter().map(|v| *v > median).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> PhenotypeTable {
        PhenotypeTable {
            feature_names: vec!["x1".into(), "x2".into(), "x3".into()],
            features: vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
            phenotype: vec![0.0, 1.0],
        }
    }

    #[test]
    fn select_all_or_subset() {
        let (all, idx) = select_columns(&table(), None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(idx, vec![1, 2, 3]);

        let (one, _) = select_columns(&table(), Some([2].as_slice())).unwrap();
        assert_eq!(one, Arrays::One(vec![3.0, 4.0]));

        assert!(select_columns(&table(), Some([0].as_slice())).is_err());
        assert!(select_columns(&table(), Some([4].as_slice())).is_err());
    }

    #[test]
    fn median_split_marks_upper_half() {
        let groups = median_split(&[5.0, 1.0, 3.0, 4.0]).unwrap();
        assert_eq!(groups, Groups::Boolean(vec![true, false, false, true]));
    }

    #[test]
    fn generate_writes_csv_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let data = run_generate(&PhenotypeConfig::default(), Some(&path)).unwrap();
        let table = load_table(&path).unwrap();
        assert_eq!(table.phenotype, data.y);
    }
}
