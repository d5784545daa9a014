//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed straight into the plotting functions
//! - parsed from CLI flags (`ValueEnum`) or plain strings (`FromStr`)
//! - exported to JSON summaries

use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A single array or an ordered collection of arrays.
///
/// A collection with exactly one element behaves like a single array.
#[derive(Debug, Clone, PartialEq)]
pub enum Arrays {
    One(Vec<f64>),
    Many(Vec<Vec<f64>>),
}

impl Arrays {
    /// Number of arrays held (1 for `One`).
    pub fn len(&self) -> usize {
        match self {
            Arrays::One(_) => 1,
            Arrays::Many(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow every array in order.
    pub fn as_slices(&self) -> Vec<&[f64]> {
        match self {
            Arrays::One(v) => vec![v.as_slice()],
            Arrays::Many(vs) => vs.iter().map(|v| v.as_slice()).collect(),
        }
    }
}

impl From<Vec<f64>> for Arrays {
    fn from(value: Vec<f64>) -> Self {
        Arrays::One(value)
    }
}

impl From<&[f64]> for Arrays {
    fn from(value: &[f64]) -> Self {
        Arrays::One(value.to_vec())
    }
}

impl From<Vec<Vec<f64>>> for Arrays {
    fn from(value: Vec<Vec<f64>>) -> Self {
        Arrays::Many(value)
    }
}

/// Noise model applied to the synthetic phenotype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NoiseType {
    /// Additive normal noise with standard deviation `noise_level`.
    #[value(alias = "normal")]
    Gaussian,
    /// Poisson counts around `softplus(y)`.
    Poisson,
    /// Additive exponential noise with scale `noise_level`.
    Exponential,
    /// Multiplicative uniform noise on `[-noise_level, noise_level)`.
    Uniform,
}

impl NoiseType {
    pub fn name(self) -> &'static str {
        match self {
            NoiseType::Gaussian => "gaussian",
            NoiseType::Poisson => "poisson",
            NoiseType::Exponential => "exponential",
            NoiseType::Uniform => "uniform",
        }
    }
}

impl FromStr for NoiseType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gaussian" | "normal" => Ok(NoiseType::Gaussian),
            "poisson" => Ok(NoiseType::Poisson),
            "exponential" => Ok(NoiseType::Exponential),
            "uniform" => Ok(NoiseType::Uniform),
            other => Err(AppError::config(format!(
                "Invalid noise type '{other}'. Choose 'gaussian', 'normal', 'poisson', 'exponential' or 'uniform'."
            ))),
        }
    }
}

/// Two-sample test used by the grouped boxplots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StatTest {
    /// Wilcoxon rank-sum test (normal approximation).
    #[value(name = "ranksums")]
    RankSums,
    /// Independent two-sample Student t-test (pooled variance).
    #[value(name = "ttest")]
    TTest,
    /// Mann-Whitney U test.
    #[value(name = "mannwhitneyu")]
    MannWhitneyU,
}

impl StatTest {
    pub fn name(self) -> &'static str {
        match self {
            StatTest::RankSums => "ranksums",
            StatTest::TTest => "ttest",
            StatTest::MannWhitneyU => "mannwhitneyu",
        }
    }
}

/// Parse a test name, where `none` means "do not run a test".
pub fn parse_test_name(s: &str) -> Result<Option<StatTest>, AppError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "none" => Ok(None),
        "ranksums" => Ok(Some(StatTest::RankSums)),
        "ttest" => Ok(Some(StatTest::TTest)),
        "mannwhitneyu" => Ok(Some(StatTest::MannWhitneyU)),
        other => Err(AppError::config(format!(
            "Unknown test: {other}. Use 'ranksums', 'ttest', 'mannwhitneyu', or 'none'."
        ))),
    }
}

impl FromStr for StatTest {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_test_name(s)?
            .ok_or_else(|| AppError::config("'none' is not a test; use Option<StatTest> instead."))
    }
}

/// Per-observation binary group assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Groups {
    Boolean(Vec<bool>),
    Categorical(Vec<String>),
}

impl Groups {
    pub fn len(&self) -> usize {
        match self {
            Groups::Boolean(v) => v.len(),
            Groups::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of a two-sample test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub statistic: f64,
    pub pvalue: f64,
}

/// Figure size in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FigSize {
    pub width: f64,
    pub height: f64,
}

impl FigSize {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Default scatter sizing: 3.5in per panel, 3.5in tall.
    pub fn scatter_default_for(n_panels: usize) -> Self {
        Self::new(3.5 * n_panels as f64, 3.5)
    }

    /// Default boxplot sizing: 3.75in per variable, 4in tall.
    pub fn boxplot_default_for(n_vars: usize) -> Self {
        Self::new(3.75 * n_vars as f64, 4.0)
    }

    /// Pixel dimensions at the given dots-per-inch.
    pub fn to_pixels(self, dpi: u32) -> Result<(u32, u32), AppError> {
        if !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0) {
            return Err(AppError::config(format!(
                "Figure size must be positive, got {}x{}.",
                self.width, self.height
            )));
        }
        if dpi == 0 {
            return Err(AppError::config("dpi must be > 0."));
        }
        let w = (self.width * dpi as f64).round().max(1.0) as u32;
        let h = (self.height * dpi as f64).round().max(1.0) as u32;
        Ok((w, h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noise_type_parses_aliases_and_rejects_unknown() {
        assert_eq!("normal".parse::<NoiseType>().unwrap(), NoiseType::Gaussian);
        assert_eq!("Gaussian".parse::<NoiseType>().unwrap(), NoiseType::Gaussian);
        assert_eq!("uniform".parse::<NoiseType>().unwrap(), NoiseType::Uniform);
        let err = "bogus".parse::<NoiseType>().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }

    #[test]
    fn test_names_parse() {
        assert_eq!(parse_test_name("ranksums").unwrap(), Some(StatTest::RankSums));
        assert_eq!(parse_test_name("none").unwrap(), None);
        assert!(parse_test_name("wilcoxon").is_err());
    }

    #[test]
    fn arrays_len_counts_members() {
        assert_eq!(Arrays::from(vec![1.0, 2.0]).len(), 1);
        assert_eq!(Arrays::from(vec![vec![1.0], vec![2.0], vec![3.0]]).len(), 3);
        assert!(Arrays::Many(Vec::new()).is_empty());
    }

    #[test]
    fn figsize_scales_linearly_with_panels() {
        assert_eq!(FigSize::scatter_default_for(3), FigSize::new(10.5, 3.5));
        assert_eq!(FigSize::boxplot_default_for(2), FigSize::new(7.5, 4.0));
        assert_eq!(FigSize::new(7.0, 3.5).to_pixels(100).unwrap(), (700, 350));
        assert!(FigSize::new(0.0, 3.5).to_pixels(100).is_err());
    }
}
