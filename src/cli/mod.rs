//! Command-line parsing for the phenoplot tool.
//!
//! The goal of this module is to keep **argument parsing** separate from data
//! generation, model fitting and rendering.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::NoiseType;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "phenoplot", version, about = "Synthetic phenotype generator and regression plots")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a synthetic phenotype and optionally write it to CSV.
    Generate(GenerateArgs),
    /// Scatter each feature column against the phenotype with fit lines.
    Scatter(ScatterArgs),
    /// 3D scatter of two feature columns against the phenotype with a fitted plane.
    Plane(PlaneArgs),
    /// Boxplots of every feature column split by phenotype above/below its median.
    Boxplot(BoxplotArgs),
}

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Number of samples (rows).
    #[arg(short = 'n', long, default_value_t = 100)]
    pub num_samples: usize,

    /// Number of independent variables (columns).
    #[arg(short = 'p', long, default_value_t = 2)]
    pub num_vars: usize,

    /// Comma-separated weights, one per variable. Drawn from Poisson(1) when omitted.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub weights: Option<Vec<f64>>,

    /// Additive bias. Drawn from Poisson(1) when omitted.
    #[arg(long, allow_hyphen_values = true)]
    pub bias: Option<f64>,

    /// Noise scale (meaning depends on the noise type).
    #[arg(long, default_value_t = 0.1)]
    pub noise_level: f64,

    /// Noise model.
    #[arg(long, value_enum, default_value_t = NoiseType::Gaussian)]
    pub noise_type: NoiseType,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Write the generated data to this CSV file.
    #[arg(long, value_name = "CSV")]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ScatterArgs {
    /// Data CSV (feature columns followed by `phenotype`).
    #[arg(long, value_name = "CSV")]
    pub data: PathBuf,

    /// 1-based feature columns to plot (default: all).
    #[arg(long, value_delimiter = ',')]
    pub columns: Option<Vec<usize>>,

    /// Scatter only, no regression lines.
    #[arg(long)]
    pub no_fit: bool,

    /// Output SVG path.
    #[arg(long, default_value = "scatter.svg")]
    pub out: PathBuf,

    /// Print an ASCII preview of each panel.
    #[arg(long)]
    pub preview: bool,

    /// Preview width (columns).
    #[arg(long, default_value_t = 72)]
    pub width: usize,

    /// Preview height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Write a JSON summary of the figure.
    #[arg(long, value_name = "JSON")]
    pub summary: Option<PathBuf>,

    /// Rendering resolution.
    #[arg(long, default_value_t = crate::plot::DEFAULT_DPI)]
    pub dpi: u32,
}

#[derive(Debug, Args, Clone)]
pub struct PlaneArgs {
    /// Data CSV (at least two feature columns followed by `phenotype`).
    #[arg(long, value_name = "CSV")]
    pub data: PathBuf,

    /// Points only, no fitted plane.
    #[arg(long)]
    pub no_fit: bool,

    /// Camera elevation (degrees).
    #[arg(long, default_value_t = 20.0, allow_hyphen_values = true)]
    pub elev: f64,

    /// Camera azimuth (degrees).
    #[arg(long, default_value_t = -45.0, allow_hyphen_values = true)]
    pub azim: f64,

    /// Surface samples per axis.
    #[arg(long, default_value_t = 10)]
    pub grid_res: usize,

    /// Output SVG path.
    #[arg(long, default_value = "plane.svg")]
    pub out: PathBuf,

    /// Write a JSON summary of the figure.
    #[arg(long, value_name = "JSON")]
    pub summary: Option<PathBuf>,

    /// Rendering resolution.
    #[arg(long, default_value_t = crate::plot::DEFAULT_DPI)]
    pub dpi: u32,
}

#[derive(Debug, Args, Clone)]
pub struct BoxplotArgs {
    /// Data CSV (feature columns followed by `phenotype`).
    #[arg(long, value_name = "CSV")]
    pub data: PathBuf,

    /// Two-sample test: ranksums, ttest, mannwhitneyu or none.
    #[arg(long, default_value = "ranksums")]
    pub test: String,

    /// Output SVG path.
    #[arg(long, default_value = "boxplot.svg")]
    pub out: PathBuf,

    /// Write a JSON summary of the figure.
    #[arg(long, value_name = "JSON")]
    pub summary: Option<PathBuf>,

    /// Rendering resolution.
    #[arg(long, default_value_t = crate::plot::DEFAULT_DPI)]
    pub dpi: u32,
}
