//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads or generates data
//! - renders figures and prints reports
//! - writes optional exports

use clap::Parser;

use crate::cli::{BoxplotArgs, Command, GenerateArgs, PlaneArgs, ScatterArgs};
use crate::data::PhenotypeConfig;
use crate::domain::parse_test_name;
use crate::error::AppError;
use crate::io::{PlotSummary, write_summary_json};
use crate::plot::{
    BoxplotOptions, ModelSpec, PlaneModel, PlaneOptions, ScatterOptions, ascii::render_ascii_scatter,
    plot_2d_scatter_with_fits, plot_3d_scatter_with_plane, plot_grouped_boxplots,
};
use crate::report;

pub mod pipeline;

/// Entry point for the `phenoplot` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Generate(args) => handle_generate(args),
        Command::Scatter(args) => handle_scatter(args),
        Command::Plane(args) => handle_plane(args),
        Command::Boxplot(args) => handle_boxplot(args),
    }
}

pub fn phenotype_config_from_args(args: &GenerateArgs) -> PhenotypeConfig {
    PhenotypeConfig {
        num_samples: args.num_samples,
        num_independent_vars: args.num_vars,
        weights: args.weights.clone(),
        bias: args.bias,
        noise_level: args.noise_level,
        noise_type: args.noise_type,
        random_seed: args.seed,
    }
}

fn handle_generate(args: GenerateArgs) -> Result<(), AppError> {
    let config = phenotype_config_from_args(&args);
    let data = pipeline::run_generate(&config, args.out.as_deref())?;
    println!("{}", report::format_generation_summary(&config, &data));
    Ok(())
}

fn handle_scatter(args: ScatterArgs) -> Result<(), AppError> {
    let table = pipeline::load_table(&args.data)?;
    let (x, _) = pipeline::select_columns(&table, args.columns.as_deref())?;

    let options = ScatterOptions {
        figsize: None,
        models: if args.no_fit { ModelSpec::None } else { ModelSpec::Auto },
        save_path: Some(args.out.clone()),
        dpi: args.dpi,
    };
    let plot = plot_2d_scatter_with_fits(&x, &table.phenotype.clone().into(), &options)?;
    println!("{}", report::format_scatter_summary(&plot));

    if args.preview {
        for panel in &plot.panels {
            println!("{}", render_ascii_scatter(panel, args.width, args.height));
        }
    }
    if let Some(path) = &args.summary {
        write_summary_json(path, &PlotSummary::from_scatter(&plot))?;
    }
    Ok(())
}

fn handle_plane(args: PlaneArgs) -> Result<(), AppError> {
    let table = pipeline::load_table(&args.data)?;
    if table.n_features() < 2 {
        return Err(AppError::config("The 3D plot needs at least two feature columns."));
    }

    let options = PlaneOptions {
        model: if args.no_fit { PlaneModel::None } else { PlaneModel::Auto },
        grid_res: args.grid_res,
        elev: args.elev,
        azim: args.azim,
        save_path: Some(args.out.clone()),
        dpi: args.dpi,
        ..PlaneOptions::default()
    };
    let plot = plot_3d_scatter_with_plane(table.feature(0)?, table.feature(1)?, &table.phenotype, &options)?;
    print!("{}", report::format_plane_summary(&plot));

    if let Some(path) = &args.summary {
        write_summary_json(path, &PlotSummary::from_plane(&plot))?;
    }
    Ok(())
}

fn handle_boxplot(args: BoxplotArgs) -> Result<(), AppError> {
    let test = parse_test_name(&args.test)?;
    let table = pipeline::load_table(&args.data)?;
    let groups = pipeline::median_split(&table.phenotype)?;
    let (variables, _) = pipeline::select_columns(&table, None)?;

    let options = BoxplotOptions {
        figsize: None,
        test,
        group_labels: Some(["Above median".to_string(), "At/below median".to_string()]),
        var_labels: Some(table.feature_names.clone()),
        save_path: Some(args.out.clone()),
        dpi: args.dpi,
        ..BoxplotOptions::default()
    };
    let figure = plot_grouped_boxplots(&variables, &groups, &options)?;
    println!("{}", report::format_test_results(&figure, test));

    if let Some(path) = &args.summary {
        write_summary_json(path, &PlotSummary::from_boxplot(&figure, test))?;
    }
    Ok(())
}
