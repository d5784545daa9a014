//! Side-by-side 2D scatter panels with optional regression lines.

use std::path::PathBuf;

use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::{Arrays, FigSize};
use crate::error::AppError;
use crate::math::{linspace, min_max};
use crate::models::{FitSummary, ModelHandle};

use super::pairing::{ModelSpec, PanelPair, resolve_models, resolve_pairs, single_feature};
use super::{DEFAULT_DPI, DrawResult, Figure, Typography, colors, draw_text_lines, pad_range, render_svg};

/// Number of x samples along a drawn fit line.
const FIT_LINE_POINTS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterOptions {
    /// `None` sizes the figure at 3.5in per panel.
    pub figsize: Option<FigSize>,
    pub models: ModelSpec,
    pub save_path: Option<PathBuf>,
    pub dpi: u32,
}

impl Default for ScatterOptions {
    fn default() -> Self {
        Self {
            figsize: Some(FigSize::new(7.0, 3.5)),
            models: ModelSpec::Auto,
            save_path: None,
            dpi: DEFAULT_DPI,
        }
    }
}

/// What was drawn on one panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPanel {
    pub x_label: String,
    pub y_label: String,
    /// `#rrggbb`
    pub color: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub fit_line: Option<Vec<(f64, f64)>>,
    pub annotation: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScatterPlot {
    pub figure: Figure,
    pub panels: Vec<ScatterPanel>,
    /// One model per panel, or `None` when fits were disabled.
    pub models: Option<Vec<ModelHandle>>,
}

/// Plot one or more scatter panels with per-panel regression lines.
///
/// `x` and `phenotype` are paired per `resolve_pairs`; models per `resolve_models`.
pub fn plot_2d_scatter_with_fits(
    x: &Arrays,
    phenotype: &Arrays,
    options: &ScatterOptions,
) -> Result<ScatterPlot, AppError> {
    let pairs = resolve_pairs(x, phenotype)?;
    let models = resolve_models(&options.models, &pairs)?;
    let n = pairs.len();
    let figsize = options.figsize.unwrap_or_else(|| FigSize::scatter_default_for(n));
    let size = figsize.to_pixels(options.dpi)?;

    let mut panels = Vec::with_capacity(n);
    for (i, pair) in pairs.iter().enumerate() {
        let model = models.as_ref().map(|m| &m[i]);
        panels.push(build_panel(i, pair, model)?);
    }

    let style = Typography::new(options.dpi);
    let figure = render_svg(size, |root| {
        let areas = root.split_evenly((1, n));
        for (area, panel) in areas.iter().zip(&panels) {
            draw_panel(area, panel, &style)?;
        }
        Ok(())
    })?;
    log::debug!("Rendered {n} scatter panel(s) at {}x{} px", size.0, size.1);

    figure.save_if_requested(options.save_path.as_deref())?;
    Ok(ScatterPlot { figure, panels, models })
}

fn build_panel(i: usize, pair: &PanelPair<'_>, model: Option<&ModelHandle>) -> Result<ScatterPanel, AppError> {
    let color = colors::PANEL_CYCLE[i % colors::PANEL_CYCLE.len()];
    let (fit_line, annotation) = match model {
        None => (None, None),
        Some(handle) => {
            let (lo, hi) = finite_range(pair.x)
                .ok_or_else(|| AppError::config(format!("Panel {} has no finite x values.", i + 1)))?;
            let xs = linspace(lo, hi, FIT_LINE_POINTS);
            let ys = handle.predict(&single_feature(&xs))?;
            let line: Vec<(f64, f64)> = xs.into_iter().zip(ys).collect();

            let (fx, fy) = pair.finite();
            let annotation = handle
                .coefficient_summary(&single_feature(&fx), &fy)
                .map(|s| annotation_2d(&s));
            if annotation.is_none() {
                log::debug!("Skipping annotation for panel {}: fit summary unavailable", i + 1);
            }
            (Some(line), annotation)
        }
    };

    Ok(ScatterPanel {
        x_label: format!("X{}", i + 1),
        y_label: "Phenotype".to_string(),
        color: colors::to_hex(color),
        x: pair.x.to_vec(),
        y: pair.y.to_vec(),
        fit_line,
        annotation,
    })
}

/// `R² = …` over `y = …x + …`.
pub fn annotation_2d(summary: &FitSummary) -> String {
    let coef = summary.coef.first().copied().unwrap_or(f64::NAN);
    format!(
        "R\u{b2} = {:.2}\ny = {:.2}x + {:.2}",
        summary.r_squared, coef, summary.intercept
    )
}

fn finite_range(values: &[f64]) -> Option<(f64, f64)> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    min_max(&finite)
}

fn draw_panel(area: &DrawingArea<SVGBackend<'_>, Shift>, panel: &ScatterPanel, style: &Typography) -> DrawResult<()> {
    let mut ys: Vec<f64> = panel.y.clone();
    if let Some(line) = &panel.fit_line {
        ys.extend(line.iter().map(|&(_, y)| y));
    }
    let (x0, x1) = finite_range(&panel.x).unwrap_or((0.0, 1.0));
    let (y0, y1) = finite_range(&ys).unwrap_or((0.0, 1.0));
    let (x0, x1) = pad_range(x0, x1, 0.05);
    let (y0, y1) = pad_range(y0, y1, 0.05);
    let color = colors::parse(&panel.color).unwrap_or(colors::BLUE);

    let mut chart = ChartBuilder::on(area)
        .margin(style.px_u32(6.0))
        .x_label_area_size(style.px_u32(26.0))
        .y_label_area_size(style.px_u32(34.0))
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(5)
        .y_labels(5)
        .x_desc(panel.x_label.as_str())
        .y_desc(panel.y_label.as_str())
        .label_style(style.tick_font())
        .axis_desc_style(style.label_font())
        .draw()?;

    let radius = style.px_u32(2.5);
    chart.draw_series(
        panel
            .x
            .iter()
            .zip(&panel.y)
            .filter(|(a, b)| a.is_finite() && b.is_finite())
            .map(|(&a, &b)| Circle::new((a, b), radius, color.mix(0.6).filled())),
    )?;

    if let Some(line) = &panel.fit_line {
        chart.draw_series(LineSeries::new(
            line.iter().copied(),
            colors::RED.stroke_width(style.px_u32(1.5)),
        ))?;
    }

    if let Some(text) = &panel.annotation {
        let lines: Vec<&str> = text.lines().collect();
        draw_text_lines(chart.plotting_area(), &lines, 0.05, 0.05, &style.font(9.0))?;
    }
    Ok(())
}
