//! Read/write plot summary JSON files.
//!
//! A summary is the portable record of what a figure showed: panel labels,
//! annotation text, the models behind fit lines and any test results. It lets
//! downstream scripts consume the numbers without parsing the SVG.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{StatTest, TestOutcome};
use crate::error::AppError;
use crate::models::ModelHandle;
use crate::plot::{BoxplotFigure, PlanePlot, ScatterPlot};
use crate::stats::BoxStats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterPanelSummary {
    pub x_label: String,
    pub y_label: String,
    pub color: String,
    pub annotation: Option<String>,
    pub model: Option<ModelHandle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxPanelSummary {
    pub title: String,
    pub group_labels: [String; 2],
    pub stats: [BoxStats; 2],
    pub result: Option<TestOutcome>,
    pub annotation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlotSummary {
    Scatter {
        panels: Vec<ScatterPanelSummary>,
    },
    Plane {
        annotation: Option<String>,
        model: Option<ModelHandle>,
    },
    Boxplot {
        test: Option<StatTest>,
        panels: Vec<BoxPanelSummary>,
    },
}

impl PlotSummary {
    pub fn from_scatter(plot: &ScatterPlot) -> Self {
        let panels = plot
            .panels
            .iter()
            .enumerate()
            .map(|(i, p)| ScatterPanelSummary {
                x_label: p.x_label.clone(),
                y_label: p.y_label.clone(),
                color: p.color.clone(),
                annotation: p.annotation.clone(),
                model: plot.models.as_ref().and_then(|m| m.get(i).cloned()),
            })
            .collect();
        PlotSummary::Scatter { panels }
    }

    pub fn from_plane(plot: &PlanePlot) -> Self {
        PlotSummary::Plane {
            annotation: plot.annotation.clone(),
            model: plot.model.clone(),
        }
    }

    pub fn from_boxplot(figure: &BoxplotFigure, test: Option<StatTest>) -> Self {
        let panels = figure
            .panels
            .iter()
            .map(|p| BoxPanelSummary {
                title: p.title.clone(),
                group_labels: p.group_labels.clone(),
                stats: p.stats.clone(),
                result: p.test,
                annotation: p.annotation.clone(),
            })
            .collect();
        PlotSummary::Boxplot { test, panels }
    }
}

/// Write a summary JSON file.
pub fn write_summary_json(path: &Path, summary: &PlotSummary) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create summary JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, summary)
        .map_err(|e| AppError::io(format!("Failed to write summary JSON: {e}")))?;
    log::info!("Wrote summary to {}", path.display());
    Ok(())
}

/// Read a summary JSON file.
pub fn read_summary_json(path: &Path) -> Result<PlotSummary, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::io(format!("Failed to open summary JSON '{}': {e}", path.display())))?;
    serde_json::from_reader(file).map_err(|e| AppError::config(format!("Invalid summary JSON: {e}")))
}
