//! Grouped boxplots comparing two groups across one or more variables.

use std::collections::BTreeSet;
use std::path::PathBuf;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::{Deserialize, Serialize};

use crate::domain::{Arrays, FigSize, Groups, StatTest, TestOutcome};
use crate::error::AppError;
use crate::stats::{BoxStats, run_test};

use super::{DEFAULT_DPI, DrawResult, Figure, Typography, colors, pad_range, render_svg};

/// Fraction of a group's slot left empty on each side of its box.
const BOX_INSET: f64 = 0.2;

#[derive(Debug, Clone, PartialEq)]
pub struct BoxplotOptions {
    /// `None` sizes the figure at 3.75in per variable.
    pub figsize: Option<FigSize>,
    pub test: Option<StatTest>,
    /// Defaults to `Positive`/`Negative` or the sorted category values.
    pub group_labels: Option<[String; 2]>,
    /// Defaults to `Variable` (one variable) or `Variable i`.
    pub var_labels: Option<Vec<String>>,
    pub colors: [RGBColor; 2],
    pub ylabel: String,
    pub save_path: Option<PathBuf>,
    pub dpi: u32,
}

impl Default for BoxplotOptions {
    fn default() -> Self {
        Self {
            figsize: Some(FigSize::new(7.5, 4.0)),
            test: Some(StatTest::RankSums),
            group_labels: None,
            var_labels: None,
            colors: [colors::BLUE, colors::RED],
            ylabel: "Value".to_string(),
            save_path: None,
            dpi: DEFAULT_DPI,
        }
    }
}

/// Binary partition of observations.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSplit {
    /// Default display labels, first group first.
    pub labels: [String; 2],
    /// `true` where the observation belongs to the first group.
    pub in_first: Vec<bool>,
}

impl GroupSplit {
    pub fn len(&self) -> usize {
        self.in_first.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_first.is_empty()
    }

    /// Split `values` into (first group, second group), preserving order.
    pub fn partition(&self, values: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let mut first = Vec::new();
        let mut second = Vec::new();
        for (&v, &is_first) in values.iter().zip(&self.in_first) {
            if is_first {
                first.push(v);
            } else {
                second.push(v);
            }
        }
        (first, second)
    }
}

/// Partition a group vector with exactly two distinct values.
///
/// Boolean: `true` is the first group. Categorical: values sorted ascending.
pub fn split_groups(groups: &Groups) -> Result<GroupSplit, AppError> {
    match groups {
        Groups::Boolean(flags) => {
            let distinct = flags.iter().collect::<BTreeSet<_>>().len();
            if distinct != 2 {
                return Err(two_values_error(distinct));
            }
            Ok(GroupSplit {
                labels: ["Positive".to_string(), "Negative".to_string()],
                in_first: flags.clone(),
            })
        }
        Groups::Categorical(values) => {
            let distinct: BTreeSet<&str> = values.iter().map(String::as_str).collect();
            let mut it = distinct.iter();
            let (Some(&first), Some(&second), None) = (it.next(), it.next(), it.next()) else {
                return Err(two_values_error(distinct.len()));
            };
            Ok(GroupSplit {
                labels: [first.to_string(), second.to_string()],
                in_first: values.iter().map(|v| v == first).collect(),
            })
        }
    }
}

fn two_values_error(found: usize) -> AppError {
    AppError::config(format!(
        "Group vector must contain exactly two distinct values, found {found}."
    ))
}

/// One variable's panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxPanel {
    pub title: String,
    pub group_labels: [String; 2],
    pub stats: [BoxStats; 2],
    pub test: Option<TestOutcome>,
    pub annotation: Option<String>,
    /// Data y of the p-value annotation.
    pub annotation_y: f64,
}

#[derive(Debug, Clone)]
pub struct BoxplotFigure {
    pub figure: Figure,
    pub panels: Vec<BoxPanel>,
    /// One entry per variable; `None` when no test was requested.
    pub test_results: Vec<Option<TestOutcome>>,
}

pub fn plot_grouped_boxplots(
    variables: &Arrays,
    groups: &Groups,
    options: &BoxplotOptions,
) -> Result<BoxplotFigure, AppError> {
    let vars = variables.as_slices();
    let n = vars.len();
    if n == 0 {
        return Err(AppError::config("No variables to plot."));
    }
    let split = split_groups(groups)?;
    let titles = variable_titles(n, options.var_labels.as_deref())?;
    let group_labels = options.group_labels.clone().unwrap_or_else(|| split.labels.clone());
    let figsize = options.figsize.unwrap_or_else(|| FigSize::boxplot_default_for(n));
    let size = figsize.to_pixels(options.dpi)?;

    let mut panels = Vec::with_capacity(n);
    for (i, (values, title)) in vars.iter().zip(titles).enumerate() {
        if values.len() != split.len() {
            return Err(AppError::config(format!(
                "Variable {} has {} values but the group vector has {}.",
                i + 1,
                values.len(),
                split.len()
            )));
        }
        panels.push(build_panel(values, &split, title, &group_labels, options.test)?);
    }
    let test_results = panels.iter().map(|p| p.test).collect();

    let style = Typography::new(options.dpi);
    let figure = render_svg(size, |root| {
        let areas = root.split_evenly((1, n));
        for (area, panel) in areas.iter().zip(&panels) {
            draw_panel(area, panel, options, &style)?;
        }
        Ok(())
    })?;
    figure.save_if_requested(options.save_path.as_deref())?;

    Ok(BoxplotFigure {
        figure,
        panels,
        test_results,
    })
}

fn variable_titles(n: usize, custom: Option<&[String]>) -> Result<Vec<String>, AppError> {
    match custom {
        Some(labels) if labels.len() < n => Err(AppError::config(format!(
            "Provided {} variable label(s) for {n} variables.",
            labels.len()
        ))),
        Some(labels) => Ok(labels[..n].to_vec()),
        None if n == 1 => Ok(vec!["Variable".to_string()]),
        None => Ok((1..=n).map(|i| format!("Variable {i}")).collect()),
    }
}

fn build_panel(
    values: &[f64],
    split: &GroupSplit,
    title: String,
    group_labels: &[String; 2],
    test: Option<StatTest>,
) -> Result<BoxPanel, AppError> {
    if values.iter().any(|v| !v.is_finite()) {
        return Err(AppError::config(format!("{title} contains non-finite values.")));
    }
    let (first, second) = split.partition(values);
    let stats_for = |group: &[f64], label: &str| {
        BoxStats::from_values(group)
            .ok_or_else(|| AppError::config(format!("{title}: group '{label}' is empty.")))
    };
    let stats = [stats_for(&first, &group_labels[0])?, stats_for(&second, &group_labels[1])?];

    let outcome = test.map(|t| run_test(t, &first, &second)).transpose()?;
    if let (Some(t), Some(o)) = (test, outcome) {
        log::debug!("{title}: {} statistic={:.4} p={:.4e}", t.name(), o.statistic, o.pvalue);
    }
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Ok(BoxPanel {
        title,
        group_labels: group_labels.clone(),
        stats,
        test: outcome,
        annotation: outcome.map(|o| format!("p = {:.3e}", o.pvalue)),
        annotation_y: max * 0.9,
    })
}

fn draw_panel(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    panel: &BoxPanel,
    options: &BoxplotOptions,
    style: &Typography,
) -> DrawResult<()> {
    let (mut lo, mut hi) = panel.stats[0].extent();
    let (lo2, hi2) = panel.stats[1].extent();
    lo = lo.min(lo2);
    hi = hi.max(hi2);
    if panel.annotation.is_some() {
        lo = lo.min(panel.annotation_y);
        hi = hi.max(panel.annotation_y);
    }
    let (lo, hi) = pad_range(lo, hi, 0.08);
    let labels = &panel.group_labels;

    // Two slots: CenterOf(0) and CenterOf(1).
    let mut chart = ChartBuilder::on(area)
        .caption(panel.title.as_str(), style.title_font())
        .margin(style.px_u32(6.0))
        .x_label_area_size(style.px_u32(22.0))
        .y_label_area_size(style.px_u32(38.0))
        .build_cartesian_2d((0..1usize).into_segmented(), lo..hi)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .y_desc(options.ylabel.as_str())
        .label_style(style.tick_font())
        .axis_desc_style(style.label_font())
        .x_label_formatter(&|v| match v {
            SegmentValue::CenterOf(i) => labels.get(*i).cloned().unwrap_or_default(),
            _ => String::new(),
        })
        .draw()?;

    let slot_px = chart.plotting_area().dim_in_pixel().0 as f64 / 2.0;
    let inset = (slot_px * BOX_INSET).round() as u32;
    let half = (slot_px * (0.5 - BOX_INSET)).round() as i32;
    let cap = half / 2;
    let stroke = style.px_u32(1.2);

    for (i, stats) in panel.stats.iter().enumerate() {
        let line = options.colors[i].stroke_width(stroke);

        let mut body = Rectangle::new(
            [(SegmentValue::Exact(i), stats.q1), (SegmentValue::Exact(i + 1), stats.q3)],
            line,
        );
        body.set_margin(0, 0, inset, inset);
        chart.draw_series(std::iter::once(body))?;

        let center = SegmentValue::CenterOf(i);
        chart.draw_series([
            PathElement::new(vec![(center.clone(), stats.whisker_low), (center.clone(), stats.q1)], line),
            PathElement::new(vec![(center.clone(), stats.q3), (center.clone(), stats.whisker_high)], line),
        ])?;

        chart.draw_series([
            EmptyElement::at((center.clone(), stats.median))
                + PathElement::new(vec![(-half, 0), (half, 0)], line),
            EmptyElement::at((center.clone(), stats.whisker_low))
                + PathElement::new(vec![(-cap, 0), (cap, 0)], line),
            EmptyElement::at((center.clone(), stats.whisker_high))
                + PathElement::new(vec![(-cap, 0), (cap, 0)], line),
        ])?;

        let flier = BLACK.stroke_width(1);
        chart.draw_series(
            stats
                .fliers
                .iter()
                .map(|&v| Circle::new((center.clone(), v), style.px_u32(2.0), flier)),
        )?;
    }

    if let Some(text) = &panel.annotation {
        let font = TextStyle::from(style.font(9.0)).pos(Pos::new(HPos::Center, VPos::Center));
        chart.draw_series(std::iter::once(
            EmptyElement::at((SegmentValue::Exact(1), panel.annotation_y))
                + Text::new(text.clone(), (0, 0), font),
        ))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::stats::ttest_ind;

    fn labels(values: &[&str]) -> Groups {
        Groups::Categorical(values.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn three_distinct_values_error() {
        let err = split_groups(&labels(&["a", "b", "c", "a"])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(split_groups(&Groups::Boolean(vec![true, true])).is_err());
    }

    #[test]
    fn categorical_split_is_sorted_exhaustive_and_disjoint() {
        let groups = labels(&["wt", "ko", "wt", "ko", "ko"]);
        let split = split_groups(&groups).unwrap();
        assert_eq!(split.labels, ["ko".to_string(), "wt".to_string()]);

        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let (first, second) = split.partition(&values);
        assert_eq!(first, vec![2.0, 4.0, 5.0]);
        assert_eq!(second, vec![1.0, 3.0]);
        assert_eq!(first.len() + second.len(), values.len());
        assert!(first.iter().all(|v| !second.contains(v)));
    }

    #[test]
    fn boolean_split_puts_true_first() {
        let split = split_groups(&Groups::Boolean(vec![false, true, true])).unwrap();
        assert_eq!(split.labels, ["Positive".to_string(), "Negative".to_string()]);
        assert_eq!(split.partition(&[1.0, 2.0, 3.0]), (vec![2.0, 3.0], vec![1.0]));
    }

    fn sample() -> (Vec<f64>, Groups) {
        let values: Vec<f64> = (0..16).map(f64::from).collect();
        let groups = Groups::Boolean((0..16).map(|i| i >= 8).collect());
        (values, groups)
    }

    #[test]
    fn single_variable_panel_with_ttest() {
        let (values, groups) = sample();
        let options = BoxplotOptions {
            test: Some(StatTest::TTest),
            ..BoxplotOptions::default()
        };
        let fig = plot_grouped_boxplots(&values.clone().into(), &groups, &options).unwrap();

        let expected = ttest_ind(&values[8..], &values[..8]).unwrap();
        assert_eq!(fig.test_results, vec![Some(expected)]);
        let panel = &fig.panels[0];
        assert_eq!(panel.title, "Variable");
        assert_eq!(panel.group_labels[0], "Positive");
        assert_eq!(panel.stats[0].median, 11.5);
        assert_eq!(panel.annotation, Some(format!("p = {:.3e}", expected.pvalue)));
        assert_eq!(panel.annotation_y, 15.0 * 0.9);
        assert_eq!(fig.figure.size(), (750, 400));
        assert!(fig.figure.svg().contains("Positive"));
    }

    #[test]
    fn multiple_variables_get_numbered_titles_and_no_test() {
        let (values, groups) = sample();
        let vars = Arrays::Many(vec![values.clone(), values.iter().map(|v| -v).collect()]);
        let options = BoxplotOptions {
            figsize: None,
            test: None,
            ..BoxplotOptions::default()
        };
        let fig = plot_grouped_boxplots(&vars, &groups, &options).unwrap();
        let titles: Vec<&str> = fig.panels.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Variable 1", "Variable 2"]);
        assert_eq!(fig.test_results, vec![None, None]);
        assert!(fig.panels.iter().all(|p| p.annotation.is_none()));
        assert_eq!(fig.figure.size(), (750, 400));
    }

    #[test]
    fn length_mismatch_and_short_labels_are_config_errors() {
        let (values, groups) = sample();
        let short: Arrays = values[..10].to_vec().into();
        let err = plot_grouped_boxplots(&short, &groups, &BoxplotOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let vars = Arrays::Many(vec![values.clone(), values]);
        let options = BoxplotOptions {
            var_labels: Some(vec!["only one".to_string()]),
            ..BoxplotOptions::default()
        };
        assert!(plot_grouped_boxplots(&vars, &groups, &options).is_err());
    }

    #[test]
    fn custom_labels_are_used() {
        let (values, groups) = sample();
        let options = BoxplotOptions {
            group_labels: Some(["High".to_string(), "Low".to_string()]),
            var_labels: Some(vec!["Height".to_string()]),
            ..BoxplotOptions::default()
        };
        let fig = plot_grouped_boxplots(&values.into(), &groups, &options).unwrap();
        assert_eq!(fig.panels[0].title, "Height");
        assert_eq!(fig.panels[0].group_labels, ["High".to_string(), "Low".to_string()]);
    }
}
