//! Formatted terminal output.
//!
//! Formatting lives here so the generation, model and plotting code stays free
//! of presentation concerns, and output changes stay localized.

use crate::data::{PhenotypeConfig, PhenotypeData};
use crate::domain::StatTest;
use crate::math::min_max;
use crate::plot::{BoxplotFigure, PlanePlot, ScatterPlot};

/// Summary of a synthetic generation run.
pub fn format_generation_summary(config: &PhenotypeConfig, data: &PhenotypeData) -> String {
    let mut out = String::new();

    out.push_str("=== phenoplot - synthetic phenotype ===\n");
    out.push_str(&format!(
        "Samples: n={} | variables: p={}\n",
        data.x.nrows(),
        data.x.ncols()
    ));
    out.push_str(&format!(
        "Noise: {} (level={}) | seed={}\n",
        config.noise_type.name(),
        config.noise_level,
        config.random_seed
    ));
    out.push_str(&format!(
        "Weights: {}{}\n",
        fmt_vec(&data.weights),
        if config.weights.is_none() { " (drawn)" } else { "" }
    ));
    out.push_str(&format!(
        "Bias: {:.6}{}\n",
        data.bias,
        if config.bias.is_none() { " (drawn)" } else { "" }
    ));

    for (j, column) in data.columns().iter().enumerate() {
        if let Some((lo, hi)) = min_max(column) {
            out.push_str(&format!("x{:<3} range=[{lo:.3}, {hi:.3}]\n", j + 1));
        }
    }
    if let Some((lo, hi)) = min_max(&data.y) {
        out.push_str(&format!("Phenotype range=[{lo:.3}, {hi:.3}]\n"));
    }

    out
}

/// Per-panel fit annotations of a scatter figure.
pub fn format_scatter_summary(plot: &ScatterPlot) -> String {
    let mut out = String::new();
    out.push_str(&format!("Scatter panels: {}\n", plot.panels.len()));
    for panel in &plot.panels {
        let note = match (&panel.fit_line, &panel.annotation) {
            (None, _) => "no fit".to_string(),
            (Some(_), None) => "fit drawn, annotation unavailable".to_string(),
            (Some(_), Some(text)) => text.replace('\n', " | "),
        };
        out.push_str(&format!("- {:<6} {note}\n", panel.x_label));
    }
    out
}

pub fn format_plane_summary(plot: &PlanePlot) -> String {
    match (&plot.model, &plot.annotation) {
        (None, _) => "3D scatter: no plane\n".to_string(),
        (Some(_), None) => "3D scatter: plane drawn, annotation unavailable\n".to_string(),
        (Some(_), Some(text)) => format!("3D scatter: {}\n", text.replace('\n', " | ")),
    }
}

/// Table of group-comparison results, one row per variable.
pub fn format_test_results(figure: &BoxplotFigure, test: Option<StatTest>) -> String {
    let mut out = String::new();
    let name = test.map(StatTest::name).unwrap_or("none");
    out.push_str(&format!("Group comparison (test: {name})\n"));

    out.push_str(
        format!(
            "{:<20} {:>10} {:>10} {:>12} {:>12}\n",
            "variable", "median 1", "median 2", "statistic", "p-value"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<20} {:-<10} {:-<10} {:-<12} {:-<12}", "", "", "", "", "").trim_end());
    out.push('\n');

    for panel in &figure.panels {
        let (stat, p) = match panel.test {
            Some(o) => (format!("{:.4}", o.statistic), format!("{:.3e}", o.pvalue)),
            None => ("-".to_string(), "-".to_string()),
        };
        out.push_str(
            format!(
                "{:<20} {:>10.3} {:>10.3} {:>12} {:>12}",
                truncate(&panel.title, 20),
                panel.stats[0].median,
                panel.stats[1].median,
                stat,
                p
            )
            .trim_end(),
        );
        out.push('\n');
    }
    if let Some(panel) = figure.panels.first() {
        out.push_str(&format!(
            "(group 1 = {}, group 2 = {})\n",
            panel.group_labels[0], panel.group_labels[1]
        ));
    }
    out
}

fn fmt_vec(v: &[f64]) -> String {
    let parts: Vec<String> = v.iter().map(|x| format!("{x:.6}")).collect();
    format!("[{}]", parts.join(", "))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::generate_random_phenotype;
    use crate::domain::{Arrays, Groups};
    use crate::plot::{BoxplotOptions, plot_grouped_boxplots};

    #[test]
    fn generation_summary_marks_drawn_parameters() {
        let config = PhenotypeConfig {
            num_samples: 10,
            weights: Some(vec![1.0, 2.0]),
            ..PhenotypeConfig::default()
        };
        let data = generate_random_phenotype(&config).unwrap();
        let txt = format_generation_summary(&config, &data);
        assert!(txt.contains("Samples: n=10 | variables: p=2"));
        assert!(txt.contains("Weights: [1.000000, 2.000000]\n"));
        assert!(txt.contains(" (drawn)"));
        assert!(txt.contains("x2"));
        assert!(txt.contains("Noise: gaussian (level=0.1) | seed=42"));
    }

    #[test]
    fn test_table_has_one_row_per_variable() {
        let values: Vec<f64> = (0..10).map(f64::from).collect();
        let vars = Arrays::Many(vec![values.clone(), values]);
        let groups = Groups::Categorical((0..10).map(|i| if i < 5 { "a" } else { "b" }.to_string()).collect());
        let fig = plot_grouped_boxplots(&vars, &groups, &BoxplotOptions::default()).unwrap();

        let txt = format_test_results(&fig, Some(StatTest::RankSums));
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines[0], "Group comparison (test: ranksums)");
        assert!(lines[3].starts_with("Variable 1"));
        assert!(lines[4].starts_with("Variable 2"));
        assert_eq!(lines[5], "(group 1 = a, group 2 = b)");
    }

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 5), "abcd.");
    }
}
