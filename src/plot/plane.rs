//! 3D scatter of two independent variables against the phenotype, with the
//! fitted regression plane drawn as a translucent surface.

use std::path::PathBuf;

use nalgebra::DMatrix;
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::FigSize;
use crate::error::AppError;
use crate::math::{columns_to_matrix, linspace, min_max};
use crate::models::{FitSummary, LinearRegression, ModelHandle};

use super::{DEFAULT_DPI, DrawResult, Figure, Typography, colors, draw_text_lines, pad_range, render_svg};

/// Model drawn as the plane.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum PlaneModel {
    None,
    /// Fit `y ~ x1 + x2` by ordinary least squares.
    #[default]
    Auto,
    Fitted(ModelHandle),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaneOptions {
    pub figsize: FigSize,
    pub model: PlaneModel,
    /// Surface samples per axis.
    pub grid_res: usize,
    /// Camera elevation in degrees.
    pub elev: f64,
    /// Camera azimuth in degrees.
    pub azim: f64,
    pub surface_alpha: f64,
    pub point_color: RGBColor,
    pub surface_color: RGBColor,
    pub save_path: Option<PathBuf>,
    pub dpi: u32,
}

impl Default for PlaneOptions {
    fn default() -> Self {
        Self {
            figsize: FigSize::new(7.0, 5.0),
            model: PlaneModel::Auto,
            grid_res: 10,
            elev: 20.0,
            azim: -45.0,
            surface_alpha: 0.5,
            point_color: colors::PURPLE,
            surface_color: colors::ORANGE,
            save_path: None,
            dpi: DEFAULT_DPI,
        }
    }
}

/// Predicted plane sampled on a regular grid.
///
/// `y[i][j]` is the prediction at `(x1[j], x2[i])`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneSurface {
    pub x1: Vec<f64>,
    pub x2: Vec<f64>,
    pub y: Vec<Vec<f64>>,
}

#[derive(Debug, Clone)]
pub struct PlanePlot {
    pub figure: Figure,
    pub annotation: Option<String>,
    pub model: Option<ModelHandle>,
    pub surface: Option<PlaneSurface>,
}

pub fn plot_3d_scatter_with_plane(
    x1: &[f64],
    x2: &[f64],
    y: &[f64],
    options: &PlaneOptions,
) -> Result<PlanePlot, AppError> {
    validate(x1, x2, y, options)?;
    let size = options.figsize.to_pixels(options.dpi)?;
    let features = columns_to_matrix(&[x1, x2])
        .ok_or_else(|| AppError::config("x1 and x2 must be non-empty and of equal length."))?;

    let model: Option<ModelHandle> = match &options.model {
        PlaneModel::None => None,
        PlaneModel::Auto => Some(LinearRegression::fit(&features, y)?.into()),
        PlaneModel::Fitted(handle) => {
            if handle.n_features() != 2 {
                return Err(AppError::model(format!(
                    "Plane model expects 2 features, got {}.",
                    handle.n_features()
                )));
            }
            Some(handle.clone())
        }
    };

    let (surface, annotation) = match &model {
        None => (None, None),
        Some(handle) => {
            let surface = sample_surface(handle, x1, x2, options.grid_res)?;
            let summary = handle.summary(&features, y);
            if !summary.r_squared.is_finite() {
                log::debug!("Plane fit has no finite R\u{b2}; annotating with NaN");
            }
            (Some(surface), Some(annotation_3d(&summary)))
        }
    };

    let style = Typography::new(options.dpi);
    let figure = render_svg(size, |root| {
        draw_plane(root, x1, x2, y, surface.as_ref(), annotation.as_deref(), options, &style)
    })?;
    figure.save_if_requested(options.save_path.as_deref())?;

    Ok(PlanePlot {
        figure,
        annotation,
        model,
        surface,
    })
}

fn validate(x1: &[f64], x2: &[f64], y: &[f64], options: &PlaneOptions) -> Result<(), AppError> {
    if x1.is_empty() || x1.len() != x2.len() || x1.len() != y.len() {
        return Err(AppError::config(format!(
            "x1, x2 and y must have equal non-zero lengths (got {}, {}, {}).",
            x1.len(),
            x2.len(),
            y.len()
        )));
    }
    if [x1, x2, y].iter().any(|s| s.iter().any(|v| !v.is_finite())) {
        return Err(AppError::config("3D scatter inputs must be finite."));
    }
    if options.grid_res < 2 {
        return Err(AppError::config(format!("grid_res must be >= 2, got {}.", options.grid_res)));
    }
    if !(0.0..=1.0).contains(&options.surface_alpha) {
        return Err(AppError::config(format!(
            "surface_alpha must be within [0, 1], got {}.",
            options.surface_alpha
        )));
    }
    if !(options.elev.is_finite() && options.azim.is_finite()) {
        return Err(AppError::config("Viewing angles must be finite."));
    }
    Ok(())
}

fn sample_surface(handle: &ModelHandle, x1: &[f64], x2: &[f64], grid_res: usize) -> Result<PlaneSurface, AppError> {
    let (a0, a1) = min_max(x1).ok_or_else(|| AppError::config("x1 has no finite range."))?;
    let (b0, b1) = min_max(x2).ok_or_else(|| AppError::config("x2 has no finite range."))?;
    let gx1 = linspace(a0, a1, grid_res);
    let gx2 = linspace(b0, b1, grid_res);

    // Rows ordered x2-major so predictions chunk into one row per x2 value.
    let grid = DMatrix::from_fn(grid_res * grid_res, 2, |r, c| {
        if c == 0 { gx1[r % grid_res] } else { gx2[r / grid_res] }
    });
    let flat = handle.predict(&grid)?;
    let y = flat.chunks(grid_res).map(<[f64]>::to_vec).collect();

    Ok(PlaneSurface { x1: gx1, x2: gx2, y })
}

/// `R² = …` over `y = …x1 + …x2 + …`.
pub fn annotation_3d(summary: &FitSummary) -> String {
    let c1 = summary.coef.first().copied().unwrap_or(f64::NAN);
    let c2 = summary.coef.get(1).copied().unwrap_or(f64::NAN);
    format!(
        "R\u{b2} = {:.2}\ny = {:.2}x1 + {:.2}x2 + {:.2}",
        summary.r_squared, c1, c2, summary.intercept
    )
}

#[allow(clippy::too_many_arguments)]
fn draw_plane(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    x1: &[f64],
    x2: &[f64],
    y: &[f64],
    surface: Option<&PlaneSurface>,
    annotation: Option<&str>,
    options: &PlaneOptions,
    style: &Typography,
) -> DrawResult<()> {
    let (a0, a1) = min_max(x1).unwrap_or((0.0, 1.0));
    let (b0, b1) = min_max(x2).unwrap_or((0.0, 1.0));
    let mut ys = y.to_vec();
    if let Some(s) = surface {
        ys.extend(s.y.iter().flatten().copied());
    }
    let (c0, c1) = min_max(&ys).unwrap_or((0.0, 1.0));
    let (a0, a1) = pad_range(a0, a1, 0.02);
    let (b0, b1) = pad_range(b0, b1, 0.02);
    let (c0, c1) = pad_range(c0, c1, 0.05);

    let mut chart = ChartBuilder::on(root)
        .margin(style.px_u32(10.0))
        .build_cartesian_3d(a0..a1, c0..c1, b0..b1)?;

    let (pitch, yaw) = (options.elev.to_radians(), options.azim.to_radians());
    chart.with_projection(|mut pb| {
        pb.pitch = pitch;
        pb.yaw = yaw;
        pb.scale = 0.8;
        pb.into_matrix()
    });

    chart
        .configure_axes()
        .light_grid_style(BLACK.mix(0.15))
        .max_light_lines(3)
        .draw()?;

    if let Some(s) = surface {
        let fill = options.surface_color.mix(options.surface_alpha).filled();
        let n = s.x1.len();
        let quads = (0..n - 1).flat_map(|i| (0..n - 1).map(move |j| (i, j)));
        chart.draw_series(quads.map(|(i, j)| {
            Polygon::new(
                vec![
                    (s.x1[j], s.y[i][j], s.x2[i]),
                    (s.x1[j + 1], s.y[i][j + 1], s.x2[i]),
                    (s.x1[j + 1], s.y[i + 1][j + 1], s.x2[i + 1]),
                    (s.x1[j], s.y[i + 1][j], s.x2[i + 1]),
                ],
                fill,
            )
        }))?;
    }

    let radius = style.px_u32(2.5);
    chart.draw_series(
        x1.iter()
            .zip(x2)
            .zip(y)
            .map(|((&a, &b), &c)| Circle::new((a, c, b), radius, options.point_color.mix(0.8).filled())),
    )?;

    let axis_names = [
        "x: Independent Variable 1 (x1)",
        "y: Phenotype",
        "z: Independent Variable 2 (x2)",
    ];
    draw_text_lines(root, &axis_names, 0.02, 0.86, &style.tick_font())?;

    if let Some(text) = annotation {
        let lines: Vec<&str> = text.lines().collect();
        draw_text_lines(root, &lines, 0.05, 0.05, &style.label_font())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::OlsResults;
    use approx::assert_abs_diff_eq;

    fn plane_data() -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let x1: Vec<f64> = (0..12).map(|i| f64::from(i) * 0.5).collect();
        let x2: Vec<f64> = (0..12).map(|i| f64::from((i * 7) % 12)).collect();
        let y = x1.iter().zip(&x2).map(|(a, b)| 1.5 * a - 0.5 * b + 2.0).collect();
        (x1, x2, y)
    }

    #[test]
    fn auto_plane_recovers_coefficients() {
        let (x1, x2, y) = plane_data();
        let plot = plot_3d_scatter_with_plane(&x1, &x2, &y, &PlaneOptions::default()).unwrap();
        assert_eq!(
            plot.annotation.as_deref(),
            Some("R\u{b2} = 1.00\ny = 1.50x1 + -0.50x2 + 2.00")
        );
        assert_eq!(plot.figure.size(), (700, 500));

        let surface = plot.surface.unwrap();
        assert_eq!(surface.y.len(), 10);
        assert!(surface.y.iter().all(|row| row.len() == 10));
        let expected = 1.5 * surface.x1[3] - 0.5 * surface.x2[7] + 2.0;
        assert_abs_diff_eq!(surface.y[7][3], expected, epsilon = 1e-9);
    }

    #[test]
    fn no_model_draws_points_only() {
        let (x1, x2, y) = plane_data();
        let options = PlaneOptions {
            model: PlaneModel::None,
            ..PlaneOptions::default()
        };
        let plot = plot_3d_scatter_with_plane(&x1, &x2, &y, &options).unwrap();
        assert!(plot.annotation.is_none());
        assert!(plot.surface.is_none());
        assert!(plot.model.is_none());
    }

    #[test]
    fn parameter_style_plane_uses_leading_intercept() {
        let (x1, x2, y) = plane_data();
        let handle: ModelHandle = OlsResults::from_parts(vec![2.0, 1.5, -0.5], Some(0.75)).into();
        let options = PlaneOptions {
            model: PlaneModel::Fitted(handle),
            grid_res: 3,
            ..PlaneOptions::default()
        };
        let plot = plot_3d_scatter_with_plane(&x1, &x2, &y, &options).unwrap();
        assert_eq!(
            plot.annotation.as_deref(),
            Some("R\u{b2} = 0.75\ny = 1.50x1 + -0.50x2 + 2.00")
        );
        assert_eq!(plot.surface.unwrap().x1.len(), 3);
    }

    #[test]
    fn missing_rsquared_is_rendered_as_nan() {
        let (x1, x2, y) = plane_data();
        let handle: ModelHandle = OlsResults::from_parts(vec![2.0, 1.5, -0.5], None).into();
        let options = PlaneOptions {
            model: PlaneModel::Fitted(handle),
            ..PlaneOptions::default()
        };
        let plot = plot_3d_scatter_with_plane(&x1, &x2, &y, &options).unwrap();
        assert_eq!(
            plot.annotation.as_deref(),
            Some("R\u{b2} = NaN\ny = 1.50x1 + -0.50x2 + 2.00")
        );
        assert!(plot.surface.is_some());
    }

    #[test]
    fn one_feature_model_is_a_model_error() {
        let (x1, x2, y) = plane_data();
        let options = PlaneOptions {
            model: PlaneModel::Fitted(LinearRegression::from_parts(vec![1.0], 0.0).into()),
            ..PlaneOptions::default()
        };
        let err = plot_3d_scatter_with_plane(&x1, &x2, &y, &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Model);
    }

    #[test]
    fn invalid_inputs_are_config_errors() {
        let (x1, x2, y) = plane_data();
        let err = plot_3d_scatter_with_plane(&x1[..5], &x2, &y, &PlaneOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);

        let coarse = PlaneOptions {
            grid_res: 1,
            ..PlaneOptions::default()
        };
        assert_eq!(
            plot_3d_scatter_with_plane(&x1, &x2, &y, &coarse).unwrap_err().kind(),
            ErrorKind::Config
        );
    }
}
