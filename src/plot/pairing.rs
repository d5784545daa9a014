//! Panel pairing and per-panel model dispatch for scatter figures.
//!
//! Both steps run before anything is drawn, so configuration errors never leave
//! a half-rendered figure behind.

use nalgebra::DMatrix;

use crate::domain::Arrays;
use crate::error::AppError;
use crate::models::{LinearRegression, ModelHandle};

/// One subplot's data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelPair<'a> {
    pub x: &'a [f64],
    pub y: &'a [f64],
}

impl PanelPair<'_> {
    /// The observations where both x and y are finite.
    pub fn finite(&self) -> (Vec<f64>, Vec<f64>) {
        self.x
            .iter()
            .zip(self.y)
            .filter(|(a, b)| a.is_finite() && b.is_finite())
            .map(|(&a, &b)| (a, b))
            .unzip()
    }
}

/// Which models to draw on scatter panels.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ModelSpec {
    /// Scatter only.
    None,
    /// Fit an ordinary least squares line per panel.
    #[default]
    Auto,
    /// One pre-fitted model; only valid for a single panel.
    Single(ModelHandle),
    /// Pre-fitted models, the i-th used for the i-th panel.
    PerPanel(Vec<ModelHandle>),
}

/// Expand x/y inputs into ordered panel pairs.
///
/// - one x, one y: a single pair
/// - many x, one y: every x against the same y
/// - one x, many y: the same x against every y
/// - many x, many y: positional pairs (lengths must match)
pub fn resolve_pairs<'a>(x: &'a Arrays, y: &'a Arrays) -> Result<Vec<PanelPair<'a>>, AppError> {
    if x.is_empty() || y.is_empty() {
        return Err(AppError::config("Empty collection passed for x or phenotype."));
    }
    let xs = x.as_slices();
    let ys = y.as_slices();

    let pairs: Vec<PanelPair<'a>> = match (xs.len(), ys.len()) {
        (1, 1) => vec![PanelPair { x: xs[0], y: ys[0] }],
        (_, 1) => xs.iter().map(|&xi| PanelPair { x: xi, y: ys[0] }).collect(),
        (1, _) => ys.iter().map(|&yi| PanelPair { x: xs[0], y: yi }).collect(),
        (m, k) if m != k => {
            return Err(AppError::config(format!(
                "When providing collections for both x and phenotype, their lengths must match ({m} vs {k})."
            )));
        }
        _ => xs.iter().zip(&ys).map(|(&xi, &yi)| PanelPair { x: xi, y: yi }).collect(),
    };

    for (i, pair) in pairs.iter().enumerate() {
        if pair.x.is_empty() {
            return Err(AppError::config(format!("Panel {} has no observations.", i + 1)));
        }
        if pair.x.len() != pair.y.len() {
            return Err(AppError::config(format!(
                "Panel {}: x has {} values but phenotype has {}.",
                i + 1,
                pair.x.len(),
                pair.y.len()
            )));
        }
    }

    Ok(pairs)
}

/// Resolve the model used on each panel.
///
/// Returns `None` for `ModelSpec::None`, otherwise exactly one handle per panel.
pub fn resolve_models(spec: &ModelSpec, pairs: &[PanelPair<'_>]) -> Result<Option<Vec<ModelHandle>>, AppError> {
    let n = pairs.len();
    let models = match spec {
        ModelSpec::None => return Ok(None),
        ModelSpec::Auto => pairs
            .iter()
            .map(|p| {
                let (x, y) = p.finite();
                LinearRegression::fit(&single_feature(&x), &y).map(ModelHandle::from)
            })
            .collect::<Result<Vec<_>, _>>()?,
        ModelSpec::Single(handle) => {
            if n != 1 {
                return Err(AppError::config(format!(
                    "Single model provided but {n} subplots detected. Provide one model per subplot."
                )));
            }
            vec![handle.clone()]
        }
        ModelSpec::PerPanel(handles) => {
            if handles.len() < n {
                return Err(AppError::config(format!(
                    "Provided {} model(s), fewer than the {n} subplots.",
                    handles.len()
                )));
            }
            handles[..n].to_vec()
        }
    };

    for (i, handle) in models.iter().enumerate() {
        if handle.n_features() != 1 {
            return Err(AppError::model(format!(
                "Model for panel {} expects {} features; scatter panels have one.",
                i + 1,
                handle.n_features()
            )));
        }
    }

    Ok(Some(models))
}

pub(crate) fn single_feature(values: &[f64]) -> DMatrix<f64> {
    DMatrix::from_column_slice(values.len(), 1, values)
}
