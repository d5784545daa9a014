//! Fitted regression model handles.
//!
//! Plots accept models in two incompatible capability shapes:
//!
//! - `LinearRegression`: slope-style. Exposes `coef`, `intercept`, `predict` on raw
//!   features and `score` (R² computed on supplied data).
//! - `OlsResults`: parameter-vector style. The first parameter is the intercept, the
//!   rest are slopes; `rsquared` is stored at fit time and `predict` expects a design
//!   matrix that already carries the constant column.
//!
//! `ModelHandle` is the tagged union over both. Callers match on the variant instead
//! of probing for attributes.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::math::{add_constant, r_squared, solve_least_squares};

/// Slope-style ordinary least squares model with an implicit intercept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegression {
    coef: Vec<f64>,
    intercept: f64,
}

impl LinearRegression {
    /// Fit `y ≈ X β + b` on an `n x k` feature matrix.
    ///
    /// Features and response are centered before solving, so a constant feature
    /// gets a zero slope and the intercept is the response mean.
    pub fn fit(x: &DMatrix<f64>, y: &[f64]) -> Result<Self, AppError> {
        if x.nrows() != y.len() {
            return Err(AppError::model(format!(
                "Feature rows ({}) do not match response length ({}).",
                x.nrows(),
                y.len()
            )));
        }
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(AppError::model("Cannot fit a regression on empty data."));
        }
        ensure_finite(x, y)?;

        let n = x.nrows() as f64;
        let x_mean: Vec<f64> = x.column_iter().map(|c| c.sum() / n).collect();
        let y_mean = y.iter().sum::<f64>() / n;
        let centered = DMatrix::from_fn(x.nrows(), x.ncols(), |i, j| x[(i, j)] - x_mean[j]);
        let target = DVector::from_iterator(y.len(), y.iter().map(|v| v - y_mean));

        let coef = solve_least_squares(&centered, &target)
            .ok_or_else(|| AppError::model("Least squares solve failed (ill-conditioned design)."))?;
        let intercept = y_mean - coef.iter().zip(&x_mean).map(|(c, m)| c * m).sum::<f64>();

        Ok(Self {
            coef: coef.iter().copied().collect(),
            intercept,
        })
    }

    /// Build a model from known coefficients.
    pub fn from_parts(coef: Vec<f64>, intercept: f64) -> Self {
        Self { coef, intercept }
    }

    pub fn coef(&self) -> &[f64] {
        &self.coef
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn n_features(&self) -> usize {
        self.coef.len()
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Result<Vec<f64>, AppError> {
        if x.ncols() != self.coef.len() {
            return Err(AppError::model(format!(
                "Model expects {} feature(s), got {}.",
                self.coef.len(),
                x.ncols()
            )));
        }
        Ok(x.row_iter()
            .map(|row| {
                self.intercept + row.iter().zip(&self.coef).map(|(a, b)| a * b).sum::<f64>()
            })
            .collect())
    }

    /// R² of the model's predictions on `(x, y)`.
    pub fn score(&self, x: &DMatrix<f64>, y: &[f64]) -> Result<f64, AppError> {
        let y_hat = self.predict(x)?;
        r_squared(y, &y_hat).ok_or_else(|| AppError::model("R² is undefined for this data."))
    }
}

/// Parameter-vector style OLS results (`params[0]` is the intercept).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OlsResults {
    params: Vec<f64>,
    rsquared: Option<f64>,
}

impl OlsResults {
    /// Fit on an exogenous matrix that already contains a leading constant column.
    pub fn fit(exog: &DMatrix<f64>, y: &[f64]) -> Result<Self, AppError> {
        if exog.nrows() != y.len() || exog.nrows() == 0 {
            return Err(AppError::model(format!(
                "Design rows ({}) do not match response length ({}).",
                exog.nrows(),
                y.len()
            )));
        }
        if exog.ncols() < 2 {
            return Err(AppError::model("Design needs a constant column and at least one feature."));
        }
        ensure_finite(exog, y)?;
        let target = DVector::from_column_slice(y);
        let beta = solve_least_squares(exog, &target)
            .ok_or_else(|| AppError::model("Least squares solve failed (ill-conditioned design)."))?;
        let params: Vec<f64> = beta.iter().copied().collect();
        let fitted = exog * &beta;
        let rsquared = r_squared(y, fitted.as_slice());
        Ok(Self { params, rsquared })
    }

    /// Build results from known parameters.
    pub fn from_parts(params: Vec<f64>, rsquared: Option<f64>) -> Self {
        Self { params, rsquared }
    }

    pub fn params(&self) -> &[f64] {
        &self.params
    }

    pub fn rsquared(&self) -> Option<f64> {
        self.rsquared
    }

    pub fn n_features(&self) -> usize {
        self.params.len().saturating_sub(1)
    }

    /// Predict from an exogenous matrix including the constant column.
    pub fn predict(&self, exog: &DMatrix<f64>) -> Result<Vec<f64>, AppError> {
        if exog.ncols() != self.params.len() {
            return Err(AppError::model(format!(
                "Results expect {} design column(s), got {}.",
                self.params.len(),
                exog.ncols()
            )));
        }
        Ok(exog
            .row_iter()
            .map(|row| row.iter().zip(&self.params).map(|(a, b)| a * b).sum::<f64>())
            .collect())
    }
}

/// Goodness of fit and coefficients extracted from a handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub r_squared: f64,
    pub coef: Vec<f64>,
    pub intercept: f64,
}

/// A fitted model in one of the two supported capability shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum ModelHandle {
    Coefficients(LinearRegression),
    Parameters(OlsResults),
}

impl ModelHandle {
    pub fn n_features(&self) -> usize {
        match self {
            ModelHandle::Coefficients(m) => m.n_features(),
            ModelHandle::Parameters(m) => m.n_features(),
        }
    }

    /// Predict from raw features (no constant column).
    pub fn predict(&self, features: &DMatrix<f64>) -> Result<Vec<f64>, AppError> {
        match self {
            ModelHandle::Coefficients(m) => m.predict(features),
            ModelHandle::Parameters(m) => m.predict(&add_constant(features)),
        }
    }

    /// Slope-style summary: R² scored on `(features, y)` plus coefficients.
    ///
    /// Only `Coefficients` handles qualify. Returns `None` for any other handle or
    /// when a value is unavailable or non-finite.
    pub fn coefficient_summary(&self, features: &DMatrix<f64>, y: &[f64]) -> Option<FitSummary> {
        let ModelHandle::Coefficients(m) = self else {
            return None;
        };
        let out = FitSummary {
            r_squared: m.score(features, y).ok()?,
            coef: m.coef().to_vec(),
            intercept: m.intercept(),
        };
        let finite = out.r_squared.is_finite()
            && out.intercept.is_finite()
            && out.coef.iter().all(|c| c.is_finite());
        finite.then_some(out)
    }

    /// Summary from whichever shape the handle has. Missing values are NaN.
    pub fn summary(&self, features: &DMatrix<f64>, y: &[f64]) -> FitSummary {
        match self {
            ModelHandle::Coefficients(m) => FitSummary {
                r_squared: m.score(features, y).unwrap_or(f64::NAN),
                coef: m.coef().to_vec(),
                intercept: m.intercept(),
            },
            ModelHandle::Parameters(m) => {
                let (intercept, coef) = match m.params().split_first() {
                    Some((b, rest)) => (*b, rest.to_vec()),
                    None => (f64::NAN, Vec::new()),
                };
                FitSummary {
                    r_squared: m.rsquared().unwrap_or(f64::NAN),
                    coef,
                    intercept,
                }
            }
        }
    }
}

fn ensure_finite(x: &DMatrix<f64>, y: &[f64]) -> Result<(), AppError> {
    if x.iter().chain(y).all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(AppError::model("Cannot fit a regression on NaN or infinite values."))
    }
}

impl From<LinearRegression> for ModelHandle {
    fn from(value: LinearRegression) -> Self {
        ModelHandle::Coefficients(value)
    }
}

impl From<OlsResults> for ModelHandle {
    fn from(value: OlsResults) -> Self {
        ModelHandle::Parameters(value)
    }
}
