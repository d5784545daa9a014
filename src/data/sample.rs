//! Synthetic phenotype generation.
//!
//! The phenotype is a linear function of uniformly sampled independent variables
//! plus a bias, perturbed by one of several noise models. Every random draw comes
//! from a single seeded `StdRng` stream, so a config fully determines the output.

use nalgebra::DMatrix;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::{Exp, Normal, Poisson, Uniform};
use serde::{Deserialize, Serialize};

use crate::domain::NoiseType;
use crate::error::AppError;

/// Lower/upper bounds of the uniform independent variables.
const X_LOW: f64 = 0.0;
const X_HIGH: f64 = 10.0;

/// Above this, `ln(exp(y) + 1)` equals `y` to double precision.
const SOFTPLUS_LINEAR_CUTOFF: f64 = 35.0;

/// Largest Poisson rate accepted for noise.
const POISSON_MAX_RATE: f64 = 1e15;

/// Parameters for `generate_random_phenotype`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhenotypeConfig {
    pub num_samples: usize,
    pub num_independent_vars: usize,
    /// Per-variable weights. Drawn from Poisson(1) when absent.
    pub weights: Option<Vec<f64>>,
    /// Additive bias. Drawn from Poisson(1) when absent.
    pub bias: Option<f64>,
    pub noise_level: f64,
    pub noise_type: NoiseType,
    pub random_seed: u64,
}

impl Default for PhenotypeConfig {
    fn default() -> Self {
        Self {
            num_samples: 100,
            num_independent_vars: 2,
            weights: None,
            bias: None,
            noise_level: 0.1,
            noise_type: NoiseType::Gaussian,
            random_seed: 42,
        }
    }
}

/// Generated design matrix and phenotype, plus the weights/bias actually used.
#[derive(Debug, Clone, PartialEq)]
pub struct PhenotypeData {
    /// `num_samples x num_independent_vars`.
    pub x: DMatrix<f64>,
    pub y: Vec<f64>,
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl PhenotypeData {
    /// Copy out column `j` of the design matrix.
    pub fn column(&self, j: usize) -> Option<Vec<f64>> {
        (j < self.x.ncols()).then(|| self.x.column(j).iter().copied().collect())
    }

    /// All design columns in order.
    pub fn columns(&self) -> Vec<Vec<f64>> {
        (0..self.x.ncols())
            .map(|j| self.x.column(j).iter().copied().collect())
            .collect()
    }
}

pub fn generate_random_phenotype(config: &PhenotypeConfig) -> Result<PhenotypeData, AppError> {
    validate(config)?;

    let n = config.num_samples;
    let p = config.num_independent_vars;
    let mut rng = StdRng::seed_from_u64(config.random_seed);

    // Row-major fill so row i is drawn before row i+1.
    let x_dist = Uniform::new(X_LOW, X_HIGH);
    let raw: Vec<f64> = (0..n * p).map(|_| x_dist.sample(&mut rng)).collect();
    let x = DMatrix::from_row_slice(n, p, &raw);

    // Absent weights consume p + 1 Poisson draws; the extra one is discarded but
    // keeps the stream position of the bias draw.
    let weights = match &config.weights {
        Some(w) => w.clone(),
        None => {
            let unit = poisson(1.0)?;
            let mut drawn: Vec<f64> = (0..=p).map(|_| unit.sample(&mut rng)).collect();
            drawn.truncate(p);
            drawn
        }
    };
    log::info!("Using weights: {weights:?}");

    let mut y: Vec<f64> = x
        .row_iter()
        .map(|row| row.iter().zip(&weights).map(|(a, w)| a * w).sum())
        .collect();

    let bias = match config.bias {
        Some(b) => b,
        None => poisson(1.0)?.sample(&mut rng),
    };
    log::info!("Using bias: {bias}");
    for v in &mut y {
        *v += bias;
    }

    apply_noise(&mut y, config.noise_type, config.noise_level, &mut rng)?;

    Ok(PhenotypeData { x, y, weights, bias })
}

fn validate(config: &PhenotypeConfig) -> Result<(), AppError> {
    if !(config.noise_level.is_finite() && config.noise_level >= 0.0) {
        return Err(AppError::config(format!(
            "noise_level must be finite and >= 0, got {}.",
            config.noise_level
        )));
    }
    if let Some(w) = &config.weights {
        if w.len() != config.num_independent_vars {
            return Err(AppError::config(format!(
                "Length of weights ({}) must match num_independent_vars ({}).",
                w.len(),
                config.num_independent_vars
            )));
        }
        if w.iter().any(|v| !v.is_finite()) {
            return Err(AppError::config("Weights must be finite."));
        }
    }
    if let Some(b) = config.bias {
        if !b.is_finite() {
            return Err(AppError::config("Bias must be finite."));
        }
    }
    Ok(())
}

fn apply_noise(y: &mut [f64], kind: NoiseType, level: f64, rng: &mut StdRng) -> Result<(), AppError> {
    match kind {
        NoiseType::Gaussian => {
            let noise = Normal::new(0.0, level)
                .map_err(|e| AppError::config(format!("Noise distribution error: {e}")))?;
            for v in y.iter_mut() {
                *v += noise.sample(rng);
            }
        }
        NoiseType::Poisson => {
            if let Some(bad) = y.iter().find(|v| {
                let rate = softplus(**v);
                rate.is_nan() || rate > POISSON_MAX_RATE
            }) {
                return Err(AppError::config(format!(
                    "Phenotype value {bad} gives a Poisson rate that is NaN or above {POISSON_MAX_RATE:e}."
                )));
            }
            for v in y.iter_mut() {
                let lambda = softplus(*v);
                // softplus underflows to zero for very negative inputs.
                *v = if lambda > 0.0 { poisson(lambda)?.sample(rng) } else { 0.0 };
            }
        }
        NoiseType::Exponential => {
            if level > 0.0 {
                let noise = Exp::new(1.0 / level)
                    .map_err(|e| AppError::config(format!("Noise distribution error: {e}")))?;
                for v in y.iter_mut() {
                    *v += noise.sample(rng);
                }
            }
        }
        NoiseType::Uniform => {
            if level > 0.0 {
                let noise = Uniform::new(-level, level);
                for v in y.iter_mut() {
                    *v *= noise.sample(rng);
                }
            } else {
                y.iter_mut().for_each(|v| *v = 0.0);
            }
        }
    }
    Ok(())
}

fn poisson(lambda: f64) -> Result<Poisson<f64>, AppError> {
    Poisson::new(lambda).map_err(|e| AppError::config(format!("Poisson rate {lambda} rejected: {e}")))
}

/// `ln(exp(x) + 1)`, stable for large positive `x`.
fn softplus(x: f64) -> f64 {
    if x > SOFTPLUS_LINEAR_CUTOFF {
        x
    } else {
        x.exp().ln_1p()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn same_seed_is_bit_identical() {
        let config = PhenotypeConfig {
            num_samples: 100,
            num_independent_vars: 2,
            random_seed: 42,
            ..PhenotypeConfig::default()
        };
        let a = generate_random_phenotype(&config).unwrap();
        let b = generate_random_phenotype(&config).unwrap();

        assert_eq!(a.x.shape(), (100, 2));
        assert_eq!(a.y.len(), 100);
        let bits = |v: &[f64]| v.iter().map(|f| f.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(a.x.as_slice()), bits(b.x.as_slice()));
        assert_eq!(bits(&a.y), bits(&b.y));
    }

    #[test]
    fn different_seeds_differ() {
        let a = generate_random_phenotype(&PhenotypeConfig::default()).unwrap();
        let b = generate_random_phenotype(&PhenotypeConfig {
            random_seed: 7,
            ..PhenotypeConfig::default()
        })
        .unwrap();
        assert_ne!(a.x, b.x);
    }

    #[test]
    fn x_is_within_uniform_bounds() {
        let data = generate_random_phenotype(&PhenotypeConfig::default()).unwrap();
        assert!(data.x.iter().all(|v| (X_LOW..X_HIGH).contains(v)));
    }

    #[test]
    fn explicit_weights_and_bias_without_noise_are_exact() {
        let config = PhenotypeConfig {
            num_samples: 20,
            num_independent_vars: 2,
            weights: Some(vec![2.0, -1.0]),
            bias: Some(3.0),
            noise_level: 0.0,
            noise_type: NoiseType::Exponential,
            random_seed: 1,
        };
        let data = generate_random_phenotype(&config).unwrap();
        for (i, y) in data.y.iter().enumerate() {
            let expected = 2.0 * data.x[(i, 0)] - data.x[(i, 1)] + 3.0;
            assert_abs_diff_eq!(*y, expected, epsilon = 1e-12);
        }
        assert_eq!(data.weights, vec![2.0, -1.0]);
        assert_eq!(data.bias, 3.0);
    }

    #[test]
    fn weights_length_mismatch_is_config_error() {
        let config = PhenotypeConfig {
            weights: Some(vec![1.0]),
            ..PhenotypeConfig::default()
        };
        let err = generate_random_phenotype(&config).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }

    #[test]
    fn negative_noise_level_is_rejected() {
        let config = PhenotypeConfig {
            noise_level: -0.5,
            ..PhenotypeConfig::default()
        };
        assert!(generate_random_phenotype(&config).is_err());
    }

    #[test]
    fn poisson_noise_yields_non_negative_integers() {
        let config = PhenotypeConfig {
            noise_type: NoiseType::Poisson,
            ..PhenotypeConfig::default()
        };
        let data = generate_random_phenotype(&config).unwrap();
        assert!(data.y.iter().all(|v| *v >= 0.0 && v.fract() == 0.0));
    }

    #[test]
    fn overflowing_poisson_rate_is_config_error() {
        let config = PhenotypeConfig {
            num_samples: 3,
            weights: Some(vec![1e308, 1e308]),
            noise_type: NoiseType::Poisson,
            ..PhenotypeConfig::default()
        };
        let err = generate_random_phenotype(&config).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Config);
    }

    #[test]
    fn exponential_noise_shifts_up_by_scale() {
        let config = PhenotypeConfig {
            num_samples: 5000,
            weights: Some(vec![1.0, -2.0]),
            bias: Some(1.0),
            noise_level: 2.0,
            noise_type: NoiseType::Exponential,
            ..PhenotypeConfig::default()
        };
        let data = generate_random_phenotype(&config).unwrap();
        let shifts: Vec<f64> = data
            .y
            .iter()
            .enumerate()
            .map(|(i, y)| y - (data.x[(i, 0)] - 2.0 * data.x[(i, 1)] + 1.0))
            .collect();
        assert!(shifts.iter().all(|d| *d >= -1e-12));
        let mean = shifts.iter().sum::<f64>() / shifts.len() as f64;
        assert_abs_diff_eq!(mean, 2.0, epsilon = 0.15);
    }

    #[test]
    fn drawn_weights_match_variable_count() {
        let data = generate_random_phenotype(&PhenotypeConfig {
            num_independent_vars: 3,
            ..PhenotypeConfig::default()
        })
        .unwrap();
        assert_eq!(data.weights.len(), 3);
        assert!(data.weights.iter().all(|w| *w >= 0.0 && w.fract() == 0.0));
    }

    #[test]
    fn uniform_noise_scales_within_level() {
        let config = PhenotypeConfig {
            weights: Some(vec![1.0, 1.0]),
            bias: Some(0.0),
            noise_level: 0.5,
            noise_type: NoiseType::Uniform,
            ..PhenotypeConfig::default()
        };
        let data = generate_random_phenotype(&config).unwrap();
        for (i, y) in data.y.iter().enumerate() {
            let clean = data.x[(i, 0)] + data.x[(i, 1)];
            assert!(y.abs() <= 0.5 * clean + 1e-12);
        }
    }

    #[test]
    fn softplus_is_positive_and_linear_for_large_inputs() {
        assert!(softplus(-50.0) > 0.0);
        assert_abs_diff_eq!(softplus(0.0), 2f64.ln(), epsilon = 1e-12);
        assert_eq!(softplus(100.0), 100.0);
    }
}
