//! Two-sample location tests.
//!
//! All tests are two-sided and report the statistic for the *first* sample:
//!
//! - rank-sum: `z` of the first sample's rank sum under the normal approximation
//! - t-test: pooled-variance Student `t`
//! - Mann-Whitney: `U` of the first sample, exact for small tie-free samples,
//!   otherwise normal approximation with tie and continuity corrections
//!
//! Degenerate inputs (too few observations, zero variance) yield NaN outcomes
//! rather than errors, so one bad variable never aborts a multi-panel figure.

use statrs::distribution::{ContinuousCDF, Normal, StudentsT};

use crate::domain::{StatTest, TestOutcome};
use crate::error::AppError;

/// Largest smaller-sample size for which the exact U distribution is used.
const EXACT_U_MAX_SIZE: usize = 8;

/// Run `test` on the two samples.
pub fn run_test(test: StatTest, a: &[f64], b: &[f64]) -> Result<TestOutcome, AppError> {
    match test {
        StatTest::RankSums => rank_sums(a, b),
        StatTest::TTest => ttest_ind(a, b),
        StatTest::MannWhitneyU => mann_whitney_u(a, b),
    }
}

pub fn rank_sums(a: &[f64], b: &[f64]) -> Result<TestOutcome, AppError> {
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    if a.is_empty() || b.is_empty() {
        return Ok(nan_outcome());
    }
    let ranks = rank_average(&concat(a, b));
    let s: f64 = ranks[..a.len()].iter().sum();
    let expected = n1 * (n1 + n2 + 1.0) / 2.0;
    let z = (s - expected) / (n1 * n2 * (n1 + n2 + 1.0) / 12.0).sqrt();
    let pvalue = 2.0 * standard_normal()?.sf(z.abs());
    Ok(TestOutcome { statistic: z, pvalue })
}

pub fn ttest_ind(a: &[f64], b: &[f64]) -> Result<TestOutcome, AppError> {
    let (n1, n2) = (a.len(), b.len());
    if n1 == 0 || n2 == 0 || n1 + n2 <= 2 {
        return Ok(nan_outcome());
    }
    let (m1, v1) = mean_var(a);
    let (m2, v2) = mean_var(b);
    let df = (n1 + n2 - 2) as f64;
    let pooled = ((n1 as f64 - 1.0) * v1 + (n2 as f64 - 1.0) * v2) / df;
    let se = (pooled * (1.0 / n1 as f64 + 1.0 / n2 as f64)).sqrt();
    if !(se.is_finite() && se > 0.0) {
        return Ok(nan_outcome());
    }
    let t = (m1 - m2) / se;
    let dist = StudentsT::new(0.0, 1.0, df)
        .map_err(|e| AppError::model(format!("Student t distribution error: {e}")))?;
    let pvalue = (2.0 * dist.sf(t.abs())).min(1.0);
    Ok(TestOutcome { statistic: t, pvalue })
}

pub fn mann_whitney_u(a: &[f64], b: &[f64]) -> Result<TestOutcome, AppError> {
    let (n1, n2) = (a.len(), b.len());
    if n1 == 0 || n2 == 0 {
        return Ok(nan_outcome());
    }
    let combined = concat(a, b);
    let ranks = rank_average(&combined);
    let r1: f64 = ranks[..n1].iter().sum();
    let (n1f, n2f) = (n1 as f64, n2 as f64);
    let u1 = r1 - n1f * (n1f + 1.0) / 2.0;
    let u2 = n1f * n2f - u1;
    let u_max = u1.max(u2);

    let ties = tie_counts(&combined);
    let has_ties = ties.iter().any(|&t| t > 1);

    let pvalue = if n1.min(n2) <= EXACT_U_MAX_SIZE && !has_ties {
        2.0 * exact_u_sf(n1, n2, u_max)
    } else {
        let n = n1f + n2f;
        let tie_term: f64 = ties.iter().map(|&t| (t as f64).powi(3) - t as f64).sum();
        let sigma = (n1f * n2f / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)))).sqrt();
        if !(sigma.is_finite() && sigma > 0.0) {
            return Ok(TestOutcome {
                statistic: u1,
                pvalue: f64::NAN,
            });
        }
        let mu = n1f * n2f / 2.0;
        let z = (u_max - mu - 0.5) / sigma;
        2.0 * standard_normal()?.sf(z)
    };

    Ok(TestOutcome {
        statistic: u1,
        pvalue: pvalue.min(1.0),
    })
}

/// `P(U >= u)` under the null for sample sizes `m`, `n` without ties.
///
/// The counts of U values are the coefficients of the Gaussian binomial
/// `[m+n choose m]_q = Π_{i=1..k} (1 - q^{j+i}) / (1 - q^i)`, with `k = min(m, n)`
/// and `j = max(m, n)`.
fn exact_u_sf(m: usize, n: usize, u: f64) -> f64 {
    let (k, j) = (m.min(n), m.max(n));
    let degree = k * j;
    let mut coeffs = vec![0.0f64; degree + 1];
    coeffs[0] = 1.0;

    for i in 1..=k {
        // Multiply by (1 - q^{j+i}), highest degree first so we read old values.
        let shift = j + i;
        for d in (shift..=degree).rev() {
            coeffs[d] -= coeffs[d - shift];
        }
        // Divide by (1 - q^i): running sum with stride i.
        for d in i..=degree {
            coeffs[d] += coeffs[d - i];
        }
    }

    let total: f64 = coeffs.iter().sum();
    let start = u.ceil().max(0.0) as usize;
    if start > degree {
        return 0.0;
    }
    coeffs[start..].iter().sum::<f64>() / total
}

/// Ranks starting at 1, ties receive the average of their positions.
pub fn rank_average(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&i, &j| values[i].total_cmp(&values[j]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // Positions start..end (0-based) share rank mean(start+1 ..= end).
        let avg = (start + 1 + end) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = avg;
        }
        start = end;
    }
    ranks
}

fn tie_counts(values: &[f64]) -> Vec<usize> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut counts = Vec::new();
    let mut i = 0;
    while i < sorted.len() {
        let mut j = i + 1;
        while j < sorted.len() && sorted[j] == sorted[i] {
            j += 1;
        }
        counts.push(j - i);
        i = j;
    }
    counts
}

/// Mean and unbiased (ddof = 1) variance. Variance is 0 for a single value.
fn mean_var(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var)
}

fn concat(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    out.extend_from_slice(a);
    out.extend_from_slice(b);
    out
}

fn standard_normal() -> Result<Normal, AppError> {
    Normal::new(0.0, 1.0).map_err(|e| AppError::model(format!("Normal distribution error: {e}")))
}

fn nan_outcome() -> TestOutcome {
    TestOutcome {
        statistic: f64::NAN,
        pvalue: f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn ranks_average_ties() {
        let r = rank_average(&[10.0, 20.0, 20.0, 5.0]);
        assert_eq!(r, vec![2.0, 3.5, 3.5, 1.0]);
    }

    #[test]
    fn rank_sums_separated_samples() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [6.0, 7.0, 8.0, 9.0, 10.0];
        let out = rank_sums(&a, &b).unwrap();
        // S = 15, E = 27.5, sd = sqrt(25 * 11 / 12)
        let expected_z = (15.0 - 27.5) / (25.0f64 * 11.0 / 12.0).sqrt();
        assert_abs_diff_eq!(out.statistic, expected_z, epsilon = 1e-12);
        assert!(out.pvalue < 0.01);
    }

    #[test]
    fn rank_sums_is_antisymmetric() {
        let a = [1.0, 4.0, 2.5, 7.0];
        let b = [3.0, 5.0, 6.0];
        let ab = rank_sums(&a, &b).unwrap();
        let ba = rank_sums(&b, &a).unwrap();
        assert_abs_diff_eq!(ab.statistic, -ba.statistic, epsilon = 1e-12);
        assert_abs_diff_eq!(ab.pvalue, ba.pvalue, epsilon = 1e-12);
    }

    #[test]
    fn ttest_known_value() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        let out = ttest_ind(&a, &b).unwrap();
        // Means 2 and 5, pooled variance 1, se = sqrt(2/3).
        let expected_t = -3.0 / (2.0f64 / 3.0).sqrt();
        assert_abs_diff_eq!(out.statistic, expected_t, epsilon = 1e-12);
        assert!(out.pvalue > 0.0 && out.pvalue < 0.05);
    }

    #[test]
    fn ttest_zero_variance_is_nan() {
        let out = ttest_ind(&[1.0, 1.0], &[1.0, 1.0]).unwrap();
        assert!(out.statistic.is_nan());
        assert!(out.pvalue.is_nan());
    }

    #[test]
    fn mann_whitney_exact_fully_separated() {
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        let out = mann_whitney_u(&a, &b).unwrap();
        assert_eq!(out.statistic, 0.0);
        // Only 1 of C(6,3) = 20 arrangements is as extreme on each side.
        assert_abs_diff_eq!(out.pvalue, 2.0 / 20.0, epsilon = 1e-12);
    }

    #[test]
    fn exact_distribution_sums_to_one() {
        assert_abs_diff_eq!(exact_u_sf(3, 5, 0.0), 1.0, epsilon = 1e-12);
        assert_eq!(exact_u_sf(3, 5, 16.0), 0.0);
        // Symmetric around m*n/2 = 8: P(U >= 9) == P(U <= 7).
        assert_abs_diff_eq!(exact_u_sf(4, 4, 9.0), 1.0 - exact_u_sf(4, 4, 8.0), epsilon = 1e-12);
    }

    #[test]
    fn mann_whitney_asymptotic_with_ties() {
        let a: Vec<f64> = (0..20).map(|i| (i % 5) as f64).collect();
        let b: Vec<f64> = (0..20).map(|i| (i % 5) as f64 + 2.0).collect();
        let out = mann_whitney_u(&a, &b).unwrap();
        assert!(out.statistic < 200.0);
        assert!(out.pvalue > 0.0 && out.pvalue < 0.01);
    }

    #[test]
    fn identical_samples_are_not_significant() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0];
        for test in [StatTest::RankSums, StatTest::MannWhitneyU, StatTest::TTest] {
            let out = run_test(test, &a, &a).unwrap();
            assert!(out.pvalue > 0.9, "{test:?} p = {}", out.pvalue);
        }
    }
}
