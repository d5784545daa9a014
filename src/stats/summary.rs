//! Boxplot statistics.

use serde::{Deserialize, Serialize};

/// Whisker reach in multiples of the interquartile range.
const WHISKER_IQR: f64 = 1.5;

/// Five-number style summary used to draw one box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Most extreme observation within `q1 - 1.5 IQR`.
    pub whisker_low: f64,
    /// Most extreme observation within `q3 + 1.5 IQR`.
    pub whisker_high: f64,
    /// Observations beyond the whiskers.
    pub fliers: Vec<f64>,
}

impl BoxStats {
    /// Compute box statistics; `None` for empty or non-finite data.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile_sorted(&sorted, 0.25);
        let median = quantile_sorted(&sorted, 0.5);
        let q3 = quantile_sorted(&sorted, 0.75);
        let iqr = q3 - q1;
        let lo_fence = q1 - WHISKER_IQR * iqr;
        let hi_fence = q3 + WHISKER_IQR * iqr;

        let whisker_low = sorted.iter().copied().find(|v| *v >= lo_fence).unwrap_or(q1);
        let whisker_high = sorted.iter().rev().copied().find(|v| *v <= hi_fence).unwrap_or(q3);
        let fliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < whisker_low || *v > whisker_high)
            .collect();

        Some(Self {
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            fliers,
        })
    }

    /// Lowest and highest drawn value (whiskers and fliers).
    pub fn extent(&self) -> (f64, f64) {
        let lo = self.fliers.iter().copied().fold(self.whisker_low, f64::min);
        let hi = self.fliers.iter().copied().fold(self.whisker_high, f64::max);
        (lo, hi)
    }
}

/// Quantile of pre-sorted data with linear interpolation between order statistics.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            let frac = pos - lo as f64;
            sorted[lo] + frac * (sorted[hi] - sorted[lo])
        }
    }
}
