//! Descriptive statistics shared by correction and scoring.
//!
//! Functions with a `nan_` prefix skip NaN entries; the others expect clean
//! input. Empty input yields NaN rather than a zero sentinel.

use std::cmp::Ordering;

/// Scale factor turning a MAD into a consistent estimator of sigma.
pub const MAD_SCALE: f64 = 1.4826;

pub fn sum(values: &[f64]) -> f64 {
    let mut total = 0f64;
    for &v in values {
        total += v;
    }
    total
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    sum(values) / values.len() as f64
}

/// Variance with `ddof` delta degrees of freedom (0 = population, 1 = sample).
pub fn variance(values: &[f64], ddof: usize) -> f64 {
    let n = values.len();
    if n <= ddof {
        return f64::NAN;
    }
    let m = mean(values);
    let mut ss = 0f64;
    for &v in values {
        let d = v - m;
        ss += d * d;
    }
    ss / (n - ddof) as f64
}

pub fn std_dev(values: &[f64], ddof: usize) -> f64 {
    variance(values, ddof).sqrt()
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    out
}

pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let s = sorted(values);
    let n = s.len();
    if n % 2 == 1 {
        s[n / 2]
    } else {
        0.5 * (s[n / 2 - 1] + s[n / 2])
    }
}

/// Percentile in [0, 100] with linear interpolation between closest ranks.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let s = sorted(values);
    let p = p.clamp(0.0, 100.0);
    let rank = p / 100.0 * (s.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    s[lo] + (s[hi] - s[lo]) * frac
}

/// Median absolute deviation, unscaled.
pub fn mad(values: &[f64]) -> f64 {
    let m = median(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - m).abs()).collect();
    median(&deviations)
}

pub fn finite(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| !v.is_nan()).collect()
}

pub fn nan_mean(values: &[f64]) -> f64 {
    mean(&finite(values))
}

pub fn nan_median(values: &[f64]) -> f64 {
    median(&finite(values))
}

pub fn nan_std_dev(values: &[f64], ddof: usize) -> f64 {
    std_dev(&finite(values), ddof)
}

/// Z-scores ignoring NaN entries, which stay NaN. A constant input maps to
/// all zeros.
pub fn nan_zscore(values: &[f64], ddof: usize) -> Vec<f64> {
    let clean = finite(values);
    let m = mean(&clean);
    let sd = std_dev(&clean, ddof);
    values
        .iter()
        .map(|&v| {
            if v.is_nan() {
                f64::NAN
            } else if sd > 0.0 && sd.is_finite() {
                (v - m) / sd
            } else {
                0.0
            }
        })
        .collect()
}
