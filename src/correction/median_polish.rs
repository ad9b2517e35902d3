//! Tukey median polish and the B-score family built on its residuals.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{HtsError, Result};
use crate::model::matrix::WellMatrix;
use crate::stats::{self, MAD_SCALE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Estimator {
    #[default]
    Median,
    Mean,
}

impl Estimator {
    fn center(&self, values: &[f64]) -> f64 {
        let v = match self {
            Estimator::Median => stats::nan_median(values),
            Estimator::Mean => stats::nan_mean(values),
        };
        if v.is_nan() { 0.0 } else { v }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MedianPolishConfig {
    pub max_iterations: usize,
    /// Relative change in the sum of absolute residuals below which the
    /// sweeps stop.
    pub epsilon: f64,
    pub estimator: Estimator,
}

impl Default for MedianPolishConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            epsilon: 0.01,
            estimator: Estimator::Median,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MedianPolishFit {
    pub grand_effect: f64,
    pub row_effects: Vec<f64>,
    pub col_effects: Vec<f64>,
    /// Data minus the additive fit; empty wells are 0.
    pub residuals: WellMatrix,
    pub iterations: usize,
}

pub fn median_polish(matrix: &WellMatrix, config: &MedianPolishConfig) -> Result<MedianPolishFit> {
    let fit = polish(matrix, config)?;
    Ok(MedianPolishFit {
        grand_effect: fit.grand,
        row_effects: fit.rows,
        col_effects: fit.cols,
        residuals: WellMatrix::from_missing(matrix.format(), fit.residuals)?,
        iterations: fit.iterations,
    })
}

/// Median polish residuals scaled by their MAD.
pub fn b_score(matrix: &WellMatrix, config: &MedianPolishConfig) -> Result<WellMatrix> {
    let scores = b_score_raw(matrix, config)?;
    WellMatrix::from_missing(matrix.format(), scores)
}

/// Z-scored B-score.
pub fn bz_score(matrix: &WellMatrix, config: &MedianPolishConfig) -> Result<WellMatrix> {
    let scores = b_score_raw(matrix, config)?;
    let flat: Vec<f64> = scores.iter().copied().collect();
    let z = stats::nan_zscore(&flat, 0);
    let z = Array2::from_shape_vec(scores.dim(), z)
        .map_err(|_| HtsError::shape(matrix.shape(), scores.dim()))?;
    WellMatrix::from_missing(matrix.format(), z)
}

fn b_score_raw(matrix: &WellMatrix, config: &MedianPolishConfig) -> Result<Array2<f64>> {
    let fit = polish(matrix, config)?;
    let present: Vec<f64> = stats::finite(&fit.residuals.iter().copied().collect::<Vec<_>>());
    let scale = stats::mad(&present) * MAD_SCALE;
    if !(scale > 0.0) {
        return Err(HtsError::numerical("median polish residuals have zero MAD"));
    }
    Ok(fit.residuals.mapv(|v| v / scale))
}

struct PolishState {
    grand: f64,
    rows: Vec<f64>,
    cols: Vec<f64>,
    residuals: Array2<f64>,
    iterations: usize,
}

fn polish(matrix: &WellMatrix, config: &MedianPolishConfig) -> Result<PolishState> {
    if config.max_iterations == 0 {
        return Err(HtsError::configuration("median polish needs at least one iteration"));
    }
    let mut z = matrix.zeros_as_missing();
    if z.iter().all(|v| v.is_nan()) {
        return Err(HtsError::numerical("median polish on an empty plate"));
    }
    let (n_rows, n_cols) = z.dim();
    let est = config.estimator;

    let mut grand = 0f64;
    let mut rows = vec![0f64; n_rows];
    let mut cols = vec![0f64; n_cols];
    let mut old_sum = 0f64;
    let mut iterations = 0;

    for _ in 0..config.max_iterations {
        iterations += 1;

        for (i, mut row) in z.rows_mut().into_iter().enumerate() {
            let values: Vec<f64> = row.iter().copied().collect();
            let delta = est.center(&values);
            row.mapv_inplace(|v| v - delta);
            rows[i] += delta;
        }
        let delta = est.center(&cols);
        cols.iter_mut().for_each(|c| *c -= delta);
        grand += delta;

        for (j, mut col) in z.columns_mut().into_iter().enumerate() {
            let values: Vec<f64> = col.iter().copied().collect();
            let delta = est.center(&values);
            col.mapv_inplace(|v| v - delta);
            cols[j] += delta;
        }
        let delta = est.center(&rows);
        rows.iter_mut().for_each(|r| *r -= delta);
        grand += delta;

        let new_sum: f64 = z.iter().filter(|v| !v.is_nan()).map(|v| v.abs()).sum();
        if new_sum == 0.0 || (new_sum - old_sum).abs() < config.epsilon * new_sum {
            break;
        }
        old_sum = new_sum;
    }

    Ok(PolishState {
        grand,
        rows,
        cols,
        residuals: z,
        iterations,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/correction/median_polish.rs"]
mod tests;
