use std::cmp::Ordering;

use crate::error::{HtsError, Result};
use crate::model::matrix::WellMatrix;

#[derive(Debug, Clone, PartialEq)]
pub struct QuantileNormalized {
    pub matrices: Vec<WellMatrix>,
    /// False when a single replicate was passed through untouched.
    pub applied: bool,
}

/// Gives every replicate the same value distribution: the k-th smallest
/// value of each replicate becomes the mean of all k-th smallest values.
pub fn quantile_normalize(matrices: &[&WellMatrix]) -> Result<QuantileNormalized> {
    let Some(first) = matrices.first() else {
        return Err(HtsError::configuration(
            "quantile normalization needs at least one replicate",
        ));
    };
    for m in &matrices[1..] {
        first.check_same_shape(m)?;
    }
    if matrices.len() == 1 {
        tracing::debug!("quantile normalization with a single replicate is a no-op");
        return Ok(QuantileNormalized {
            matrices: vec![(*first).clone()],
            applied: false,
        });
    }

    let n = first.format().n_wells();
    let columns: Vec<Vec<f64>> = matrices.iter().map(|m| m.to_vec()).collect();
    let orders: Vec<Vec<usize>> = columns.iter().map(|c| rank_order(c)).collect();

    let mut rank_means = vec![0f64; n];
    for (column, order) in columns.iter().zip(&orders) {
        for (rank, &idx) in order.iter().enumerate() {
            rank_means[rank] += column[idx];
        }
    }
    let k = matrices.len() as f64;
    rank_means.iter_mut().for_each(|v| *v /= k);

    let mut out = Vec::with_capacity(matrices.len());
    for (m, order) in matrices.iter().zip(&orders) {
        let mut values = vec![0f64; n];
        for (rank, &idx) in order.iter().enumerate() {
            values[idx] = rank_means[rank];
        }
        let format = m.format();
        let (rows, cols) = format.shape();
        let array = ndarray::Array2::from_shape_vec((rows, cols), values)
            .map_err(|_| HtsError::shape((rows, cols), m.shape()))?;
        out.push(WellMatrix::from_array(format, array)?);
    }
    Ok(QuantileNormalized {
        matrices: out,
        applied: true,
    })
}

/// Indices that sort `values` ascending; ties keep their original order.
fn rank_order(values: &[f64]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..values.len()).collect();
    idx.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));
    idx
}

#[cfg(test)]
#[path = "../../tests/src_inline/correction/quantile.rs"]
mod tests;
