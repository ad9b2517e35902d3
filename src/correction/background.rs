//! Background surface subtraction and per-column well correction.

use ndarray::Array2;

use crate::error::{HtsError, Result};
use crate::model::matrix::WellMatrix;
use crate::model::normalize::log2_values;
use crate::stats;

/// Per-well mean over a set of plates, used as the shared background.
pub fn estimate_background(matrices: &[&WellMatrix]) -> Result<WellMatrix> {
    let Some(first) = matrices.first() else {
        return Err(HtsError::configuration(
            "background estimation needs at least one matrix",
        ));
    };
    let mut acc = Array2::<f64>::zeros(first.shape());
    for m in matrices {
        first.check_same_shape(m)?;
        acc += m.values();
    }
    acc /= matrices.len() as f64;
    WellMatrix::from_array(first.format(), acc)
}

pub fn subtract_background(matrix: &WellMatrix, background: &WellMatrix) -> Result<WellMatrix> {
    matrix.check_same_shape(background)?;
    WellMatrix::from_array(matrix.format(), matrix.values() - background.values())
}

/// Log2 followed by a z-score, applied to a raw feature column.
pub fn well_correction(values: &[f64]) -> Result<Vec<f64>> {
    let logged = log2_values(values)?;
    let sd = stats::std_dev(&logged, 0);
    if !(sd > 0.0) {
        return Err(HtsError::numerical("well correction on a constant column"));
    }
    Ok(stats::nan_zscore(&logged, 0))
}

#[cfg(test)]
#[path = "../../tests/src_inline/correction/background.rs"]
mod tests;
