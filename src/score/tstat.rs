use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::matrix::WellMatrix;
use crate::model::plate::Plate;
use crate::model::replicat::SummaryMethod;
use crate::score::{check_control_sample, corrected_matrices, score_matrix};
use crate::stats;
use crate::well::WellPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TStatVariant {
    #[default]
    UnpairedWelch,
    UnpairedEqualVariance,
    Paired,
}

/// Per-well t-statistic of the corrected `feature` summary against the
/// negative control; positive when the well is above the control.
pub fn t_statistic(
    plate: &Plate,
    feature: &str,
    method: SummaryMethod,
    variant: TStatVariant,
) -> Result<WellMatrix> {
    let matrices = corrected_matrices(plate, feature, method)?;
    let negative = plate.negative_positions()?;
    let format = plate.format();

    let control = pooled_control(&matrices, &negative);
    check_control_sample(&control, plate.name())?;

    match variant {
        TStatVariant::UnpairedWelch | TStatVariant::UnpairedEqualVariance => {
            let t = |a: &[f64], b: &[f64]| match variant {
                TStatVariant::UnpairedWelch => welch_t(a, b),
                _ => pooled_t(a, b),
            };
            Ok(score_matrix(format, "t-statistic", plate.name(), |pos| {
                let well = well_values(&matrices, pos);
                t(&well, &control)
            }))
        }
        TStatVariant::Paired => {
            let residuals = paired_residuals(&matrices, &negative);
            Ok(score_matrix(format, "paired t-statistic", plate.name(), |pos| {
                let diffs: Vec<f64> = residuals.iter().map(|m| m.get(pos)).collect();
                let sd = stats::std_dev(&diffs, 1);
                if !(sd > 0.0) {
                    return f64::NAN;
                }
                stats::mean(&diffs) / (sd / (diffs.len() as f64).sqrt())
            }))
        }
    }
}

/// Welch's unequal-variance t of `a` against `b`.
pub fn welch_t(a: &[f64], b: &[f64]) -> f64 {
    let se = (stats::variance(a, 1) / a.len() as f64 + stats::variance(b, 1) / b.len() as f64).sqrt();
    if !(se > 0.0) {
        return f64::NAN;
    }
    (stats::mean(a) - stats::mean(b)) / se
}

/// Student's t with pooled (equal) variance.
pub fn pooled_t(a: &[f64], b: &[f64]) -> f64 {
    let (na, nb) = (a.len() as f64, b.len() as f64);
    if na + nb <= 2.0 {
        return f64::NAN;
    }
    let pooled = ((na - 1.0) * stats::variance(a, 1) + (nb - 1.0) * stats::variance(b, 1))
        / (na + nb - 2.0);
    let se = (pooled * (1.0 / na + 1.0 / nb)).sqrt();
    if !(se > 0.0) {
        return f64::NAN;
    }
    (stats::mean(a) - stats::mean(b)) / se
}

pub(crate) fn pooled_control(matrices: &[&WellMatrix], negative: &[WellPos]) -> Vec<f64> {
    matrices.iter().flat_map(|m| m.gather(negative)).collect()
}

pub(crate) fn well_values(matrices: &[&WellMatrix], pos: WellPos) -> Vec<f64> {
    matrices.iter().map(|m| m.get(pos)).collect()
}

/// Each replicate minus the median of its own negative-control wells.
pub(crate) fn paired_residuals(matrices: &[&WellMatrix], negative: &[WellPos]) -> Vec<WellMatrix> {
    matrices
        .iter()
        .map(|m| {
            let reference = stats::median(&m.gather(negative));
            m.map(|v| v - reference)
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/score/tstat.rs"]
mod tests;
