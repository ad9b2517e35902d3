use serde::{Deserialize, Serialize};

use crate::error::{HtsError, Result};
use crate::model::matrix::WellMatrix;
use crate::model::plate::Plate;
use crate::model::replicat::SummaryMethod;
use crate::score::tstat::{paired_residuals, pooled_control, well_values};
use crate::score::{check_control_sample, corrected_matrices, score_matrix};
use crate::stats::{self, MAD_SCALE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SsmdVariant {
    /// `(mean_w - mean_c) / sqrt(var_w + var_c)`.
    #[default]
    UnpairedMean,
    /// Medians and MAD-based spreads in place of means and variances.
    UnpairedRobust,
    /// Mean over SD of the per-replicate differences to the control median.
    Paired,
}

/// Strictly standardized mean difference of each well against the negative
/// control.
pub fn ssmd(
    plate: &Plate,
    feature: &str,
    method: SummaryMethod,
    variant: SsmdVariant,
) -> Result<WellMatrix> {
    let matrices = corrected_matrices(plate, feature, method)?;
    let negative = plate.negative_positions()?;
    let format = plate.format();
    let name = plate.name();
    let control = pooled_control(&matrices, &negative);
    check_control_sample(&control, name)?;

    match variant {
        SsmdVariant::UnpairedMean => {
            let (mean_c, var_c) = (stats::mean(&control), stats::variance(&control, 1));
            Ok(score_matrix(format, "ssmd", name, |pos| {
                let well = well_values(&matrices, pos);
                let denom = (stats::variance(&well, 1) + var_c).sqrt();
                if !(denom > 0.0) {
                    return f64::NAN;
                }
                (stats::mean(&well) - mean_c) / denom
            }))
        }
        SsmdVariant::UnpairedRobust => {
            let spread_c = MAD_SCALE * stats::mad(&control);
            if !(spread_c > 0.0) {
                return Err(HtsError::numerical(format!(
                    "plate {name}: negative control has zero MAD"
                )));
            }
            let median_c = stats::median(&control);
            Ok(score_matrix(format, "robust ssmd", name, |pos| {
                let well = well_values(&matrices, pos);
                let spread_w = MAD_SCALE * stats::mad(&well);
                (stats::median(&well) - median_c) / (spread_w.powi(2) + spread_c.powi(2)).sqrt()
            }))
        }
        SsmdVariant::Paired => {
            let residuals = paired_residuals(&matrices, &negative);
            Ok(score_matrix(format, "paired ssmd", name, |pos| {
                let diffs: Vec<f64> = residuals.iter().map(|m| m.get(pos)).collect();
                let sd = stats::std_dev(&diffs, 1);
                if !(sd > 0.0) {
                    return f64::NAN;
                }
                stats::mean(&diffs) / sd
            }))
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/score/ssmd.rs"]
mod tests;
