use serde::Serialize;

use crate::error::{HtsError, Result};
use crate::model::plate::Plate;
use crate::model::replicat::SummaryMethod;
use crate::stats;

/// Control separation of one replicat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlateQuality {
    pub replicat: String,
    pub z_prime: f64,
    pub ssmd: f64,
    /// Coefficient of variation of the negative control, in percent.
    pub cv_negative: f64,
}

/// `1 - 3 (sd_p + sd_n) / |m_p - m_n|` with population SDs.
pub fn z_prime_factor(negative: &[f64], positive: &[f64]) -> Result<f64> {
    if negative.is_empty() || positive.is_empty() {
        return Err(HtsError::numerical("Z'-factor needs values in both controls"));
    }
    let gap = (stats::mean(positive) - stats::mean(negative)).abs();
    if !(gap > 0.0) {
        return Err(HtsError::numerical("controls have equal means"));
    }
    Ok(1.0 - 3.0 * (stats::std_dev(positive, 0) + stats::std_dev(negative, 0)) / gap)
}

/// Quality per replicat, read from the corrected matrix when one exists and
/// from the summary otherwise. Needs a positive control.
pub fn plate_quality(plate: &Plate, feature: &str, method: SummaryMethod) -> Result<Vec<PlateQuality>> {
    let Some(positive) = plate.positive_positions()? else {
        return Err(HtsError::configuration(format!(
            "plate {}: quality metrics need a positive control",
            plate.name()
        )));
    };
    let negative = plate.negative_positions()?;

    plate
        .replicats()
        .map(|r| {
            let matrix = match r.corrected(feature, method) {
                Ok(m) => m,
                Err(_) => r.summary(feature, method)?,
            };
            let neg = matrix.gather(&negative);
            let pos = matrix.gather(&positive);
            let mean_n = stats::mean(&neg);
            let spread = (stats::variance(&neg, 1) + stats::variance(&pos, 1)).sqrt();
            Ok(PlateQuality {
                replicat: r.name().to_string(),
                z_prime: z_prime_factor(&neg, &pos)?,
                ssmd: (stats::mean(&pos) - mean_n) / spread,
                cv_negative: 100.0 * stats::std_dev(&neg, 0) / mean_n.abs(),
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/score/quality.rs"]
mod tests;
