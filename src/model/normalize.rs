//! Non-spatial transforms of a raw feature column.

use serde::{Deserialize, Serialize};

use crate::error::{HtsError, Result};
use crate::stats::{self, MAD_SCALE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizationMethod {
    ZScore,
    RobustZScore,
    PercentOfSample,
    RobustPercentOfSample,
    PercentOfControl,
    NormalizedPercentInhibition,
}

pub fn normalize_values(
    values: &[f64],
    method: NormalizationMethod,
    log2: bool,
    negative: &[bool],
    positive: &[bool],
) -> Result<Vec<f64>> {
    let data = if log2 { log2_values(values)? } else { values.to_vec() };

    let select = |mask: &[bool]| -> Vec<f64> {
        data.iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(&v, _)| v)
            .collect()
    };

    let out = match method {
        NormalizationMethod::ZScore => {
            let m = stats::mean(&data);
            let sd = nonzero(stats::std_dev(&data, 0), "standard deviation")?;
            data.iter().map(|v| (v - m) / sd).collect()
        }
        NormalizationMethod::RobustZScore => {
            let m = stats::median(&data);
            let mad = nonzero(stats::mad(&data) * MAD_SCALE, "MAD")?;
            data.iter().map(|v| (v - m) / mad).collect()
        }
        NormalizationMethod::PercentOfSample => {
            let m = nonzero(stats::mean(&data), "sample mean")?;
            data.iter().map(|v| v / m * 100.0).collect()
        }
        NormalizationMethod::RobustPercentOfSample => {
            let m = nonzero(stats::median(&data), "sample median")?;
            data.iter().map(|v| v / m * 100.0).collect()
        }
        NormalizationMethod::PercentOfControl => {
            let neg = select(negative);
            if neg.is_empty() {
                return Err(HtsError::configuration(
                    "percent of control needs negative control rows",
                ));
            }
            let m = nonzero(stats::mean(&neg), "negative control mean")?;
            data.iter().map(|v| v / m * 100.0).collect()
        }
        NormalizationMethod::NormalizedPercentInhibition => {
            let neg = select(negative);
            let pos = select(positive);
            if neg.is_empty() || pos.is_empty() {
                return Err(HtsError::configuration(
                    "normalized percent inhibition needs negative and positive control rows",
                ));
            }
            let mn = stats::mean(&neg);
            let mp = stats::mean(&pos);
            let span = nonzero(mp - mn, "control separation")?;
            data.iter().map(|v| (v - mn) / span * 100.0).collect()
        }
    };
    Ok(out)
}

pub fn log2_values(values: &[f64]) -> Result<Vec<f64>> {
    if let Some(bad) = values.iter().find(|&&v| v <= 0.0 || v.is_nan()) {
        return Err(HtsError::numerical(format!(
            "log2 of non-positive value {bad}"
        )));
    }
    Ok(values.iter().map(|v| v.log2()).collect())
}

fn nonzero(value: f64, what: &str) -> Result<f64> {
    if value == 0.0 || !value.is_finite() {
        return Err(HtsError::numerical(format!("{what} is {value}")));
    }
    Ok(value)
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/normalize.rs"]
mod tests;
