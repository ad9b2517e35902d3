//! Per-well statistics against the negative control.
//!
//! Scores are read from spatially corrected summaries. Zero is a legitimate
//! value here (an empty well has a count of 0), unlike in the correction
//! engine. A well whose own statistic is undefined is NaN in the returned
//! matrix; plate-level degeneracies are errors.

use crate::error::{HtsError, Result};
use crate::model::matrix::WellMatrix;
use crate::model::plate::Plate;
use crate::model::replicat::SummaryMethod;
use crate::stats;
use crate::well::{PlateFormat, WellPos};

pub mod cells;
pub mod quality;
pub mod ssmd;
pub mod tstat;

pub use cells::{
    Direction, PositiveCellConfig, cell_count_stats, percent_positive, percent_positive_stats,
    viability_toxicity,
};
pub use quality::{PlateQuality, plate_quality, z_prime_factor};
pub use ssmd::{SsmdVariant, ssmd};
pub use tstat::{TStatVariant, pooled_t, t_statistic, welch_t};

/// Mean and population SD of a per-well quantity across replicates.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicateStats {
    pub mean: WellMatrix,
    pub sd: WellMatrix,
}

pub fn across_replicates(matrices: &[WellMatrix]) -> Result<ReplicateStats> {
    let Some(first) = matrices.first() else {
        return Err(HtsError::configuration("no replicates to aggregate"));
    };
    for m in &matrices[1..] {
        first.check_same_shape(m)?;
    }
    let format = first.format();
    let per_well = |pos: WellPos| matrices.iter().map(|m| m.get(pos)).collect::<Vec<f64>>();
    Ok(ReplicateStats {
        mean: WellMatrix::from_fn(format, |pos| stats::mean(&per_well(pos))),
        sd: WellMatrix::from_fn(format, |pos| stats::std_dev(&per_well(pos), 0)),
    })
}

/// Corrected matrices of every replicat; needs at least two replicats.
pub(crate) fn corrected_matrices<'a>(
    plate: &'a Plate,
    feature: &str,
    method: SummaryMethod,
) -> Result<Vec<&'a WellMatrix>> {
    if plate.n_replicats() < 2 {
        return Err(HtsError::configuration(format!(
            "plate {}: scoring needs at least 2 replicates, got {}",
            plate.name(),
            plate.n_replicats()
        )));
    }
    plate
        .replicats()
        .map(|r| r.corrected(feature, method))
        .collect()
}

/// Checks that a pooled control sample can serve as a reference.
pub(crate) fn check_control_sample(values: &[f64], plate: &str) -> Result<()> {
    if values.len() < 2 {
        return Err(HtsError::numerical(format!(
            "plate {plate}: negative control has {} values, need at least 2",
            values.len()
        )));
    }
    if !(stats::variance(values, 1) > 0.0) {
        return Err(HtsError::numerical(format!(
            "plate {plate}: negative control has zero variance"
        )));
    }
    Ok(())
}

/// Builds a score matrix from a per-well function, logging undefined wells.
pub(crate) fn score_matrix(
    format: PlateFormat,
    what: &str,
    plate: &str,
    f: impl Fn(WellPos) -> f64,
) -> WellMatrix {
    let matrix = WellMatrix::from_fn(format, f);
    let undefined = matrix.values().iter().filter(|v| !v.is_finite()).count();
    if undefined > 0 {
        tracing::warn!(plate, what, undefined, "score undefined for some wells");
    }
    matrix
}

#[cfg(test)]
#[path = "../../tests/src_inline/score/mod.rs"]
mod tests;
