use serde::{Deserialize, Serialize};

use crate::error::{HtsError, Result};
use crate::model::matrix::WellMatrix;
use crate::model::plate::Plate;
use crate::model::replicat::Replicat;
use crate::model::table::DataKind;
use crate::score::{ReplicateStats, across_replicates};
use crate::stats;
use crate::well::WellPos;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Above,
    Below,
}

impl Direction {
    #[inline]
    pub fn passes(&self, value: f64, threshold: f64) -> bool {
        match self {
            Direction::Above => value > threshold,
            Direction::Below => value < threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositiveCellConfig {
    pub feature: String,
    /// Percentile of the negative-control cells; the plate's detection
    /// threshold when unset.
    #[serde(default)]
    pub percentile: Option<f64>,
    #[serde(default)]
    pub direction: Direction,
}

impl PositiveCellConfig {
    pub fn new(feature: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            percentile: None,
            direction: Direction::Above,
        }
    }
}

/// Percentage of cells per well beyond the `percentile` of the
/// negative-control cells of the same replicat. Wells without cells are 0.
pub fn percent_positive(
    replicat: &Replicat,
    feature: &str,
    negative: &[WellPos],
    percentile: f64,
    direction: Direction,
) -> Result<WellMatrix> {
    let table = replicat.table();
    if table.kind() != DataKind::SingleCell {
        return Err(HtsError::configuration(format!(
            "replicat {}: positive-cell calling needs single-cell data",
            replicat.name()
        )));
    }
    if !(0.0..=100.0).contains(&percentile) {
        return Err(HtsError::configuration(format!(
            "percentile {percentile} outside [0, 100]"
        )));
    }
    let control = stats::finite(&table.values_in(feature, negative)?);
    if control.is_empty() {
        return Err(HtsError::numerical(format!(
            "replicat {}: no negative-control cells for {feature:?}",
            replicat.name()
        )));
    }
    let threshold = stats::percentile(&control, percentile);

    let mut matrix = WellMatrix::zeros(replicat.format());
    for (pos, values) in table.group_by_well(feature)? {
        let positive = values.iter().filter(|&&v| direction.passes(v, threshold)).count();
        matrix.set(pos, 100.0 * positive as f64 / values.len() as f64);
    }
    Ok(matrix)
}

/// Percent-positive mean and population SD across the plate's replicats.
pub fn percent_positive_stats(plate: &Plate, config: &PositiveCellConfig) -> Result<ReplicateStats> {
    let negative = plate.negative_positions()?;
    let percentile = config.percentile.unwrap_or(plate.controls().threshold);
    let per_replicat = plate
        .replicats()
        .map(|r| percent_positive(r, &config.feature, &negative, percentile, config.direction))
        .collect::<Result<Vec<_>>>()?;
    across_replicates(&per_replicat)
}

/// Cell count mean and population SD across the plate's replicats.
pub fn cell_count_stats(plate: &Plate) -> Result<ReplicateStats> {
    let counts: Vec<WellMatrix> = plate.replicats().map(|r| r.cell_counts()).collect();
    across_replicates(&counts)
}

/// Viability relative to the negative control and, when the plate has a
/// toxicity control, toxicity on the scale negative = 0, toxic = 100.
pub fn viability_toxicity(
    plate: &Plate,
    counts: &ReplicateStats,
) -> Result<(WellMatrix, Option<WellMatrix>)> {
    let negative = stats::mean(&counts.mean.gather(&plate.negative_positions()?));
    if !(negative > 0.0) {
        return Err(HtsError::numerical(format!(
            "plate {}: negative control has no cells",
            plate.name()
        )));
    }
    let viability = counts.mean.map(|v| 100.0 * v / negative);

    let toxicity = match plate.toxicity_positions()? {
        None => None,
        Some(positions) => {
            let toxic = stats::mean(&counts.mean.gather(&positions));
            let span = negative - toxic;
            if span == 0.0 || span.is_nan() {
                return Err(HtsError::numerical(format!(
                    "plate {}: toxicity control count equals the negative control",
                    plate.name()
                )));
            }
            Some(counts.mean.map(|v| 100.0 * (negative - v) / span))
        }
    };
    Ok((viability, toxicity))
}

#[cfg(test)]
#[path = "../../tests/src_inline/score/cells.rs"]
mod tests;
