//! Per-well result table.
//!
//! One row per annotated well, in row-major well order. Undefined values
//! (NaN in the score matrices) appear as `None`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{HtsError, Result};
use crate::model::matrix::WellMatrix;
use crate::model::setup::PlateSetup;
use crate::score::{Direction, ReplicateStats};
use crate::stats;
use crate::well::{PlateFormat, WellPos, index_to_label, label_to_index};

pub const COLUMNS: [&str; 14] = [
    "GeneName",
    "Well",
    "CellsCount",
    "SDCellsCount",
    "PositiveCells",
    "SDPositiveCells",
    "Mean",
    "Std",
    "Median",
    "Stdm",
    "Viability",
    "Toxicity",
    "SSMD",
    "TStat",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AggregationPolicy {
    /// Every row carries its own well's statistics.
    #[default]
    PerWell,
    /// Every row of a gene carries the mean over all of that gene's wells.
    GeneAveraged,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    #[serde(rename = "GeneName")]
    pub gene_name: String,
    #[serde(rename = "Well")]
    pub well: String,
    #[serde(rename = "CellsCount")]
    pub cells_count: Option<f64>,
    #[serde(rename = "SDCellsCount")]
    pub sd_cells_count: Option<f64>,
    #[serde(rename = "PositiveCells")]
    pub positive_cells: Option<f64>,
    #[serde(rename = "SDPositiveCells")]
    pub sd_positive_cells: Option<f64>,
    #[serde(rename = "Mean")]
    pub mean: Option<f64>,
    #[serde(rename = "Std")]
    pub std: Option<f64>,
    #[serde(rename = "Median")]
    pub median: Option<f64>,
    #[serde(rename = "Stdm")]
    pub stdm: Option<f64>,
    #[serde(rename = "Viability")]
    pub viability: Option<f64>,
    #[serde(rename = "Toxicity")]
    pub toxicity: Option<f64>,
    #[serde(rename = "SSMD")]
    pub ssmd: Option<f64>,
    #[serde(rename = "TStat")]
    pub tstat: Option<f64>,
}

impl ResultRow {
    /// Numeric cell by column name; `None` for the text columns and for
    /// unknown names.
    pub fn value(&self, column: &str) -> Option<f64> {
        match column {
            "CellsCount" => self.cells_count,
            "SDCellsCount" => self.sd_cells_count,
            "PositiveCells" => self.positive_cells,
            "SDPositiveCells" => self.sd_positive_cells,
            "Mean" => self.mean,
            "Std" => self.std,
            "Median" => self.median,
            "Stdm" => self.stdm,
            "Viability" => self.viability,
            "Toxicity" => self.toxicity,
            "SSMD" => self.ssmd,
            "TStat" => self.tstat,
            _ => None,
        }
    }

    fn value_mut(&mut self, column: &str) -> Option<&mut Option<f64>> {
        match column {
            "CellsCount" => Some(&mut self.cells_count),
            "SDCellsCount" => Some(&mut self.sd_cells_count),
            "PositiveCells" => Some(&mut self.positive_cells),
            "SDPositiveCells" => Some(&mut self.sd_positive_cells),
            "Mean" => Some(&mut self.mean),
            "Std" => Some(&mut self.std),
            "Median" => Some(&mut self.median),
            "Stdm" => Some(&mut self.stdm),
            "Viability" => Some(&mut self.viability),
            "Toxicity" => Some(&mut self.toxicity),
            "SSMD" => Some(&mut self.ssmd),
            "TStat" => Some(&mut self.tstat),
            _ => None,
        }
    }
}

/// Per-well inputs of the table; absent entries become empty columns.
#[derive(Debug, Clone, Default)]
pub struct ScoreMatrices {
    pub cells_count: Option<ReplicateStats>,
    pub positive_cells: Option<ReplicateStats>,
    /// Across-replicate statistics of the mean summaries.
    pub mean: Option<ReplicateStats>,
    /// Across-replicate statistics of the median summaries.
    pub median: Option<ReplicateStats>,
    pub viability: Option<WellMatrix>,
    pub toxicity: Option<WellMatrix>,
    pub ssmd: Option<WellMatrix>,
    pub tstat: Option<WellMatrix>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultTable {
    rows: Vec<ResultRow>,
    #[serde(skip)]
    format: PlateFormat,
}

impl ResultTable {
    pub fn build(setup: &PlateSetup, scores: &ScoreMatrices, policy: AggregationPolicy) -> Result<Self> {
        let format = setup.format();
        let cell = |m: Option<&WellMatrix>, pos: WellPos| m.map(|m| m.get(pos)).filter(|v| v.is_finite());
        let mut rows = Vec::new();
        for pos in format.positions() {
            let Some(gene) = setup.annotation(pos) else {
                continue;
            };
            rows.push(ResultRow {
                gene_name: gene.to_string(),
                well: index_to_label(pos, format)?,
                cells_count: cell(scores.cells_count.as_ref().map(|s| &s.mean), pos),
                sd_cells_count: cell(scores.cells_count.as_ref().map(|s| &s.sd), pos),
                positive_cells: cell(scores.positive_cells.as_ref().map(|s| &s.mean), pos),
                sd_positive_cells: cell(scores.positive_cells.as_ref().map(|s| &s.sd), pos),
                mean: cell(scores.mean.as_ref().map(|s| &s.mean), pos),
                std: cell(scores.mean.as_ref().map(|s| &s.sd), pos),
                median: cell(scores.median.as_ref().map(|s| &s.mean), pos),
                stdm: cell(scores.median.as_ref().map(|s| &s.sd), pos),
                viability: cell(scores.viability.as_ref(), pos),
                toxicity: cell(scores.toxicity.as_ref(), pos),
                ssmd: cell(scores.ssmd.as_ref(), pos),
                tstat: cell(scores.tstat.as_ref(), pos),
            });
        }
        if policy == AggregationPolicy::GeneAveraged {
            average_by_gene(&mut rows);
        }
        Ok(Self { rows, format })
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &COLUMNS
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row of the well with `label`; labels are parsed, so `a01` finds `A1`.
    pub fn row_for_well(&self, label: &str) -> Option<&ResultRow> {
        let pos = label_to_index(label, self.format).ok()?;
        let canonical = index_to_label(pos, self.format).ok()?;
        self.rows.iter().find(|r| r.well == canonical)
    }

    pub fn column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        check_numeric_column(name)?;
        Ok(self.rows.iter().map(|r| r.value(name)).collect())
    }

    /// Rows whose `column` lies beyond `threshold` in `direction`.
    pub fn hits(&self, column: &str, threshold: f64, direction: Direction) -> Result<Vec<&ResultRow>> {
        check_numeric_column(column)?;
        Ok(self
            .rows
            .iter()
            .filter(|r| r.value(column).is_some_and(|v| direction.passes(v, threshold)))
            .collect())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.rows).map_err(|e| HtsError::Serialization(e.to_string()))
    }
}

fn check_numeric_column(name: &str) -> Result<()> {
    if !COLUMNS[2..].contains(&name) {
        return Err(HtsError::configuration(format!("no numeric result column {name:?}")));
    }
    Ok(())
}

fn average_by_gene(rows: &mut [ResultRow]) {
    let mut by_gene: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, row) in rows.iter().enumerate() {
        by_gene.entry(row.gene_name.clone()).or_default().push(i);
    }
    for idx in by_gene.values() {
        for column in &COLUMNS[2..] {
            let present: Vec<f64> = idx.iter().filter_map(|&i| rows[i].value(column)).collect();
            let avg = if present.is_empty() {
                None
            } else {
                Some(stats::mean(&present))
            };
            for &i in idx {
                if let Some(slot) = rows[i].value_mut(column) {
                    *slot = avg;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/result/mod.rs"]
mod tests;
