use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::correction::CorrectionKind;
use crate::correction::background::well_correction;
use crate::error::{HtsError, Result};
use crate::model::matrix::WellMatrix;
use crate::model::normalize::{NormalizationMethod, normalize_values};
use crate::model::table::{DataKind, RawTable};
use crate::stats;
use crate::well::{PlateFormat, WellPos};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SummaryMethod {
    Mean,
    Median,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatrixStage {
    Summary,
    Corrected,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MatrixKey {
    pub feature: String,
    pub method: SummaryMethod,
    pub stage: MatrixStage,
}

impl MatrixKey {
    pub fn new(feature: &str, method: SummaryMethod, stage: MatrixStage) -> Self {
        Self {
            feature: feature.to_string(),
            method,
            stage,
        }
    }
}

/// One repetition of a plate experiment.
#[derive(Debug, Clone)]
pub struct Replicat {
    name: String,
    format: PlateFormat,
    table: RawTable,
    /// Table as loaded, kept once a feature has been transformed in place.
    raw: Option<RawTable>,
    matrices: BTreeMap<MatrixKey, WellMatrix>,
    is_normalized: bool,
    is_spatial_normalized: bool,
    correction: Option<CorrectionKind>,
}

impl Replicat {
    pub fn new(name: impl Into<String>, format: PlateFormat, table: RawTable) -> Result<Self> {
        let name = name.into();
        if let Some(pos) = table.wells().iter().find(|&&p| !format.contains(p)) {
            return Err(HtsError::InvalidWell(format!(
                "replicat {name}: row at ({}, {}) outside {}x{} plate",
                pos.row,
                pos.col,
                format.rows(),
                format.cols()
            )));
        }
        Ok(Self {
            name,
            format,
            table,
            raw: None,
            matrices: BTreeMap::new(),
            is_normalized: false,
            is_spatial_normalized: false,
            correction: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> PlateFormat {
        self.format
    }

    pub fn table(&self) -> &RawTable {
        &self.table
    }

    pub fn is_normalized(&self) -> bool {
        self.is_normalized
    }

    pub fn is_spatial_normalized(&self) -> bool {
        self.is_spatial_normalized
    }

    pub fn correction(&self) -> Option<CorrectionKind> {
        self.correction
    }

    pub fn matrix(&self, key: &MatrixKey) -> Option<&WellMatrix> {
        self.matrices.get(key)
    }

    /// Mean or median of `feature` per well; wells without rows stay 0.
    pub fn compute_well_summary(
        &mut self,
        feature: &str,
        method: SummaryMethod,
    ) -> Result<&WellMatrix> {
        if self.table.kind() == DataKind::SingleCell && !self.is_normalized {
            tracing::warn!(
                replicat = %self.name,
                feature,
                "summarizing single-cell data that has not been normalized"
            );
        }
        let matrix = summarize(&self.table, self.format, feature, method)?;
        let key = MatrixKey::new(feature, method, MatrixStage::Summary);
        self.matrices.insert(key.clone(), matrix);
        Ok(&self.matrices[&key])
    }

    pub fn summary(&self, feature: &str, method: SummaryMethod) -> Result<&WellMatrix> {
        self.matrices
            .get(&MatrixKey::new(feature, method, MatrixStage::Summary))
            .ok_or_else(|| {
                HtsError::precondition(format!(
                    "replicat {}: no {method:?} summary for {feature:?}",
                    self.name
                ))
            })
    }

    pub fn summary_or_compute(
        &mut self,
        feature: &str,
        method: SummaryMethod,
    ) -> Result<&WellMatrix> {
        let key = MatrixKey::new(feature, method, MatrixStage::Summary);
        if !self.matrices.contains_key(&key) {
            self.compute_well_summary(feature, method)?;
        }
        self.summary(feature, method)
    }

    /// Spatially corrected matrix; fails when no correction has been applied.
    pub fn corrected(&self, feature: &str, method: SummaryMethod) -> Result<&WellMatrix> {
        if !self.is_spatial_normalized {
            return Err(HtsError::precondition(format!(
                "replicat {} is not spatially normalized",
                self.name
            )));
        }
        self.matrices
            .get(&MatrixKey::new(feature, method, MatrixStage::Corrected))
            .ok_or_else(|| {
                HtsError::precondition(format!(
                    "replicat {}: no corrected {method:?} matrix for {feature:?}",
                    self.name
                ))
            })
    }

    pub fn set_corrected(
        &mut self,
        feature: &str,
        method: SummaryMethod,
        kind: CorrectionKind,
        matrix: WellMatrix,
    ) -> Result<()> {
        if matrix.shape() != self.format.shape() {
            return Err(HtsError::shape(self.format.shape(), matrix.shape()));
        }
        self.matrices.insert(
            MatrixKey::new(feature, method, MatrixStage::Corrected),
            matrix,
        );
        self.is_spatial_normalized = true;
        self.correction = Some(kind);
        Ok(())
    }

    /// Feature column as loaded, before any in-place transform.
    pub fn raw_feature(&self, feature: &str) -> Result<&[f64]> {
        self.raw.as_ref().unwrap_or(&self.table).feature(feature)
    }

    /// Non-spatial transform of a raw feature column. Control-based methods
    /// use the rows that fall in `negative` (and `positive` for NPI).
    /// The transform always reads the loaded values, so repeating it gives
    /// the same table. Existing summaries of `feature` are recomputed.
    pub fn normalize(
        &mut self,
        feature: &str,
        method: NormalizationMethod,
        log2: bool,
        negative: &[WellPos],
        positive: &[WellPos],
    ) -> Result<()> {
        let column = self.raw_feature(feature)?;
        let neg_mask: Vec<bool> = self.table.wells().iter().map(|p| negative.contains(p)).collect();
        let pos_mask: Vec<bool> = self.table.wells().iter().map(|p| positive.contains(p)).collect();
        let values = normalize_values(column, method, log2, &neg_mask, &pos_mask)?;
        self.replace_feature(feature, values)?;
        self.is_normalized = true;
        tracing::debug!(replicat = %self.name, feature, ?method, log2, "normalized raw feature");
        Ok(())
    }

    /// Log2 + z-score of the raw column, then a fresh corrected summary.
    /// Summaries of `feature` follow the transformed column.
    pub fn apply_well_correction(&mut self, feature: &str, method: SummaryMethod) -> Result<()> {
        let corrected = well_correction(self.raw_feature(feature)?)?;
        self.replace_feature(feature, corrected)?;
        self.is_normalized = true;
        let matrix = self.compute_well_summary(feature, method)?.clone();
        self.set_corrected(feature, method, CorrectionKind::WellCorrection, matrix)
    }

    /// Swaps in a transformed column and recomputes the summaries built from
    /// it. Nothing changes on failure.
    fn replace_feature(&mut self, feature: &str, values: Vec<f64>) -> Result<()> {
        let mut table = self.table.clone();
        table.set_feature(feature, values)?;
        let mut refreshed = Vec::new();
        for key in self.matrices.keys() {
            if key.stage == MatrixStage::Summary && key.feature == feature {
                refreshed.push((key.clone(), summarize(&table, self.format, feature, key.method)?));
            }
        }
        if self.raw.is_none() {
            self.raw = Some(self.table.clone());
        }
        self.table = table;
        self.matrices.extend(refreshed);
        Ok(())
    }

    pub fn cell_counts(&self) -> WellMatrix {
        let mut matrix = WellMatrix::zeros(self.format);
        for (pos, n) in self.table.count_by_well() {
            matrix.set(pos, n as f64);
        }
        matrix
    }

    pub(crate) fn slice_region(&self, rows: &Range<usize>, cols: &Range<usize>) -> Result<Replicat> {
        let mut matrices = BTreeMap::new();
        for (key, matrix) in &self.matrices {
            matrices.insert(key.clone(), matrix.slice_region(rows.clone(), cols.clone())?);
        }
        Ok(Replicat {
            name: self.name.clone(),
            format: PlateFormat::from_shape(rows.len(), cols.len()),
            table: self.table.slice_region(rows, cols),
            raw: self.raw.as_ref().map(|t| t.slice_region(rows, cols)),
            matrices,
            is_normalized: self.is_normalized,
            is_spatial_normalized: self.is_spatial_normalized,
            correction: self.correction,
        })
    }
}

pub(crate) fn summarize(
    table: &RawTable,
    format: PlateFormat,
    feature: &str,
    method: SummaryMethod,
) -> Result<WellMatrix> {
    let groups = table.group_by_well(feature)?;
    let mut matrix = WellMatrix::zeros(format);
    for (pos, values) in groups {
        let v = match method {
            SummaryMethod::Mean => stats::mean(&values),
            SummaryMethod::Median => stats::median(&values),
        };
        matrix.set(pos, v);
    }
    Ok(matrix)
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/replicat.rs"]
mod tests;
