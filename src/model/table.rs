use std::collections::BTreeMap;
use std::ops::Range;

use crate::error::{HtsError, Result};
use crate::well::{PlateFormat, WellPos, label_to_index};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    /// Several rows per well, one per cell.
    SingleCell,
    /// At most one row per well.
    WellLevel,
}

/// Long-form measurement table: one row per cell or per well.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    wells: Vec<WellPos>,
    features: BTreeMap<String, Vec<f64>>,
    kind: DataKind,
}

impl RawTable {
    pub fn new(wells: Vec<WellPos>, features: BTreeMap<String, Vec<f64>>) -> Result<Self> {
        let n = wells.len();
        for (name, column) in &features {
            if column.len() != n {
                return Err(HtsError::configuration(format!(
                    "feature {name:?} has {} rows, expected {n}",
                    column.len()
                )));
            }
        }
        let kind = detect_kind(&wells);
        Ok(Self {
            wells,
            features,
            kind,
        })
    }

    /// Rows identified by a single well label column (`"A1"`, `"B12"`).
    pub fn from_labels<S: AsRef<str>>(
        format: PlateFormat,
        labels: &[S],
        features: BTreeMap<String, Vec<f64>>,
    ) -> Result<Self> {
        let wells = labels
            .iter()
            .map(|l| label_to_index(l.as_ref(), format))
            .collect::<Result<Vec<_>>>()?;
        Self::new(wells, features)
    }

    /// Rows identified by 1-based row and column number columns.
    pub fn from_row_col(
        format: PlateFormat,
        rows: &[usize],
        cols: &[usize],
        features: BTreeMap<String, Vec<f64>>,
    ) -> Result<Self> {
        if rows.len() != cols.len() {
            return Err(HtsError::configuration(
                "row and column index columns differ in length",
            ));
        }
        let mut wells = Vec::with_capacity(rows.len());
        for (&r, &c) in rows.iter().zip(cols) {
            if r == 0 || c == 0 || !format.contains(WellPos::new(r - 1, c - 1)) {
                return Err(HtsError::InvalidWell(format!(
                    "row {r} column {c} outside {}x{} plate",
                    format.rows(),
                    format.cols()
                )));
            }
            wells.push(WellPos::new(r - 1, c - 1));
        }
        Self::new(wells, features)
    }

    /// Overrides the detected kind, e.g. for single-cell data that happens
    /// to hold one cell per well.
    pub fn with_kind(mut self, kind: DataKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn n_rows(&self) -> usize {
        self.wells.len()
    }

    pub fn kind(&self) -> DataKind {
        self.kind
    }

    pub fn wells(&self) -> &[WellPos] {
        &self.wells
    }

    pub fn feature_names(&self) -> impl Iterator<Item = &str> {
        self.features.keys().map(String::as_str)
    }

    pub fn feature(&self, name: &str) -> Result<&[f64]> {
        self.features
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| HtsError::configuration(format!("unknown feature {name:?}")))
    }

    pub fn set_feature(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if values.len() != self.wells.len() {
            return Err(HtsError::configuration(format!(
                "feature {name:?} has {} rows, expected {}",
                values.len(),
                self.wells.len()
            )));
        }
        self.features.insert(name.to_string(), values);
        Ok(())
    }

    /// Feature values grouped per well, in first-seen row order within a well.
    pub fn group_by_well(&self, feature: &str) -> Result<BTreeMap<WellPos, Vec<f64>>> {
        let column = self.feature(feature)?;
        let mut out: BTreeMap<WellPos, Vec<f64>> = BTreeMap::new();
        for (pos, &v) in self.wells.iter().zip(column) {
            out.entry(*pos).or_default().push(v);
        }
        Ok(out)
    }

    pub fn count_by_well(&self) -> BTreeMap<WellPos, usize> {
        let mut out = BTreeMap::new();
        for pos in &self.wells {
            *out.entry(*pos).or_insert(0) += 1;
        }
        out
    }

    /// Values of rows that fall in any of `positions`.
    pub fn values_in(&self, feature: &str, positions: &[WellPos]) -> Result<Vec<f64>> {
        let column = self.feature(feature)?;
        Ok(self
            .wells
            .iter()
            .zip(column)
            .filter(|(pos, _)| positions.contains(pos))
            .map(|(_, &v)| v)
            .collect())
    }

    /// Keeps rows inside the region and re-indexes them relative to its origin.
    pub fn slice_region(&self, rows: &Range<usize>, cols: &Range<usize>) -> RawTable {
        let keep: Vec<usize> = self
            .wells
            .iter()
            .enumerate()
            .filter(|(_, p)| rows.contains(&p.row) && cols.contains(&p.col))
            .map(|(i, _)| i)
            .collect();
        let wells = keep
            .iter()
            .map(|&i| WellPos::new(self.wells[i].row - rows.start, self.wells[i].col - cols.start))
            .collect::<Vec<_>>();
        let features = self
            .features
            .iter()
            .map(|(name, column)| (name.clone(), keep.iter().map(|&i| column[i]).collect()))
            .collect();
        RawTable {
            wells,
            features,
            kind: self.kind,
        }
    }
}

fn detect_kind(wells: &[WellPos]) -> DataKind {
    let mut seen = std::collections::HashSet::with_capacity(wells.len());
    for pos in wells {
        if !seen.insert(*pos) {
            return DataKind::SingleCell;
        }
    }
    DataKind::WellLevel
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/table.rs"]
mod tests;
