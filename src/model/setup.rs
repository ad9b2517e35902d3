use std::collections::BTreeSet;
use std::ops::Range;

use crate::error::{HtsError, Result};
use crate::model::matrix::check_region;
use crate::well::{PlateFormat, WellPos, label_to_index};

/// Well -> gene/reagent annotation grid. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateSetup {
    format: PlateFormat,
    grid: Vec<Option<String>>,
}

impl PlateSetup {
    /// `rows[r][c]` is the annotation of the well at (r, c); empty strings
    /// count as unused wells.
    pub fn from_grid(format: PlateFormat, rows: Vec<Vec<Option<String>>>) -> Result<Self> {
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.len() != format.rows() || rows.iter().any(|r| r.len() != format.cols()) {
            return Err(HtsError::shape(format.shape(), (rows.len(), n_cols)));
        }
        let grid = rows
            .into_iter()
            .flatten()
            .map(|cell| cell.filter(|g| !g.trim().is_empty()))
            .collect();
        Ok(Self { format, grid })
    }

    pub fn from_labels<S: AsRef<str>>(format: PlateFormat, entries: &[(S, S)]) -> Result<Self> {
        let mut grid = vec![None; format.n_wells()];
        for (label, gene) in entries {
            let pos = label_to_index(label.as_ref(), format)?;
            let gene = gene.as_ref().trim();
            if !gene.is_empty() {
                grid[pos.row * format.cols() + pos.col] = Some(gene.to_string());
            }
        }
        Ok(Self { format, grid })
    }

    pub fn format(&self) -> PlateFormat {
        self.format
    }

    pub fn annotation(&self, pos: WellPos) -> Option<&str> {
        if !self.format.contains(pos) {
            return None;
        }
        self.grid[pos.row * self.format.cols() + pos.col].as_deref()
    }

    /// All wells annotated with `gene`, row-major.
    pub fn positions_of(&self, gene: &str) -> Result<Vec<WellPos>> {
        let out: Vec<WellPos> = self
            .format
            .positions()
            .filter(|&p| self.annotation(p) == Some(gene))
            .collect();
        if out.is_empty() {
            return Err(HtsError::configuration(format!(
                "gene {gene:?} not found in plate setup"
            )));
        }
        Ok(out)
    }

    pub fn genes(&self) -> BTreeSet<&str> {
        self.grid.iter().filter_map(|g| g.as_deref()).collect()
    }

    pub fn slice_region(&self, rows: Range<usize>, cols: Range<usize>) -> Result<PlateSetup> {
        check_region(self.format, &rows, &cols)?;
        let format = PlateFormat::from_shape(rows.len(), cols.len());
        let mut grid = Vec::with_capacity(format.n_wells());
        for row in rows {
            for col in cols.clone() {
                grid.push(self.annotation(WellPos::new(row, col)).map(str::to_string));
            }
        }
        Ok(Self { format, grid })
    }
}
