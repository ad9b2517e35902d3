//! Well label codec and plate formats.
//!
//! Labels are a row part of one or more letters (`A`..`Z`, then `AA`, `AB`,
//! ...) followed by a 1-based column number: `A1`, `P24`, `AF48`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{HtsError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlateFormat {
    Plate96,
    Plate384,
    Plate1536,
    Custom { rows: usize, cols: usize },
}

impl PlateFormat {
    pub fn from_size(n_wells: usize) -> Result<Self> {
        match n_wells {
            96 => Ok(PlateFormat::Plate96),
            384 => Ok(PlateFormat::Plate384),
            1536 => Ok(PlateFormat::Plate1536),
            other => Err(HtsError::configuration(format!(
                "unsupported plate size {other} (use 96, 384 or 1536)"
            ))),
        }
    }

    /// Picks a named format when the shape matches one.
    pub fn from_shape(rows: usize, cols: usize) -> Self {
        match (rows, cols) {
            (8, 12) => PlateFormat::Plate96,
            (16, 24) => PlateFormat::Plate384,
            (32, 48) => PlateFormat::Plate1536,
            _ => PlateFormat::Custom { rows, cols },
        }
    }

    pub fn rows(&self) -> usize {
        self.shape().0
    }

    pub fn cols(&self) -> usize {
        self.shape().1
    }

    pub fn shape(&self) -> (usize, usize) {
        match *self {
            PlateFormat::Plate96 => (8, 12),
            PlateFormat::Plate384 => (16, 24),
            PlateFormat::Plate1536 => (32, 48),
            PlateFormat::Custom { rows, cols } => (rows, cols),
        }
    }

    pub fn n_wells(&self) -> usize {
        let (r, c) = self.shape();
        r * c
    }

    pub fn contains(&self, pos: WellPos) -> bool {
        pos.row < self.rows() && pos.col < self.cols()
    }

    /// All positions in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = WellPos> + use<> {
        let (rows, cols) = self.shape();
        (0..rows).flat_map(move |row| (0..cols).map(move |col| WellPos { row, col }))
    }
}

/// Zero-based well coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WellPos {
    pub row: usize,
    pub col: usize,
}

impl WellPos {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for WellPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", row_letters(self.row), self.col + 1)
    }
}

pub fn label_to_index(label: &str, format: PlateFormat) -> Result<WellPos> {
    let trimmed = label.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(trimmed.len());
    let (letters, digits) = trimmed.split_at(split);
    if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HtsError::InvalidWell(format!("malformed well label {label:?}")));
    }

    let mut row = 0usize;
    for b in letters.bytes() {
        let v = (b.to_ascii_uppercase() - b'A') as usize + 1;
        row = row
            .checked_mul(26)
            .and_then(|r| r.checked_add(v))
            .ok_or_else(|| HtsError::InvalidWell(format!("row part too long in {label:?}")))?;
    }
    let row = row - 1;

    let col_1based: usize = digits
        .parse()
        .map_err(|_| HtsError::InvalidWell(format!("bad column number in {label:?}")))?;
    if col_1based == 0 {
        return Err(HtsError::InvalidWell(format!(
            "column numbers start at 1 in {label:?}"
        )));
    }

    let pos = WellPos::new(row, col_1based - 1);
    if !format.contains(pos) {
        return Err(HtsError::InvalidWell(format!(
            "{label} outside {}x{} plate",
            format.rows(),
            format.cols()
        )));
    }
    Ok(pos)
}

pub fn index_to_label(pos: WellPos, format: PlateFormat) -> Result<String> {
    if !format.contains(pos) {
        return Err(HtsError::InvalidWell(format!(
            "({}, {}) outside {}x{} plate",
            pos.row,
            pos.col,
            format.rows(),
            format.cols()
        )));
    }
    Ok(pos.to_string())
}

/// Bijective base-26 row letters: 0 -> A, 25 -> Z, 26 -> AA.
pub fn row_letters(row: usize) -> String {
    let mut n = row + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
#[path = "../../tests/src_inline/well/tests.rs"]
mod tests;
