use std::ops::Range;

use ndarray::{Array2, s};

use crate::error::{HtsError, Result};
use crate::well::{PlateFormat, WellPos};

/// One value per well for a single feature, shaped to its plate format.
#[derive(Debug, Clone, PartialEq)]
pub struct WellMatrix {
    format: PlateFormat,
    values: Array2<f64>,
}

impl WellMatrix {
    pub fn zeros(format: PlateFormat) -> Self {
        Self {
            format,
            values: Array2::zeros(format.shape()),
        }
    }

    pub fn from_array(format: PlateFormat, values: Array2<f64>) -> Result<Self> {
        if values.dim() != format.shape() {
            return Err(HtsError::shape(format.shape(), values.dim()));
        }
        Ok(Self { format, values })
    }

    pub fn from_rows(format: PlateFormat, rows: &[Vec<f64>]) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.iter().any(|r| r.len() != n_cols) {
            return Err(HtsError::configuration("ragged rows in matrix input"));
        }
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        let values = Array2::from_shape_vec((n_rows, n_cols), flat)
            .map_err(|_| HtsError::shape(format.shape(), (n_rows, n_cols)))?;
        Self::from_array(format, values)
    }

    pub fn from_fn(format: PlateFormat, mut f: impl FnMut(WellPos) -> f64) -> Self {
        Self {
            format,
            values: Array2::from_shape_fn(format.shape(), |(row, col)| f(WellPos { row, col })),
        }
    }

    pub fn format(&self) -> PlateFormat {
        self.format
    }

    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn into_values(self) -> Array2<f64> {
        self.values
    }

    /// Panics when `pos` is outside the plate.
    pub fn get(&self, pos: WellPos) -> f64 {
        self.values[[pos.row, pos.col]]
    }

    pub fn set(&mut self, pos: WellPos, value: f64) {
        self.values[[pos.row, pos.col]] = value;
    }

    pub fn gather(&self, positions: &[WellPos]) -> Vec<f64> {
        positions.iter().map(|&p| self.get(p)).collect()
    }

    /// Row-major copy of all values.
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }

    pub fn check_same_shape(&self, other: &WellMatrix) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(HtsError::shape(self.shape(), other.shape()));
        }
        Ok(())
    }

    /// Zeros become NaN, for algorithms that treat an empty well as missing.
    pub fn zeros_as_missing(&self) -> Array2<f64> {
        self.values.mapv(|v| if v == 0.0 { f64::NAN } else { v })
    }

    /// Inverse of [`zeros_as_missing`](Self::zeros_as_missing) for algorithm output.
    pub fn from_missing(format: PlateFormat, values: Array2<f64>) -> Result<Self> {
        Self::from_array(format, values.mapv(|v| if v.is_nan() { 0.0 } else { v }))
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> WellMatrix {
        Self {
            format: self.format,
            values: self.values.mapv(f),
        }
    }

    pub fn slice_region(&self, rows: Range<usize>, cols: Range<usize>) -> Result<WellMatrix> {
        check_region(self.format, &rows, &cols)?;
        let values = self.values.slice(s![rows.clone(), cols.clone()]).to_owned();
        Ok(Self {
            format: PlateFormat::from_shape(rows.len(), cols.len()),
            values,
        })
    }
}

pub(crate) fn check_region(
    format: PlateFormat,
    rows: &Range<usize>,
    cols: &Range<usize>,
) -> Result<()> {
    if rows.is_empty() || cols.is_empty() || rows.end > format.rows() || cols.end > format.cols() {
        return Err(HtsError::configuration(format!(
            "region rows {rows:?} cols {cols:?} outside {}x{} plate",
            format.rows(),
            format.cols()
        )));
    }
    Ok(())
}
