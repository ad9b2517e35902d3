//! Systematic-error correction.
//!
//! Every algorithm here takes matrices by reference and returns new ones.
//! Zero-valued wells are treated as missing by the diffusion model and the
//! median polish family only; quantile normalization and background
//! subtraction keep zeros as measurements.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{HtsError, Result};

pub mod background;
pub mod diffusion;
pub mod median_polish;
pub mod quantile;

pub use diffusion::{DiffusionConfig, DiffusionFit, DiffusionOutcome, diffusion_model};
pub use median_polish::{MedianPolishConfig, MedianPolishFit, b_score, bz_score, median_polish};
pub use quantile::{QuantileNormalized, quantile_normalize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CorrectionKind {
    /// Summary copied through unchanged, e.g. when no gradient was found.
    Identity,
    DiffusionModel,
    MedianPolish,
    BScore,
    BZScore,
    QuantileNormalization,
    Background,
    WellCorrection,
}

/// Cooperative cancellation flag shared between a caller and long-running
/// corrections.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(HtsError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Most values a single grid axis may hold.
pub const MAX_GRID_POINTS: usize = 5_000;

/// Inclusive start, exclusive end, positive step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridRange {
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl GridRange {
    pub fn new(start: f64, end: f64, step: f64) -> Self {
        Self { start, end, step }
    }

    pub fn validate(&self, what: &str) -> Result<()> {
        if !(self.start.is_finite() && self.end.is_finite()) {
            return Err(HtsError::configuration(format!(
                "{what} grid needs finite bounds, got {self:?}"
            )));
        }
        if !(self.step > 0.0) || !(self.end > self.start) {
            return Err(HtsError::configuration(format!(
                "{what} grid needs start < end and a positive step, got {self:?}"
            )));
        }
        let points = ((self.end - self.start) / self.step).ceil();
        if points > MAX_GRID_POINTS as f64 {
            return Err(HtsError::configuration(format!(
                "{what} grid has {points} points, at most {MAX_GRID_POINTS} allowed"
            )));
        }
        Ok(())
    }

    /// Grid points, truncated to `MAX_GRID_POINTS` for unvalidated ranges.
    pub fn values(&self) -> Vec<f64> {
        let n = ((self.end - self.start) / self.step).ceil();
        let n = if n.is_nan() { 0 } else { (n as usize).min(MAX_GRID_POINTS) };
        (0..n).map(|i| self.start + i as f64 * self.step).collect()
    }
}

impl Default for GridRange {
    fn default() -> Self {
        Self::new(0.0, 1000.0, 10.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceMetric {
    #[default]
    Squared,
    Absolute,
}

impl DistanceMetric {
    #[inline]
    pub fn cell(&self, a: f64, b: f64) -> f64 {
        match self {
            DistanceMetric::Squared => (a - b) * (a - b),
            DistanceMetric::Absolute => (a - b).abs(),
        }
    }
}
