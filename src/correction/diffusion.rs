//! Diffusion model for evaporation and temperature gradients.
//!
//! A padded grid with its border pinned at 1 is relaxed with an explicit
//! Laplacian stencil. The z-scored interior after each step is a candidate
//! "diffusion map". The map closest to the plate's own z-scored pattern is
//! scaled onto the plate by a brute-force (shift, multiplier) search and
//! divided out.

use ndarray::{Array2, s};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::correction::{CancelToken, DistanceMetric, GridRange};
use crate::error::{HtsError, Result};
use crate::model::matrix::WellMatrix;
use crate::stats;

/// Upper stability bound of the explicit 2-D five-point stencil.
const MAX_STABLE_COEFFICIENT: f64 = 0.25;

/// Every iteration keeps one map in memory, so the count is capped.
pub const MAX_DIFFUSION_ITERATIONS: usize = 1_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffusionConfig {
    pub max_iterations: usize,
    pub coefficient: f64,
    pub shift: GridRange,
    pub multiplier: GridRange,
    pub distance: DistanceMetric,
}

impl Default for DiffusionConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            coefficient: 0.125,
            shift: GridRange::default(),
            multiplier: GridRange::default(),
            distance: DistanceMetric::Squared,
        }
    }
}

impl DiffusionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 || self.max_iterations > MAX_DIFFUSION_ITERATIONS {
            return Err(HtsError::configuration(format!(
                "diffusion iterations must be in 1..={MAX_DIFFUSION_ITERATIONS}, got {}",
                self.max_iterations
            )));
        }
        if !(self.coefficient > 0.0 && self.coefficient <= MAX_STABLE_COEFFICIENT) {
            return Err(HtsError::configuration(format!(
                "diffusion coefficient {} outside (0, {MAX_STABLE_COEFFICIENT}]",
                self.coefficient
            )));
        }
        self.shift.validate("shift")?;
        self.multiplier.validate("multiplier")?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiffusionFit {
    pub best_iteration: usize,
    pub shift: f64,
    pub multiplier: f64,
    /// Grid-search distance between the scaled map and the plate.
    pub distance: f64,
    pub matrix: WellMatrix,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiffusionOutcome {
    /// The flat map fits best: the plate shows no diffusion gradient and is
    /// left as is.
    NoGradient { pattern_distance: f64 },
    Corrected(DiffusionFit),
}

pub fn diffusion_model(
    matrix: &WellMatrix,
    config: &DiffusionConfig,
    cancel: Option<&CancelToken>,
) -> Result<DiffusionOutcome> {
    config.validate()?;
    let original = matrix.zeros_as_missing();
    let n_present = original.iter().filter(|v| !v.is_nan()).count();
    if n_present < 2 {
        return Err(HtsError::numerical(format!(
            "diffusion model needs at least 2 non-empty wells, got {n_present}"
        )));
    }
    let flat: Vec<f64> = original.iter().copied().collect();
    if !(stats::nan_std_dev(&flat, 0) > 0.0) {
        return Err(HtsError::numerical("plate has no variance"));
    }
    let real_z = zscore(&original);

    let (rows, cols) = matrix.shape();
    let maps = diffusion_maps(rows, cols, config.max_iterations, config.coefficient, cancel)?;
    let (best_iteration, pattern_distance) = best_iteration(&real_z, &maps, config.distance);

    if best_iteration == 0 {
        tracing::debug!(pattern_distance, "diffusion model: flat map fits best");
        return Ok(DiffusionOutcome::NoGradient { pattern_distance });
    }

    let map = &maps[best_iteration];
    let (shift, multiplier, distance) = grid_search(map, &original, config, cancel)?;

    let mut corrected = Array2::<f64>::zeros((rows, cols));
    for ((idx, &orig), &m) in original.indexed_iter().zip(map.iter()) {
        if orig.is_nan() {
            corrected[idx] = f64::NAN;
            continue;
        }
        let denom = m * multiplier + shift;
        if denom == 0.0 {
            return Err(HtsError::numerical(format!(
                "diffusion fit is zero at ({}, {})",
                idx.0, idx.1
            )));
        }
        corrected[idx] = orig / denom;
    }

    tracing::debug!(best_iteration, shift, multiplier, distance, "diffusion model fitted");
    Ok(DiffusionOutcome::Corrected(DiffusionFit {
        best_iteration,
        shift,
        multiplier,
        distance,
        matrix: WellMatrix::from_missing(matrix.format(), corrected)?,
    }))
}

/// Z-scored interiors: index 0 is the flat initial grid (all zeros), index
/// `k` the state after `k` stencil updates.
pub fn diffusion_maps(
    rows: usize,
    cols: usize,
    max_iterations: usize,
    coefficient: f64,
    cancel: Option<&CancelToken>,
) -> Result<Vec<Array2<f64>>> {
    let mut cur = Array2::<f64>::zeros((rows + 2, cols + 2));
    for ((i, j), v) in cur.indexed_iter_mut() {
        if i == 0 || j == 0 || i == rows + 1 || j == cols + 1 {
            *v = 1.0;
        }
    }

    let mut maps = Vec::with_capacity(max_iterations + 1);
    maps.push(zscore(&cur.slice(s![1..=rows, 1..=cols]).to_owned()));

    let mut next = cur.clone();
    for _ in 0..max_iterations {
        if let Some(token) = cancel {
            token.check()?;
        }
        for i in 1..=rows {
            for j in 1..=cols {
                let neighbors =
                    cur[[i - 1, j]] + cur[[i + 1, j]] + cur[[i, j - 1]] + cur[[i, j + 1]];
                next[[i, j]] = cur[[i, j]] + coefficient * (neighbors - 4.0 * cur[[i, j]]);
            }
        }
        std::mem::swap(&mut cur, &mut next);
        maps.push(zscore(&cur.slice(s![1..=rows, 1..=cols]).to_owned()));
    }
    Ok(maps)
}

/// Index of the map with the smallest full-matrix distance to `real_z`,
/// summed over non-missing wells. Ties keep the lowest index.
pub fn best_iteration(
    real_z: &Array2<f64>,
    maps: &[Array2<f64>],
    metric: DistanceMetric,
) -> (usize, f64) {
    let mut best = (0usize, f64::INFINITY);
    for (k, map) in maps.iter().enumerate() {
        let mut d = 0f64;
        for (&r, &m) in real_z.iter().zip(map.iter()) {
            if !r.is_nan() {
                d += metric.cell(m, r);
            }
        }
        if d < best.1 {
            best = (k, d);
        }
    }
    best
}

/// Distance between `map * multiplier + shift` and the non-missing wells of
/// `original`.
pub fn fit_distance(
    map: &Array2<f64>,
    original: &Array2<f64>,
    shift: f64,
    multiplier: f64,
    metric: DistanceMetric,
) -> f64 {
    let mut d = 0f64;
    for (&m, &o) in map.iter().zip(original.iter()) {
        if !o.is_nan() {
            d += metric.cell(m * multiplier + shift, o);
        }
    }
    d
}

/// Exhaustive (shift, multiplier) search. Ties keep the lowest shift, then
/// the lowest multiplier, independent of thread scheduling.
pub fn grid_search(
    map: &Array2<f64>,
    original: &Array2<f64>,
    config: &DiffusionConfig,
    cancel: Option<&CancelToken>,
) -> Result<(f64, f64, f64)> {
    let shifts = config.shift.values();
    let multipliers = config.multiplier.values();

    let per_shift = shifts
        .par_iter()
        .map(|&shift| -> Result<(f64, f64, f64)> {
            if let Some(token) = cancel {
                token.check()?;
            }
            let mut best = (f64::INFINITY, f64::NAN);
            for &multiplier in &multipliers {
                let d = fit_distance(map, original, shift, multiplier, config.distance);
                if d < best.0 {
                    best = (d, multiplier);
                }
            }
            Ok((shift, best.1, best.0))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut best = (f64::NAN, f64::NAN, f64::INFINITY);
    for (shift, multiplier, d) in per_shift {
        if d < best.2 {
            best = (shift, multiplier, d);
        }
    }
    if !best.2.is_finite() {
        return Err(HtsError::numerical("diffusion grid search found no finite fit"));
    }
    Ok(best)
}

fn zscore(values: &Array2<f64>) -> Array2<f64> {
    let flat: Vec<f64> = values.iter().copied().collect();
    let z = stats::nan_zscore(&flat, 0);
    Array2::from_shape_vec(values.dim(), z).unwrap_or_else(|_| Array2::zeros(values.dim()))
}

#[cfg(test)]
#[path = "../../tests/src_inline/correction/diffusion.rs"]
mod tests;
