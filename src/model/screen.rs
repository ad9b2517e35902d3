use std::collections::BTreeMap;

use crate::correction::CorrectionKind;
use crate::correction::background::{estimate_background, subtract_background};
use crate::error::{HtsError, Result};
use crate::model::matrix::WellMatrix;
use crate::model::plate::{Controls, Plate};
use crate::model::replicat::SummaryMethod;
use crate::well::PlateFormat;

/// A named set of plates. Plates are added, never removed.
#[derive(Debug, Clone)]
pub struct Screen {
    name: String,
    plates: BTreeMap<String, Plate>,
    default_controls: Controls,
    default_format: PlateFormat,
}

impl Screen {
    pub fn new(name: impl Into<String>, default_controls: Controls, default_format: PlateFormat) -> Self {
        Self {
            name: name.into(),
            plates: BTreeMap::new(),
            default_controls,
            default_format,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_controls(&self) -> &Controls {
        &self.default_controls
    }

    pub fn default_format(&self) -> PlateFormat {
        self.default_format
    }

    pub fn add_plate(&mut self, plate: Plate) -> Result<()> {
        if self.plates.contains_key(plate.name()) {
            return Err(HtsError::configuration(format!(
                "screen {}: duplicate plate {}",
                self.name,
                plate.name()
            )));
        }
        if plate.format().shape() != self.default_format.shape() {
            tracing::warn!(
                screen = %self.name,
                plate = plate.name(),
                "plate format differs from the screen default"
            );
        }
        self.plates.insert(plate.name().to_string(), plate);
        Ok(())
    }

    pub fn plate(&self, name: &str) -> Option<&Plate> {
        self.plates.get(name)
    }

    pub fn plate_mut(&mut self, name: &str) -> Option<&mut Plate> {
        self.plates.get_mut(name)
    }

    pub fn plates(&self) -> impl Iterator<Item = &Plate> {
        self.plates.values()
    }

    pub fn n_plates(&self) -> usize {
        self.plates.len()
    }

    pub(crate) fn plates_map_mut(&mut self) -> &mut BTreeMap<String, Plate> {
        &mut self.plates
    }

    /// Estimates a per-well background surface from every replicat of every
    /// plate and subtracts it from each replicat's summary.
    pub fn background_correction(&mut self, feature: &str, method: SummaryMethod) -> Result<WellMatrix> {
        let mut summaries = Vec::new();
        for plate in self.plates.values_mut() {
            for replicat in plate.replicats_mut() {
                summaries.push(replicat.summary_or_compute(feature, method)?.clone());
            }
        }
        let refs: Vec<&WellMatrix> = summaries.iter().collect();
        let background = estimate_background(&refs)?;

        let mut corrected = Vec::with_capacity(summaries.len());
        for summary in &summaries {
            corrected.push(subtract_background(summary, &background)?);
        }
        let mut corrected = corrected.into_iter();
        for plate in self.plates.values_mut() {
            for replicat in plate.replicats_mut() {
                if let Some(matrix) = corrected.next() {
                    replicat.set_corrected(feature, method, CorrectionKind::Background, matrix)?;
                }
            }
        }
        tracing::info!(
            screen = %self.name,
            feature,
            n_replicats = summaries.len(),
            "applied background correction"
        );
        Ok(background)
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/screen.rs"]
mod tests;
