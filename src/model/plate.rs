use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{HtsError, Result};
use crate::model::normalize::NormalizationMethod;
use crate::model::replicat::Replicat;
use crate::model::setup::PlateSetup;
use crate::well::{PlateFormat, WellPos};

/// Reference genes of a plate or screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Controls {
    pub negative: String,
    #[serde(default)]
    pub positive: Option<String>,
    #[serde(default)]
    pub toxicity: Option<String>,
    /// Percentile of the negative-control cell distribution used as the
    /// positive-cell threshold.
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

fn default_threshold() -> f64 {
    50.0
}

impl Controls {
    pub fn new(negative: impl Into<String>) -> Self {
        Self {
            negative: negative.into(),
            positive: None,
            toxicity: None,
            threshold: default_threshold(),
        }
    }

    pub fn with_positive(mut self, gene: impl Into<String>) -> Self {
        self.positive = Some(gene.into());
        self
    }

    pub fn with_toxicity(mut self, gene: impl Into<String>) -> Self {
        self.toxicity = Some(gene.into());
        self
    }

    pub fn with_threshold(mut self, percentile: f64) -> Self {
        self.threshold = percentile;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Plate {
    name: String,
    setup: PlateSetup,
    replicats: BTreeMap<String, Replicat>,
    controls: Controls,
}

impl Plate {
    pub fn new(name: impl Into<String>, setup: PlateSetup, controls: Controls) -> Self {
        Self {
            name: name.into(),
            setup,
            replicats: BTreeMap::new(),
            controls,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn setup(&self) -> &PlateSetup {
        &self.setup
    }

    pub fn format(&self) -> PlateFormat {
        self.setup.format()
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn set_controls(&mut self, controls: Controls) {
        self.controls = controls;
    }

    pub fn add_replicat(&mut self, replicat: Replicat) -> Result<()> {
        if replicat.format().shape() != self.format().shape() {
            return Err(HtsError::shape(self.format().shape(), replicat.format().shape()));
        }
        if self.replicats.contains_key(replicat.name()) {
            return Err(HtsError::configuration(format!(
                "plate {}: duplicate replicat {}",
                self.name,
                replicat.name()
            )));
        }
        self.replicats.insert(replicat.name().to_string(), replicat);
        Ok(())
    }

    pub fn replicat(&self, name: &str) -> Option<&Replicat> {
        self.replicats.get(name)
    }

    pub fn replicat_mut(&mut self, name: &str) -> Option<&mut Replicat> {
        self.replicats.get_mut(name)
    }

    pub fn replicats(&self) -> impl Iterator<Item = &Replicat> {
        self.replicats.values()
    }

    pub fn replicats_mut(&mut self) -> impl Iterator<Item = &mut Replicat> {
        self.replicats.values_mut()
    }

    pub fn n_replicats(&self) -> usize {
        self.replicats.len()
    }

    pub fn negative_positions(&self) -> Result<Vec<WellPos>> {
        self.setup.positions_of(&self.controls.negative)
    }

    pub fn positive_positions(&self) -> Result<Option<Vec<WellPos>>> {
        self.controls
            .positive
            .as_deref()
            .map(|g| self.setup.positions_of(g))
            .transpose()
    }

    pub fn toxicity_positions(&self) -> Result<Option<Vec<WellPos>>> {
        self.controls
            .toxicity
            .as_deref()
            .map(|g| self.setup.positions_of(g))
            .transpose()
    }

    /// Applies a non-spatial transform to `feature` in every replicat,
    /// resolving control wells from the setup. Nothing changes on failure.
    pub fn normalize(
        &mut self,
        feature: &str,
        method: NormalizationMethod,
        log2: bool,
    ) -> Result<()> {
        let negative = match method {
            NormalizationMethod::PercentOfControl
            | NormalizationMethod::NormalizedPercentInhibition => self.negative_positions()?,
            _ => Vec::new(),
        };
        let positive = match method {
            NormalizationMethod::NormalizedPercentInhibition => {
                self.positive_positions()?.ok_or_else(|| {
                    HtsError::configuration(format!(
                        "plate {}: normalized percent inhibition needs a positive control",
                        self.name
                    ))
                })?
            }
            _ => Vec::new(),
        };
        let mut updated = self.replicats.clone();
        for replicat in updated.values_mut() {
            replicat.normalize(feature, method, log2, &negative, &positive)?;
        }
        self.replicats = updated;
        Ok(())
    }

    /// Independent copy of a rectangular sub-region; nothing is shared with
    /// the parent plate.
    pub fn region(&self, rows: Range<usize>, cols: Range<usize>) -> Result<Plate> {
        let setup = self.setup.slice_region(rows.clone(), cols.clone())?;
        let mut replicats = BTreeMap::new();
        for (name, replicat) in &self.replicats {
            replicats.insert(name.clone(), replicat.slice_region(&rows, &cols)?);
        }
        Ok(Plate {
            name: format!(
                "{}[{}..{},{}..{}]",
                self.name, rows.start, rows.end, cols.start, cols.end
            ),
            setup,
            replicats,
            controls: self.controls.clone(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/plate.rs"]
mod tests;
