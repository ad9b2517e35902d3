//! Plate analysis: summarize, correct, score, tabulate.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;

use crate::config::AnalysisConfig;
use crate::correction::CancelToken;
use crate::error::{HtsError, Result};
use crate::model::plate::Plate;
use crate::model::screen::Screen;
use crate::result::ResultTable;
use crate::score::PlateQuality;

pub mod stage1_summarize;
pub mod stage2_correct;
pub mod stage3_score;
pub mod stage4_results;

use stage1_summarize::run_stage1;
use stage2_correct::{ReplicatCorrection, run_stage2};
use stage3_score::run_stage3;
use stage4_results::run_stage4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlateReport {
    pub plate: String,
    pub corrections: Vec<ReplicatCorrection>,
    pub quality: Vec<PlateQuality>,
    pub table: ResultTable,
}

impl PlateReport {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| HtsError::Serialization(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlateFailure {
    pub plate: String,
    pub error: HtsError,
}

#[derive(Debug, Default)]
pub struct ScreenReport {
    pub reports: BTreeMap<String, PlateReport>,
    pub failures: Vec<PlateFailure>,
}

pub fn analyze_plate(
    plate: &mut Plate,
    config: &AnalysisConfig,
    cancel: Option<&CancelToken>,
) -> Result<PlateReport> {
    config.validate()?;
    if let Some(token) = cancel {
        token.check()?;
    }
    tracing::info!(
        plate = plate.name(),
        replicats = plate.n_replicats(),
        feature = %config.feature,
        "analyzing plate"
    );

    let stage1 = run_stage1(plate, config)?;
    let stage2 = run_stage2(plate, config, cancel)?;
    tracing::debug!(plate = plate.name(), corrections = stage2.corrections.len(), "corrected");
    let scores = run_stage3(plate, config, stage1)?;
    let stage4 = run_stage4(plate, config, &scores)?;

    tracing::info!(plate = plate.name(), rows = stage4.table.len(), "plate analyzed");
    Ok(PlateReport {
        plate: plate.name().to_string(),
        corrections: stage2.corrections,
        quality: stage4.quality,
        table: stage4.table,
    })
}

impl Screen {
    /// Analyzes every plate in parallel. A failing plate is logged and
    /// recorded; the others still run. An invalid `config` or a precondition
    /// violation (component misuse, not bad data) fails the whole batch.
    pub fn analyze(&mut self, config: &AnalysisConfig, cancel: Option<&CancelToken>) -> Result<ScreenReport> {
        config.validate()?;
        let outcomes: Vec<(String, Result<PlateReport>)> = self
            .plates_map_mut()
            .par_iter_mut()
            .map(|(name, plate)| (name.clone(), analyze_plate(plate, config, cancel)))
            .collect();

        let mut report = ScreenReport::default();
        for (name, outcome) in outcomes {
            match outcome {
                Ok(r) => {
                    report.reports.insert(name, r);
                }
                Err(error @ HtsError::Precondition(_)) => return Err(error),
                Err(error) => {
                    tracing::error!(plate = %name, error = %error, "plate analysis failed");
                    report.failures.push(PlateFailure { plate: name, error });
                }
            }
        }
        tracing::info!(
            screen = self.name(),
            analyzed = report.reports.len(),
            failed = report.failures.len(),
            "screen analyzed"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/mod.rs"]
mod tests;
