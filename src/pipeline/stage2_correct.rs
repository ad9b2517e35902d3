use serde::Serialize;

use crate::config::{AnalysisConfig, CorrectionMethod};
use crate::correction::diffusion::{DiffusionOutcome, diffusion_model};
use crate::correction::median_polish::{b_score, bz_score, median_polish};
use crate::correction::quantile::quantile_normalize;
use crate::correction::{CancelToken, CorrectionKind};
use crate::error::Result;
use crate::model::matrix::WellMatrix;
use crate::model::plate::Plate;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum CorrectionDetail {
    None,
    NoGradient {
        pattern_distance: f64,
    },
    Diffusion {
        best_iteration: usize,
        shift: f64,
        multiplier: f64,
        distance: f64,
    },
    MedianPolish {
        iterations: usize,
        grand_effect: f64,
    },
    Quantile {
        applied: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicatCorrection {
    pub replicat: String,
    pub kind: CorrectionKind,
    pub detail: CorrectionDetail,
}

#[derive(Debug)]
pub struct Stage2Output {
    pub corrections: Vec<ReplicatCorrection>,
}

/// Corrects the configured summary of every replicat. All corrections are
/// computed before any is stored, so a failure or cancellation leaves the
/// plate unchanged.
pub fn run_stage2(
    plate: &mut Plate,
    config: &AnalysisConfig,
    cancel: Option<&CancelToken>,
) -> Result<Stage2Output> {
    let feature = config.feature.as_str();
    let method = config.summary;

    let mut computed: Vec<(String, WellMatrix, ReplicatCorrection)> = Vec::new();
    match &config.correction {
        CorrectionMethod::QuantileNormalization => {
            let summaries = plate
                .replicats()
                .map(|r| r.summary(feature, method))
                .collect::<Result<Vec<_>>>()?;
            let normalized = quantile_normalize(&summaries)?;
            let kind = if normalized.applied {
                CorrectionKind::QuantileNormalization
            } else {
                tracing::info!(plate = plate.name(), "single replicat: quantile normalization skipped");
                CorrectionKind::Identity
            };
            for (replicat, matrix) in plate.replicats().zip(normalized.matrices) {
                let name = replicat.name().to_string();
                let record = ReplicatCorrection {
                    replicat: name.clone(),
                    kind,
                    detail: CorrectionDetail::Quantile {
                        applied: normalized.applied,
                    },
                };
                computed.push((name, matrix, record));
            }
        }
        per_replicat => {
            for replicat in plate.replicats() {
                if let Some(token) = cancel {
                    token.check()?;
                }
                let summary = replicat.summary(feature, method)?;
                let (matrix, kind, detail) = correct_one(summary, per_replicat, cancel)?;
                if matches!(detail, CorrectionDetail::NoGradient { .. }) {
                    tracing::info!(
                        plate = plate.name(),
                        replicat = replicat.name(),
                        "no diffusion gradient, summary kept"
                    );
                }
                let name = replicat.name().to_string();
                let record = ReplicatCorrection {
                    replicat: name.clone(),
                    kind,
                    detail,
                };
                computed.push((name, matrix, record));
            }
        }
    }

    let mut corrections = Vec::with_capacity(computed.len());
    for (name, matrix, record) in computed {
        if let Some(replicat) = plate.replicat_mut(&name) {
            replicat.set_corrected(feature, method, record.kind, matrix)?;
        }
        corrections.push(record);
    }
    Ok(Stage2Output { corrections })
}

fn correct_one(
    summary: &WellMatrix,
    correction: &CorrectionMethod,
    cancel: Option<&CancelToken>,
) -> Result<(WellMatrix, CorrectionKind, CorrectionDetail)> {
    Ok(match correction {
        CorrectionMethod::None | CorrectionMethod::QuantileNormalization => {
            (summary.clone(), CorrectionKind::Identity, CorrectionDetail::None)
        }
        CorrectionMethod::DiffusionModel(cfg) => match diffusion_model(summary, cfg, cancel)? {
            DiffusionOutcome::NoGradient { pattern_distance } => (
                summary.clone(),
                CorrectionKind::Identity,
                CorrectionDetail::NoGradient { pattern_distance },
            ),
            DiffusionOutcome::Corrected(fit) => (
                fit.matrix,
                CorrectionKind::DiffusionModel,
                CorrectionDetail::Diffusion {
                    best_iteration: fit.best_iteration,
                    shift: fit.shift,
                    multiplier: fit.multiplier,
                    distance: fit.distance,
                },
            ),
        },
        CorrectionMethod::MedianPolish(cfg) => {
            let fit = median_polish(summary, cfg)?;
            (
                fit.residuals,
                CorrectionKind::MedianPolish,
                CorrectionDetail::MedianPolish {
                    iterations: fit.iterations,
                    grand_effect: fit.grand_effect,
                },
            )
        }
        CorrectionMethod::BScore(cfg) => {
            (b_score(summary, cfg)?, CorrectionKind::BScore, CorrectionDetail::None)
        }
        CorrectionMethod::BZScore(cfg) => {
            (bz_score(summary, cfg)?, CorrectionKind::BZScore, CorrectionDetail::None)
        }
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_correct.rs"]
mod tests;
