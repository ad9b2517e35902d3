use serde::{Deserialize, Serialize};

use crate::correction::diffusion::DiffusionConfig;
use crate::correction::median_polish::MedianPolishConfig;
use crate::error::{HtsError, Result};
use crate::model::normalize::NormalizationMethod;
use crate::model::replicat::SummaryMethod;
use crate::result::AggregationPolicy;
use crate::score::{PositiveCellConfig, SsmdVariant, TStatVariant};

/// Spatial correction applied to every replicat summary of a plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CorrectionMethod {
    /// Summaries are scored as they are.
    None,
    DiffusionModel(DiffusionConfig),
    /// Median polish residuals.
    MedianPolish(MedianPolishConfig),
    BScore(MedianPolishConfig),
    BZScore(MedianPolishConfig),
    /// Shared value distribution across the plate's replicats.
    QuantileNormalization,
}

impl Default for CorrectionMethod {
    fn default() -> Self {
        CorrectionMethod::DiffusionModel(DiffusionConfig::default())
    }
}

/// Optional non-spatial transform of the raw feature before summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationStep {
    pub method: NormalizationMethod,
    #[serde(default)]
    pub log2: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub tstat: TStatVariant,
    pub ssmd: SsmdVariant,
    pub positive_cells: Option<PositiveCellConfig>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            tstat: TStatVariant::UnpairedWelch,
            ssmd: SsmdVariant::UnpairedMean,
            positive_cells: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub feature: String,
    /// Summary the correction and scores are computed on.
    pub summary: SummaryMethod,
    pub normalization: Option<NormalizationStep>,
    pub correction: CorrectionMethod,
    pub scoring: ScoringConfig,
    pub aggregation: AggregationPolicy,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            feature: String::new(),
            summary: SummaryMethod::Mean,
            normalization: None,
            correction: CorrectionMethod::default(),
            scoring: ScoringConfig::default(),
            aggregation: AggregationPolicy::PerWell,
        }
    }
}

impl AnalysisConfig {
    pub fn new(feature: impl Into<String>) -> Self {
        Self {
            feature: feature.into(),
            ..Self::default()
        }
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: AnalysisConfig = serde_json::from_str(text)
            .map_err(|e| HtsError::configuration(format!("invalid analysis config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| HtsError::Serialization(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.feature.trim().is_empty() {
            return Err(HtsError::configuration("analysis config needs a feature"));
        }
        match &self.correction {
            CorrectionMethod::DiffusionModel(cfg) => cfg.validate()?,
            CorrectionMethod::MedianPolish(cfg)
            | CorrectionMethod::BScore(cfg)
            | CorrectionMethod::BZScore(cfg) => {
                if cfg.max_iterations == 0 || !(cfg.epsilon >= 0.0) {
                    return Err(HtsError::configuration(format!(
                        "median polish needs iterations > 0 and epsilon >= 0, got {} and {}",
                        cfg.max_iterations, cfg.epsilon
                    )));
                }
            }
            CorrectionMethod::None | CorrectionMethod::QuantileNormalization => {}
        }
        if let Some(cells) = &self.scoring.positive_cells {
            if let Some(p) = cells.percentile {
                if !(0.0..=100.0).contains(&p) {
                    return Err(HtsError::configuration(format!(
                        "positive-cell percentile {p} outside [0, 100]"
                    )));
                }
            }
        }
        Ok(())
    }
}
