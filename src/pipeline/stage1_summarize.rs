use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::model::matrix::WellMatrix;
use crate::model::plate::Plate;
use crate::model::replicat::SummaryMethod;
use crate::score::{ReplicateStats, across_replicates};

#[derive(Debug)]
pub struct Stage1Output {
    pub mean: ReplicateStats,
    pub median: ReplicateStats,
}

/// Optional raw-feature normalization, then mean and median summaries for
/// every replicat.
pub fn run_stage1(plate: &mut Plate, config: &AnalysisConfig) -> Result<Stage1Output> {
    if let Some(step) = &config.normalization {
        plate.normalize(&config.feature, step.method, step.log2)?;
    }

    let mut means: Vec<WellMatrix> = Vec::with_capacity(plate.n_replicats());
    let mut medians: Vec<WellMatrix> = Vec::with_capacity(plate.n_replicats());
    for replicat in plate.replicats_mut() {
        means.push(replicat.compute_well_summary(&config.feature, SummaryMethod::Mean)?.clone());
        medians.push(replicat.compute_well_summary(&config.feature, SummaryMethod::Median)?.clone());
    }

    Ok(Stage1Output {
        mean: across_replicates(&means)?,
        median: across_replicates(&medians)?,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_summarize.rs"]
mod tests;
