use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::model::plate::Plate;
use crate::model::table::DataKind;
use crate::pipeline::stage1_summarize::Stage1Output;
use crate::result::ScoreMatrices;
use crate::score::{cell_count_stats, percent_positive_stats, ssmd, t_statistic, viability_toxicity};

/// Scores every well of a corrected plate. Cell-level columns are filled
/// only when every replicat holds single-cell data.
pub fn run_stage3(plate: &Plate, config: &AnalysisConfig, stage1: Stage1Output) -> Result<ScoreMatrices> {
    let feature = config.feature.as_str();
    let tstat = t_statistic(plate, feature, config.summary, config.scoring.tstat)?;
    let ssmd_matrix = ssmd(plate, feature, config.summary, config.scoring.ssmd)?;

    let single_cell = plate.replicats().all(|r| r.table().kind() == DataKind::SingleCell);
    let (cells_count, viability, toxicity) = if single_cell {
        let counts = cell_count_stats(plate)?;
        let (viability, toxicity) = viability_toxicity(plate, &counts)?;
        (Some(counts), Some(viability), toxicity)
    } else {
        (None, None, None)
    };

    let positive_cells = match &config.scoring.positive_cells {
        Some(cells) => Some(percent_positive_stats(plate, cells)?),
        None => None,
    };

    Ok(ScoreMatrices {
        cells_count,
        positive_cells,
        mean: Some(stage1.mean),
        median: Some(stage1.median),
        viability,
        toxicity,
        ssmd: Some(ssmd_matrix),
        tstat: Some(tstat),
    })
}
