use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::model::plate::Plate;
use crate::result::{ResultTable, ScoreMatrices};
use crate::score::{PlateQuality, plate_quality};

#[derive(Debug)]
pub struct Stage4Output {
    pub table: ResultTable,
    pub quality: Vec<PlateQuality>,
}

pub fn run_stage4(plate: &Plate, config: &AnalysisConfig, scores: &ScoreMatrices) -> Result<Stage4Output> {
    let table = ResultTable::build(plate.setup(), scores, config.aggregation)?;
    let quality = if plate.controls().positive.is_none() {
        tracing::debug!(plate = plate.name(), "no positive control, quality metrics skipped");
        Vec::new()
    } else {
        match plate_quality(plate, &config.feature, config.summary) {
            Ok(q) => q,
            Err(e) => {
                tracing::warn!(plate = plate.name(), error = %e, "quality metrics unavailable");
                Vec::new()
            }
        }
    };
    Ok(Stage4Output { table, quality })
}
