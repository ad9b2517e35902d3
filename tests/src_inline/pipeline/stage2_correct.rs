use super::*;

use std::collections::BTreeMap;

use crate::correction::median_polish::MedianPolishConfig;
use crate::error::HtsError;
use crate::model::plate::Controls;
use crate::model::replicat::{Replicat, SummaryMethod};
use crate::model::setup::PlateSetup;
use crate::model::table::RawTable;
use crate::well::PlateFormat;

fn plate() -> Plate {
    let format = PlateFormat::from_shape(2, 3);
    let setup = PlateSetup::from_labels(format, &[("A1", "NEG"), ("B1", "NEG")]).unwrap();
    let mut plate = Plate::new("p1", setup, Controls::new("NEG"));
    let labels = ["A1", "A2", "A3", "B1", "B2", "B3"];
    for (name, values) in [
        ("r1", [1.0, 2.0, 3.0, 4.0, 5.0, 7.0]),
        ("r2", [2.0, 4.0, 6.0, 8.0, 10.0, 12.0]),
    ] {
        let mut features = BTreeMap::new();
        features.insert("f".to_string(), values.to_vec());
        let table = RawTable::from_labels(format, &labels, features).unwrap();
        let mut rep = Replicat::new(name, format, table).unwrap();
        rep.compute_well_summary("f", SummaryMethod::Mean).unwrap();
        plate.add_replicat(rep).unwrap();
    }
    plate
}

fn config(correction: CorrectionMethod) -> AnalysisConfig {
    AnalysisConfig {
        correction,
        ..AnalysisConfig::new("f")
    }
}

#[test]
fn test_no_correction_copies_summary() {
    let mut p = plate();
    let out = run_stage2(&mut p, &config(CorrectionMethod::None), None).unwrap();
    assert_eq!(out.corrections.len(), 2);
    for rep in p.replicats() {
        assert_eq!(rep.correction(), Some(CorrectionKind::Identity));
        assert_eq!(
            rep.corrected("f", SummaryMethod::Mean).unwrap(),
            rep.summary("f", SummaryMethod::Mean).unwrap()
        );
    }
}

#[test]
fn test_quantile_normalization_across_replicats() {
    let mut p = plate();
    let out = run_stage2(&mut p, &config(CorrectionMethod::QuantileNormalization), None).unwrap();
    assert!(out.corrections.iter().all(|c| c.detail == CorrectionDetail::Quantile { applied: true }));
    let r1 = p.replicat("r1").unwrap().corrected("f", SummaryMethod::Mean).unwrap().to_vec();
    let r2 = p.replicat("r2").unwrap().corrected("f", SummaryMethod::Mean).unwrap().to_vec();
    // Both replicats are already in the same rank order.
    assert_eq!(r1, r2);
    assert_eq!(r1, vec![1.5, 3.0, 4.5, 6.0, 7.5, 9.5]);
}

#[test]
fn test_median_polish_stores_residuals() {
    let mut p = plate();
    let cfg = config(CorrectionMethod::MedianPolish(MedianPolishConfig::default()));
    let out = run_stage2(&mut p, &cfg, None).unwrap();
    assert!(matches!(out.corrections[0].detail, CorrectionDetail::MedianPolish { .. }));
    assert_eq!(
        p.replicat("r1").unwrap().correction(),
        Some(CorrectionKind::MedianPolish)
    );
}

#[test]
fn test_cancellation_leaves_plate_unchanged() {
    let mut p = plate();
    let token = CancelToken::new();
    token.cancel();
    let err = run_stage2(&mut p, &config(CorrectionMethod::default()), Some(&token)).unwrap_err();
    assert_eq!(err, HtsError::Cancelled);
    assert!(p.replicats().all(|r| !r.is_spatial_normalized()));
}

#[test]
fn test_missing_summary_is_precondition_error() {
    let mut p = plate();
    let mut cfg = config(CorrectionMethod::None);
    cfg.summary = SummaryMethod::Median;
    assert!(matches!(
        run_stage2(&mut p, &cfg, None),
        Err(HtsError::Precondition(_))
    ));
}
