use super::*;

use std::collections::BTreeMap;

use crate::correction::CorrectionKind;
use crate::error::HtsError;
use crate::model::plate::Controls;
use crate::model::replicat::Replicat;
use crate::model::setup::PlateSetup;
use crate::model::table::RawTable;
use crate::well::{PlateFormat, WellPos, label_to_index};

fn format() -> PlateFormat {
    PlateFormat::from_shape(2, 4)
}

fn pos(label: &str) -> WellPos {
    label_to_index(label, format()).unwrap()
}

fn plate(replicates: &[[[f64; 4]; 2]]) -> Plate {
    let setup = PlateSetup::from_labels(
        format(),
        &[("A1", "NEG"), ("A2", "NEG"), ("B1", "NEG"), ("B2", "NEG"), ("A3", "G1"), ("B3", "G1")],
    )
    .unwrap();
    let mut plate = Plate::new("p1", setup, Controls::new("NEG"));
    for (i, rows) in replicates.iter().enumerate() {
        let table = RawTable::new(Vec::new(), BTreeMap::new()).unwrap();
        let mut rep = Replicat::new(format!("r{i}"), format(), table).unwrap();
        let rows: Vec<Vec<f64>> = rows.iter().map(|r| r.to_vec()).collect();
        let matrix = WellMatrix::from_rows(format(), &rows).unwrap();
        rep.set_corrected("f", SummaryMethod::Mean, CorrectionKind::Identity, matrix)
            .unwrap();
        plate.add_replicat(rep).unwrap();
    }
    plate
}

fn two_replicates() -> Plate {
    plate(&[
        [[1.0, 3.0, 10.0, 5.0], [2.0, 4.0, 10.0, 50.0]],
        [[3.0, 1.0, 12.0, 5.0], [4.0, 2.0, 14.0, 52.0]],
    ])
}

#[test]
fn test_unpaired_mean_ssmd() {
    let s = ssmd(&two_replicates(), "f", SummaryMethod::Mean, SsmdVariant::UnpairedMean).unwrap();
    let expected = 8.5 / (2.0 + 10.0 / 7.0_f64).sqrt();
    assert!((s.get(pos("A3")) - expected).abs() < 1e-9);
}

#[test]
fn test_robust_ssmd_uses_median_and_mad() {
    let s = ssmd(&two_replicates(), "f", SummaryMethod::Mean, SsmdVariant::UnpairedRobust).unwrap();
    // Control median 2.5 and MAD 1; A3 median 11 and MAD 1.
    let expected = 8.5 / (MAD_SCALE * 2.0_f64.sqrt());
    assert!((s.get(pos("A3")) - expected).abs() < 1e-9);
}

#[test]
fn test_paired_ssmd() {
    let s = ssmd(&two_replicates(), "f", SummaryMethod::Mean, SsmdVariant::Paired).unwrap();
    assert!((s.get(pos("A3")) - 8.5 / 2.0_f64.sqrt()).abs() < 1e-9);
    assert!(s.get(pos("A4")).is_nan());
}

#[test]
fn test_robust_zero_mad_control_is_numerical_error() {
    let p = plate(&[
        [[2.0, 2.0, 10.0, 5.0], [2.0, 5.0, 10.0, 50.0]],
        [[2.0, 2.0, 12.0, 5.0], [2.0, 5.0, 14.0, 52.0]],
    ]);
    let err = ssmd(&p, "f", SummaryMethod::Mean, SsmdVariant::UnpairedRobust).unwrap_err();
    assert!(matches!(err, HtsError::Numerical(_)));
    assert!(ssmd(&p, "f", SummaryMethod::Mean, SsmdVariant::UnpairedMean).is_ok());
}

#[test]
fn test_paired_constant_control_is_numerical_error() {
    let p = plate(&[
        [[2.0, 2.0, 10.0, 5.0], [2.0, 2.0, 10.0, 50.0]],
        [[2.0, 2.0, 12.0, 5.0], [2.0, 2.0, 14.0, 52.0]],
    ]);
    let err = ssmd(&p, "f", SummaryMethod::Mean, SsmdVariant::Paired).unwrap_err();
    assert!(matches!(err, HtsError::Numerical(_)));
}
