use super::*;

use std::collections::BTreeMap;

use crate::correction::CorrectionKind;
use crate::error::HtsError;
use crate::model::plate::Controls;
use crate::model::replicat::Replicat;
use crate::model::setup::PlateSetup;
use crate::model::table::RawTable;
use crate::well::{PlateFormat, label_to_index};

const NEG_A: [[f64; 4]; 2] = [[1.0, 3.0, 10.0, 5.0], [2.0, 4.0, 10.0, 50.0]];
const NEG_B: [[f64; 4]; 2] = [[3.0, 1.0, 12.0, 5.0], [4.0, 2.0, 14.0, 52.0]];

fn format() -> PlateFormat {
    PlateFormat::from_shape(2, 4)
}

fn pos(label: &str) -> WellPos {
    label_to_index(label, format()).unwrap()
}

fn plate(replicates: &[[[f64; 4]; 2]], corrected: bool) -> Plate {
    let setup = PlateSetup::from_labels(
        format(),
        &[
            ("A1", "NEG"),
            ("A2", "NEG"),
            ("B1", "NEG"),
            ("B2", "NEG"),
            ("A3", "G1"),
            ("B3", "G1"),
            ("A4", "G2"),
            ("B4", "POS"),
        ],
    )
    .unwrap();
    let mut plate = Plate::new("p1", setup, Controls::new("NEG").with_positive("POS"));
    for (i, rows) in replicates.iter().enumerate() {
        let table = RawTable::new(Vec::new(), BTreeMap::new()).unwrap();
        let mut rep = Replicat::new(format!("r{i}"), format(), table).unwrap();
        if corrected {
            let rows: Vec<Vec<f64>> = rows.iter().map(|r| r.to_vec()).collect();
            let matrix = WellMatrix::from_rows(format(), &rows).unwrap();
            rep.set_corrected("f", SummaryMethod::Mean, CorrectionKind::Identity, matrix)
                .unwrap();
        }
        plate.add_replicat(rep).unwrap();
    }
    plate
}

#[test]
fn test_welch_matches_manual_computation() {
    let p = plate(&[NEG_A, NEG_B], true);
    let t = t_statistic(&p, "f", SummaryMethod::Mean, TStatVariant::UnpairedWelch).unwrap();
    // Control pool mean 2.5, sample variance 10/7; well A3 is [10, 12].
    let expected = 8.5 / (2.0 / 2.0 + (10.0 / 7.0) / 8.0_f64).sqrt();
    assert!((t.get(pos("A3")) - expected).abs() < 1e-9);
    assert!(t.get(pos("B4")) > t.get(pos("A3")));
}

#[test]
fn test_welch_equals_pooled_for_equal_variances() {
    // Sizes 2 and 5 with both sample variances equal to 2.
    let a = [1.0, 3.0];
    let scale = 0.8_f64.sqrt();
    let b: Vec<f64> = [0.0, 1.0, 2.0, 3.0, 4.0].iter().map(|v| v * scale).collect();
    assert!((stats::variance(&b, 1) - 2.0).abs() < 1e-12);
    let welch = welch_t(&a, &b);
    assert!((welch - pooled_t(&a, &b)).abs() < 1e-12);
    assert!((welch - (2.0 - 2.0 * scale) / 1.4_f64.sqrt()).abs() < 1e-12);

    // Unequal variances at unequal sizes pull the two apart.
    let wide = [0.0, 4.0];
    assert!((welch_t(&wide, &b) - pooled_t(&wide, &b)).abs() > 1e-3);
}

#[test]
fn test_welch_and_pooled_agree_in_sign_on_plate() {
    let p = plate(&[NEG_A, NEG_B], true);
    let welch = t_statistic(&p, "f", SummaryMethod::Mean, TStatVariant::UnpairedWelch).unwrap();
    let pooled =
        t_statistic(&p, "f", SummaryMethod::Mean, TStatVariant::UnpairedEqualVariance).unwrap();
    // 2 well values against 8 control values: same sign, different scale.
    assert!(welch.get(pos("A3")).signum() == pooled.get(pos("A3")).signum());
}

#[test]
fn test_sign_is_well_minus_control() {
    assert!(welch_t(&[0.0, 1.0], &[5.0, 6.0, 7.0]) < 0.0);
    assert!(welch_t(&[9.0, 10.0], &[5.0, 6.0, 7.0]) > 0.0);
}

#[test]
fn test_paired_uses_per_replicate_control_median() {
    let p = plate(&[NEG_A, NEG_B], true);
    let t = t_statistic(&p, "f", SummaryMethod::Mean, TStatVariant::Paired).unwrap();
    // Both control medians are 2.5: A3 residuals are [7.5, 9.5].
    assert!((t.get(pos("A3")) - 8.5).abs() < 1e-9);
    // A4 residuals are identical, so the paired statistic is undefined.
    assert!(t.get(pos("A4")).is_nan());
}

#[test]
fn test_needs_two_replicates() {
    let p = plate(&[NEG_A], true);
    let err = t_statistic(&p, "f", SummaryMethod::Mean, TStatVariant::UnpairedWelch).unwrap_err();
    assert!(matches!(err, HtsError::Configuration(_)));
}

#[test]
fn test_needs_spatial_correction() {
    let p = plate(&[NEG_A, NEG_B], false);
    let err = t_statistic(&p, "f", SummaryMethod::Mean, TStatVariant::UnpairedWelch).unwrap_err();
    assert!(matches!(err, HtsError::Precondition(_)));
}

#[test]
fn test_constant_control_is_numerical_error() {
    let flat = [[2.0, 2.0, 10.0, 5.0], [2.0, 2.0, 10.0, 50.0]];
    let p = plate(&[flat, flat], true);
    let err = t_statistic(&p, "f", SummaryMethod::Mean, TStatVariant::UnpairedWelch).unwrap_err();
    assert!(matches!(err, HtsError::Numerical(_)));
}

#[test]
fn test_unknown_negative_control_is_configuration_error() {
    let mut p = plate(&[NEG_A, NEG_B], true);
    p.set_controls(Controls::new("MISSING"));
    let err = t_statistic(&p, "f", SummaryMethod::Mean, TStatVariant::UnpairedWelch).unwrap_err();
    assert!(matches!(err, HtsError::Configuration(_)));
}

#[test]
fn test_paired_single_well_control_is_numerical_error() {
    let mut p = plate(&[NEG_A, NEG_B], true);
    // G2 occupies A4 only.
    p.set_controls(Controls::new("G2"));
    let err = t_statistic(&p, "f", SummaryMethod::Mean, TStatVariant::Paired).unwrap_err();
    assert!(matches!(err, HtsError::Numerical(_)));
}
