use super::*;
use crate::stats;
use crate::well::{PlateFormat, WellPos};

fn replicate(seed: u64, scale: f64) -> WellMatrix {
    WellMatrix::from_fn(PlateFormat::Plate96, |p| {
        let h = (p.row as u64 * 31 + p.col as u64 * 17 + seed * 13) % 97;
        scale * (h as f64 + 1.0)
    })
}

#[test]
fn test_sorted_values_match_across_replicates() {
    let a = replicate(1, 1.0);
    let b = replicate(2, 3.0);
    let c = replicate(3, 0.5);
    let out = quantile_normalize(&[&a, &b, &c]).unwrap();
    assert!(out.applied);
    let sorted: Vec<Vec<f64>> = out.matrices.iter().map(|m| stats::sorted(&m.to_vec())).collect();
    for rank in 0..96 {
        assert!((sorted[0][rank] - sorted[1][rank]).abs() < 1e-9);
        assert!((sorted[0][rank] - sorted[2][rank]).abs() < 1e-9);
    }
}

#[test]
fn test_rank_order_is_preserved() {
    let a = replicate(1, 1.0);
    let b = replicate(5, 2.0);
    let out = quantile_normalize(&[&a, &b]).unwrap();
    let p = WellPos::new(0, 0);
    let q = WellPos::new(3, 7);
    let before = a.get(p) < a.get(q);
    let after = out.matrices[0].get(p) < out.matrices[0].get(q);
    if a.get(p) != a.get(q) {
        assert_eq!(before, after);
    }
}

#[test]
fn test_known_small_case() {
    let format = PlateFormat::Custom { rows: 1, cols: 3 };
    let a = WellMatrix::from_rows(format, &[vec![5.0, 2.0, 3.0]]).unwrap();
    let b = WellMatrix::from_rows(format, &[vec![4.0, 1.0, 6.0]]).unwrap();
    let out = quantile_normalize(&[&a, &b]).unwrap();
    // Rank means: (2+1)/2, (3+4)/2, (5+6)/2.
    assert_eq!(out.matrices[0].to_vec(), vec![5.5, 1.5, 3.5]);
    assert_eq!(out.matrices[1].to_vec(), vec![3.5, 1.5, 5.5]);
}

#[test]
fn test_single_replicate_is_explicit_noop() {
    let a = replicate(1, 1.0);
    let out = quantile_normalize(&[&a]).unwrap();
    assert!(!out.applied);
    assert_eq!(out.matrices[0], a);
}

#[test]
fn test_shape_mismatch_and_empty() {
    let a = replicate(1, 1.0);
    let b = WellMatrix::zeros(PlateFormat::Plate384);
    assert!(matches!(quantile_normalize(&[&a, &b]), Err(HtsError::DataShape { .. })));
    assert!(matches!(quantile_normalize(&[]), Err(HtsError::Configuration(_))));
}
