use super::*;

use std::collections::BTreeMap;

use crate::model::plate::Controls;
use crate::model::setup::PlateSetup;
use crate::model::table::RawTable;
use crate::well::{PlateFormat, label_to_index};

fn format() -> PlateFormat {
    PlateFormat::from_shape(1, 3)
}

fn pos(label: &str) -> WellPos {
    label_to_index(label, format()).unwrap()
}

fn cells(name: &str, rows: &[(&str, f64)]) -> Replicat {
    let labels: Vec<&str> = rows.iter().map(|(l, _)| *l).collect();
    let mut features = BTreeMap::new();
    features.insert("int".to_string(), rows.iter().map(|(_, v)| *v).collect());
    let table = RawTable::from_labels(format(), &labels, features).unwrap();
    Replicat::new(name, format(), table).unwrap()
}

fn plate(controls: Controls) -> Plate {
    let setup =
        PlateSetup::from_labels(format(), &[("A1", "NEG"), ("A2", "G1"), ("A3", "TOX")]).unwrap();
    let mut plate = Plate::new("p1", setup, controls);
    plate
        .add_replicat(cells(
            "r1",
            &[
                ("A1", 1.0),
                ("A1", 2.0),
                ("A1", 3.0),
                ("A1", 4.0),
                ("A2", 1.0),
                ("A2", 3.0),
                ("A2", 5.0),
                ("A2", 7.0),
            ],
        ))
        .unwrap();
    plate
        .add_replicat(cells(
            "r2",
            &[
                ("A1", 1.0),
                ("A1", 2.0),
                ("A1", 3.0),
                ("A1", 4.0),
                ("A2", 5.0),
                ("A2", 7.0),
            ],
        ))
        .unwrap();
    plate
}

#[test]
fn test_percent_positive_above_and_below() {
    let p = plate(Controls::new("NEG"));
    let neg = p.negative_positions().unwrap();
    let rep = p.replicat("r1").unwrap();

    let above = percent_positive(rep, "int", &neg, 50.0, Direction::Above).unwrap();
    assert_eq!(above.get(pos("A1")), 50.0);
    assert_eq!(above.get(pos("A2")), 75.0);
    assert_eq!(above.get(pos("A3")), 0.0);

    let below = percent_positive(rep, "int", &neg, 50.0, Direction::Below).unwrap();
    assert_eq!(below.get(pos("A2")), 25.0);
}

#[test]
fn test_percent_positive_stats_across_replicates() {
    let p = plate(Controls::new("NEG"));
    let stats = percent_positive_stats(&p, &PositiveCellConfig::new("int")).unwrap();
    assert_eq!(stats.mean.get(pos("A2")), 87.5);
    assert_eq!(stats.sd.get(pos("A2")), 12.5);
}

#[test]
fn test_percent_positive_uses_plate_threshold() {
    let p = plate(Controls::new("NEG").with_threshold(100.0));
    let stats = percent_positive_stats(&p, &PositiveCellConfig::new("int")).unwrap();
    // Above the largest control cell (4): r1 has 2 of 4, r2 2 of 2.
    assert_eq!(stats.mean.get(pos("A2")), 75.0);
}

#[test]
fn test_percent_positive_needs_single_cell_data() {
    let mut features = BTreeMap::new();
    features.insert("int".to_string(), vec![1.0, 2.0]);
    let table = RawTable::from_labels(format(), &["A1", "A2"], features).unwrap();
    let rep = Replicat::new("r", format(), table).unwrap();
    let err = percent_positive(&rep, "int", &[pos("A1")], 50.0, Direction::Above).unwrap_err();
    assert!(matches!(err, HtsError::Configuration(_)));
}

#[test]
fn test_cell_counts_and_viability() {
    let p = plate(Controls::new("NEG").with_toxicity("TOX"));
    let counts = cell_count_stats(&p).unwrap();
    assert_eq!(counts.mean.get(pos("A2")), 3.0);
    assert_eq!(counts.sd.get(pos("A2")), 1.0);
    assert_eq!(counts.mean.get(pos("A3")), 0.0);

    let (viability, toxicity) = viability_toxicity(&p, &counts).unwrap();
    assert_eq!(viability.get(pos("A1")), 100.0);
    assert_eq!(viability.get(pos("A2")), 75.0);
    let toxicity = toxicity.unwrap();
    assert_eq!(toxicity.get(pos("A1")), 0.0);
    assert_eq!(toxicity.get(pos("A2")), 25.0);
    assert_eq!(toxicity.get(pos("A3")), 100.0);
}

#[test]
fn test_no_toxicity_without_control() {
    let p = plate(Controls::new("NEG"));
    let counts = cell_count_stats(&p).unwrap();
    let (_, toxicity) = viability_toxicity(&p, &counts).unwrap();
    assert!(toxicity.is_none());
}

#[test]
fn test_empty_negative_control_is_numerical_error() {
    let p = plate(Controls::new("TOX"));
    let counts = cell_count_stats(&p).unwrap();
    let err = viability_toxicity(&p, &counts).unwrap_err();
    assert!(matches!(err, HtsError::Numerical(_)));
}
