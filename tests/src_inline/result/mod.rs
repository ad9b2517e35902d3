use super::*;

fn format() -> PlateFormat {
    PlateFormat::from_shape(1, 4)
}

fn setup() -> PlateSetup {
    PlateSetup::from_labels(format(), &[("A1", "NEG"), ("A2", "G1"), ("A4", "G1")]).unwrap()
}

fn matrix(values: [f64; 4]) -> WellMatrix {
    WellMatrix::from_rows(format(), &[values.to_vec()]).unwrap()
}

fn scores() -> ScoreMatrices {
    ScoreMatrices {
        mean: Some(ReplicateStats {
            mean: matrix([1.0, 2.0, 3.0, 4.0]),
            sd: matrix([0.1, 0.2, 0.3, 0.4]),
        }),
        tstat: Some(matrix([0.0, 5.0, 9.0, f64::NAN])),
        ssmd: Some(matrix([0.0, 1.0, 2.0, 3.0])),
        ..ScoreMatrices::default()
    }
}

#[test]
fn test_rows_skip_unannotated_wells() {
    let table = ResultTable::build(&setup(), &scores(), AggregationPolicy::PerWell).unwrap();
    let wells: Vec<&str> = table.rows().iter().map(|r| r.well.as_str()).collect();
    assert_eq!(wells, vec!["A1", "A2", "A4"]);
    assert_eq!(table.columns().len(), 14);

    let a2 = table.row_for_well("a02").unwrap();
    assert_eq!(a2.gene_name, "G1");
    assert_eq!(a2.mean, Some(2.0));
    assert_eq!(a2.std, Some(0.2));
    assert_eq!(a2.cells_count, None);
    assert!(table.row_for_well("A3").is_none());
}

#[test]
fn test_undefined_scores_are_none() {
    let table = ResultTable::build(&setup(), &scores(), AggregationPolicy::PerWell).unwrap();
    assert_eq!(table.row_for_well("A4").unwrap().tstat, None);
    assert_eq!(
        table.column("TStat").unwrap(),
        vec![Some(0.0), Some(5.0), None]
    );
}

#[test]
fn test_gene_averaged_rows() {
    let table = ResultTable::build(&setup(), &scores(), AggregationPolicy::GeneAveraged).unwrap();
    let a2 = table.row_for_well("A2").unwrap();
    let a4 = table.row_for_well("A4").unwrap();
    assert_eq!(a2.mean, Some(3.0));
    assert_eq!(a4.mean, Some(3.0));
    // Only A2 has a defined t-statistic.
    assert_eq!(a4.tstat, Some(5.0));
    assert_eq!(table.row_for_well("A1").unwrap().mean, Some(1.0));
}

#[test]
fn test_hits_by_direction() {
    let table = ResultTable::build(&setup(), &scores(), AggregationPolicy::PerWell).unwrap();
    let up: Vec<&str> = table
        .hits("SSMD", 0.5, Direction::Above)
        .unwrap()
        .iter()
        .map(|r| r.well.as_str())
        .collect();
    assert_eq!(up, vec!["A2", "A4"]);
    assert_eq!(table.hits("TStat", 1.0, Direction::Below).unwrap().len(), 1);
    assert!(matches!(
        table.hits("GeneName", 0.0, Direction::Above),
        Err(HtsError::Configuration(_))
    ));
    assert!(table.column("Nope").is_err());
}

#[test]
fn test_json_uses_column_names() {
    let table = ResultTable::build(&setup(), &scores(), AggregationPolicy::PerWell).unwrap();
    let json = table.to_json().unwrap();
    assert!(json.contains("\"GeneName\": \"NEG\""));
    assert!(json.contains("\"SDPositiveCells\": null"));
    assert!(json.contains("\"TStat\": 5.0"));
}
