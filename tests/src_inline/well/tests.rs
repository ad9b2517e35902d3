use super::*;

#[test]
fn test_round_trip_all_formats() {
    for format in [
        PlateFormat::Plate96,
        PlateFormat::Plate384,
        PlateFormat::Plate1536,
        PlateFormat::Custom { rows: 30, cols: 7 },
    ] {
        for pos in format.positions() {
            let label = index_to_label(pos, format).unwrap();
            assert_eq!(label_to_index(&label, format).unwrap(), pos);
            assert_eq!(index_to_label(label_to_index(&label, format).unwrap(), format).unwrap(), label);
        }
    }
}

#[test]
fn test_known_labels() {
    assert_eq!(label_to_index("A1", PlateFormat::Plate96).unwrap(), WellPos::new(0, 0));
    assert_eq!(label_to_index("H12", PlateFormat::Plate96).unwrap(), WellPos::new(7, 11));
    assert_eq!(label_to_index("p24", PlateFormat::Plate384).unwrap(), WellPos::new(15, 23));
    assert_eq!(label_to_index("B05", PlateFormat::Plate96).unwrap(), WellPos::new(1, 4));
    assert_eq!(label_to_index("AF48", PlateFormat::Plate1536).unwrap(), WellPos::new(31, 47));
    assert_eq!(row_letters(26), "AA");
    assert_eq!(row_letters(51), "AZ");
    assert_eq!(row_letters(52), "BA");
}

#[test]
fn test_invalid_labels() {
    for bad in ["", "1A", "A", "A0", "A1B", "I1", "A13", "-A1", "A-1"] {
        assert!(
            matches!(label_to_index(bad, PlateFormat::Plate96), Err(HtsError::InvalidWell(_))),
            "{bad:?} should be rejected"
        );
    }
    assert!(index_to_label(WellPos::new(8, 0), PlateFormat::Plate96).is_err());
}

#[test]
fn test_plate_format_sizes() {
    assert_eq!(PlateFormat::from_size(384).unwrap().shape(), (16, 24));
    assert!(matches!(PlateFormat::from_size(100), Err(HtsError::Configuration(_))));
    assert_eq!(PlateFormat::from_shape(8, 12), PlateFormat::Plate96);
    assert_eq!(PlateFormat::Plate96.positions().count(), 96);
}
