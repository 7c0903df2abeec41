use super::*;
use crate::record::model::TRIGGER_COUNT;

fn sample_row() -> Vec<String> {
    let mut row = vec![String::new(); 22];
    row[0] = "IMG_20240101".to_owned();
    row[1] = "(100, 900)".to_owned();
    row[2] = "(700, 910)".to_owned();
    row[3] = "(150, 880)".to_owned();
    row[4] = "(250, 882)".to_owned();
    row[5] = "(350, 884)".to_owned();
    row[6] = "(420, 870)".to_owned();
    row[7] = "(600, 875)".to_owned();
    row[8] = "2.35".to_owned();
    row[9] = "(410, 860)".to_owned();
    row[10] = "(440, 800)".to_owned();
    row[20] = "[0, 0, 10, 20, 30, 40, 50, 60, 70]".to_owned();
    row[21] = "coach-a".to_owned();
    row
}

#[test]
fn parses_full_row() {
    let rec = parse_row(&sample_row()).unwrap();
    assert_eq!(rec.key, "IMG_20240101");
    assert_eq!(rec.scale, [Point::new(100, 900), Point::new(700, 910)]);
    assert_eq!(
        rec.stride,
        StrideGroup::ThreePoint([
            Point::new(150, 880),
            Point::new(250, 882),
            Point::new(350, 884)
        ])
    );
    assert_eq!(rec.jump, [Point::new(420, 870), Point::new(600, 875)]);
    assert_eq!(rec.angle, [Point::new(410, 860), Point::new(440, 800)]);
    assert_eq!(
        rec.triggers,
        Triggers::new([0, 0, 10, 20, 30, 40, 50, 60, 70])
    );
    assert_eq!(rec.operator, "coach-a");
}

#[test]
fn sentinel_stride_field_yields_two_point_group() {
    let mut row = sample_row();
    row[3] = " Default Value ".to_owned();
    let rec = parse_row(&row).unwrap();
    assert_eq!(
        rec.stride,
        StrideGroup::TwoPoint([Point::new(250, 882), Point::new(350, 884)])
    );
}

#[test]
fn sentinel_anywhere_is_filtered_preserving_order() {
    let mut row = sample_row();
    row[4] = ABSENT_SENTINEL.to_owned();
    let rec = parse_row(&row).unwrap();
    assert_eq!(
        rec.stride.points(),
        &[Point::new(150, 880), Point::new(350, 884)]
    );
}

#[test]
fn two_sentinels_degrade_to_unsupported_without_error() {
    let mut row = sample_row();
    row[3] = ABSENT_SENTINEL.to_owned();
    row[5] = String::new();
    let rec = parse_row(&row).unwrap();
    assert_eq!(rec.stride, StrideGroup::Unsupported(vec![Point::new(250, 882)]));
    assert!(!rec.stride.is_renderable());
}

#[test]
fn eight_triggers_is_a_count_mismatch() {
    let mut row = sample_row();
    row[20] = "[0, 0, 10, 20, 30, 40, 50, 60]".to_owned();
    assert_eq!(
        parse_row(&row).unwrap_err(),
        ParseError::TriggerCountMismatch { found: 8 }
    );
}

#[test]
fn malformed_point_names_its_field() {
    let mut row = sample_row();
    row[6] = "(420; 870)".to_owned();
    match parse_row(&row).unwrap_err() {
        ParseError::MalformedField { field, .. } => assert_eq!(field, "takeoff"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn malformed_trigger_list_names_its_field() {
    let mut row = sample_row();
    row[20] = "[0, 0, 10, 20, x]".to_owned();
    match parse_row(&row).unwrap_err() {
        ParseError::MalformedField { field, .. } => assert_eq!(field, "triggers"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn short_row_reports_missing_field() {
    let row: Vec<String> = sample_row().into_iter().take(12).collect();
    assert_eq!(
        parse_row(&row).unwrap_err(),
        ParseError::MissingField {
            field: "triggers",
            index: 20
        }
    );
}

#[test]
fn row_without_operator_column_has_empty_operator() {
    let row: Vec<String> = sample_row().into_iter().take(21).collect();
    let rec = parse_row(&row).unwrap();
    assert_eq!(rec.operator, "");
}

#[test]
fn serialized_record_reparses_to_equal_record() {
    let records = [
        parse_row(&sample_row()).unwrap(),
        AnnotationRecord {
            key: "abc".to_owned(),
            scale: [Point::new(1, 2), Point::new(3, 4)],
            stride: StrideGroup::TwoPoint([Point::new(10, 10), Point::new(20, 10)]),
            jump: [Point::new(-5, 6), Point::new(7, 8)],
            angle: [Point::new(9, 10), Point::new(11, 12)],
            triggers: Triggers::new([0, 0, 10, 20, 30, 40, 50, 60, 70]),
            operator: "op".to_owned(),
        },
        AnnotationRecord {
            key: "unsupported".to_owned(),
            scale: [Point::new(0, 0), Point::new(1, 0)],
            stride: StrideGroup::Unsupported(vec![Point::new(5, 5)]),
            jump: [Point::new(0, 0), Point::new(0, 0)],
            angle: [Point::new(0, 0), Point::new(0, 0)],
            triggers: Triggers::new([1; TRIGGER_COUNT]),
            operator: String::new(),
        },
    ];
    for rec in records {
        let row = rec.to_row().unwrap();
        assert_eq!(row.len(), fields::ROW_LEN);
        assert_eq!(parse_row(&row).unwrap(), rec);
    }
}

#[test]
fn serialized_two_point_group_leads_with_sentinel() {
    let mut row = sample_row();
    row[3] = ABSENT_SENTINEL.to_owned();
    let rec = parse_row(&row).unwrap();
    let out = rec.to_row().unwrap();
    assert_eq!(out[3], ABSENT_SENTINEL);
    assert_eq!(out[4], "(250, 882)");
    assert_eq!(out[20], "[0, 0, 10, 20, 30, 40, 50, 60, 70]");
}

fn record_with(stride: StrideGroup, key: &str, operator: &str) -> AnnotationRecord {
    AnnotationRecord {
        key: key.to_owned(),
        scale: [Point::new(0, 40), Point::new(60, 40)],
        stride,
        jump: [Point::new(5, 30), Point::new(55, 30)],
        angle: [Point::new(10, 20), Point::new(30, 10)],
        triggers: Triggers::new([0, 0, 10, 20, 30, 40, 50, 60, 70]),
        operator: operator.to_owned(),
    }
}

#[test]
fn every_stride_cardinality_round_trips_or_is_rejected() {
    for n in 0..=5i32 {
        let points: Vec<Point> = (0..n).map(|i| Point::new(10 * i, -i)).collect();
        let rec = record_with(StrideGroup::from_points(points), "IMG_0001", "op");
        match rec.to_row() {
            Ok(row) => {
                assert!(n <= 3, "{n} points should not serialize");
                assert_eq!(parse_row(&row).unwrap(), rec, "{n} points");
            }
            Err(err) => {
                assert!(n > 3, "{n} points: {err}");
                assert_eq!(
                    err,
                    ParseError::malformed("stride", format!("{n} points do not fit the 3 stride columns"))
                );
            }
        }
    }
}

#[test]
fn padded_key_or_operator_is_rejected() {
    let two = || StrideGroup::TwoPoint([Point::new(1, 1), Point::new(2, 2)]);
    let err = record_with(two(), " IMG_0001", "op").to_row().unwrap_err();
    assert!(matches!(err, ParseError::MalformedField { field: "key", .. }), "{err}");
    let err = record_with(two(), "IMG_0001", "op ").to_row().unwrap_err();
    assert!(matches!(err, ParseError::MalformedField { field: "operator", .. }), "{err}");
}
