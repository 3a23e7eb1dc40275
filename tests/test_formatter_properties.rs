use chrono::{TimeZone, Utc};
use wqt::data::{Field, ResultSet, Row, Schema, Value, ValueKind};
use wqt::format::{table, CsvFormatter, FormatKind, Formatter, JsonFormatter, TableFormatter};

fn results(fields: Vec<Field>, rows: Vec<Vec<Value>>) -> ResultSet {
    ResultSet {
        schema: Schema::new(fields),
        rows: rows.into_iter().map(Row::new).collect(),
        truncated: false,
    }
}

fn mixed_results() -> ResultSet {
    results(
        vec![
            Field::new("id", ValueKind::Integer),
            Field::new("name", ValueKind::Text),
            Field::new("score", ValueKind::Float),
            Field::new("active", ValueKind::Boolean),
            Field::new("seen", ValueKind::Timestamp),
            Field::new(
                "owner",
                ValueKind::Record(vec![Field::new("id", ValueKind::Integer)]),
            ),
            Field::new("tags", ValueKind::Repeated(Box::new(ValueKind::Text))),
        ],
        vec![
            vec![
                Value::Integer(1),
                Value::Text("alpha".into()),
                Value::Float(0.5),
                Value::Boolean(true),
                Value::Timestamp(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()),
                Value::Record(vec![("id".to_string(), Value::Integer(9))]),
                Value::Repeated(vec![Value::Text("x".into()), Value::Text("y".into())]),
            ],
            vec![
                Value::Null,
                Value::Null,
                Value::Null,
                Value::Null,
                Value::Null,
                Value::Null,
                Value::Null,
            ],
        ],
    )
}

#[test]
fn no_variant_fails_on_well_formed_input() {
    let populated = mixed_results();
    let empty = ResultSet::new(populated.schema.clone());
    let no_columns = ResultSet::default();

    for kind in FormatKind::ALL {
        let formatter = kind.formatter(b',');
        assert!(formatter.format(&populated).is_ok(), "{kind} on rows");
        assert!(formatter.format(&empty).is_ok(), "{kind} on empty set");
        assert!(formatter.format(&no_columns).is_ok(), "{kind} on no schema");
    }
}

#[test]
fn csv_round_trips_through_a_conformant_parser() {
    let tricky = "a,\"quoted\"\nand a newline";
    let rs = results(
        vec![
            Field::new("note", ValueKind::Text),
            Field::new("n", ValueKind::Integer),
        ],
        vec![vec![Value::Text(tricky.into()), Value::Integer(7)]],
    );
    let out = CsvFormatter::default().format(&rs).unwrap();

    let mut reader = csv::Reader::from_reader(out.as_bytes());
    assert_eq!(
        reader.headers().unwrap().iter().collect::<Vec<_>>(),
        vec!["note", "n"]
    );
    let record = reader.records().next().unwrap().unwrap();
    assert_eq!(&record[0], tricky);
    assert_eq!(&record[1], "7");
    assert!(reader.records().next().is_none());
}

#[test]
fn json_preserves_integers_beyond_float_precision() {
    let big = 9007199254740993_i64; // 2^53 + 1
    let rs = results(
        vec![Field::new("big", ValueKind::Integer)],
        vec![vec![Value::Integer(big)]],
    );
    let out = JsonFormatter.format(&rs).unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(parsed[0]["big"].as_i64(), Some(big));
    // and the text itself carries the exact digits, no exponent form
    assert!(out.contains("9007199254740993"));
}

#[test]
fn decimal_digits_pass_through_every_format_verbatim() {
    let digits = "123456789012345678901234567890.5";
    let rs = results(
        vec![Field::new("amount", ValueKind::from_wire("NUMERIC"))],
        vec![vec![Value::Text(digits.into())]],
    );
    for kind in FormatKind::ALL {
        let out = kind.formatter(b',').format(&rs).unwrap();
        assert!(out.contains(digits), "{kind} lost the decimal digits");
    }
}

#[test]
fn table_columns_align_across_all_rows() {
    let rs = results(
        vec![
            Field::new("id", ValueKind::Integer),
            Field::new("name", ValueKind::Text),
        ],
        vec![
            vec![Value::Integer(1), Value::Text("a-much-longer-name".into())],
            vec![Value::Integer(23456), Value::Text("b".into())],
        ],
    );
    let out = TableFormatter.format(&rs).unwrap();
    let lines: Vec<&str> = out.lines().collect();

    // the separator is as wide as the widest line
    let sep_positions: Vec<usize> = lines[1].match_indices("-+-").map(|(i, _)| i).collect();
    assert_eq!(sep_positions.len(), 1);
    // every populated line has its delimiter in the same column
    for line in [lines[0], lines[2], lines[3]] {
        assert_eq!(line.find(" | "), Some(sep_positions[0]));
    }
    // "23456" is the widest id cell, so the id column is 5 wide
    assert!(lines[1].starts_with("------+-"));
}

#[test]
fn null_field_renders_per_variant() {
    let rs = results(
        vec![
            Field::new("x", ValueKind::Integer),
            Field::new("y", ValueKind::Text),
        ],
        vec![vec![Value::Integer(1), Value::Null]],
    );

    let csv_out = CsvFormatter::default().format(&rs).unwrap();
    assert_eq!(csv_out, "x,y\n1,\n");

    let json_out = JsonFormatter.format(&rs).unwrap();
    assert_eq!(json_out, r#"[{"x":1,"y":null}]"#);

    let table_out = TableFormatter.format(&rs).unwrap();
    let row = table_out.lines().nth(2).unwrap();
    assert_eq!(row, "1 | NULL");
}

#[test]
fn table_cap_bounds_line_length_for_huge_cells() {
    let rs = results(
        vec![Field::new("blob", ValueKind::Text)],
        vec![vec![Value::Text("z".repeat(10_000))]],
    );
    let out = TableFormatter.format(&rs).unwrap();
    for line in out.lines() {
        assert!(line.chars().count() <= table::MAX_CELL_WIDTH);
    }
}
