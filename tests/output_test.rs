use datafuzz::core::dataset::{DataSet, DataSetOptions, Matrix, Records, Representation, Row, Table};
use datafuzz::core::output::{Output, Sink};
use datafuzz::{FuzzError, Value};
use ndarray::array;
use std::fs;
use tempfile::tempdir;

fn table() -> Table {
    Table::from_columns(vec![
        ("id", vec![Value::Int(1), Value::Int(2), Value::Int(3)]),
        ("city", vec![Value::from("Lyon"), Value::from("Oslo"), Value::from("Lima")]),
        ("temp", vec![Value::Float(11.5), Value::Float(-2.25), Value::Float(19.0)]),
    ])
    .unwrap()
}

#[test]
fn test_native_export_is_unchanged() {
    for ds in [
        DataSet::new(table(), DataSetOptions::default()).unwrap(),
        DataSet::new(Matrix::from(array![[1i64, 2], [3, 4]]), DataSetOptions::default()).unwrap(),
    ] {
        match ds.to_output().unwrap() {
            Output::Records(records) => assert_eq!(&records, ds.records()),
            other => panic!("unexpected output {}", other),
        }
    }

    let ds = DataSet::new(table(), DataSetOptions::default().with_sink("pandas")).unwrap();
    match ds.to_output().unwrap() {
        Output::Records(records) => assert_eq!(&records, ds.records()),
        other => panic!("unexpected output {}", other),
    }
}

#[test]
fn test_export_converts_representation() {
    let ds = DataSet::new(table(), DataSetOptions::default().with_sink("records")).unwrap();
    match ds.to_output().unwrap() {
        Output::Records(Records::Rows(rows)) => {
            assert_eq!(rows.len(), 3);
            assert_eq!(rows[1].get(1), Some(&Value::from("Oslo")));
        }
        other => panic!("unexpected output {}", other),
    }

    let ds = DataSet::new(
        Matrix::from(array![[1.0, 2.0], [3.0, 4.0]]),
        DataSetOptions::default().with_sink("dataset"),
    )
    .unwrap();
    match ds.to_output().unwrap() {
        Output::Dataset(wrapped) => {
            assert_eq!(wrapped.representation(), Representation::Matrix);
            assert_eq!(wrapped.records(), ds.records());
        }
        other => panic!("unexpected output {}", other),
    }
}

#[test]
fn test_unsupported_sinks() {
    assert!(matches!("file://out.parquet".parse::<Sink>(), Err(FuzzError::NotImplemented(_))));
    assert!(matches!("xml".parse::<Sink>(), Err(FuzzError::NotImplemented(_))));
    assert_eq!("numpy".parse::<Sink>().unwrap(), Sink::Representation(Representation::Matrix));

    let ds = DataSet::new(table(), DataSetOptions::default().with_sink("xml")).unwrap();
    assert!(matches!(ds.to_output(), Err(FuzzError::NotImplemented(_))));
}

#[test]
fn test_csv_file_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cities.csv");
    let sink = format!("file://{}", path.display());

    let ds = DataSet::new(table(), DataSetOptions::default().with_sink(sink.clone())).unwrap();
    match ds.to_output().unwrap() {
        Output::File(written) => assert_eq!(written, path),
        other => panic!("unexpected output {}", other),
    }
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("id,city,temp"));

    let back = DataSet::new(sink, DataSetOptions::default()).unwrap();
    assert_eq!(back.representation(), Representation::Tabular);
    assert_eq!(back.len(), 3);
    assert_eq!(back.records().cell(2, 1), Some(Value::from("Lima")));
    assert_eq!(back.records().cell(1, 2), Some(Value::Float(-2.25)));
}

#[test]
fn test_csv_records_are_strings() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cities.csv");
    let sink = format!("file://{}", path.display());
    DataSet::new(table(), DataSetOptions::default().with_sink(sink.clone()))
        .unwrap()
        .to_output()
        .unwrap();

    let back = DataSet::new(sink, DataSetOptions::records()).unwrap();
    assert_eq!(back.representation(), Representation::Records);
    assert_eq!(
        back.get(0),
        Some(Row::mapping([
            ("id", Value::from("1")),
            ("city", Value::from("Lyon")),
            ("temp", Value::from("11.5")),
        ]))
    );
}

#[test]
fn test_matrix_csv_has_no_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("grid.csv");
    let ds = DataSet::new(
        Matrix::from(array![[1i64, 2], [3, 4]]),
        DataSetOptions::default().with_sink(format!("file://{}", path.display())),
    )
    .unwrap();
    ds.to_output().unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().next(), Some("1,2"));
}

#[test]
fn test_json_file_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cities.json");
    let sink = format!("file://{}", path.display());
    DataSet::new(table(), DataSetOptions::default().with_sink(sink.clone()))
        .unwrap()
        .to_output()
        .unwrap();

    let back = DataSet::new(sink, DataSetOptions::records()).unwrap();
    assert_eq!(back.len(), 3);
    assert_eq!(back.get(0).unwrap().get(0), Some(&Value::Int(1)));
    assert_eq!(back.get(1).unwrap().get(1), Some(&Value::from("Oslo")));
}

#[test]
fn test_json_must_be_a_list() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scalar.json");
    fs::write(&path, "42").unwrap();
    assert!(matches!(
        DataSet::new(format!("file://{}", path.display()), DataSetOptions::default()),
        Err(FuzzError::Construction(_))
    ));
}

#[test]
fn test_sql_roundtrip() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("fuzz.db");
    let uri = format!("sqlite:///{}", db.display());

    let options = DataSetOptions::default()
        .with_sink("sql")
        .with_sql(uri.clone(), None, Some("cities".to_string()));
    let ds = DataSet::new(table(), options).unwrap();
    match ds.to_output().unwrap() {
        Output::Sql { table, rows } => {
            assert_eq!(table, "cities");
            assert_eq!(rows, 3);
        }
        other => panic!("unexpected output {}", other),
    }

    let options = DataSetOptions::default().with_sql(
        uri,
        Some("SELECT id, city, temp FROM cities ORDER BY id".to_string()),
        None,
    );
    let back = DataSet::new("sql", options).unwrap();
    assert_eq!(back.len(), 3);
    assert_eq!(back.records().cell(0, 1), Some(Value::from("Lyon")));
    assert_eq!(back.records().cell(2, 2), Some(Value::Float(19.0)));
}

#[test]
fn test_sql_sink_requires_table() {
    let options = DataSetOptions::default()
        .with_sink("sql")
        .with_sql("sqlite:///:memory:", None, None);
    assert!(matches!(
        DataSet::new(table(), options),
        Err(FuzzError::Construction(_))
    ));

    let options = DataSetOptions::default()
        .with_sink("sql")
        .with_sql("postgres://localhost/db", None, Some("t".to_string()));
    assert!(matches!(
        DataSet::new(table(), options),
        Err(FuzzError::NotImplemented(_))
    ));
}
