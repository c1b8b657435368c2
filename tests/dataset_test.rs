use datafuzz::core::dataset::{ColumnRef, DataSet, DataSetOptions, Matrix, Records, Representation, Row, Table};
use datafuzz::{FuzzError, Value};
use ndarray::array;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

fn people() -> Vec<Row> {
    (0..10)
        .map(|i| {
            Row::mapping([
                ("id", Value::Int(i)),
                ("name", Value::from(format!("person {i}"))),
            ])
        })
        .collect()
}

/// The same five-row column `[3, 1, 4, 1, 5]` in every representation.
fn every_representation() -> Vec<DataSet> {
    let values = [3i64, 1, 4, 1, 5];
    let table = Table::from_columns(vec![("x", values.iter().copied().map(Value::Int).collect())]).unwrap();
    let matrix = Matrix::from(array![[3i64], [1], [4], [1], [5]]);
    let rows: Vec<Row> = values.iter().map(|v| Row::sequence([Value::Int(*v)])).collect();
    vec![
        DataSet::new(table, DataSetOptions::default()).unwrap(),
        DataSet::new(matrix, DataSetOptions::default()).unwrap(),
        DataSet::new(rows, DataSetOptions::records()).unwrap(),
    ]
}

#[test]
fn test_representation_follows_source() {
    let ds = DataSet::new(people(), DataSetOptions::default()).unwrap();
    assert_eq!(ds.representation(), Representation::Tabular);

    let ds = DataSet::new(people(), DataSetOptions::records()).unwrap();
    assert_eq!(ds.representation(), Representation::Records);

    let ds = DataSet::new(Matrix::from(array![[1.0, 2.0]]), DataSetOptions::default()).unwrap();
    assert_eq!(ds.representation(), Representation::Matrix);
}

#[test]
fn test_rejects_bad_sources() {
    assert!(matches!(
        DataSet::new("not a source", DataSetOptions::default()),
        Err(FuzzError::UnsupportedInput(_))
    ));
    assert!(matches!(
        DataSet::new(Vec::<Row>::new(), DataSetOptions::default()),
        Err(FuzzError::EmptyInput(_))
    ));
    match DataSet::new("file:///no/such/file.csv", DataSetOptions::default()) {
        Err(FuzzError::Construction(msg)) => assert!(msg.contains("/no/such/file.csv")),
        other => panic!("expected construction error, got {:?}", other.map(|d| d.len())),
    }
    assert!(matches!(
        DataSet::new("sql", DataSetOptions::default()),
        Err(FuzzError::Construction(_))
    ));
}

#[test]
fn test_sample_without_replacement() {
    let ds = DataSet::new(people(), DataSetOptions::default()).unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    let sample = ds.sample(0.5, &mut rng);
    assert_eq!(sample.len(), 5);

    let ids: HashSet<i64> = sample.column_values(0).filter_map(|v| v.as_int()).collect();
    assert_eq!(ids.len(), 5);
    assert!(ids.iter().all(|id| (0..10).contains(id)));
}

#[test]
fn test_sample_columns_by_representation() {
    let mut rng = StdRng::seed_from_u64(7);
    let ds = DataSet::new(people(), DataSetOptions::default()).unwrap();
    let cols = ds.sample_columns(0.5, &mut rng);
    assert_eq!(cols.len(), 1);
    assert!(matches!(cols[0], ColumnRef::Name(_)));

    let ds = DataSet::new(Matrix::from(array![[1i64, 2, 3, 4]]), DataSetOptions::default()).unwrap();
    let cols = ds.sample_columns(0.5, &mut rng);
    assert_eq!(cols.len(), 2);
    assert!(cols.iter().all(|c| matches!(c, ColumnRef::Index(i) if *i < 4)));
}

#[test]
fn test_min_max_in_every_representation() {
    for ds in every_representation() {
        assert_eq!(ds.column_min(0).unwrap(), Some(Value::Int(1)), "{}", ds.representation());
        assert_eq!(ds.column_max(0).unwrap(), Some(Value::Int(5)), "{}", ds.representation());
        assert!(matches!(ds.column_max(3), Err(FuzzError::ColumnNotFound(_))));
    }
}

#[test]
fn test_append_in_every_representation() {
    for mut ds in every_representation() {
        let before: Vec<Row> = ds.iter().collect();
        let extra = ds.records().take_rows(&[0, 4]);
        let added = ds.append(extra).unwrap();
        assert_eq!(added, 2);
        assert_eq!(ds.len(), 7);
        for (i, row) in before.iter().enumerate() {
            assert_eq!(ds.get(i).as_ref(), Some(row));
        }
        assert_eq!(ds.records().cell(5, 0), Some(Value::Int(3)));
        assert_eq!(ds.records().cell(6, 0), Some(Value::Int(5)));
    }
}

#[test]
fn test_iteration_restarts() {
    let ds = DataSet::new(people(), DataSetOptions::records()).unwrap();
    assert_eq!(ds.iter().count(), 10);
    assert_eq!((&ds).into_iter().count(), 10);

    let mut first = ds.iter();
    first.next();
    assert_eq!(ds.iter().len(), 10);
    assert_eq!(first.len(), 9);
}

#[test]
fn test_column_resolution() {
    let ds = DataSet::new(people(), DataSetOptions::default()).unwrap();
    assert_eq!(ds.column_index(&ColumnRef::from("name")).unwrap(), 1);
    assert_eq!(ds.column_index(&ColumnRef::Index(0)).unwrap(), 0);
    assert!(matches!(
        ds.column_index(&ColumnRef::from("age")),
        Err(FuzzError::ColumnNotFound(name)) if name == "age"
    ));

    let records = DataSet::new(people(), DataSetOptions::records()).unwrap();
    assert_eq!(records.column_index(&ColumnRef::from("name")).unwrap(), 1);

    let matrix = DataSet::new(Matrix::from(array![[1i64, 2]]), DataSetOptions::default()).unwrap();
    assert!(matrix.column_index(&ColumnRef::from("name")).is_err());
}

#[test]
fn test_conversion_keeps_cells() {
    let ds = DataSet::new(people(), DataSetOptions::records()).unwrap();
    let table = ds.records().clone().convert(Representation::Tabular).unwrap();
    assert!(matches!(table, Records::Tabular(_)));
    assert_eq!(table.column_names().unwrap(), vec!["id".to_string(), "name".to_string()]);
    assert_eq!(table.cell(3, 1), Some(Value::from("person 3")));
}
