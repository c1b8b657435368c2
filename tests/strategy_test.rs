use datafuzz::core::dataset::{DataSet, DataSetOptions, Matrix, Row};
use datafuzz::strategy::{build_strategy, Duplicator, NoiseMaker, NoiseOp, Strategy, StrategyConfig};
use datafuzz::{FuzzError, Value, ValueType};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;

fn people(prefer_tabular: bool) -> DataSet {
    let rows: Vec<Row> = (0..20)
        .map(|i| {
            Row::mapping([
                ("id", Value::Int(i)),
                ("name", Value::from(format!("person {i}"))),
                ("score", Value::Float(i as f64 * 2.5)),
            ])
        })
        .collect();
    let options = if prefer_tabular {
        DataSetOptions::default()
    } else {
        DataSetOptions::records()
    };
    DataSet::new(rows, options).unwrap()
}

fn float_matrix() -> DataSet {
    let matrix = Array2::from_shape_fn((20, 3), |(r, c)| (r * 10 + c) as f64);
    DataSet::new(Matrix::from(matrix), DataSetOptions::default()).unwrap()
}

fn distinct_rows(ds: &DataSet) -> usize {
    ds.iter().map(|row| format!("{:?}", row)).collect::<HashSet<_>>().len()
}

#[test]
fn test_percentage_boundaries_rejected() {
    for percentage in [0.0, 100.0] {
        let mut ds = people(true);
        let config = StrategyConfig::new("fuzz", percentage);
        assert!(matches!(
            build_strategy(&config, &mut ds, StdRng::seed_from_u64(1)),
            Err(FuzzError::InvalidPercentage(_))
        ));
    }
}

#[test]
fn test_unknown_strategy_type() {
    let mut ds = people(true);
    let config = StrategyConfig::new("shuffle", 10.0);
    assert!(matches!(
        build_strategy(&config, &mut ds, StdRng::seed_from_u64(1)),
        Err(FuzzError::NotImplemented(_))
    ));
}

#[test]
fn test_duplicator_without_noise_adds_exact_copies() {
    for mut ds in [people(true), people(false), float_matrix()] {
        let before = ds.len();
        let config = StrategyConfig::new("duplicator", 25.0);
        let report = Duplicator::with_rng(&mut ds, &config, StdRng::seed_from_u64(2))
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(report.rows_appended, 5);
        assert_eq!(ds.len(), before + 5);
        assert_eq!(distinct_rows(&ds), before);
    }
}

#[test]
fn test_duplicator_with_noise_avoids_duplicates() {
    for seed in 0..5 {
        for mut ds in [people(true), people(false), float_matrix()] {
            let before = ds.len();
            let config = StrategyConfig::new("duplicate", 30.0).with_add_noise(true);
            let mut strategy = build_strategy(&config, &mut ds, StdRng::seed_from_u64(seed)).unwrap();
            let report = strategy.run().unwrap();
            drop(strategy);
            assert_eq!(report.rows_appended, 6);
            assert_eq!(ds.len(), before + 6);
            assert_eq!(distinct_rows(&ds), ds.len(), "seed {}", seed);
        }
    }
}

#[test]
fn test_noise_range_on_strings_fails() {
    let mut ds = people(true);
    let config = StrategyConfig::new("noise", 20.0)
        .with_columns(vec!["name".into()])
        .with_noise(vec![NoiseOp::Range]);
    let mut noise = NoiseMaker::with_rng(&mut ds, &config, StdRng::seed_from_u64(4)).unwrap();
    assert!(matches!(noise.run(), Err(FuzzError::NotImplemented(_))));
}

#[test]
fn test_noise_random_stays_in_observed_range() {
    let mut ds = people(true);
    let config = StrategyConfig::new("noise", 50.0)
        .with_columns(vec!["id".into(), "score".into()])
        .with_noise(vec![NoiseOp::Random]);
    let report = NoiseMaker::with_rng(&mut ds, &config, StdRng::seed_from_u64(6))
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(report.columns, vec![0, 2]);
    assert!(report.is_clean());
    assert_eq!(ds.column_dtype(0).unwrap(), ValueType::Int);
    assert!(ds
        .records()
        .column_values(0)
        .all(|v| (0..20).contains(&v.as_int().unwrap())));
    assert!(ds
        .records()
        .column_values(2)
        .all(|v| (0.0..=47.5).contains(&v.as_float().unwrap())));
}

#[test]
fn test_noise_ops_run_in_listed_order() {
    let mut ds = people(true);
    // nulls first, then the string permutation leaves them alone
    let config = StrategyConfig::new("noise", 50.0)
        .with_columns(vec!["name".into()])
        .with_noise(vec![NoiseOp::AddNulls, NoiseOp::StringPermutation]);
    let report = NoiseMaker::with_rng(&mut ds, &config, StdRng::seed_from_u64(8))
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(report.cells_mutated, 20);
    let nulls = ds.records().column_values(1).filter(Value::is_null).count();
    assert_eq!(nulls, 10);
}

#[test]
fn test_noise_on_matrix_widens_for_nulls() {
    let mut ds = DataSet::new(
        Matrix::from(Array2::from_shape_fn((10, 2), |(r, c)| (r + c) as i64)),
        DataSetOptions::default(),
    )
    .unwrap();
    let config = StrategyConfig::new("noise", 30.0)
        .with_columns(vec![0usize.into()])
        .with_noise(vec![NoiseOp::AddNulls]);
    let report = NoiseMaker::with_rng(&mut ds, &config, StdRng::seed_from_u64(1))
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(report.cells_mutated, 3);
    assert_eq!(ds.records().column_dtype(0), Some(ValueType::Float));
    assert_eq!(ds.records().column_values(0).filter(Value::is_null).count(), 3);
}

#[test]
fn test_fuzzer_keeps_shape() {
    let mut ds = people(true);
    let config = StrategyConfig::new("fuzz", 30.0);
    let report = build_strategy(&config, &mut ds, StdRng::seed_from_u64(12))
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(report.strategy, "fuzz");
    assert_eq!(report.columns.len(), 1);
    assert_eq!(ds.len(), 20);
    assert_eq!(ds.num_columns(), 3);
}

#[test]
fn test_seeded_strategies_repeat() {
    let run = |seed| {
        let mut ds = people(true);
        let config = StrategyConfig::new("fuzz", 40.0);
        build_strategy(&config, &mut ds, StdRng::seed_from_u64(seed))
            .unwrap()
            .run()
            .unwrap();
        format!("{:?}", ds.records())
    };
    assert_eq!(run(99), run(99));
}
