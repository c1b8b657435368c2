use super::{Strategy, StrategyBase, StrategyConfig};
use crate::core::dataset::DataSet;
use crate::core::error::Result;
use crate::engine::RunReport;
use crate::transforms::fuzz::{GENERIC_FAMILY, NUMERIC_FAMILY, STRING_FAMILY};
use crate::transforms::{pick, Named};
use rand::rngs::ThreadRng;
use rand::{Rng, RngCore};

/// Chance, in percent, that a column gets a type-independent fuzz value.
const GENERIC_CHANCE: u32 = 20;

/// Replaces sampled cells with adversarial values picked per column.
pub struct Fuzzer<'a, R: RngCore = ThreadRng> {
    base: StrategyBase<'a>,
    columns: Vec<usize>,
    rng: R,
}

impl<'a> Fuzzer<'a> {
    pub fn new(dataset: &'a mut DataSet, config: &StrategyConfig) -> Result<Self> {
        Self::with_rng(dataset, config, rand::thread_rng())
    }
}

impl<'a, R: RngCore> Fuzzer<'a, R> {
    pub fn with_rng(dataset: &'a mut DataSet, config: &StrategyConfig, mut rng: R) -> Result<Self> {
        let base = StrategyBase::new(dataset, config.fraction())?;
        let columns = base.columns_or_sample(config.columns.as_deref(), &mut rng)?;
        Ok(Self { base, columns, rng })
    }

    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    fn choose(&mut self, column: usize) -> Result<Named> {
        let family: &[Named] = if self.rng.gen_range(0..100) < GENERIC_CHANCE {
            &GENERIC_FAMILY
        } else if self.base.dataset().column_dtype(column)?.is_textual() {
            &STRING_FAMILY
        } else {
            &NUMERIC_FAMILY
        };
        Ok(*pick(family, &mut self.rng))
    }
}

impl<R: RngCore> Strategy for Fuzzer<'_, R> {
    fn name(&self) -> &str {
        "fuzz"
    }

    fn run(&mut self) -> Result<RunReport> {
        let mut report = RunReport::new(self.name());
        for column in self.columns.clone() {
            let transform = self.choose(column)?;
            tracing::info!(strategy = "fuzz", column, fuzz = transform.name, "fuzzing column");
            let outcome = self.base.apply(column, &transform, &mut self.rng)?;
            report.record(outcome);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dataset::{DataSetOptions, Table};
    use crate::core::value::Value;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dataset() -> DataSet {
        let table = Table::from_columns(vec![
            ("n", (0..20).map(Value::Int).collect()),
            ("s", (0..20).map(|i| Value::from(format!("row {i}"))).collect()),
        ])
        .unwrap();
        DataSet::new(table, DataSetOptions::default()).unwrap()
    }

    #[test]
    fn test_fuzz_touches_only_sampled_rows() {
        let mut ds = dataset();
        let before = ds.records().clone();
        let config = StrategyConfig::new("fuzz", 25.0).with_columns(vec!["n".into(), "s".into()]);
        let mut fuzzer = Fuzzer::with_rng(&mut ds, &config, StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(fuzzer.columns(), &[0, 1]);
        let report = fuzzer.run().unwrap();
        assert_eq!(report.columns, vec![0, 1]);
        assert!(report.cells_mutated <= 10);
        assert_eq!(ds.len(), 20);
        for col in 0..2 {
            let changed = before
                .column_values(col)
                .zip(ds.records().column_values(col))
                .filter(|(a, b)| a != b)
                .count();
            assert!(changed <= 5);
        }
    }

    #[test]
    fn test_choose_follows_column_type() {
        let names = |family: &[Named]| family.iter().map(|t| t.name).collect::<Vec<_>>();
        let generic = names(&GENERIC_FAMILY);
        let mut ds = dataset();
        let config = StrategyConfig::new("fuzz", 50.0);
        let mut fuzzer = Fuzzer::with_rng(&mut ds, &config, StdRng::seed_from_u64(21)).unwrap();

        for (column, family) in [(0, names(&NUMERIC_FAMILY)), (1, names(&STRING_FAMILY))] {
            let mut generic_picks = 0;
            for _ in 0..2000 {
                let name = fuzzer.choose(column).unwrap().name;
                if generic.contains(&name) {
                    generic_picks += 1;
                } else {
                    assert!(family.contains(&name), "{} picked for column {}", name, column);
                }
            }
            // 20% of 2000
            assert!((300..500).contains(&generic_picks), "generic picks {}", generic_picks);
        }
    }

    #[test]
    fn test_sampled_columns_without_config() {
        let mut ds = dataset();
        let config = StrategyConfig::new("fuzz", 50.0);
        let fuzzer = Fuzzer::with_rng(&mut ds, &config, StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(fuzzer.columns().len(), 1);
    }
}
