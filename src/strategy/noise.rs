use super::{range_transform, Strategy, StrategyBase, StrategyConfig};
use crate::core::dataset::DataSet;
use crate::core::error::{FuzzError, Result};
use crate::core::value::{Value, ValueType};
use crate::engine::{Diagnostic, RunReport};
use crate::transforms::noise::{Cast, MESSY_SPACES};
use crate::transforms::{pick, Constant, Transform};
use rand::rngs::ThreadRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named noise operations, applied in the order given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseOp {
    AddNulls,
    StringPermutation,
    Random,
    Range,
    TypeTransform,
}

impl FromStr for NoiseOp {
    type Err = FuzzError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "add_nulls" => Ok(NoiseOp::AddNulls),
            "string_permutation" => Ok(NoiseOp::StringPermutation),
            "random" => Ok(NoiseOp::Random),
            "range" => Ok(NoiseOp::Range),
            "type_transform" => Ok(NoiseOp::TypeTransform),
            other => Err(FuzzError::NotImplemented(format!("noise {}", other))),
        }
    }
}

impl fmt::Display for NoiseOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NoiseOp::AddNulls => "add_nulls",
            NoiseOp::StringPermutation => "string_permutation",
            NoiseOp::Random => "random",
            NoiseOp::Range => "range",
            NoiseOp::TypeTransform => "type_transform",
        };
        write!(f, "{}", name)
    }
}

/// Applies noise operations to a set of columns.
pub struct NoiseMaker<'a, R: RngCore = ThreadRng> {
    base: StrategyBase<'a>,
    columns: Vec<usize>,
    noise: Vec<NoiseOp>,
    limits: Option<(f64, f64)>,
    rng: R,
}

impl<'a> NoiseMaker<'a> {
    pub fn new(dataset: &'a mut DataSet, config: &StrategyConfig) -> Result<Self> {
        Self::with_rng(dataset, config, rand::thread_rng())
    }
}

impl<'a, R: RngCore> NoiseMaker<'a, R> {
    /// Columns not given in `config` are sampled here, once.
    pub fn with_rng(dataset: &'a mut DataSet, config: &StrategyConfig, mut rng: R) -> Result<Self> {
        let noise = match &config.noise {
            Some(ops) if !ops.is_empty() => ops.clone(),
            _ => {
                return Err(FuzzError::Construction(
                    "You must specify what types of noise to apply.".to_string(),
                ))
            }
        };
        let base = StrategyBase::new(dataset, config.fraction())?;
        let columns = base.columns_or_sample(config.columns.as_deref(), &mut rng)?;
        Ok(Self {
            base,
            columns,
            noise,
            limits: config.limits,
            rng,
        })
    }

    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    fn mutate(&mut self, column: usize, transform: &dyn Transform, report: &mut RunReport) -> Result<()> {
        let outcome = self.base.apply(column, transform, &mut self.rng)?;
        report.record(outcome);
        Ok(())
    }

    fn nullify(&mut self, report: &mut RunReport) -> Result<()> {
        for column in self.columns.clone() {
            self.mutate(column, &Constant::null(), report)?;
        }
        Ok(())
    }

    fn string_permutation(&mut self, report: &mut RunReport) -> Result<()> {
        for column in self.columns.clone() {
            if self.base.dataset().column_dtype(column)?.is_textual() {
                self.mutate(column, &MESSY_SPACES, report)?;
            }
        }
        Ok(())
    }

    /// Numeric columns get a random value within their observed range;
    /// textual ones fall back to whitespace permutation.
    fn randomize(&mut self, report: &mut RunReport) -> Result<()> {
        for column in self.columns.clone() {
            let dtype = self.base.dataset().column_dtype(column)?;
            if dtype.is_textual() {
                self.mutate(column, &MESSY_SPACES, report)?;
                continue;
            }
            if !dtype.is_numeric() {
                tracing::debug!(column, %dtype, "no random noise for column type");
                continue;
            }
            let ds = self.base.dataset();
            let bounds = ds.column_min(column)?.zip(ds.column_max(column)?);
            match bounds.and_then(|(low, high)| range_transform(dtype, &low, &high)) {
                Some(transform) => self.mutate(column, transform.as_ref(), report)?,
                None => report.push(Diagnostic::new(
                    Some(column),
                    "random",
                    "column has no finite range to draw from",
                )),
            }
        }
        Ok(())
    }

    /// Random values within `limits`, or the column's range without them.
    fn use_range(&mut self, report: &mut RunReport) -> Result<()> {
        for column in self.columns.clone() {
            let dtype = self.base.dataset().column_dtype(column)?;
            if dtype.is_textual() {
                return Err(FuzzError::NotImplemented(
                    "You must use a numeric column when using `range`".to_string(),
                ));
            }
            if !dtype.is_numeric() {
                tracing::debug!(column, %dtype, "no range noise for column type");
                continue;
            }
            let bounds = match self.limits {
                Some((low, high)) => Some((Value::Float(low), Value::Float(high))),
                None => {
                    let ds = self.base.dataset();
                    ds.column_min(column)?.zip(ds.column_max(column)?)
                }
            };
            match bounds.and_then(|(low, high)| range_transform(dtype, &low, &high)) {
                Some(transform) => self.mutate(column, transform.as_ref(), report)?,
                None => report.push(Diagnostic::new(
                    Some(column),
                    "range",
                    "column has no finite range to draw from",
                )),
            }
        }
        Ok(())
    }

    /// Cast sampled cells to another scalar type, chosen once per column.
    fn type_transform(&mut self, report: &mut RunReport) -> Result<()> {
        for column in self.columns.clone() {
            let dtype = self.base.dataset().column_dtype(column)?;
            let choices: &[ValueType] = match dtype {
                ValueType::Int => &[ValueType::String, ValueType::Float],
                ValueType::Float => &[ValueType::String, ValueType::Int],
                t if t.is_textual() => &[ValueType::Float, ValueType::Int],
                _ => {
                    tracing::debug!(column, %dtype, "no type transform for column type");
                    continue;
                }
            };
            let target = *pick(choices, &mut self.rng);
            let outcome = self.base.apply(column, &Cast::new(target), &mut self.rng)?;
            if outcome.diagnostic.is_some() {
                tracing::error!(column, "Could not change type for column");
            }
            report.record(outcome);
        }
        Ok(())
    }
}

impl<R: RngCore> Strategy for NoiseMaker<'_, R> {
    fn name(&self) -> &str {
        "noise"
    }

    fn run(&mut self) -> Result<RunReport> {
        let mut report = RunReport::new(self.name());
        for op in self.noise.clone() {
            tracing::info!(strategy = "noise", noise = %op, columns = ?self.columns, "applying noise");
            match op {
                NoiseOp::AddNulls => self.nullify(&mut report)?,
                NoiseOp::StringPermutation => self.string_permutation(&mut report)?,
                NoiseOp::Random => self.randomize(&mut report)?,
                NoiseOp::Range => self.use_range(&mut report)?,
                NoiseOp::TypeTransform => self.type_transform(&mut report)?,
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dataset::{DataSetOptions, Matrix, Row};
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dataset() -> DataSet {
        let rows = (0..10)
            .map(|i| {
                Row::mapping([
                    ("id", Value::Int(i)),
                    ("price", Value::Float(i as f64 * 1.5)),
                    ("name", Value::from(format!("item number {i}"))),
                ])
            })
            .collect::<Vec<_>>();
        DataSet::new(rows, DataSetOptions::default()).unwrap()
    }

    #[test]
    fn test_requires_noise_ops() {
        let mut ds = dataset();
        let config = StrategyConfig::new("noise", 30.0);
        assert!(matches!(
            NoiseMaker::with_rng(&mut ds, &config, StdRng::seed_from_u64(1)),
            Err(FuzzError::Construction(_))
        ));
    }

    #[test]
    fn test_add_nulls() {
        let mut ds = dataset();
        let config = StrategyConfig::new("noise", 30.0)
            .with_columns(vec!["id".into()])
            .with_noise(vec![NoiseOp::AddNulls]);
        let report = NoiseMaker::with_rng(&mut ds, &config, StdRng::seed_from_u64(1))
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(report.cells_mutated, 3);
        let nulls = ds.records().column_values(0).filter(Value::is_null).count();
        assert_eq!(nulls, 3);
    }

    #[test]
    fn test_range_with_limits_stays_inside() {
        let mut ds = dataset();
        let config = StrategyConfig::new("noise", 50.0)
            .with_columns(vec!["price".into()])
            .with_noise(vec![NoiseOp::Range])
            .with_limits(100.0, 200.0);
        NoiseMaker::with_rng(&mut ds, &config, StdRng::seed_from_u64(2))
            .unwrap()
            .run()
            .unwrap();
        let high = ds
            .records()
            .column_values(1)
            .filter(|v| v.as_float().is_some_and(|f| f >= 100.0))
            .count();
        assert_eq!(high, 5);
    }

    #[test]
    fn test_random_on_extreme_floats() {
        let mut ds = DataSet::new(
            Matrix::from(array![[-1e308], [0.0], [1e308]]),
            DataSetOptions::default(),
        )
        .unwrap();
        let config = StrategyConfig::new("noise", 50.0)
            .with_columns(vec![0usize.into()])
            .with_noise(vec![NoiseOp::Random]);
        let report = NoiseMaker::with_rng(&mut ds, &config, StdRng::seed_from_u64(7))
            .unwrap()
            .run()
            .unwrap();
        assert!(report.is_clean());
        assert_eq!(report.cells_mutated, 2);
        assert!(ds
            .records()
            .column_values(0)
            .all(|v| v.as_float().is_some_and(|f| (-1e308..=1e308).contains(&f))));
    }

    #[test]
    fn test_infinite_limits_give_a_diagnostic() {
        let mut ds = dataset();
        let before = ds.records().clone();
        let config = StrategyConfig::new("noise", 50.0)
            .with_columns(vec!["price".into()])
            .with_noise(vec![NoiseOp::Range])
            .with_limits(f64::NEG_INFINITY, f64::INFINITY);
        let report = NoiseMaker::with_rng(&mut ds, &config, StdRng::seed_from_u64(7))
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(report.cells_mutated, 0);
        assert_eq!(report.diagnostics.len(), 1);
        assert_eq!(report.diagnostics[0].operation, "range");
        assert_eq!(ds.records(), &before);
    }

    #[test]
    fn test_range_on_text_is_not_implemented() {
        let mut ds = dataset();
        let config = StrategyConfig::new("noise", 30.0)
            .with_columns(vec!["name".into()])
            .with_noise(vec![NoiseOp::Range]);
        let mut noise = NoiseMaker::with_rng(&mut ds, &config, StdRng::seed_from_u64(3)).unwrap();
        assert!(matches!(noise.run(), Err(FuzzError::NotImplemented(_))));
    }

    #[test]
    fn test_type_transform_changes_types() {
        let mut ds = dataset();
        let config = StrategyConfig::new("noise", 50.0)
            .with_columns(vec!["id".into()])
            .with_noise(vec![NoiseOp::TypeTransform]);
        let report = NoiseMaker::with_rng(&mut ds, &config, StdRng::seed_from_u64(4))
            .unwrap()
            .run()
            .unwrap();
        assert!(report.is_clean());
        let changed = ds
            .records()
            .column_values(0)
            .filter(|v| !matches!(v, Value::Int(_)))
            .count();
        assert_eq!(changed, 5);
    }

    #[test]
    fn test_ops_parse_from_names() {
        assert_eq!("type_transform".parse::<NoiseOp>().unwrap(), NoiseOp::TypeTransform);
        assert!("shout".parse::<NoiseOp>().is_err());
    }
}
