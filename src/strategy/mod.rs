//! Mutation strategies bound to one dataset and one sampling percentage.

pub mod duplicator;
pub mod fuzz;
pub mod noise;

pub use duplicator::Duplicator;
pub use fuzz::Fuzzer;
pub use noise::{NoiseMaker, NoiseOp};

use crate::core::dataset::{scaled_count, ColumnRef, DataSet};
use crate::core::error::{FuzzError, Result};
use crate::core::value::{Value, ValueType};
use crate::engine::{mutation, MutationOutcome, RunReport};
use crate::transforms::noise::{RandomFloat, RandomInt};
use crate::transforms::Transform;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Percentage (1-100 scale) used when a configuration leaves it out.
pub const DEFAULT_PERCENTAGE: f64 = 30.0;

pub trait Strategy {
    fn name(&self) -> &str;

    /// Mutate the bound dataset in place. Recovered failures are listed in
    /// the report; only fatal ones are returned as errors.
    fn run(&mut self) -> Result<RunReport>;
}

/// State shared by every strategy: the dataset it mutates and the fraction
/// of rows each step touches.
#[derive(Debug)]
pub struct StrategyBase<'a> {
    dataset: &'a mut DataSet,
    percentage: f64,
}

impl<'a> StrategyBase<'a> {
    /// `percentage` must lie strictly between 0 and 1.
    pub fn new(dataset: &'a mut DataSet, percentage: f64) -> Result<Self> {
        if !(percentage > 0.0 && percentage < 1.0) {
            return Err(FuzzError::InvalidPercentage(percentage));
        }
        Ok(Self {
            dataset,
            percentage,
        })
    }

    pub fn percentage(&self) -> f64 {
        self.percentage
    }

    pub fn dataset(&self) -> &DataSet {
        &*self.dataset
    }

    pub fn dataset_mut(&mut self) -> &mut DataSet {
        &mut *self.dataset
    }

    /// Rows touched per mutation step, for the dataset's current length.
    pub fn row_count(&self) -> usize {
        scaled_count(self.dataset.len(), self.percentage)
    }

    /// Canonical positions for `columns`, entry by entry.
    pub fn resolve_columns(&self, columns: &[ColumnRef]) -> Result<Vec<usize>> {
        columns.iter().map(|c| self.dataset.column_index(c)).collect()
    }

    /// The given columns, or a fresh column sample when none are given.
    pub fn columns_or_sample<R: Rng + ?Sized>(
        &self,
        columns: Option<&[ColumnRef]>,
        rng: &mut R,
    ) -> Result<Vec<usize>> {
        match columns {
            Some(cols) if !cols.is_empty() => self.resolve_columns(cols),
            _ => {
                let sampled = self.dataset.sample_columns(self.percentage, rng);
                self.resolve_columns(&sampled)
            }
        }
    }

    /// Mutate `row_count()` random cells of `column`.
    pub fn apply(
        &mut self,
        column: usize,
        transform: &dyn Transform,
        rng: &mut dyn RngCore,
    ) -> Result<MutationOutcome> {
        let rows = self.row_count();
        mutation::apply(self.dataset, column, transform, rows, rng)
    }
}

/// Random value in a column's observed range, typed like the column.
/// Non-finite bounds give no transform.
pub(crate) fn range_transform(
    dtype: ValueType,
    low: &Value,
    high: &Value,
) -> Option<Box<dyn Transform>> {
    match dtype {
        ValueType::Int => Some(Box::new(RandomInt::new(low.as_int()?, high.as_int()?))),
        ValueType::Float => {
            let (low, high) = (low.as_float()?, high.as_float()?);
            if !low.is_finite() || !high.is_finite() {
                return None;
            }
            Some(Box::new(RandomFloat::new(low, high)))
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Fuzz,
    Noise,
    Duplicator,
}

impl FromStr for StrategyKind {
    type Err = FuzzError;

    /// Loose match: any type containing `fuzz`, `noise`, `dupli` or `dupe`.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_lowercase();
        if lower.contains("fuzz") {
            Ok(StrategyKind::Fuzz)
        } else if lower.contains("noise") {
            Ok(StrategyKind::Noise)
        } else if lower.contains("dupli") || lower.contains("dupe") {
            Ok(StrategyKind::Duplicator)
        } else {
            Err(FuzzError::NotImplemented(format!(
                "No strategy for type {}",
                lower
            )))
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Fuzz => write!(f, "fuzz"),
            StrategyKind::Noise => write!(f, "noise"),
            StrategyKind::Duplicator => write!(f, "duplicator"),
        }
    }
}

/// Declarative strategy definition as found in pipeline files and on the
/// command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(rename = "type")]
    pub kind: String,
    /// 1-100
    #[serde(default)]
    pub percentage: Option<f64>,
    #[serde(default)]
    pub columns: Option<Vec<ColumnRef>>,
    #[serde(default)]
    pub noise: Option<Vec<NoiseOp>>,
    #[serde(default)]
    pub add_noise: bool,
    #[serde(default)]
    pub limits: Option<(f64, f64)>,
}

impl StrategyConfig {
    pub fn new(kind: impl Into<String>, percentage: f64) -> Self {
        Self {
            kind: kind.into(),
            percentage: Some(percentage),
            ..Self::default()
        }
    }

    pub fn strategy_kind(&self) -> Result<StrategyKind> {
        self.kind.parse()
    }

    /// The configured percentage as a fraction.
    pub fn fraction(&self) -> f64 {
        self.percentage.unwrap_or(DEFAULT_PERCENTAGE) / 100.0
    }

    pub fn with_columns(mut self, columns: Vec<ColumnRef>) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn with_noise(mut self, noise: Vec<NoiseOp>) -> Self {
        self.noise = Some(noise);
        self
    }

    pub fn with_add_noise(mut self, add_noise: bool) -> Self {
        self.add_noise = add_noise;
        self
    }

    pub fn with_limits(mut self, low: f64, high: f64) -> Self {
        self.limits = Some((low, high));
        self
    }
}

/// Construct the strategy `config` describes, bound to `dataset`.
pub fn build_strategy<'a, R>(
    config: &StrategyConfig,
    dataset: &'a mut DataSet,
    rng: R,
) -> Result<Box<dyn Strategy + 'a>>
where
    R: RngCore + 'a,
{
    let strategy: Box<dyn Strategy + 'a> = match config.strategy_kind()? {
        StrategyKind::Fuzz => Box::new(Fuzzer::with_rng(dataset, config, rng)?),
        StrategyKind::Noise => Box::new(NoiseMaker::with_rng(dataset, config, rng)?),
        StrategyKind::Duplicator => Box::new(Duplicator::with_rng(dataset, config, rng)?),
    };
    tracing::debug!(strategy = strategy.name(), "strategy built");
    Ok(strategy)
}
