//! Declarative pipelines: one input, a list of strategies run in order, one
//! output.
//!
//! Pipelines come from YAML files:
//!
//! ```yaml
//! data:
//!   input: file://people.csv
//!   output: file://people_noisy.csv
//! strategies:
//!   - type: noise
//!     percentage: 20
//!     noise: [add_nulls, random]
//!   - type: duplicator
//!     percentage: 10
//!     add_noise: true
//! ```
//!
//! or from command-line arguments via [`PipelineSpec::from_args`].

use crate::core::config::FuzzConfig;
use crate::core::dataset::{DataSet, DataSetOptions};
use crate::core::error::{FuzzError, Result};
use crate::core::output::Output;
use crate::engine::RunReport;
use crate::strategy::{build_strategy, StrategyConfig};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSpec {
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub db_uri: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    #[serde(default)]
    pub data: DataSpec,
    #[serde(default)]
    pub strategies: Vec<StrategyConfig>,
}

/// One strategy that failed while running; the pipeline went on without it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyFailure {
    pub index: usize,
    pub strategy: String,
    pub message: String,
}

#[derive(Debug)]
pub struct PipelineReport {
    pub output: Output,
    pub reports: Vec<RunReport>,
    pub failures: Vec<StrategyFailure>,
}

impl PipelineSpec {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            FuzzError::Config(format!("could not read {}: {}", path.display(), e))
        })?;
        let spec = Self::from_yaml_str(&content)?;
        tracing::debug!(path = %path.display(), strategies = spec.strategies.len(), "pipeline loaded");
        Ok(spec)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let spec: PipelineSpec = serde_yaml::from_str(content)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Pipeline from command-line pieces. Strategies missing a percentage
    /// get `default_percentage`.
    pub fn from_args(
        data: DataSpec,
        mut strategies: Vec<StrategyConfig>,
        default_percentage: f64,
    ) -> Result<Self> {
        for strategy in &mut strategies {
            strategy.percentage.get_or_insert(default_percentage);
        }
        let spec = Self { data, strategies };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<()> {
        if self.data.input.as_deref().map_or(true, str::is_empty) {
            return Err(FuzzError::Config("You must define data input.".to_string()));
        }
        if self.data.output.as_deref().map_or(true, str::is_empty) {
            return Err(FuzzError::Config("You must define data output.".to_string()));
        }
        for (i, strategy) in self.strategies.iter().enumerate() {
            if strategy.kind.is_empty() || strategy.percentage.is_none() {
                return Err(FuzzError::Config(format!(
                    "Strategy {} must define both type and percentage.",
                    i
                )));
            }
        }
        Ok(())
    }

    fn options(&self, config: &FuzzConfig) -> DataSetOptions {
        let mut options = DataSetOptions::from_config(config);
        options.sink = self.data.output.clone();
        options.db_uri = self.data.db_uri.clone();
        options.query = self.data.query.clone();
        options.table = self.data.table.clone();
        options
    }
}

/// Bare `.csv`/`.json` paths are read as files.
fn input_descriptor(input: &str) -> String {
    let lower = input.to_lowercase();
    let is_file = lower.ends_with(".csv") || lower.ends_with(".json");
    if is_file && !input.contains("://") {
        format!("file://{}", input)
    } else {
        input.to_string()
    }
}

/// Load the input, run every strategy in order, and export.
pub fn run_pipeline<R: RngCore>(
    spec: &PipelineSpec,
    config: &FuzzConfig,
    rng: &mut R,
) -> Result<PipelineReport> {
    spec.validate()?;
    let input = spec.data.input.as_deref().unwrap_or_default();
    let mut dataset = DataSet::new(input_descriptor(input), spec.options(config))?;
    tracing::info!(
        input,
        representation = %dataset.representation(),
        rows = dataset.len(),
        "pipeline input loaded"
    );

    let mut reports = Vec::with_capacity(spec.strategies.len());
    let mut failures = Vec::new();
    for (index, strategy_config) in spec.strategies.iter().enumerate() {
        let mut strategy = build_strategy(strategy_config, &mut dataset, &mut *rng)?;
        match strategy.run() {
            Ok(report) => {
                for diagnostic in &report.diagnostics {
                    tracing::warn!(strategy = %strategy_config.kind, "{}", diagnostic);
                }
                reports.push(report);
            }
            Err(e) => {
                tracing::error!(strategy = %strategy_config.kind, index, "strategy failed: {}", e);
                failures.push(StrategyFailure {
                    index,
                    strategy: strategy_config.kind.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    let output = dataset.to_output()?;
    tracing::info!(output = %output, "pipeline finished");
    Ok(PipelineReport {
        output,
        reports,
        failures,
    })
}
