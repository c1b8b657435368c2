//! Export of a dataset to its configured sink.

use crate::core::connectors::{sql_connector, ConnectorRegistry};
use crate::core::dataset::{DataSet, DataSetOptions, Records, Representation};
use crate::core::error::{FuzzError, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Where exported data goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    /// Hand back the records in their current representation
    Native,
    Representation(Representation),
    /// A new dataset wrapping the records
    Dataset,
    File(PathBuf),
    Sql,
}

impl Sink {
    /// Unset means pass-through.
    pub fn parse(sink: Option<&str>) -> Result<Sink> {
        match sink {
            None => Ok(Sink::Native),
            Some(s) => s.parse(),
        }
    }
}

impl FromStr for Sink {
    type Err = FuzzError;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(path) = s.strip_prefix("file://") {
            let lower = path.to_lowercase();
            if lower.ends_with(".csv") || lower.ends_with(".json") {
                return Ok(Sink::File(PathBuf::from(path)));
            }
            return Err(FuzzError::NotImplemented(
                "Only CSV and JSON file types supported.".to_string(),
            ));
        }
        match s {
            "dataset" => Ok(Sink::Dataset),
            "sql" => Ok(Sink::Sql),
            other => other
                .parse::<Representation>()
                .map(Sink::Representation)
                .map_err(|_| FuzzError::NotImplemented(format!("Output {} not supported", other))),
        }
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sink::Native => write!(f, "native"),
            Sink::Representation(r) => write!(f, "{}", r),
            Sink::Dataset => write!(f, "dataset"),
            Sink::File(p) => write!(f, "file://{}", p.display()),
            Sink::Sql => write!(f, "sql"),
        }
    }
}

/// Result of an export.
#[derive(Debug, Clone)]
pub enum Output {
    Records(Records),
    Dataset(Box<DataSet>),
    /// Path of the written file
    File(PathBuf),
    Sql { table: String, rows: usize },
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Records(r) => write!(f, "{} records ({} rows)", r.representation(), r.len()),
            Output::Dataset(d) => write!(f, "dataset {} ({} rows)", d.id(), d.len()),
            Output::File(p) => write!(f, "{}", p.display()),
            Output::Sql { table, rows } => write!(f, "sql table {} ({} rows)", table, rows),
        }
    }
}

impl DataSet {
    /// Export the records to the configured sink.
    pub fn to_output(&self) -> Result<Output> {
        let sink = Sink::parse(self.sink())?;
        let records = self.records();
        tracing::debug!(sink = %sink, representation = %self.representation(), "exporting");

        match sink {
            Sink::Native => Ok(Output::Records(records.clone())),
            Sink::Representation(r) => Ok(Output::Records(records.clone().convert(r)?)),
            Sink::Dataset => {
                let options = DataSetOptions {
                    prefer_tabular: self.options().prefer_tabular,
                    ..DataSetOptions::default()
                };
                Ok(Output::Dataset(Box::new(DataSet::new(records.clone(), options)?)))
            }
            Sink::File(path) => {
                let registry = ConnectorRegistry::with_defaults();
                let lookup = path.to_string_lossy();
                let connector = registry.find_connector(&lookup).ok_or_else(|| {
                    FuzzError::NotImplemented("Only CSV and JSON file types supported.".to_string())
                })?;
                connector.write(&path, records)?;
                tracing::info!(path = %path.display(), "dataset written");
                Ok(Output::File(path))
            }
            Sink::Sql => {
                let options = self.options();
                let (db_uri, table) = match (&options.db_uri, &options.table) {
                    (Some(u), Some(t)) => (u, t),
                    _ => {
                        return Err(FuzzError::Config(
                            "You must define a valid db_uri and table to write SQL.".to_string(),
                        ))
                    }
                };
                let rows = sql_connector::write_table(db_uri, table, records)?;
                Ok(Output::Sql {
                    table: table.clone(),
                    rows,
                })
            }
        }
    }
}
