pub mod csv_connector;
pub mod json_connector;
pub mod sql_connector;

pub use csv_connector::CsvConnector;
pub use json_connector::JsonConnector;

use crate::core::dataset::{Records, Table};
use crate::core::error::Result;
use std::path::Path;

/// A file format the dataset can be read from and written to.
pub trait Connector: Send + Sync {
    /// Unique name of the connector (e.g., "csv", "json")
    fn name(&self) -> &str;

    /// Check if this connector can handle the given path
    fn can_handle(&self, path: &str) -> bool;

    /// Read the file, as a table when `prefer_tabular` is set and as row
    /// records otherwise.
    fn read(&self, path: &Path, prefer_tabular: bool) -> Result<Records>;

    /// Write `records` to `path`, replacing any existing file.
    fn write(&self, path: &Path, records: &Records) -> Result<()>;
}

/// Registry for managing available connectors
pub struct ConnectorRegistry {
    connectors: Vec<Box<dyn Connector>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self {
            connectors: Vec::new(),
        }
    }

    /// CSV and JSON.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(CsvConnector::new()));
        registry.register(Box::new(JsonConnector::new()));
        registry
    }

    pub fn register(&mut self, connector: Box<dyn Connector>) {
        self.connectors.push(connector);
    }

    pub fn find_connector(&self, path: &str) -> Option<&dyn Connector> {
        self.connectors
            .iter()
            .find(|c| c.can_handle(path))
            .map(|c| c.as_ref())
    }

    pub fn list_connectors(&self) -> Vec<&str> {
        self.connectors.iter().map(|c| c.name()).collect()
    }
}

impl Default for ConnectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Column-aligned view used by the writers, plus whether the source
/// representation carried real column labels.
pub(crate) fn aligned(records: &Records) -> (Table, bool) {
    let named = records.column_names().is_some();
    (records.clone().into_table(), named)
}
