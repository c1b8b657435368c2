//! The unified dataset: one payload in exactly one of three representations
//! (labeled table, homogeneous matrix, row records) behind a single API.

pub mod column;
pub mod iter;
pub mod matrix;
pub mod records;
pub mod row;
pub mod table;

pub use column::{Aggregate, ColumnRef};
pub use iter::Rows;
pub use matrix::{CellMismatch, Element, Matrix, WriteMode};
pub use records::{Records, Representation};
pub use row::Row;
pub use table::{Column, Table};

use crate::core::config::FuzzConfig;
use crate::core::connectors::{sql_connector, ConnectorRegistry};
use crate::core::error::{FuzzError, Result};
use crate::core::value::{Value, ValueType};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const FILE_PREFIX: &str = "file://";
const SQL_MARKER: &str = "sql";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetId(pub Uuid);

impl DatasetId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DatasetId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a dataset can be built from.
#[derive(Debug, Clone)]
pub enum Source {
    Table(Table),
    Matrix(Matrix),
    Rows(Vec<Row>),
    /// `file://<path>.csv`, `file://<path>.json` or `sql`
    Descriptor(String),
}

impl From<Table> for Source {
    fn from(t: Table) -> Self {
        Source::Table(t)
    }
}

impl From<Matrix> for Source {
    fn from(m: Matrix) -> Self {
        Source::Matrix(m)
    }
}

impl From<Vec<Row>> for Source {
    fn from(rows: Vec<Row>) -> Self {
        Source::Rows(rows)
    }
}

impl From<&str> for Source {
    fn from(s: &str) -> Self {
        Source::Descriptor(s.to_string())
    }
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        Source::Descriptor(s)
    }
}

impl From<Records> for Source {
    fn from(records: Records) -> Self {
        match records {
            Records::Tabular(t) => Source::Table(t),
            Records::Matrix(m) => Source::Matrix(m),
            Records::Rows(rows) => Source::Rows(rows),
        }
    }
}

/// Where the data came from. Kept for provenance only; the payload itself
/// lives in `records`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SourceDescriptor {
    /// Shape the caller handed in, which may differ from the stored shape
    /// (row lists are stored as tables when `prefer_tabular` is set).
    Memory(Representation),
    File(PathBuf),
    Sql { db_uri: String, query: String },
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceDescriptor::Memory(r) => write!(f, "in-memory {}", r),
            SourceDescriptor::File(p) => write!(f, "{}{}", FILE_PREFIX, p.display()),
            SourceDescriptor::Sql { query, .. } => write!(f, "sql ({})", query),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSetOptions {
    /// Materialize files, queries and row lists as a table when possible
    pub prefer_tabular: bool,
    pub sink: Option<String>,
    pub db_uri: Option<String>,
    pub query: Option<String>,
    pub table: Option<String>,
}

impl Default for DataSetOptions {
    fn default() -> Self {
        Self {
            prefer_tabular: true,
            sink: None,
            db_uri: None,
            query: None,
            table: None,
        }
    }
}

impl DataSetOptions {
    pub fn from_config(config: &FuzzConfig) -> Self {
        Self {
            prefer_tabular: config.dataset.prefer_tabular,
            ..Self::default()
        }
    }

    /// Keep row lists as records instead of building a table.
    pub fn records() -> Self {
        Self {
            prefer_tabular: false,
            ..Self::default()
        }
    }

    pub fn with_sink(mut self, sink: impl Into<String>) -> Self {
        self.sink = Some(sink.into());
        self
    }

    pub fn with_sql(
        mut self,
        db_uri: impl Into<String>,
        query: Option<String>,
        table: Option<String>,
    ) -> Self {
        self.db_uri = Some(db_uri.into());
        self.query = query;
        self.table = table;
        self
    }

    /// SQL on either end needs a connection plus a query or table.
    fn validate_sql(&self, source_is_sql: bool) -> Result<()> {
        let sink_is_sql = self.sink.as_deref() == Some(SQL_MARKER);
        if !source_is_sql && !sink_is_sql {
            return Ok(());
        }
        let uri_ok = self.db_uri.as_deref().is_some_and(|u| !u.is_empty());
        let target_ok = (!source_is_sql || self.query.is_some())
            && (!sink_is_sql || self.table.is_some());
        if !uri_ok || !target_ok {
            return Err(FuzzError::Construction(
                "You must define a valid db_uri and query or table to use SQL.".to_string(),
            ));
        }
        if let Some(uri) = &self.db_uri {
            sql_connector::parse_uri(uri)?;
        }
        Ok(())
    }
}

/// Number of items a fraction of `total` selects, rounding half to even.
pub fn scaled_count(total: usize, fraction: f64) -> usize {
    let n = (total as f64 * fraction).round_ties_even();
    if n <= 0.0 {
        0
    } else {
        (n as usize).min(total)
    }
}

#[derive(Debug, Clone)]
pub struct DataSet {
    id: DatasetId,
    records: Records,
    source: SourceDescriptor,
    options: DataSetOptions,
    created_at: DateTime<Utc>,
}

impl DataSet {
    /// Build a dataset from any supported source. Fails when the source is
    /// not understood, cannot be read, or yields no rows.
    pub fn new(source: impl Into<Source>, options: DataSetOptions) -> Result<Self> {
        let source = source.into();
        let is_sql = matches!(&source, Source::Descriptor(s) if s == SQL_MARKER);
        options.validate_sql(is_sql)?;

        let (records, descriptor) = match source {
            Source::Table(t) => (
                Records::Tabular(t),
                SourceDescriptor::Memory(Representation::Tabular),
            ),
            Source::Matrix(m) => (
                Records::Matrix(m),
                SourceDescriptor::Memory(Representation::Matrix),
            ),
            Source::Rows(rows) => {
                let records = if options.prefer_tabular {
                    Records::Tabular(Table::from_rows(&rows))
                } else {
                    Records::Rows(rows)
                };
                (records, SourceDescriptor::Memory(Representation::Records))
            }
            Source::Descriptor(s) => Self::ingest(&s, &options)?,
        };

        if records.is_empty() {
            return Err(FuzzError::EmptyInput(descriptor.to_string()));
        }

        tracing::debug!(
            representation = %records.representation(),
            rows = records.len(),
            source = %descriptor,
            "dataset constructed"
        );

        Ok(Self {
            id: DatasetId::new(),
            records,
            source: descriptor,
            options,
            created_at: Utc::now(),
        })
    }

    /// Wrap records as they are, keeping their representation.
    pub fn from_records(records: Records) -> Result<Self> {
        if records.is_empty() {
            return Err(FuzzError::EmptyInput(format!(
                "in-memory {}",
                records.representation()
            )));
        }
        let representation = records.representation();
        Ok(Self {
            id: DatasetId::new(),
            records,
            source: SourceDescriptor::Memory(representation),
            options: DataSetOptions {
                prefer_tabular: representation == Representation::Tabular,
                ..DataSetOptions::default()
            },
            created_at: Utc::now(),
        })
    }

    fn ingest(descriptor: &str, options: &DataSetOptions) -> Result<(Records, SourceDescriptor)> {
        if descriptor == SQL_MARKER {
            let (db_uri, query) = match (&options.db_uri, &options.query) {
                (Some(u), Some(q)) => (u.clone(), q.clone()),
                _ => {
                    return Err(FuzzError::Construction(
                        "You must define a valid db_uri and query or table to use SQL."
                            .to_string(),
                    ))
                }
            };
            let records = sql_connector::read_query(&db_uri, &query, options.prefer_tabular)?;
            return Ok((records, SourceDescriptor::Sql { db_uri, query }));
        }

        let path = descriptor
            .strip_prefix(FILE_PREFIX)
            .ok_or_else(|| FuzzError::UnsupportedInput(descriptor.to_string()))?;
        let registry = ConnectorRegistry::with_defaults();
        let connector = registry
            .find_connector(path)
            .ok_or_else(|| FuzzError::UnsupportedInput(descriptor.to_string()))?;
        if !Path::new(path).exists() {
            return Err(FuzzError::Construction(format!(
                "Could not retrieve filename {}",
                path
            )));
        }
        tracing::info!(connector = connector.name(), path, "reading input");
        let records = connector.read(Path::new(path), options.prefer_tabular)?;
        Ok((records, SourceDescriptor::File(PathBuf::from(path))))
    }

    pub fn id(&self) -> DatasetId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn representation(&self) -> Representation {
        self.records.representation()
    }

    pub fn source(&self) -> &SourceDescriptor {
        &self.source
    }

    pub fn options(&self) -> &DataSetOptions {
        &self.options
    }

    pub fn sink(&self) -> Option<&str> {
        self.options.sink.as_deref()
    }

    pub fn records(&self) -> &Records {
        &self.records
    }

    /// Mutable access for in-place mutation. Swapping in another
    /// representation is not possible through this handle's users: the
    /// engine only writes cells.
    pub fn records_mut(&mut self) -> &mut Records {
        &mut self.records
    }

    pub fn into_records(self) -> Records {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn num_columns(&self) -> usize {
        self.records.num_columns()
    }

    /// A fresh forward-only traversal over the rows.
    pub fn iter(&self) -> Rows<'_> {
        Rows::new(&self.records)
    }

    /// Positional row access, independent of any traversal.
    pub fn get(&self, idx: usize) -> Option<Row> {
        self.records.row(idx)
    }

    /// `round(len * percentage)` distinct rows, in pick order, keeping the
    /// representation.
    pub fn sample<R: Rng + ?Sized>(&self, percentage: f64, rng: &mut R) -> Records {
        let total = self.len();
        let amount = scaled_count(total, percentage);
        let positions = rand::seq::index::sample(rng, total, amount).into_vec();
        self.records.take_rows(&positions)
    }

    /// `round(num_columns * percentage)` distinct columns: labels where the
    /// representation names its columns, positions otherwise.
    pub fn sample_columns<R: Rng + ?Sized>(&self, percentage: f64, rng: &mut R) -> Vec<ColumnRef> {
        let total = self.num_columns();
        let amount = scaled_count(total, percentage);
        let picks = rand::seq::index::sample(rng, total, amount).into_vec();
        match self.records.column_names() {
            Some(names) => picks
                .into_iter()
                .map(|i| ColumnRef::Name(names[i].clone()))
                .collect(),
            None => picks.into_iter().map(ColumnRef::Index).collect(),
        }
    }

    /// Canonical position of a column. Positions and numeric labels pass
    /// through unchecked; labels resolve against the table header or the
    /// keys of row 0.
    pub fn column_index(&self, column: &ColumnRef) -> Result<usize> {
        if let Some(idx) = column.as_index() {
            return Ok(idx);
        }
        let name = match column {
            ColumnRef::Name(n) => n.as_str(),
            ColumnRef::Index(i) => return Ok(*i),
        };
        let found = match &self.records {
            Records::Tabular(t) => t.position(name),
            Records::Rows(rows) => rows.first().and_then(|r| r.key_position(name)),
            Records::Matrix(_) => None,
        };
        found.ok_or_else(|| FuzzError::ColumnNotFound(name.to_string()))
    }

    pub fn column_dtype(&self, column: usize) -> Result<ValueType> {
        self.records
            .column_dtype(column)
            .ok_or_else(|| FuzzError::ColumnNotFound(column.to_string()))
    }

    /// Reduce every value of a column with `agg`.
    pub fn column_agg<T, F>(&self, column: usize, agg: F) -> Result<T>
    where
        F: FnOnce(&mut dyn Iterator<Item = Value>) -> T,
    {
        if column >= self.num_columns() {
            return Err(FuzzError::ColumnNotFound(column.to_string()));
        }
        let mut values = self.records.column_values(column);
        Ok(agg(&mut values))
    }

    pub fn column_min(&self, column: usize) -> Result<Option<Value>> {
        self.column_agg(column, |values| Aggregate::Min.reduce(values))
    }

    pub fn column_max(&self, column: usize) -> Result<Option<Value>> {
        self.column_agg(column, |values| Aggregate::Max.reduce(values))
    }

    /// Extend with `rows`; returns how many rows were added.
    pub fn append(&mut self, rows: impl Into<Records>) -> Result<usize> {
        let rows = rows.into();
        let added = rows.len();
        self.records.append(rows)?;
        tracing::debug!(added, total = self.len(), "rows appended");
        Ok(added)
    }
}

impl<'a> IntoIterator for &'a DataSet {
    type Item = Row;
    type IntoIter = Rows<'a>;

    fn into_iter(self) -> Rows<'a> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rows() -> Vec<Row> {
        (0..10)
            .map(|i| Row::mapping([("id", Value::Int(i)), ("name", Value::from(format!("n{i}")))]))
            .collect()
    }

    #[test]
    fn test_rounding_is_half_even() {
        assert_eq!(scaled_count(5, 0.5), 2);
        assert_eq!(scaled_count(7, 0.5), 4);
        assert_eq!(scaled_count(10, 0.01), 0);
        assert_eq!(scaled_count(10, 1.0), 10);
    }

    #[test]
    fn test_rows_become_table_when_preferred() {
        let ds = DataSet::new(rows(), DataSetOptions::default()).unwrap();
        assert_eq!(ds.representation(), Representation::Tabular);
        assert_eq!(ds.source(), &SourceDescriptor::Memory(Representation::Records));
        let ds = DataSet::new(rows(), DataSetOptions::records()).unwrap();
        assert_eq!(ds.representation(), Representation::Records);
        assert_eq!(ds.len(), 10);
    }

    #[test]
    fn test_unknown_descriptor_is_unsupported() {
        match DataSet::new("hello", DataSetOptions::default()) {
            Err(FuzzError::UnsupportedInput(s)) => assert_eq!(s, "hello"),
            other => panic!("expected UnsupportedInput, got {:?}", other.map(|d| d.len())),
        }
    }

    #[test]
    fn test_sql_without_query_fails_before_reading() {
        let opts = DataSetOptions::default().with_sql("sqlite:///:memory:", None, None);
        assert!(matches!(
            DataSet::new("sql", opts),
            Err(FuzzError::Construction(_))
        ));
    }

    #[test]
    fn test_iteration_is_restartable() {
        let ds = DataSet::new(rows(), DataSetOptions::records()).unwrap();
        assert_eq!(ds.iter().count(), 10);
        assert_eq!(ds.iter().len(), 10);
        assert_eq!(ds.iter().next(), ds.get(0));
    }

    #[test]
    fn test_column_index_resolution() {
        let ds = DataSet::new(rows(), DataSetOptions::records()).unwrap();
        assert_eq!(ds.column_index(&"name".into()).unwrap(), 1);
        assert_eq!(ds.column_index(&"7".into()).unwrap(), 7);
        assert!(matches!(
            ds.column_index(&"missing".into()),
            Err(FuzzError::ColumnNotFound(_))
        ));

        let m = DataSet::new(Matrix::from(array![[1i64, 2]]), DataSetOptions::default()).unwrap();
        assert!(m.column_index(&"a".into()).is_err());
    }

    #[test]
    fn test_sample_columns_uses_names_when_available() {
        let mut rng = StdRng::seed_from_u64(7);
        let ds = DataSet::new(rows(), DataSetOptions::default()).unwrap();
        let cols = ds.sample_columns(0.5, &mut rng);
        assert_eq!(cols.len(), 1);
        assert!(matches!(cols[0], ColumnRef::Name(_)));

        let m = DataSet::new(
            Matrix::from(array![[1.0, 2.0, 3.0, 4.0]]),
            DataSetOptions::default(),
        )
        .unwrap();
        let cols = m.sample_columns(0.5, &mut rng);
        assert_eq!(cols.len(), 2);
        assert!(cols.iter().all(|c| matches!(c, ColumnRef::Index(i) if *i < 4)));
    }
}
