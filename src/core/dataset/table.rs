use super::row::Row;
use crate::core::error::{FuzzError, Result};
use crate::core::value::{Value, ValueType};
use indexmap::IndexMap;

/// A single named column. The type follows the values: it is re-inferred
/// every time cells are written.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    values: Vec<Value>,
    dtype: ValueType,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        let dtype = ValueType::infer(&values);
        Self {
            name: name.into(),
            values,
            dtype,
        }
    }

    pub fn dtype(&self) -> ValueType {
        self.dtype
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn refresh_dtype(&mut self) {
        self.dtype = ValueType::infer(&self.values);
    }
}

/// Labeled two-dimensional table stored column-major.
/// Row order is insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, values)` pairs. All columns must have equal length.
    pub fn from_columns<N: Into<String>>(columns: Vec<(N, Vec<Value>)>) -> Result<Self> {
        let mut table = Table::new();
        for (name, values) in columns {
            let name = name.into();
            if !table.columns.is_empty() && values.len() != table.rows {
                return Err(FuzzError::ShapeMismatch(format!(
                    "column '{}' has {} rows, expected {}",
                    name,
                    values.len(),
                    table.rows
                )));
            }
            if table.position(&name).is_some() {
                return Err(FuzzError::Construction(format!(
                    "duplicate column name '{}'",
                    name
                )));
            }
            table.rows = values.len();
            table.columns.push(Column::new(name, values));
        }
        Ok(table)
    }

    /// Build from rows. Mapping keys are unioned in first-seen order;
    /// sequence rows get positional labels "0", "1", ... Missing cells are null.
    pub fn from_rows(rows: &[Row]) -> Self {
        let mut names: IndexMap<String, Vec<Value>> = IndexMap::new();
        for (i, row) in rows.iter().enumerate() {
            for (key, value) in row.labeled() {
                let column = names
                    .entry(key.into_owned())
                    .or_insert_with(|| vec![Value::Null; i]);
                column.push(value.clone());
            }
            for column in names.values_mut() {
                if column.len() < i + 1 {
                    column.push(Value::Null);
                }
            }
        }

        Self {
            rows: rows.len(),
            columns: names
                .into_iter()
                .map(|(name, values)| Column::new(name, values))
                .collect(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Position of a column label
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        self.columns.get(column)?.values.get(row)
    }

    pub fn row(&self, idx: usize) -> Option<Row> {
        if idx >= self.rows {
            return None;
        }
        Some(Row::Mapping(
            self.columns
                .iter()
                .map(|c| (c.name.clone(), c.values[idx].clone()))
                .collect(),
        ))
    }

    /// Positional row selection (pick order is kept).
    pub fn take_rows(&self, positions: &[usize]) -> Table {
        Table {
            rows: positions.len(),
            columns: self
                .columns
                .iter()
                .map(|c| {
                    Column::new(
                        c.name.clone(),
                        positions.iter().map(|&p| c.values[p].clone()).collect(),
                    )
                })
                .collect(),
        }
    }

    /// Concatenate rows of `other`, aligning columns by label.
    /// Labels missing on either side are filled with nulls.
    pub fn append(&mut self, other: Table) {
        let prior = self.rows;
        let added = other.rows;
        for column in other.columns {
            match self.position(&column.name) {
                Some(pos) => self.columns[pos].values.extend(column.values),
                None => {
                    let mut values = vec![Value::Null; prior];
                    values.extend(column.values);
                    self.columns.push(Column::new(column.name, values));
                }
            }
        }
        self.rows = prior + added;
        for column in &mut self.columns {
            column.values.resize(self.rows, Value::Null);
            column.refresh_dtype();
        }
    }

    /// Overwrite `column` at `positions` with `values` (same order), in place.
    pub fn write_column(&mut self, column: usize, positions: &[usize], values: Vec<Value>) {
        if let Some(col) = self.columns.get_mut(column) {
            for (&pos, value) in positions.iter().zip(values) {
                col.values[pos] = value;
            }
            col.refresh_dtype();
        }
    }
}
