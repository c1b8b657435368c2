use super::matrix::Matrix;
use super::row::Row;
use super::table::Table;
use crate::core::error::{FuzzError, Result};
use crate::core::value::{Value, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which in-memory shape backs a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Representation {
    Tabular,
    Matrix,
    Records,
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Representation::Tabular => write!(f, "tabular"),
            Representation::Matrix => write!(f, "matrix"),
            Representation::Records => write!(f, "records"),
        }
    }
}

impl FromStr for Representation {
    type Err = FuzzError;

    /// Accepts the representation tags and their dataframe/array/list aliases.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tabular" | "pandas" => Ok(Representation::Tabular),
            "matrix" | "numpy" => Ok(Representation::Matrix),
            "records" | "list" => Ok(Representation::Records),
            other => Err(FuzzError::NotImplemented(format!(
                "representation {} not supported",
                other
            ))),
        }
    }
}

/// The live payload of a dataset: exactly one of the three representations.
#[derive(Debug, Clone, PartialEq)]
pub enum Records {
    Tabular(Table),
    Matrix(Matrix),
    Rows(Vec<Row>),
}

impl Records {
    pub fn representation(&self) -> Representation {
        match self {
            Records::Tabular(_) => Representation::Tabular,
            Records::Matrix(_) => Representation::Matrix,
            Records::Rows(_) => Representation::Records,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Records::Tabular(t) => t.num_rows(),
            Records::Matrix(m) => m.nrows(),
            Records::Rows(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column count; row 0 is authoritative for `records`.
    pub fn num_columns(&self) -> usize {
        match self {
            Records::Tabular(t) => t.num_columns(),
            Records::Matrix(m) => m.ncols(),
            Records::Rows(rows) => rows.first().map(Row::len).unwrap_or(0),
        }
    }

    /// Column labels where naming exists.
    pub fn column_names(&self) -> Option<Vec<String>> {
        match self {
            Records::Tabular(t) => Some(t.column_names().into_iter().map(String::from).collect()),
            Records::Matrix(_) => None,
            Records::Rows(rows) => rows
                .first()
                .and_then(Row::keys)
                .map(|keys| keys.into_iter().map(String::from).collect()),
        }
    }

    pub fn row(&self, idx: usize) -> Option<Row> {
        match self {
            Records::Tabular(t) => t.row(idx),
            Records::Matrix(m) => m.row(idx).map(Row::Sequence),
            Records::Rows(rows) => rows.get(idx).cloned(),
        }
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<Value> {
        match self {
            Records::Tabular(t) => t.cell(row, column).cloned(),
            Records::Matrix(m) => m.get(row, column),
            Records::Rows(rows) => rows.get(row)?.get(column).cloned(),
        }
    }

    /// Rows at `positions`, in that order, keeping the representation.
    pub fn take_rows(&self, positions: &[usize]) -> Records {
        match self {
            Records::Tabular(t) => Records::Tabular(t.take_rows(positions)),
            Records::Matrix(m) => Records::Matrix(m.take_rows(positions)),
            Records::Rows(rows) => {
                Records::Rows(positions.iter().map(|&p| rows[p].clone()).collect())
            }
        }
    }

    /// Element type of one column: native for tabular/matrix, the runtime
    /// type of row 0's value for records.
    pub fn column_dtype(&self, column: usize) -> Option<ValueType> {
        match self {
            Records::Tabular(t) => t.column(column).map(|c| c.dtype()),
            Records::Matrix(m) => (column < m.ncols()).then(|| m.dtype()),
            Records::Rows(rows) => rows.first()?.get(column).map(Value::value_type),
        }
    }

    /// Stream one column's values.
    pub fn column_values(&self, column: usize) -> Box<dyn Iterator<Item = Value> + '_> {
        match self {
            Records::Tabular(t) => match t.column(column) {
                Some(c) => Box::new(c.values().iter().cloned()),
                None => Box::new(std::iter::empty()),
            },
            Records::Matrix(m) => m.column_values(column),
            Records::Rows(rows) => {
                let projected: Vec<Value> = rows
                    .iter()
                    .map(|r| r.get(column).cloned().unwrap_or(Value::Null))
                    .collect();
                Box::new(projected.into_iter())
            }
        }
    }

    /// Convert into another representation.
    pub fn convert(self, target: Representation) -> Result<Records> {
        if self.representation() == target {
            return Ok(self);
        }
        Ok(match target {
            Representation::Tabular => Records::Tabular(self.into_table()),
            Representation::Matrix => Records::Matrix(self.into_matrix()?),
            Representation::Records => Records::Rows(self.into_rows()),
        })
    }

    pub fn into_table(self) -> Table {
        match self {
            Records::Tabular(t) => t,
            other => Table::from_rows(&other.into_rows()),
        }
    }

    pub fn into_matrix(self) -> Result<Matrix> {
        match self {
            Records::Matrix(m) => Ok(m),
            other => Matrix::from_rows(other.into_rows().into_iter().map(Row::into_values).collect()),
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Records::Rows(rows) => rows,
            Records::Tabular(t) => (0..t.num_rows()).filter_map(|i| t.row(i)).collect(),
            Records::Matrix(m) => m.to_rows().into_iter().map(Row::Sequence).collect(),
        }
    }

    /// Extend with `rows`, converting them to this representation first.
    pub fn append(&mut self, rows: Records) -> Result<()> {
        match self {
            Records::Tabular(t) => t.append(rows.into_table()),
            Records::Matrix(m) => m.append(rows.into_matrix()?)?,
            Records::Rows(existing) => existing.extend(rows.into_rows()),
        }
        Ok(())
    }
}

impl From<Table> for Records {
    fn from(t: Table) -> Self {
        Records::Tabular(t)
    }
}

impl From<Matrix> for Records {
    fn from(m: Matrix) -> Self {
        Records::Matrix(m)
    }
}

impl From<Vec<Row>> for Records {
    fn from(rows: Vec<Row>) -> Self {
        Records::Rows(rows)
    }
}
