//! Homogeneous matrix representation backed by `ndarray`.
//!
//! A matrix holds exactly one element type. Writing a value of another type
//! goes through [`WriteMode`]: `Strict` accepts only values the element type
//! stores natively, `Adapted` also accepts lossless conversions (integral
//! floats into ints, numeric strings into numbers, anything into strings).
//! When neither works the failure names the element type the matrix would
//! need, and the caller may [`Matrix::coerce`] the whole matrix to it.

use crate::core::error::{FuzzError, Result};
use crate::core::value::{Value, ValueType};
use ndarray::{concatenate, Array2, Axis};

/// Why a value could not be stored in the current element type.
#[derive(Debug, Clone, PartialEq)]
pub struct CellMismatch {
    /// Element type that would hold the value, if any
    pub required: Option<ValueType>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Strict,
    Adapted,
}

/// Element types a matrix can be built from.
pub trait Element: Clone {
    const DTYPE: ValueType;

    fn to_value(&self) -> Value;

    fn from_value(value: &Value, mode: WriteMode) -> std::result::Result<Self, CellMismatch>;
}

/// Element type that can hold `value` once the matrix is widened.
fn required_for(value: &Value) -> ValueType {
    match value.value_type() {
        ValueType::Null => ValueType::Float,
        ValueType::Bytes => ValueType::Object,
        other => other,
    }
}

fn mismatch(value: &Value, target: ValueType) -> CellMismatch {
    CellMismatch {
        required: Some(required_for(value)),
        message: format!(
            "could not store {} value {} in {} matrix",
            value.value_type(),
            value,
            target
        ),
    }
}

impl Element for f64 {
    const DTYPE: ValueType = ValueType::Float;

    fn to_value(&self) -> Value {
        if self.is_nan() {
            Value::Null
        } else {
            Value::Float(*self)
        }
    }

    fn from_value(value: &Value, mode: WriteMode) -> std::result::Result<Self, CellMismatch> {
        match (value, mode) {
            (Value::Float(f), _) => Ok(*f),
            (Value::Int(i), _) => Ok(*i as f64),
            (Value::Bool(b), _) => Ok(if *b { 1.0 } else { 0.0 }),
            (Value::Null, _) => Ok(f64::NAN),
            (Value::String(s), WriteMode::Adapted) => {
                s.trim().parse().map_err(|_| mismatch(value, Self::DTYPE))
            }
            _ => Err(mismatch(value, Self::DTYPE)),
        }
    }
}

impl Element for i64 {
    const DTYPE: ValueType = ValueType::Int;

    fn to_value(&self) -> Value {
        Value::Int(*self)
    }

    fn from_value(value: &Value, mode: WriteMode) -> std::result::Result<Self, CellMismatch> {
        match (value, mode) {
            (Value::Int(i), _) => Ok(*i),
            (Value::Bool(b), _) => Ok(*b as i64),
            (Value::Float(f), WriteMode::Adapted) if f.is_finite() && f.fract() == 0.0 => {
                Ok(*f as i64)
            }
            (Value::String(s), WriteMode::Adapted) => {
                s.trim().parse().map_err(|_| mismatch(value, Self::DTYPE))
            }
            _ => Err(mismatch(value, Self::DTYPE)),
        }
    }
}

impl Element for bool {
    const DTYPE: ValueType = ValueType::Bool;

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: &Value, mode: WriteMode) -> std::result::Result<Self, CellMismatch> {
        match (value, mode) {
            (Value::Bool(b), _) => Ok(*b),
            (Value::Int(0), WriteMode::Adapted) => Ok(false),
            (Value::Int(1), WriteMode::Adapted) => Ok(true),
            _ => Err(mismatch(value, Self::DTYPE)),
        }
    }
}

impl Element for String {
    const DTYPE: ValueType = ValueType::String;

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: &Value, mode: WriteMode) -> std::result::Result<Self, CellMismatch> {
        match (value, mode) {
            (Value::String(s), _) => Ok(s.clone()),
            (other, WriteMode::Adapted) => Ok(other.to_text().into_owned()),
            _ => Err(mismatch(value, Self::DTYPE)),
        }
    }
}

impl Element for Value {
    const DTYPE: ValueType = ValueType::Object;

    fn to_value(&self) -> Value {
        self.clone()
    }

    fn from_value(value: &Value, _mode: WriteMode) -> std::result::Result<Self, CellMismatch> {
        Ok(value.clone())
    }
}

/// Matrix with a single element type per instance.
#[derive(Debug, Clone, PartialEq)]
pub enum Matrix {
    Bool(Array2<bool>),
    Int(Array2<i64>),
    Float(Array2<f64>),
    Str(Array2<String>),
    Object(Array2<Value>),
}

macro_rules! each_matrix {
    ($matrix:expr, $arr:ident => $body:expr) => {
        match $matrix {
            Matrix::Bool($arr) => $body,
            Matrix::Int($arr) => $body,
            Matrix::Float($arr) => $body,
            Matrix::Str($arr) => $body,
            Matrix::Object($arr) => $body,
        }
    };
}

fn convert_all<T: Element>(values: &[Value], ncols: usize, mode: WriteMode) -> Result<Array2<T>> {
    let cells = values
        .iter()
        .map(|v| T::from_value(v, mode))
        .collect::<std::result::Result<Vec<T>, CellMismatch>>()
        .map_err(|m| FuzzError::Construction(m.message))?;
    let nrows = if ncols == 0 { 0 } else { cells.len() / ncols };
    Array2::from_shape_vec((nrows, ncols), cells)
        .map_err(|e| FuzzError::ShapeMismatch(e.to_string()))
}

impl Matrix {
    /// Build a matrix from equally sized rows, choosing the element type
    /// from the values (ints, floats, bools, strings, or objects for a mix).
    pub fn from_rows(rows: Vec<Vec<Value>>) -> Result<Self> {
        let ncols = rows.first().map(Vec::len).unwrap_or(0);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != ncols) {
            return Err(FuzzError::ShapeMismatch(format!(
                "row {} has {} columns, expected {}",
                i,
                row.len(),
                ncols
            )));
        }
        let flat: Vec<Value> = rows.into_iter().flatten().collect();
        let has_null = flat.iter().any(Value::is_null);
        let dtype = match ValueType::infer(&flat) {
            ValueType::Null => ValueType::Float,
            ValueType::Int if has_null => ValueType::Float,
            ValueType::String | ValueType::Bool if has_null => ValueType::Object,
            ValueType::Bytes => ValueType::Object,
            other => other,
        };
        Self::build(dtype, &flat, ncols, WriteMode::Strict)
    }

    fn build(dtype: ValueType, flat: &[Value], ncols: usize, mode: WriteMode) -> Result<Self> {
        Ok(match dtype {
            ValueType::Bool => Matrix::Bool(convert_all(flat, ncols, mode)?),
            ValueType::Int => Matrix::Int(convert_all(flat, ncols, mode)?),
            ValueType::Float | ValueType::Null => Matrix::Float(convert_all(flat, ncols, mode)?),
            ValueType::String => Matrix::Str(convert_all(flat, ncols, mode)?),
            ValueType::Object | ValueType::Bytes => {
                Matrix::Object(convert_all(flat, ncols, mode)?)
            }
        })
    }

    pub fn nrows(&self) -> usize {
        each_matrix!(self, a => a.nrows())
    }

    pub fn ncols(&self) -> usize {
        each_matrix!(self, a => a.ncols())
    }

    /// Element type of the whole matrix
    pub fn dtype(&self) -> ValueType {
        match self {
            Matrix::Bool(_) => ValueType::Bool,
            Matrix::Int(_) => ValueType::Int,
            Matrix::Float(_) => ValueType::Float,
            Matrix::Str(_) => ValueType::String,
            Matrix::Object(_) => ValueType::Object,
        }
    }

    pub fn get(&self, row: usize, column: usize) -> Option<Value> {
        each_matrix!(self, a => a.get((row, column)).map(Element::to_value))
    }

    pub fn row(&self, idx: usize) -> Option<Vec<Value>> {
        if idx >= self.nrows() {
            return None;
        }
        Some(each_matrix!(self, a => a.row(idx).iter().map(Element::to_value).collect()))
    }

    /// Lazily read one column without materializing it.
    pub fn column_values(&self, column: usize) -> Box<dyn Iterator<Item = Value> + '_> {
        if column >= self.ncols() {
            return Box::new(std::iter::empty());
        }
        each_matrix!(self, a => Box::new(a.column(column).into_iter().map(Element::to_value)))
    }

    /// Fancy-index rows (pick order is kept).
    pub fn take_rows(&self, positions: &[usize]) -> Matrix {
        match self {
            Matrix::Bool(a) => Matrix::Bool(a.select(Axis(0), positions)),
            Matrix::Int(a) => Matrix::Int(a.select(Axis(0), positions)),
            Matrix::Float(a) => Matrix::Float(a.select(Axis(0), positions)),
            Matrix::Str(a) => Matrix::Str(a.select(Axis(0), positions)),
            Matrix::Object(a) => Matrix::Object(a.select(Axis(0), positions)),
        }
    }

    pub fn to_rows(&self) -> Vec<Vec<Value>> {
        (0..self.nrows()).filter_map(|i| self.row(i)).collect()
    }

    /// Convert every element to `dtype`. Fails (leaving `self` untouched)
    /// when some element cannot be represented in the new type.
    pub fn coerce(&mut self, dtype: ValueType) -> Result<()> {
        if dtype == self.dtype() {
            return Ok(());
        }
        let ncols = self.ncols();
        let flat: Vec<Value> = each_matrix!(&*self, a => a.iter().map(Element::to_value).collect());
        let flat = if dtype == ValueType::Int {
            // truncating cast, as an `astype(int)` would do
            flat.into_iter()
                .map(|v| match v {
                    Value::Float(f) if f.is_finite() => Value::Int(f as i64),
                    other => other,
                })
                .collect()
        } else {
            flat
        };
        *self = Self::build(dtype, &flat, ncols, WriteMode::Adapted)?;
        Ok(())
    }

    /// Write `values` into `column` at `positions`. All-or-nothing: nothing
    /// is written unless every value converts under `mode`.
    pub fn write_column(
        &mut self,
        column: usize,
        positions: &[usize],
        values: &[Value],
        mode: WriteMode,
    ) -> std::result::Result<(), CellMismatch> {
        fn write<T: Element>(
            arr: &mut Array2<T>,
            column: usize,
            positions: &[usize],
            values: &[Value],
            mode: WriteMode,
        ) -> std::result::Result<(), CellMismatch> {
            let converted = values
                .iter()
                .map(|v| T::from_value(v, mode))
                .collect::<std::result::Result<Vec<T>, CellMismatch>>()?;
            let mut col = arr.column_mut(column);
            for (&pos, cell) in positions.iter().zip(converted) {
                col[pos] = cell;
            }
            Ok(())
        }
        each_matrix!(self, a => write(a, column, positions, values, mode))
    }

    /// Stack `other` below `self`, widening the element type when they differ.
    pub fn append(&mut self, mut other: Matrix) -> Result<()> {
        if other.nrows() == 0 {
            return Ok(());
        }
        if other.ncols() != self.ncols() {
            return Err(FuzzError::ShapeMismatch(format!(
                "cannot append {} columns to a matrix of {} columns",
                other.ncols(),
                self.ncols()
            )));
        }
        let target = self.dtype().merge(other.dtype());
        self.coerce(target)?;
        other.coerce(target)?;
        match (&mut *self, other) {
            (Matrix::Bool(a), Matrix::Bool(b)) => stack(a, b),
            (Matrix::Int(a), Matrix::Int(b)) => stack(a, b),
            (Matrix::Float(a), Matrix::Float(b)) => stack(a, b),
            (Matrix::Str(a), Matrix::Str(b)) => stack(a, b),
            (Matrix::Object(a), Matrix::Object(b)) => stack(a, b),
            _ => Err(FuzzError::ShapeMismatch(
                "element types differ after coercion".to_string(),
            )),
        }
    }
}

fn stack<T: Clone>(a: &mut Array2<T>, b: Array2<T>) -> Result<()> {
    let joined = concatenate(Axis(0), &[a.view(), b.view()])
        .map_err(|e| FuzzError::ShapeMismatch(e.to_string()))?;
    *a = joined;
    Ok(())
}

impl From<Array2<i64>> for Matrix {
    fn from(a: Array2<i64>) -> Self {
        Matrix::Int(a)
    }
}

impl From<Array2<f64>> for Matrix {
    fn from(a: Array2<f64>) -> Self {
        Matrix::Float(a)
    }
}

impl From<Array2<String>> for Matrix {
    fn from(a: Array2<String>) -> Self {
        Matrix::Str(a)
    }
}

impl From<Array2<bool>> for Matrix {
    fn from(a: Array2<bool>) -> Self {
        Matrix::Bool(a)
    }
}

impl From<Array2<Value>> for Matrix {
    fn from(a: Array2<Value>) -> Self {
        Matrix::Object(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_rows_picks_dtype() {
        let m = Matrix::from_rows(vec![
            vec![Value::Int(1), Value::Int(2)],
            vec![Value::Int(3), Value::Int(4)],
        ])
        .unwrap();
        assert_eq!(m.dtype(), ValueType::Int);

        let m = Matrix::from_rows(vec![vec![Value::Int(1), Value::Float(0.5)]]).unwrap();
        assert_eq!(m.dtype(), ValueType::Float);

        let m = Matrix::from_rows(vec![vec![Value::Int(1), Value::from("a")]]).unwrap();
        assert_eq!(m.dtype(), ValueType::Object);
    }

    #[test]
    fn test_strict_write_rejects_strings_in_int_matrix() {
        let mut m = Matrix::from(array![[1i64, 2], [3, 4]]);
        let err = m
            .write_column(0, &[0], &[Value::from("x")], WriteMode::Strict)
            .unwrap_err();
        assert_eq!(err.required, Some(ValueType::String));
        assert_eq!(m.get(0, 0), Some(Value::Int(1)));
    }

    #[test]
    fn test_adapted_write_parses_numeric_strings() {
        let mut m = Matrix::from(array![[1i64, 2], [3, 4]]);
        m.write_column(1, &[1], &[Value::from("42")], WriteMode::Adapted)
            .unwrap();
        assert_eq!(m.get(1, 1), Some(Value::Int(42)));
    }

    #[test]
    fn test_null_in_float_matrix_reads_back_as_null() {
        let mut m = Matrix::from(array![[1.0, 2.0]]);
        m.write_column(0, &[0], &[Value::Null], WriteMode::Strict)
            .unwrap();
        assert_eq!(m.get(0, 0), Some(Value::Null));
    }

    #[test]
    fn test_coerce_int_to_string() {
        let mut m = Matrix::from(array![[1i64, 2]]);
        m.coerce(ValueType::String).unwrap();
        assert_eq!(m.dtype(), ValueType::String);
        assert_eq!(m.get(0, 1), Some(Value::from("2")));
    }

    #[test]
    fn test_append_widens() {
        let mut m = Matrix::from(array![[1i64, 2]]);
        m.append(Matrix::from(array![[0.5, 1.5]])).unwrap();
        assert_eq!(m.dtype(), ValueType::Float);
        assert_eq!(m.nrows(), 2);
        assert_eq!(m.get(0, 0), Some(Value::Float(1.0)));
    }

    #[test]
    fn test_append_rejects_column_mismatch() {
        let mut m = Matrix::from(array![[1i64, 2]]);
        let err = m.append(Matrix::from(array![[1i64, 2, 3]]));
        assert!(matches!(err, Err(FuzzError::ShapeMismatch(_))));
    }
}
