//! Sampled in-place mutation of one column.
//!
//! [`apply`] picks `sample_size` distinct rows and replaces the cell at
//! `(row, column)` with the transform of its current value. Tables are
//! written column-wise in place, record rows are rebuilt, and matrices go
//! through a fallback chain because a matrix holds a single element type:
//!
//! 1. write the transformed values as they are;
//! 2. write them through the lossless adapter (`WriteMode::Adapted`);
//! 3. widen the whole matrix to the type the values need and rerun the
//!    transform on the widened cells.
//!
//! A column step either fully succeeds or leaves the column as it was (the
//! matrix may stay widened after step 3). Failures come back as a
//! [`Diagnostic`] rather than an error.

use super::report::Diagnostic;
use crate::core::dataset::{DataSet, Matrix, Records, Row, WriteMode};
use crate::core::error::{FuzzError, Result};
use crate::core::value::{Value, ValueType};
use crate::transforms::Transform;
use rand::seq::index;
use rand::RngCore;
use std::collections::HashMap;

/// What happened to one column.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    pub column: usize,
    /// Rows selected, in pick order
    pub positions: Vec<usize>,
    /// Cells actually rewritten
    pub mutated: usize,
    /// Element type a matrix was widened to
    pub coerced_to: Option<ValueType>,
    pub diagnostic: Option<Diagnostic>,
}

impl MutationOutcome {
    fn new(column: usize, positions: Vec<usize>) -> Self {
        Self {
            column,
            positions,
            mutated: 0,
            coerced_to: None,
            diagnostic: None,
        }
    }

    fn done(mut self) -> Self {
        self.mutated = self.positions.len();
        self
    }

    fn failed(mut self, operation: &str, message: String) -> Self {
        tracing::warn!(column = self.column, operation, "{}", message);
        self.diagnostic = Some(Diagnostic::new(Some(self.column), operation, message));
        self
    }
}

/// Replace `sample_size` randomly chosen cells of `column` with
/// `transform(old)`. Sizes above the row count select every row.
pub fn apply(
    dataset: &mut DataSet,
    column: usize,
    transform: &dyn Transform,
    sample_size: usize,
    rng: &mut dyn RngCore,
) -> Result<MutationOutcome> {
    let total = dataset.len();
    if column >= dataset.num_columns() {
        return Err(FuzzError::ColumnNotFound(column.to_string()));
    }
    let positions = index::sample(rng, total, sample_size.min(total)).into_vec();
    let outcome = MutationOutcome::new(column, positions);
    if outcome.positions.is_empty() {
        return Ok(outcome);
    }

    tracing::debug!(
        column,
        rows = outcome.positions.len(),
        transform = transform.name(),
        "mutating column"
    );

    Ok(match dataset.records_mut() {
        Records::Tabular(table) => {
            let old: Vec<Value> = outcome
                .positions
                .iter()
                .map(|&p| table.cell(p, column).cloned().unwrap_or(Value::Null))
                .collect();
            match transform_all(transform, &old, rng) {
                Ok(values) => {
                    table.write_column(column, &outcome.positions, values);
                    outcome.done()
                }
                Err(message) => outcome.failed(transform.name(), message),
            }
        }
        Records::Rows(rows) => mutate_rows(rows, outcome, transform, rng),
        Records::Matrix(matrix) => mutate_matrix(matrix, outcome, transform, rng),
    })
}

fn transform_all(
    transform: &dyn Transform,
    values: &[Value],
    rng: &mut dyn RngCore,
) -> std::result::Result<Vec<Value>, String> {
    values
        .iter()
        .map(|v| transform.apply(v, &mut *rng))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("{} failed: {}", transform.name(), e))
}

fn mutate_rows(
    rows: &mut Vec<Row>,
    outcome: MutationOutcome,
    transform: &dyn Transform,
    rng: &mut dyn RngCore,
) -> MutationOutcome {
    let column = outcome.column;
    let old: Vec<Value> = outcome
        .positions
        .iter()
        .map(|&p| rows[p].get(column).cloned().unwrap_or(Value::Null))
        .collect();
    let values = match transform_all(transform, &old, rng) {
        Ok(values) => values,
        Err(message) => return outcome.failed(transform.name(), message),
    };

    let mut replacements: HashMap<usize, Value> =
        outcome.positions.iter().copied().zip(values).collect();
    let mut written = 0;
    *rows = std::mem::take(rows)
        .into_iter()
        .enumerate()
        .map(|(i, mut row)| {
            if let Some(value) = replacements.remove(&i) {
                if let Some(cell) = row.get_mut(column) {
                    *cell = value;
                    written += 1;
                }
            }
            row
        })
        .collect();

    let mut outcome = outcome;
    outcome.mutated = written;
    outcome
}

fn mutate_matrix(
    matrix: &mut Matrix,
    outcome: MutationOutcome,
    transform: &dyn Transform,
    rng: &mut dyn RngCore,
) -> MutationOutcome {
    let column = outcome.column;
    let positions = outcome.positions.clone();
    let read = |m: &Matrix| -> Vec<Value> {
        positions
            .iter()
            .map(|&p| m.get(p, column).unwrap_or(Value::Null))
            .collect()
    };

    let values = match transform_all(transform, &read(matrix), rng) {
        Ok(values) => values,
        Err(message) => return outcome.failed(transform.name(), message),
    };

    let mismatch = match matrix.write_column(column, &outcome.positions, &values, WriteMode::Strict) {
        Ok(()) => return outcome.done(),
        Err(m) => m,
    };
    tracing::debug!(column, "direct write failed, retrying through adapter: {}", mismatch.message);

    let mismatch = match matrix.write_column(column, &outcome.positions, &values, WriteMode::Adapted) {
        Ok(()) => return outcome.done(),
        Err(m) => m,
    };

    let Some(required) = mismatch.required else {
        return outcome.failed(transform.name(), mismatch.message);
    };
    // Widening merges the current and required types (int + float -> float).
    let target = matrix.dtype().merge(required);
    if let Err(e) = matrix.coerce(target) {
        return outcome.failed(
            transform.name(),
            format!("Could not transform matrix type to {}: {}", target, e),
        );
    }
    tracing::info!(column, from = %mismatch.message, to = %target, "matrix widened");
    let mut outcome = outcome;
    outcome.coerced_to = Some(target);

    let values = match transform_all(transform, &read(matrix), rng) {
        Ok(values) => values,
        Err(message) => return outcome.failed(transform.name(), message),
    };
    match matrix.write_column(column, &outcome.positions, &values, WriteMode::Strict) {
        Ok(()) => outcome.done(),
        Err(m) => outcome.failed(
            transform.name(),
            format!("Could not transform matrix type: {}", m.message),
        ),
    }
}
