use crate::core::connectors::{aligned, Connector};
use crate::core::dataset::{Records, Row, Table};
use crate::core::error::{FuzzError, Result};
use crate::core::value::{Value, ValueType};
use arrow::array::{
    Array, ArrayRef, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::compute::{cast, concat_batches};
use arrow::csv;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Rows used for schema inference
const INFER_ROWS: usize = 100;

pub struct CsvConnector;

impl CsvConnector {
    pub fn new() -> Self {
        Self
    }

    fn read_batch(path: &Path, schema: SchemaRef) -> Result<Option<RecordBatch>> {
        let file = fs::File::open(path)?;
        let csv_reader = csv::ReaderBuilder::new(schema.clone())
            .with_header(true)
            .build(file)?;

        let mut batches = Vec::new();
        for batch in csv_reader {
            batches.push(batch?);
        }
        if batches.is_empty() {
            return Ok(None);
        }
        Ok(Some(concat_batches(&schema, batches.iter())?))
    }
}

impl Connector for CsvConnector {
    fn name(&self) -> &str {
        "csv"
    }

    fn can_handle(&self, path: &str) -> bool {
        path.to_lowercase().ends_with(".csv")
    }

    fn read(&self, path: &Path, prefer_tabular: bool) -> Result<Records> {
        let file = fs::File::open(path)?;
        let format = csv::reader::Format::default().with_header(true);
        let (inferred, _) = format.infer_schema(file, Some(INFER_ROWS))?;

        if prefer_tabular {
            let schema = Arc::new(inferred);
            let Some(batch) = Self::read_batch(path, schema.clone())? else {
                return Ok(Records::Tabular(Table::new()));
            };
            let columns = schema
                .fields()
                .iter()
                .zip(batch.columns())
                .map(|(field, array)| -> Result<(String, Vec<Value>)> {
                    Ok((field.name().clone(), arrow_array_to_values(array)?))
                })
                .collect::<Result<Vec<_>>>()?;
            return Ok(Records::Tabular(Table::from_columns(columns)?));
        }

        // Dictionary rows: every field is read back as text.
        let text_fields: Vec<Field> = inferred
            .fields()
            .iter()
            .map(|f| Field::new(f.name(), DataType::Utf8, true))
            .collect();
        let schema = Arc::new(Schema::new(text_fields));
        let Some(batch) = Self::read_batch(path, schema.clone())? else {
            return Ok(Records::Rows(Vec::new()));
        };
        let columns = batch
            .columns()
            .iter()
            .map(arrow_array_to_values)
            .collect::<Result<Vec<_>>>()?;
        let rows = (0..batch.num_rows())
            .map(|i| {
                Row::mapping(schema.fields().iter().zip(&columns).map(|(field, values)| {
                    let value = match &values[i] {
                        Value::Null => Value::String(String::new()),
                        v => v.clone(),
                    };
                    (field.name().clone(), value)
                }))
            })
            .collect();
        Ok(Records::Rows(rows))
    }

    fn write(&self, path: &Path, records: &Records) -> Result<()> {
        let (table, named) = aligned(records);
        let batch = table_to_record_batch(&table)?;
        let file = fs::File::create(path)?;
        let mut writer = arrow_csv::WriterBuilder::new()
            .with_header(named)
            .build(file);
        writer.write(&batch)?;
        Ok(())
    }
}

impl Default for CsvConnector {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert one Arrow column to values. Types without a direct mapping are
/// cast to text first.
pub(crate) fn arrow_array_to_values(array: &ArrayRef) -> Result<Vec<Value>> {
    fn collect<A: Array>(array: &A, get: impl Fn(&A, usize) -> Value) -> Vec<Value> {
        (0..array.len())
            .map(|i| if array.is_null(i) { Value::Null } else { get(array, i) })
            .collect()
    }

    let any = array.as_any();
    if let Some(a) = any.downcast_ref::<Int64Array>() {
        return Ok(collect(a, |a, i| Value::Int(a.value(i))));
    }
    if let Some(a) = any.downcast_ref::<Int32Array>() {
        return Ok(collect(a, |a, i| Value::Int(a.value(i) as i64)));
    }
    if let Some(a) = any.downcast_ref::<Float64Array>() {
        return Ok(collect(a, |a, i| Value::Float(a.value(i))));
    }
    if let Some(a) = any.downcast_ref::<Float32Array>() {
        return Ok(collect(a, |a, i| Value::Float(a.value(i) as f64)));
    }
    if let Some(a) = any.downcast_ref::<BooleanArray>() {
        return Ok(collect(a, |a, i| Value::Bool(a.value(i))));
    }
    if let Some(a) = any.downcast_ref::<StringArray>() {
        return Ok(collect(a, |a, i| Value::String(a.value(i).to_string())));
    }

    let text = cast(array.as_ref(), &DataType::Utf8)?;
    let strings = text
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| FuzzError::Construction("Expected StringArray after cast".to_string()))?;
    Ok(collect(strings, |a, i| Value::String(a.value(i).to_string())))
}

/// Build a record batch with one Arrow column per table column. Mixed and
/// binary columns are written as text.
pub(crate) fn table_to_record_batch(table: &Table) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(table.num_columns());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.num_columns());

    for column in table.columns() {
        let (data_type, array): (DataType, ArrayRef) = match column.dtype() {
            ValueType::Int => {
                let values: Vec<Option<i64>> = column.values().iter().map(Value::as_int).collect();
                (DataType::Int64, Arc::new(Int64Array::from(values)))
            }
            ValueType::Float => {
                let values: Vec<Option<f64>> =
                    column.values().iter().map(Value::as_float).collect();
                (DataType::Float64, Arc::new(Float64Array::from(values)))
            }
            ValueType::Bool => {
                let values: Vec<Option<bool>> =
                    column.values().iter().map(Value::as_bool).collect();
                (DataType::Boolean, Arc::new(BooleanArray::from(values)))
            }
            _ => {
                let values: Vec<Option<String>> = column
                    .values()
                    .iter()
                    .map(|v| (!v.is_null()).then(|| v.to_text().into_owned()))
                    .collect();
                (DataType::Utf8, Arc::new(StringArray::from(values)))
            }
        };
        fields.push(Field::new(column.name.as_str(), data_type, true));
        arrays.push(array);
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}
