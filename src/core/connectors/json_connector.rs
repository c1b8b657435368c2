use crate::core::connectors::{aligned, Connector};
use crate::core::dataset::{Records, Row, Table};
use crate::core::error::{FuzzError, Result};
use crate::core::value::Value;
use serde_json::Value as Json;
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;

pub struct JsonConnector;

impl JsonConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for JsonConnector {
    fn name(&self) -> &str {
        "json"
    }

    fn can_handle(&self, path: &str) -> bool {
        path.to_lowercase().ends_with(".json")
    }

    fn read(&self, path: &Path, prefer_tabular: bool) -> Result<Records> {
        let file = fs::File::open(path)?;
        let document: Json = serde_json::from_reader(BufReader::new(file))?;

        match document {
            Json::Array(items) => {
                let rows = items.into_iter().map(json_to_row).collect::<Result<Vec<_>>>()?;
                if prefer_tabular {
                    Ok(Records::Tabular(Table::from_rows(&rows)))
                } else {
                    Ok(Records::Rows(rows))
                }
            }
            // {column: [values]} or {column: {index: value}}
            Json::Object(columns) if prefer_tabular => {
                let columns = columns
                    .into_iter()
                    .map(|(name, cells)| {
                        let values = match cells {
                            Json::Array(v) => v.into_iter().map(json_to_value).collect(),
                            Json::Object(m) => m.into_iter().map(|(_, v)| json_to_value(v)).collect(),
                            other => vec![json_to_value(other)],
                        };
                        (name, values)
                    })
                    .collect();
                Ok(Records::Tabular(Table::from_columns(columns)?))
            }
            _ => Err(FuzzError::Construction(
                "The JSON file must contain a list for datafuzz use.".to_string(),
            )),
        }
    }

    fn write(&self, path: &Path, records: &Records) -> Result<()> {
        let (table, named) = aligned(records);
        let names = table.column_names();
        let rows: Vec<Json> = (0..table.num_rows())
            .map(|r| {
                let cells = table
                    .columns()
                    .iter()
                    .map(|c| value_to_json(&c.values()[r]));
                if named {
                    Json::Object(names.iter().map(|n| n.to_string()).zip(cells).collect())
                } else {
                    Json::Array(cells.collect())
                }
            })
            .collect();

        let file = fs::File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), &rows)?;
        Ok(())
    }
}

impl Default for JsonConnector {
    fn default() -> Self {
        Self::new()
    }
}

fn json_to_row(item: Json) -> Result<Row> {
    match item {
        Json::Object(fields) => Ok(Row::mapping(
            fields.into_iter().map(|(k, v)| (k, json_to_value(v))),
        )),
        Json::Array(values) => Ok(Row::sequence(values.into_iter().map(json_to_value))),
        other => Err(FuzzError::Construction(format!(
            "JSON rows must be objects or arrays, found {}",
            other
        ))),
    }
}

/// Scalars map directly; nested documents are kept as their JSON text.
pub(crate) fn json_to_value(json: Json) -> Value {
    match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
        },
        Json::String(s) => Value::String(s),
        nested => Value::String(nested.to_string()),
    }
}

pub(crate) fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::String(s) => Json::String(s.clone()),
        Value::Bytes(_) => Json::String(value.to_text().into_owned()),
    }
}
