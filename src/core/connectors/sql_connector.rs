//! SQLite source and sink.
//!
//! Connection strings follow the `sqlite://` URL form: `sqlite:///:memory:`
//! (or a bare `sqlite://`) opens an in-memory database, `sqlite:///<path>`
//! opens or creates a database file. Other schemes are rejected.

use crate::core::connectors::aligned;
use crate::core::dataset::{Records, Row, Table};
use crate::core::error::{FuzzError, Result};
use crate::core::value::{Value, ValueType};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};
use std::path::PathBuf;

const SCHEME: &str = "sqlite://";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlTarget {
    Memory,
    File(PathBuf),
}

pub fn parse_uri(uri: &str) -> Result<SqlTarget> {
    let rest = uri.strip_prefix(SCHEME).ok_or_else(|| {
        FuzzError::NotImplemented(format!(
            "database URI {} not supported, use sqlite://<path>",
            uri
        ))
    })?;
    let path = rest.strip_prefix('/').unwrap_or(rest);
    if path.is_empty() || path == ":memory:" {
        Ok(SqlTarget::Memory)
    } else {
        Ok(SqlTarget::File(PathBuf::from(path)))
    }
}

pub fn connect(uri: &str) -> Result<Connection> {
    Ok(match parse_uri(uri)? {
        SqlTarget::Memory => Connection::open_in_memory()?,
        SqlTarget::File(path) => Connection::open(path)?,
    })
}

/// Run `query` and materialize the result as a table or as mapping rows.
pub fn read_query(uri: &str, query: &str, prefer_tabular: bool) -> Result<Records> {
    let conn = connect(uri)?;
    read_with(&conn, query, prefer_tabular)
}

pub fn read_with(conn: &Connection, query: &str, prefer_tabular: bool) -> Result<Records> {
    let mut stmt = conn.prepare(query)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let rows = stmt
        .query_map([], |row| {
            let mut fields = Vec::with_capacity(names.len());
            for (i, name) in names.iter().enumerate() {
                fields.push((name.clone(), from_sql(row.get_ref(i)?)));
            }
            Ok(Row::mapping(fields))
        })?
        .collect::<rusqlite::Result<Vec<Row>>>()?;

    tracing::debug!(rows = rows.len(), "query materialized");
    if prefer_tabular {
        Ok(Records::Tabular(Table::from_rows(&rows)))
    } else {
        Ok(Records::Rows(rows))
    }
}

/// Create `table` if missing and insert every row in one transaction.
/// Returns the number of inserted rows.
pub fn write_table(uri: &str, table: &str, records: &Records) -> Result<usize> {
    let mut conn = connect(uri)?;
    write_with(&mut conn, table, records)
}

pub fn write_with(conn: &mut Connection, table: &str, records: &Records) -> Result<usize> {
    let (data, _) = aligned(records);
    let columns = data.columns();
    if columns.is_empty() {
        return Ok(0);
    }

    let definitions: Vec<String> = columns
        .iter()
        .map(|c| format!("{} {}", quote(&c.name), sql_type(c.dtype())))
        .collect();
    let names: Vec<String> = columns.iter().map(|c| quote(&c.name)).collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();

    let tx = conn.transaction()?;
    tx.execute(
        &format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote(table),
            definitions.join(", ")
        ),
        [],
    )?;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote(table),
            names.join(", "),
            placeholders.join(", ")
        ))?;
        for r in 0..data.num_rows() {
            stmt.execute(params_from_iter(columns.iter().map(|c| &c.values()[r])))?;
        }
    }
    tx.commit()?;

    tracing::info!(table, rows = data.num_rows(), "rows written");
    Ok(data.num_rows())
}

fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn sql_type(dtype: ValueType) -> &'static str {
    match dtype {
        ValueType::Int | ValueType::Bool => "INTEGER",
        ValueType::Float => "REAL",
        ValueType::Bytes => "BLOB",
        _ => "TEXT",
    }
}

fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            v if v.is_null() => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Bool(b) => ToSqlOutput::from(*b),
            Value::Int(i) => ToSqlOutput::from(*i),
            Value::Float(f) => ToSqlOutput::from(*f),
            Value::String(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
        })
    }
}
