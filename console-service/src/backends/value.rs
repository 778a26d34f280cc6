//! Row to JSON conversion.
//!
//! Ad-hoc queries run through each driver's unprepared path, so column types
//! are only known at runtime. Each engine gets a converter that matches on the
//! value's type name, decodes the natural Rust type, and falls back to the
//! value's text form.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Number, Value};
use sqlx::mysql::MySqlRow;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, ColumnIndex, Row, TypeInfo, ValueRef};

/// Converts a MySQL/MariaDB row into an ordered JSON object.
pub fn mysql_row_to_json(row: &MySqlRow) -> Map<String, Value> {
    collect(row, mysql_value)
}

/// Converts a PostgreSQL row into an ordered JSON object.
pub fn postgres_row_to_json(row: &PgRow) -> Map<String, Value> {
    collect(row, postgres_value)
}

/// Converts a SQLite row into an ordered JSON object.
pub fn sqlite_row_to_json(row: &SqliteRow) -> Map<String, Value> {
    collect(row, sqlite_value)
}

/// Reads column `idx` as text, for catalog listings.
pub fn mysql_text(row: &MySqlRow, idx: usize) -> String {
    match mysql_value(row, idx) {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn collect<R, F>(row: &R, convert: F) -> Map<String, Value>
where
    R: Row,
    F: Fn(&R, usize) -> Value,
{
    let mut out = Map::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        out.insert(column.name().to_string(), convert(row, idx));
    }
    out
}

/// Returns the runtime type name of a value, or `None` for SQL NULL.
fn type_name<R>(row: &R, idx: usize) -> Option<String>
where
    R: Row,
    usize: ColumnIndex<R>,
{
    let raw = row.try_get_raw(idx).ok()?;
    if raw.is_null() {
        return None;
    }
    Some(raw.type_info().name().to_ascii_uppercase())
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn bytes_value(bytes: Vec<u8>) -> Value {
    match String::from_utf8(bytes) {
        Ok(text) => Value::String(text),
        Err(e) => Value::String(format!("base64:{}", STANDARD.encode(e.into_bytes()))),
    }
}

fn mysql_value(row: &MySqlRow, idx: usize) -> Value {
    let Some(name) = type_name(row, idx) else {
        return Value::Null;
    };

    let typed = match name.as_str() {
        "BOOLEAN" => row.try_get::<bool, _>(idx).ok().map(Value::Bool),
        n if n.ends_with("UNSIGNED") && !n.starts_with("DECIMAL") => {
            row.try_get::<u64, _>(idx).ok().map(Value::from)
        }
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => {
            row.try_get::<i64, _>(idx).ok().map(Value::from)
        }
        "FLOAT" | "DOUBLE" => row
            .try_get::<f64, _>(idx)
            .or_else(|_| row.try_get::<f32, _>(idx).map(f64::from))
            .ok()
            .map(float_value),
        "JSON" => row.try_get::<Value, _>(idx).ok(),
        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => row.try_get_unchecked::<Vec<u8>, _>(idx).ok().map(bytes_value),
        _ => None,
    };

    typed.unwrap_or_else(|| {
        row.try_get_unchecked::<String, _>(idx)
            .map(Value::String)
            .or_else(|_| row.try_get_unchecked::<Vec<u8>, _>(idx).map(bytes_value))
            .unwrap_or(Value::Null)
    })
}

fn postgres_value(row: &PgRow, idx: usize) -> Value {
    let Some(name) = type_name(row, idx) else {
        return Value::Null;
    };

    let typed = match name.as_str() {
        "BOOL" => row.try_get::<bool, _>(idx).ok().map(Value::Bool),
        "INT2" => row.try_get::<i16, _>(idx).ok().map(Value::from),
        "INT4" => row.try_get::<i32, _>(idx).ok().map(Value::from),
        "INT8" => row.try_get::<i64, _>(idx).ok().map(Value::from),
        "FLOAT4" => row
            .try_get::<f32, _>(idx)
            .ok()
            .map(|f| float_value(f64::from(f))),
        "FLOAT8" => row.try_get::<f64, _>(idx).ok().map(float_value),
        "JSON" | "JSONB" => row.try_get::<Value, _>(idx).ok(),
        "BYTEA" => row.try_get::<Vec<u8>, _>(idx).ok().map(bytes_value),
        _ => None,
    };

    typed.unwrap_or_else(|| {
        row.try_get_unchecked::<String, _>(idx)
            .map(Value::String)
            .unwrap_or(Value::Null)
    })
}

fn sqlite_value(row: &SqliteRow, idx: usize) -> Value {
    let Some(name) = type_name(row, idx) else {
        return Value::Null;
    };

    let typed = match name.as_str() {
        "INTEGER" | "INT8" | "BIGINT" => row.try_get::<i64, _>(idx).ok().map(Value::from),
        "REAL" | "DOUBLE" | "FLOAT" => row.try_get::<f64, _>(idx).ok().map(float_value),
        "BOOLEAN" | "BOOL" => row.try_get::<bool, _>(idx).ok().map(Value::Bool),
        "BLOB" => row.try_get::<Vec<u8>, _>(idx).ok().map(bytes_value),
        _ => None,
    };

    typed.unwrap_or_else(|| {
        row.try_get_unchecked::<String, _>(idx)
            .map(Value::String)
            .unwrap_or(Value::Null)
    })
}
