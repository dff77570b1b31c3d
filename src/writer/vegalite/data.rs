//! DataFrame to inline JSON rows

use polars::prelude::*;
use serde_json::{json, Map, Value};

/// Column tagging each row with the layer it belongs to
pub const SOURCE_COLUMN: &str = "__gssdash_source__";

/// Key identifying layer `idx` in the unified dataset
pub fn layer_key(idx: usize) -> String {
    format!("__gssdash_layer_{}__", idx)
}

/// Convert a single value from a Polars Column to JSON
pub(super) fn column_value_to_json(column: &Column, idx: usize) -> Value {
    let any_value = match column.get(idx) {
        Ok(v) => v,
        Err(_) => return Value::Null,
    };

    match any_value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::Int8(v) => Value::Number(v.into()),
        AnyValue::Int16(v) => Value::Number(v.into()),
        AnyValue::Int32(v) => Value::Number(v.into()),
        AnyValue::Int64(v) => Value::Number(v.into()),
        AnyValue::UInt8(v) => Value::Number(v.into()),
        AnyValue::UInt16(v) => Value::Number(v.into()),
        AnyValue::UInt32(v) => Value::Number(v.into()),
        AnyValue::UInt64(v) => Value::Number(v.into()),
        AnyValue::Float32(v) => serde_json::Number::from_f64(v as f64)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AnyValue::Float64(v) => serde_json::Number::from_f64(v)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::StringOwned(s) => Value::String(s.to_string()),
        other => {
            tracing::debug!("Converting unsupported Polars type to string: {:?}", other);
            Value::String(format!("{}", other))
        }
    }
}

/// One JSON object per row, keyed by column name
pub(super) fn dataframe_to_values(df: &DataFrame) -> Vec<Value> {
    let columns = df.get_columns();
    (0..df.height())
        .map(|row| {
            let mut object = Map::new();
            for column in columns {
                object.insert(column.name().to_string(), column_value_to_json(column, row));
            }
            Value::Object(object)
        })
        .collect()
}

/// One JSON array per row, in column order
pub(super) fn dataframe_to_rows(df: &DataFrame) -> Vec<Value> {
    let columns = df.get_columns();
    (0..df.height())
        .map(|row| {
            Value::Array(
                columns
                    .iter()
                    .map(|column| column_value_to_json(column, row))
                    .collect(),
            )
        })
        .collect()
}

/// Concatenate per-layer rows, tagging each with its layer key
pub(super) fn unify_datasets(datasets: &[(String, Vec<Value>)]) -> Vec<Value> {
    let mut unified = Vec::new();
    for (key, rows) in datasets {
        for row in rows {
            let mut row = row.clone();
            if let Value::Object(ref mut object) = row {
                object.insert(SOURCE_COLUMN.to_string(), json!(key));
            }
            unified.push(row);
        }
    }
    unified
}
