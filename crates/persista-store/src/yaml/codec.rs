//! Record files
//!
//! A record file holds one model's records as a top-level YAML sequence of
//! mappings from field name to value:
//!
//! ```yaml
//! - id: 1
//!   username: admin
//! ```
//!
//! Datetimes are stored as RFC 3339 strings.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde_yaml::{Mapping, Number, Value as YamlValue};

use persista_core::errors::{PersistError, Result};
use persista_core::model::{FieldDescriptor, FieldType, ModelSchema, Value};

use crate::errors::{data_formatting, yaml_error};

/// Parse a record file into rows in declaration order
///
/// Missing fields read as `Null`. An empty document is an empty table.
pub fn decode_table(path: &Path, schema: &ModelSchema, content: &str) -> Result<Vec<Vec<Value>>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let document: YamlValue = serde_yaml::from_str(content).map_err(|e| yaml_error(path, e))?;
    let records = match document {
        YamlValue::Null => return Ok(Vec::new()),
        YamlValue::Sequence(records) => records,
        _ => {
            return Err(data_formatting(
                path,
                "the file must contain a YAML formatted list",
            ))
        }
    };

    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| decode_record(path, schema, index, record))
        .collect()
}

fn decode_record(
    path: &Path,
    schema: &ModelSchema,
    index: usize,
    record: YamlValue,
) -> Result<Vec<Value>> {
    let mapping = match record {
        YamlValue::Mapping(mapping) => mapping,
        _ => {
            return Err(data_formatting(
                path,
                format!("record {} is not a mapping", index),
            ))
        }
    };

    let mut row = vec![Value::Null; schema.fields().len()];
    for (name, value) in mapping {
        let name = name
            .as_str()
            .ok_or_else(|| data_formatting(path, format!("record {} has a non-string key", index)))?;
        let position = schema.position(name).ok_or_else(|| {
            data_formatting(
                path,
                format!("record {} has unknown field {}", index, name),
            )
        })?;
        row[position] = decode_value(&schema.fields()[position], value)
            .map_err(|reason| data_formatting(path, format!("record {}: {}", index, reason)))?;
    }
    Ok(row)
}

fn decode_value(field: &FieldDescriptor, value: YamlValue) -> std::result::Result<Value, String> {
    let mismatch = |found: &YamlValue| {
        format!(
            "field {} expects {}, found {:?}",
            field.field_name, field.declared_type, found
        )
    };
    match (field.declared_type, value) {
        (_, YamlValue::Null) => Ok(Value::Null),
        (FieldType::Integer, YamlValue::Number(n)) => n.as_i64().map(Value::Integer).ok_or_else(|| {
            format!("field {} expects an integer, found {}", field.field_name, n)
        }),
        (FieldType::String, YamlValue::String(s)) => Ok(Value::Text(s)),
        (FieldType::Datetime, YamlValue::String(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| Value::Datetime(dt.with_timezone(&Utc)))
            .map_err(|e| format!("field {}: {}", field.field_name, e)),
        (_, other) => Err(mismatch(&other)),
    }
}

fn encode_value(value: &Value) -> YamlValue {
    match value {
        Value::Null => YamlValue::Null,
        Value::Integer(v) => YamlValue::Number(Number::from(*v)),
        Value::Text(v) => YamlValue::String(v.clone()),
        Value::Datetime(v) => YamlValue::String(v.to_rfc3339()),
    }
}

/// Render rows as a record file, keys in declaration order
pub fn encode_table(schema: &ModelSchema, rows: &[Vec<Value>]) -> Result<String> {
    let records: Vec<YamlValue> = rows
        .iter()
        .map(|row| {
            let mut mapping = Mapping::new();
            for (field, value) in schema.fields().iter().zip(row) {
                mapping.insert(
                    YamlValue::String(field.field_name.to_string()),
                    encode_value(value),
                );
            }
            YamlValue::Mapping(mapping)
        })
        .collect();
    serde_yaml::to_string(&records).map_err(|e| PersistError::Serialization {
        message: e.to_string(),
    })
}
