//! Statement building and value conversion for the relational backend
//!
//! Every statement names its columns explicitly in declaration order, so
//! rows can be zipped positionally with the model's fields.

use rusqlite::types::Value as SqlValue;
use rusqlite::Row;

use persista_core::connector::Lookup;
use persista_core::errors::{PersistError, Result};
use persista_core::model::{FieldDescriptor, FieldType, ModelSchema, PrimaryKey, Value};

/// Quote an identifier
pub fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn column_list(schema: &ModelSchema) -> String {
    schema
        .fields()
        .iter()
        .map(|f| quote(f.field_name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `a = ?n AND b = ?n+1 ...` starting at placeholder `first`
fn conditions<'a>(names: impl Iterator<Item = &'a str>, first: usize) -> String {
    names
        .enumerate()
        .map(|(i, name)| format!("{} = ?{}", quote(name), first + i))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// `SELECT` for one lookup, terms in the order supplied
pub fn select_sql(schema: &ModelSchema, lookup: &Lookup) -> String {
    format!(
        "SELECT {} FROM {} WHERE {} LIMIT 1",
        column_list(schema),
        quote(schema.plural_name()),
        conditions(lookup.terms().iter().map(|(name, _)| name.as_str()), 1)
    )
}

/// `SELECT` of every row, ordered by primary key
pub fn select_all_sql(schema: &ModelSchema) -> String {
    let order: Vec<_> = schema
        .primary_key_names()
        .into_iter()
        .map(quote)
        .collect();
    format!(
        "SELECT {} FROM {} ORDER BY {}",
        column_list(schema),
        quote(schema.plural_name()),
        order.join(", ")
    )
}

pub fn insert_sql(schema: &ModelSchema) -> String {
    let placeholders: Vec<_> = (1..=schema.fields().len())
        .map(|i| format!("?{}", i))
        .collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote(schema.plural_name()),
        column_list(schema),
        placeholders.join(", ")
    )
}

/// `UPDATE` of one column; `?1` is the new value, the key follows
pub fn update_sql(schema: &ModelSchema, field: &str) -> String {
    format!(
        "UPDATE {} SET {} = ?1 WHERE {}",
        quote(schema.plural_name()),
        quote(field),
        conditions(schema.primary_key_names().into_iter(), 2)
    )
}

pub fn delete_sql(schema: &ModelSchema) -> String {
    format!(
        "DELETE FROM {} WHERE {}",
        quote(schema.plural_name()),
        conditions(schema.primary_key_names().into_iter(), 1)
    )
}

/// Bind parameters for a primary key
pub fn key_params(key: &PrimaryKey) -> Vec<SqlValue> {
    key.values().iter().map(to_sql).collect()
}

pub fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(v) => SqlValue::Integer(*v),
        Value::Text(v) => SqlValue::Text(v.clone()),
        Value::Datetime(v) => SqlValue::Text(v.to_rfc3339()),
    }
}

/// Convert a column value back, checking it against the declared type
pub fn from_sql(field: &FieldDescriptor, value: SqlValue) -> Result<Value> {
    match (field.declared_type, value) {
        (_, SqlValue::Null) => Ok(Value::Null),
        (FieldType::Integer, SqlValue::Integer(v)) => Ok(Value::Integer(v)),
        (FieldType::String, SqlValue::Text(v)) => Ok(Value::Text(v)),
        (declared, other) => Err(PersistError::TypeMismatch {
            field: field.field_name.to_string(),
            expected: declared.to_string(),
            found: format!("{:?}", other.data_type()),
        }),
    }
}

/// Raw column values of one row, in declaration order
pub fn read_row(schema: &ModelSchema, row: &Row<'_>) -> rusqlite::Result<Vec<SqlValue>> {
    (0..schema.fields().len()).map(|i| row.get(i)).collect()
}

/// Typed values of one row
pub fn convert_row(schema: &ModelSchema, raw: Vec<SqlValue>) -> Result<Vec<Value>> {
    schema
        .fields()
        .iter()
        .zip(raw)
        .map(|(field, value)| from_sql(field, value))
        .collect()
}
