//! Table creation for the relational backend

use persista_core::errors::{PersistError, Result};
use persista_core::model::{FieldDescriptor, FieldType, ModelSchema};

use super::query::quote;

/// SQL column type for a declared field type
///
/// Only integers and strings have a column mapping.
pub fn column_type(schema: &ModelSchema, field: &FieldDescriptor) -> Result<&'static str> {
    match field.declared_type {
        FieldType::Integer => Ok("integer"),
        FieldType::String => Ok("text"),
        other => Err(PersistError::UnmappedFieldType {
            model: schema.name().to_string(),
            field: field.field_name.to_string(),
            field_type: other.to_string(),
        }),
    }
}

/// `CREATE TABLE` statement for a model, columns in declaration order
///
/// A lone integer key becomes an `autoincrement` rowid alias so assigned
/// keys are never reused, even after the highest row is deleted.
pub fn create_table_sql(schema: &ModelSchema) -> Result<String> {
    let keys = schema.primary_key_names();
    if keys.is_empty() {
        return Err(PersistError::MissingPrimaryKey {
            model: schema.name().to_string(),
        });
    }
    let auto_key = schema.auto_key_field().map(|f| f.field_name);

    let mut columns = Vec::with_capacity(schema.fields().len() + 1);
    for field in schema.fields() {
        let sql_type = column_type(schema, field)?;
        if Some(field.field_name) == auto_key {
            columns.push(format!(
                "{} integer primary key autoincrement",
                quote(field.field_name)
            ));
        } else {
            columns.push(format!("{} {}", quote(field.field_name), sql_type));
        }
    }
    if auto_key.is_none() {
        let key_list: Vec<_> = keys.iter().map(|name| quote(name)).collect();
        columns.push(format!("PRIMARY KEY ({})", key_list.join(", ")));
    }

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote(schema.plural_name()),
        columns.join(", ")
    ))
}
