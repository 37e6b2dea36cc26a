//! Equality lookups

use std::fmt;

use crate::errors::{PersistError, Result};
use crate::model::{unknown_field, Model, ModelSchema, PrimaryKey, Value};

/// A conjunction of `field = value` terms, kept in the order supplied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lookup {
    terms: Vec<(String, Value)>,
}

impl Lookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `field = value` term
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.terms.push((field.into(), value.into()));
        self
    }

    /// Positional primary-key values zipped with the model's key fields
    pub fn primary_key<M: Model>(values: impl IntoIterator<Item = Value>) -> Result<Self> {
        let schema = M::schema();
        let names = schema.primary_key_names();
        let values: Vec<Value> = values.into_iter().collect();
        if names.is_empty() {
            return Err(PersistError::MissingPrimaryKey {
                model: schema.name().to_string(),
            });
        }
        if names.len() != values.len() {
            return Err(PersistError::InvalidLookup {
                model: schema.name().to_string(),
                reason: format!(
                    "primary key has {} fields, {} values given",
                    names.len(),
                    values.len()
                ),
            });
        }
        Ok(Self {
            terms: names
                .into_iter()
                .map(str::to_string)
                .zip(values)
                .collect(),
        })
    }

    /// Lookup matching exactly the given key
    pub fn for_key(schema: &ModelSchema, key: &PrimaryKey) -> Self {
        Self {
            terms: schema
                .primary_key_names()
                .into_iter()
                .map(str::to_string)
                .zip(key.values())
                .collect(),
        }
    }

    pub fn terms(&self) -> &[(String, Value)] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value of the first term naming `field`
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.terms
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    /// Reject terms naming fields the model does not declare
    pub fn validate(&self, schema: &ModelSchema) -> Result<()> {
        if self.terms.is_empty() {
            return Err(PersistError::InvalidLookup {
                model: schema.name().to_string(),
                reason: "lookup has no terms".to_string(),
            });
        }
        for (field, _) in &self.terms {
            if schema.field(field).is_none() {
                return Err(unknown_field(schema, field));
            }
        }
        Ok(())
    }

    /// Primary-key projection; absent key fields project to `Null`
    pub fn key_projection(&self, schema: &ModelSchema) -> PrimaryKey {
        PrimaryKey::from_values(
            schema
                .primary_key_names()
                .into_iter()
                .map(|name| self.get(name).cloned().unwrap_or(Value::Null))
                .collect(),
        )
    }

    /// Whether a full row (declaration order) satisfies every term
    pub fn matches(&self, schema: &ModelSchema, values: &[Value]) -> bool {
        self.terms.iter().all(|(field, expected)| {
            schema
                .position(field)
                .and_then(|position| values.get(position))
                .map(|actual| actual == expected)
                .unwrap_or(false)
        })
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, value)) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "{} = {}", field, value)?;
        }
        Ok(())
    }
}
