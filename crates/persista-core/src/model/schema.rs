//! Schema reflection
//!
//! A [`ModelSchema`] is built once per model type by [`SchemaBuilder`] and is
//! immutable afterwards. Field order is declaration order, never alphabetical:
//! backends map attributes to positional storage through it.

use super::key::PrimaryKey;
use super::value::{FieldType, Value};

/// Metadata for one declared attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub field_name: &'static str,
    pub declared_type: FieldType,
    pub is_primary_key: bool,
    pub declaration_index: usize,
}

/// Schema-level description of a model type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSchema {
    name: String,
    plural_name: String,
    fields: Vec<FieldDescriptor>,
}

/// Ordered fields plus the primary-key subset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reflection<'a> {
    pub fields: &'a [FieldDescriptor],
    pub primary_key: Vec<&'a FieldDescriptor>,
}

/// Reflect a schema into its ordered fields and primary-key fields
///
/// No validation happens here: a schema without key fields yields an empty
/// `primary_key`, and backends decide whether that is acceptable.
pub fn reflect(schema: &ModelSchema) -> Reflection<'_> {
    Reflection {
        fields: &schema.fields,
        primary_key: schema.fields.iter().filter(|f| f.is_primary_key).collect(),
    }
}

impl ModelSchema {
    /// Start a schema for the type named `type_name`
    ///
    /// Path prefixes are dropped and the rest is lower-cased, so
    /// `app::models::User` becomes `user`.
    pub fn builder(type_name: &str) -> SchemaBuilder {
        SchemaBuilder::new(type_name)
    }

    /// Canonical model name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Plural form, used as the relational table name
    pub fn plural_name(&self) -> &str {
        &self.plural_name
    }

    /// Fields in declaration order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.field_name == name)
    }

    /// Position of the named field in declaration order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.field_name == name)
    }

    pub fn primary_key_fields(&self) -> Vec<&FieldDescriptor> {
        reflect(self).primary_key
    }

    pub fn primary_key_names(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter(|f| f.is_primary_key)
            .map(|f| f.field_name)
            .collect()
    }

    /// The single integer key field, if the key is exactly that
    ///
    /// Backends assign such keys automatically when they are still null.
    pub fn auto_key_field(&self) -> Option<&FieldDescriptor> {
        match self.primary_key_fields().as_slice() {
            [only] if only.declared_type == FieldType::Integer => Some(*only),
            _ => None,
        }
    }

    /// Project a full row of values (declaration order) onto the primary key
    pub fn primary_key_of(&self, values: &[Value]) -> PrimaryKey {
        PrimaryKey::from_values(
            self.fields
                .iter()
                .zip(values)
                .filter(|(f, _)| f.is_primary_key)
                .map(|(_, v)| v.clone())
                .collect(),
        )
    }
}

/// Builder assigning declaration indices in call order
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    plural_name: Option<String>,
    fields: Vec<FieldDescriptor>,
}

impl SchemaBuilder {
    fn new(type_name: &str) -> Self {
        let short = type_name.rsplit("::").next().unwrap_or(type_name);
        Self {
            name: short.to_lowercase(),
            plural_name: None,
            fields: Vec::new(),
        }
    }

    /// Declare the next field
    pub fn field(mut self, field_name: &'static str, declared_type: FieldType, key: bool) -> Self {
        debug_assert!(
            self.fields.iter().all(|f| f.field_name != field_name),
            "field {} declared twice",
            field_name
        );
        let declaration_index = self.fields.len();
        self.fields.push(FieldDescriptor {
            field_name,
            declared_type,
            is_primary_key: key,
            declaration_index,
        });
        self
    }

    /// Override the derived plural form
    pub fn plural(mut self, plural_name: impl Into<String>) -> Self {
        self.plural_name = Some(plural_name.into());
        self
    }

    pub fn build(mut self) -> ModelSchema {
        self.fields.sort_by_key(|f| f.declaration_index);
        let plural_name = self
            .plural_name
            .unwrap_or_else(|| pluralize(&self.name));
        ModelSchema {
            name: self.name,
            plural_name,
            fields: self.fields,
        }
    }
}

/// English plural of a lower-case model name
pub fn pluralize(name: &str) -> String {
    let consonant_y = name.len() > 1
        && name.ends_with('y')
        && !name[..name.len() - 1].ends_with(&['a', 'e', 'i', 'o', 'u'][..]);
    if consonant_y {
        format!("{}ies", &name[..name.len() - 1])
    } else if name.ends_with('s')
        || name.ends_with('x')
        || name.ends_with('z')
        || name.ends_with("ch")
        || name.ends_with("sh")
    {
        format!("{}es", name)
    } else {
        format!("{}s", name)
    }
}
