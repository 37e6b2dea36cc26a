//! Primary keys
//!
//! A key built from exactly one value collapses to [`PrimaryKey::Scalar`];
//! anything else is [`PrimaryKey::Composite`] in declaration order. Every
//! place that computes or compares keys goes through [`PrimaryKey::from_values`]
//! so the two shapes never mix for the same model.

use std::fmt;

use super::value::Value;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimaryKey {
    Scalar(Value),
    Composite(Vec<Value>),
}

impl PrimaryKey {
    pub fn from_values(mut values: Vec<Value>) -> Self {
        if values.len() == 1 {
            PrimaryKey::Scalar(values.remove(0))
        } else {
            PrimaryKey::Composite(values)
        }
    }

    /// Key values in declaration order
    pub fn values(&self) -> Vec<Value> {
        match self {
            PrimaryKey::Scalar(v) => vec![v.clone()],
            PrimaryKey::Composite(vs) => vs.clone(),
        }
    }

    /// True when any component is still unassigned
    pub fn has_null(&self) -> bool {
        match self {
            PrimaryKey::Scalar(v) => v.is_null(),
            PrimaryKey::Composite(vs) => vs.iter().any(Value::is_null),
        }
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKey::Scalar(v) => write!(f, "{}", v),
            PrimaryKey::Composite(vs) => {
                f.write_str("(")?;
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<Value> for PrimaryKey {
    fn from(value: Value) -> Self {
        PrimaryKey::Scalar(value)
    }
}
