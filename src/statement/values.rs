//! Parameter values and their types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A parameter value inside a statement or result record.
///
/// `Undefined` is the slot-filling placeholder: a parameter that was
/// mentioned but not yet given a concrete value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Undefined,
    Bool(bool),
    Number(i64),
    String(String),
    Entity { value: String, entity_type: String },
}

impl Value {
    /// Returns true if this value is concrete (not a placeholder).
    pub fn is_defined(&self) -> bool {
        !matches!(self, Value::Undefined)
    }

    /// Returns the type of a concrete value, or `None` for the placeholder.
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Undefined => None,
            Value::Bool(_) => Some(ValueType::Bool),
            Value::Number(_) => Some(ValueType::Number),
            Value::String(_) => Some(ValueType::String),
            Value::Entity { entity_type, .. } => Some(ValueType::Entity(entity_type.clone())),
        }
    }

    /// Shorthand for an entity value.
    pub fn entity(value: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Value::Entity {
            value: value.into(),
            entity_type: entity_type.into(),
        }
    }
}

/// The declared type of a schema argument.
///
/// Equality on `ValueType` is the chain-parameter matching relation: an
/// action input can be auto-wired from a query result when their types are
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Bool,
    Number,
    String,
    Entity(String),
}

/// Direction of a sort expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Returns the opposite direction.
    ///
    /// Taking index -1 of an ascending sort is the same as taking index 1
    /// of the descending sort, so arg-min/max detection inverts here.
    pub fn invert(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Ascending => write!(f, "asc"),
            SortDirection::Descending => write!(f, "desc"),
        }
    }
}
