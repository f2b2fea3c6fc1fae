//! Runtime resource values.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::TypeKey;

/// One resource value, as seen by behaviors.
///
/// Attribute values are kept as JSON values so that behaviors can be
/// written without knowing the concrete Rust type behind a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    /// The resource type of this value
    pub type_key: TypeKey,

    /// Attribute values by name
    pub values: Map<String, Value>,
}

impl Instance {
    /// Create an empty instance of a type.
    pub fn new(type_key: impl Into<TypeKey>) -> Self {
        Self {
            type_key: type_key.into(),
            values: Map::new(),
        }
    }

    /// Set an attribute value, builder style.
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(attribute.into(), value.into());
        self
    }

    /// Get an attribute value. Missing attributes and JSON `null` both
    /// read as `None`.
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.values.get(attribute).filter(|value| !value.is_null())
    }

    /// Set an attribute value.
    pub fn set(&mut self, attribute: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(attribute.into(), value.into());
    }
}
