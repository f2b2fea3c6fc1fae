//! Attribute records.

use serde::{Deserialize, Serialize};
use std::fmt;

use trellis_core::id::TypeKey;
use trellis_core::types::ValueType;

/// How an attribute relates to other types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// A scalar or non-resource value
    Plain,

    /// A value object whose fields are flattened into the owner
    Component,

    /// A reference to one resource
    SingularAssociation,

    /// A collection or array of resources
    PluralAssociation,
}

impl AttributeKind {
    /// Whether the attribute references other resources.
    pub fn is_association(&self) -> bool {
        matches!(self, Self::SingularAssociation | Self::PluralAssociation)
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Component => write!(f, "component"),
            Self::SingularAssociation => write!(f, "singular association"),
            Self::PluralAssociation => write!(f, "plural association"),
        }
    }
}

/// One flattened attribute of one type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRecord {
    /// Catalogue name; dotted for attributes nested in components
    pub name: String,

    /// Access path through component structures, ending with the field
    pub path: Vec<String>,

    /// The declared value type
    pub value_type: ValueType,

    /// Classification
    pub kind: AttributeKind,

    /// Whether a value may be absent
    pub optional: bool,

    /// Whether loading the value is deferred
    pub lazy: bool,

    /// Whether this attribute identifies the resource
    pub identifier: bool,

    /// The type whose declaration produced this record
    pub declared_by: TypeKey,
}

impl AttributeRecord {
    /// Whether this attribute sits inside a component.
    pub fn is_nested(&self) -> bool {
        self.path.len() > 1
    }

    /// The associated resource type for association attributes.
    pub fn target_type(&self) -> Option<&TypeKey> {
        match self.kind {
            AttributeKind::SingularAssociation => self.value_type.named_key(),
            AttributeKind::PluralAssociation => {
                self.value_type.element().and_then(ValueType::named_key)
            }
            _ => None,
        }
    }
}
