//! Per-type attribute catalogues.

use indexmap::IndexMap;
use std::collections::HashMap;

use trellis_core::error::{AuthorizationError, Result};
use trellis_core::id::TypeKey;
use trellis_core::types::ValueType;

use crate::attribute::{AttributeKind, AttributeRecord};

/// The flattened, inheritance-resolved attribute catalogue of one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMetadata {
    /// The described type
    pub(crate) type_key: TypeKey,

    /// Whether the type is abstract
    pub(crate) is_abstract: bool,

    /// Attributes in catalogue order: inherited first, then own
    pub(crate) attributes: IndexMap<String, AttributeRecord>,
}

impl ResourceMetadata {
    /// The described type.
    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    /// Whether the type is abstract.
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Whether the catalogue is empty.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Attribute names in catalogue order.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// All attribute records in catalogue order.
    pub fn attributes(&self) -> impl Iterator<Item = &AttributeRecord> {
        self.attributes.values()
    }

    /// Look up one attribute.
    pub fn attribute(&self, name: &str) -> Option<&AttributeRecord> {
        self.attributes.get(name)
    }

    /// Whether the type has an attribute of this name.
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Whether the attribute references other resources.
    pub fn is_association(&self, name: &str) -> bool {
        self.attribute(name)
            .map(|a| a.kind.is_association())
            .unwrap_or(false)
    }

    /// Whether the attribute is a flattened value object.
    pub fn is_component(&self, name: &str) -> bool {
        self.attribute(name)
            .map(|a| a.kind == AttributeKind::Component)
            .unwrap_or(false)
    }

    /// Whether the attribute is an association that may be absent.
    pub fn is_association_optional(&self, name: &str) -> bool {
        self.attribute(name)
            .map(|a| a.kind.is_association() && a.optional)
            .unwrap_or(false)
    }

    /// The declared value type of an attribute.
    pub fn attribute_type(&self, name: &str) -> Option<&ValueType> {
        self.attribute(name).map(|a| &a.value_type)
    }

    /// Names of attributes that are loaded eagerly.
    pub fn non_lazy_attribute_names(&self) -> Vec<&str> {
        self.attributes
            .values()
            .filter(|a| !a.lazy)
            .map(|a| a.name.as_str())
            .collect()
    }

    /// The identifier attribute, if the type declares one.
    pub fn identifier(&self) -> Option<&AttributeRecord> {
        self.attributes.values().find(|a| a.identifier)
    }
}

/// Read-only access to every catalogue built at start-up.
#[derive(Debug, Clone, Default)]
pub struct MetadataProvider {
    catalogues: HashMap<TypeKey, ResourceMetadata>,
}

impl MetadataProvider {
    pub(crate) fn new(catalogues: HashMap<TypeKey, ResourceMetadata>) -> Self {
        Self { catalogues }
    }

    /// The catalogue of a type.
    pub fn get_metadata(&self, key: &TypeKey) -> Option<&ResourceMetadata> {
        self.catalogues.get(key)
    }

    /// The catalogue of a type, or an unknown-type error.
    pub fn require(&self, key: &TypeKey) -> Result<&ResourceMetadata> {
        self.get_metadata(key)
            .ok_or_else(|| AuthorizationError::UnknownType(key.clone()).into())
    }

    /// Number of catalogues.
    pub fn len(&self) -> usize {
        self.catalogues.len()
    }

    /// Whether no catalogue was built.
    pub fn is_empty(&self) -> bool {
        self.catalogues.is_empty()
    }
}
