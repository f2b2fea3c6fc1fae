//! Type and field descriptors.
//!
//! Descriptors are the structural view of a type handed over by discovery:
//! its supertypes, its declared fields, and the modifiers on each field.
//! They are plain data; nothing here knows about the resource graph.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::TypeKey;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    /// Modifiers recorded on a declared field
    pub struct FieldModifiers: u8 {
        const STATIC = 0b00000001;
        const TRANSIENT = 0b00000010;
        const NULLABLE = 0b00000100;
        const LAZY = 0b00001000;
        const IDENTIFIER = 0b00010000;
    }
}

/// The declared value type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    /// A primitive or library value (`string`, `i64`, `timestamp`, ...)
    Scalar(String),

    /// A named type: either a resource type or a value object
    Named(TypeKey),

    /// A growable collection of values
    Collection(Box<ValueType>),

    /// A fixed array of values
    Array(Box<ValueType>),
}

impl ValueType {
    /// Shorthand for [`ValueType::Scalar`].
    pub fn scalar(name: impl Into<String>) -> Self {
        Self::Scalar(name.into())
    }

    /// Shorthand for [`ValueType::Named`].
    pub fn named(key: impl Into<TypeKey>) -> Self {
        Self::Named(key.into())
    }

    /// Shorthand for a collection of named values.
    pub fn collection_of(key: impl Into<TypeKey>) -> Self {
        Self::Collection(Box::new(Self::Named(key.into())))
    }

    /// The element type when this is a collection or array.
    pub fn element(&self) -> Option<&ValueType> {
        match self {
            Self::Collection(inner) | Self::Array(inner) => Some(inner),
            _ => None,
        }
    }

    /// The named type, if this value type is a named type.
    pub fn named_key(&self) -> Option<&TypeKey> {
        match self {
            Self::Named(key) => Some(key),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(name) => write!(f, "{}", name),
            Self::Named(key) => write!(f, "{}", key),
            Self::Collection(inner) => write!(f, "Collection<{}>", inner),
            Self::Array(inner) => write!(f, "[{}]", inner),
        }
    }
}

/// A field as declared on one type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// The field name
    pub name: String,

    /// The declared value type
    pub value_type: ValueType,

    /// Declaration modifiers
    pub modifiers: FieldModifiers,
}

impl FieldDescriptor {
    /// Create a field with no modifiers.
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            modifiers: FieldModifiers::empty(),
        }
    }

    /// Add modifiers to this field.
    pub fn with(mut self, modifiers: FieldModifiers) -> Self {
        self.modifiers |= modifiers;
        self
    }

    /// Whether the field takes part in the attribute catalogue.
    pub fn is_persistent(&self) -> bool {
        !self
            .modifiers
            .intersects(FieldModifiers::STATIC | FieldModifiers::TRANSIENT)
    }
}

/// The kind of a described type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    /// A concrete or abstract class with at most one superclass
    Class,

    /// An interface or marker; any number may be implemented
    Interface,

    /// A nested structure without identity, flattened into its owner
    ValueObject,
}

/// Structural description of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// The type identifier
    pub key: TypeKey,

    /// The type kind
    pub kind: TypeKind,

    /// The superclass, if any
    pub superclass: Option<TypeKey>,

    /// Implemented (or extended, for interfaces) interfaces
    pub interfaces: Vec<TypeKey>,

    /// Fields declared directly on this type
    pub fields: Vec<FieldDescriptor>,

    /// Whether instances of exactly this type can exist
    pub is_abstract: bool,
}

impl TypeDescriptor {
    /// Describe a class.
    pub fn class(key: impl Into<TypeKey>) -> Self {
        Self::new(key.into(), TypeKind::Class)
    }

    /// Describe an interface. Interfaces are abstract.
    pub fn interface(key: impl Into<TypeKey>) -> Self {
        let mut descriptor = Self::new(key.into(), TypeKind::Interface);
        descriptor.is_abstract = true;
        descriptor
    }

    /// Describe a value object.
    pub fn value_object(key: impl Into<TypeKey>) -> Self {
        Self::new(key.into(), TypeKind::ValueObject)
    }

    fn new(key: TypeKey, kind: TypeKind) -> Self {
        Self {
            key,
            kind,
            superclass: None,
            interfaces: Vec::new(),
            fields: Vec::new(),
            is_abstract: false,
        }
    }

    /// Set the superclass.
    pub fn extends(mut self, superclass: impl Into<TypeKey>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// Add an implemented interface.
    pub fn implements(mut self, interface: impl Into<TypeKey>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Add a declared field.
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Mark the type abstract.
    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Direct supertypes: the superclass first, then interfaces in
    /// declaration order.
    pub fn supertypes(&self) -> impl Iterator<Item = &TypeKey> {
        self.superclass.iter().chain(self.interfaces.iter())
    }
}
