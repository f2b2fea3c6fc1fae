//! Graph nodes.

use trellis_core::id::TypeKey;
use trellis_core::types::TypeKind;

/// One resource type in the graph.
///
/// Parent and child lists are owned by the node and can only be changed
/// through the graph builder; once the builder is sealed they are frozen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNode {
    /// The type this node stands for
    pub(crate) key: TypeKey,

    /// The kind of the type
    pub(crate) kind: TypeKind,

    /// Whether the type is abstract
    pub(crate) is_abstract: bool,

    /// Direct resource supertypes, superclass first
    pub(crate) parents: Vec<TypeKey>,

    /// Direct resource subtypes, in insertion order
    pub(crate) children: Vec<TypeKey>,

    /// Longest distance from the root
    pub(crate) depth: usize,
}

impl ResourceNode {
    pub(crate) fn new(key: TypeKey, kind: TypeKind, is_abstract: bool) -> Self {
        Self {
            key,
            kind,
            is_abstract,
            parents: Vec::new(),
            children: Vec::new(),
            depth: 0,
        }
    }

    /// The type key.
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// The type kind.
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// Whether the type is abstract (interfaces always are).
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Direct resource supertypes.
    pub fn parents(&self) -> &[TypeKey] {
        &self.parents
    }

    /// Direct resource subtypes.
    pub fn children(&self) -> &[TypeKey] {
        &self.children
    }

    /// `0` for the root, otherwise one more than the deepest parent.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether this is the root marker.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub(crate) fn seal(&mut self) {
        self.parents.shrink_to_fit();
        self.children.shrink_to_fit();
    }
}
