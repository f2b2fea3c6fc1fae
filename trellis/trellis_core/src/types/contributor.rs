//! Behavior and rule contributors.

use std::fmt;
use std::sync::Arc;

use crate::id::TypeKey;

/// The tag data of a contributor: its name and the resource type it
/// declares itself for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContributorDescriptor {
    /// Unique name of the contributor (usually its type path)
    pub name: String,

    /// The declared target resource type; `None` when the tag is missing
    pub target: Option<TypeKey>,
}

impl ContributorDescriptor {
    /// Describe a contributor tagged for `target`.
    pub fn tagged(name: impl Into<String>, target: impl Into<TypeKey>) -> Self {
        Self {
            name: name.into(),
            target: Some(target.into()),
        }
    }

    /// Describe a contributor that carries no target tag.
    pub fn untagged(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: None,
        }
    }
}

/// A discovered contributor together with its instance.
pub struct Contributor<T: ?Sized> {
    /// Tag data
    pub descriptor: ContributorDescriptor,

    /// The instantiated contribution
    pub instance: Arc<T>,
}

impl<T: ?Sized> Contributor<T> {
    /// Pair a descriptor with an instance.
    pub fn new(descriptor: ContributorDescriptor, instance: Arc<T>) -> Self {
        Self {
            descriptor,
            instance,
        }
    }
}

impl<T: ?Sized> Clone for Contributor<T> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            instance: Arc::clone(&self.instance),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Contributor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Contributor")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
