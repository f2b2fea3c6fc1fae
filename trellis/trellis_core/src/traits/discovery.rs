//! Interfaces to the discovery collaborators.
//!
//! The substrate never enumerates types itself. An embedding application
//! supplies these traits, backed by a compile-time registry, generated code,
//! or anything else that can produce a stable snapshot for one build.

use crate::error::Result;
use crate::id::TypeKey;
use crate::types::{Contributor, ContributorDescriptor, FieldDescriptor, TypeDescriptor};

/// Enumerates resource types.
///
/// Implementations must return the same answers for the duration of one
/// build.
pub trait DiscoveryProvider: Send + Sync {
    /// The universal marker every resource type descends from.
    fn root_marker(&self) -> TypeKey;

    /// Find every type that (transitively) implements `marker`.
    ///
    /// The marker itself is not part of the result.
    fn find_types_implementing(&self, marker: &TypeKey) -> Result<Vec<TypeDescriptor>>;

    /// Look up the descriptor of any known type: resource types, value
    /// objects and non-resource interfaces alike.
    fn describe(&self, key: &TypeKey) -> Option<TypeDescriptor>;
}

/// Enumerates tagged implementations of one behavior capability.
pub trait ImplementationProvider<T: ?Sized>: Send + Sync {
    /// Find every implementation tagged with `capability`.
    fn find_tagged_implementations(&self, capability: &str) -> Result<Vec<Contributor<T>>>;
}

/// Reads declared fields of a type.
pub trait StructuralTagReader: Send + Sync {
    /// Fields declared directly on the type.
    fn declared_fields(&self, descriptor: &TypeDescriptor) -> Vec<FieldDescriptor>;

    /// Fields from an authoritative persistence mapping, when the type is
    /// managed by one. Takes precedence over [`Self::declared_fields`].
    fn managed_fields(&self, _descriptor: &TypeDescriptor) -> Option<Vec<FieldDescriptor>> {
        None
    }
}

/// Reads the target-type tag of a contributor.
pub trait TargetTypeTagReader: Send + Sync {
    /// The single resource type the contributor is for, or `None` when the
    /// tag is absent.
    fn target_type(&self, contributor: &ContributorDescriptor) -> Option<TypeKey>;
}

/// Field reader that trusts the descriptor's own field list.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorFieldReader;

impl StructuralTagReader for DescriptorFieldReader {
    fn declared_fields(&self, descriptor: &TypeDescriptor) -> Vec<FieldDescriptor> {
        descriptor.fields.clone()
    }
}

/// Tag reader that trusts the descriptor's declared target.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredTargetReader;

impl TargetTypeTagReader for DeclaredTargetReader {
    fn target_type(&self, contributor: &ContributorDescriptor) -> Option<TypeKey> {
        contributor.target.clone()
    }
}
