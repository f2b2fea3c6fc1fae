//! In-memory discovery registries.
//!
//! [`StaticRegistry`] answers [`DiscoveryProvider`] and
//! [`StructuralTagReader`] queries from descriptors registered up front, and
//! [`ContributorRegistry`] does the same for tagged implementations. Both
//! preserve registration order, so every query returns a stable snapshot.

use std::collections::{HashMap, HashSet};

use crate::error::{ConfigurationError, Result};
use crate::id::TypeKey;
use crate::traits::{DiscoveryProvider, ImplementationProvider, StructuralTagReader};
use crate::types::{Contributor, FieldDescriptor, TypeDescriptor};

/// A registry of type descriptors.
#[derive(Debug, Clone)]
pub struct StaticRegistry {
    /// The root marker
    root: TypeKey,

    /// Descriptors in registration order
    descriptors: Vec<TypeDescriptor>,

    /// Position of each descriptor in `descriptors`
    index: HashMap<TypeKey, usize>,

    /// Authoritative field lists for managed types
    managed: HashMap<TypeKey, Vec<FieldDescriptor>>,
}

impl StaticRegistry {
    /// Create a registry whose resource types descend from `root`.
    ///
    /// The root marker is registered as an interface.
    pub fn new(root: impl Into<TypeKey>) -> Self {
        let root = root.into();
        let mut registry = Self {
            root: root.clone(),
            descriptors: Vec::new(),
            index: HashMap::new(),
            managed: HashMap::new(),
        };
        registry.index.insert(root.clone(), 0);
        registry.descriptors.push(TypeDescriptor::interface(root));
        registry
    }

    /// Register a descriptor.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the descriptor was registered, or an identical one
    ///   already was.
    /// * `Err` - If a different descriptor is registered under the same key.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Result<()> {
        if let Some(&position) = self.index.get(&descriptor.key) {
            if self.descriptors[position] == descriptor {
                return Ok(());
            }
            return Err(ConfigurationError::DuplicateType(descriptor.key).into());
        }

        self.index
            .insert(descriptor.key.clone(), self.descriptors.len());
        self.descriptors.push(descriptor);

        Ok(())
    }

    /// Register a descriptor, builder style.
    pub fn with(mut self, descriptor: TypeDescriptor) -> Result<Self> {
        self.register(descriptor)?;
        Ok(self)
    }

    /// Record the authoritative field list of a persisted type.
    pub fn set_managed_fields(&mut self, key: impl Into<TypeKey>, fields: Vec<FieldDescriptor>) {
        self.managed.insert(key.into(), fields);
    }

    /// Number of registered descriptors, the root marker included.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether only the root marker is registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.len() <= 1
    }

    /// Whether `key` reaches `marker` through its supertypes.
    fn implements(&self, key: &TypeKey, marker: &TypeKey, seen: &mut HashSet<TypeKey>) -> bool {
        if !seen.insert(key.clone()) {
            return false;
        }

        let Some(descriptor) = self.index.get(key).map(|&i| &self.descriptors[i]) else {
            return false;
        };

        descriptor
            .supertypes()
            .any(|parent| parent == marker || self.implements(parent, marker, seen))
    }
}

impl DiscoveryProvider for StaticRegistry {
    fn root_marker(&self) -> TypeKey {
        self.root.clone()
    }

    fn find_types_implementing(&self, marker: &TypeKey) -> Result<Vec<TypeDescriptor>> {
        let types = self
            .descriptors
            .iter()
            .filter(|d| &d.key != marker)
            .filter(|d| self.implements(&d.key, marker, &mut HashSet::new()))
            .cloned()
            .collect();

        Ok(types)
    }

    fn describe(&self, key: &TypeKey) -> Option<TypeDescriptor> {
        self.index.get(key).map(|&i| self.descriptors[i].clone())
    }
}

impl StructuralTagReader for StaticRegistry {
    fn declared_fields(&self, descriptor: &TypeDescriptor) -> Vec<FieldDescriptor> {
        descriptor.fields.clone()
    }

    fn managed_fields(&self, descriptor: &TypeDescriptor) -> Option<Vec<FieldDescriptor>> {
        self.managed.get(&descriptor.key).cloned()
    }
}

/// A registry of tagged implementations, grouped by capability.
pub struct ContributorRegistry<T: ?Sized> {
    contributors: HashMap<String, Vec<Contributor<T>>>,
}

impl<T: ?Sized> ContributorRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            contributors: HashMap::new(),
        }
    }

    /// Register an implementation for `capability`.
    pub fn register(&mut self, capability: impl Into<String>, contributor: Contributor<T>) {
        self.contributors
            .entry(capability.into())
            .or_default()
            .push(contributor);
    }
}

impl<T: ?Sized> Default for ContributorRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + Send + Sync> ImplementationProvider<T> for ContributorRegistry<T> {
    fn find_tagged_implementations(&self, capability: &str) -> Result<Vec<Contributor<T>>> {
        Ok(self
            .contributors
            .get(capability)
            .cloned()
            .unwrap_or_default())
    }
}
