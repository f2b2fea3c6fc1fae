//! Catalogue construction.
//!
//! Catalogues are built in the graph's traversal order, so the catalogues
//! of all parents exist before a type is processed. Each type contributes
//! its own persistent fields, with value objects flattened into dotted
//! attributes, and inherits everything its parents expose.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use trellis_core::error::{ConfigurationError, Result};
use trellis_core::id::TypeKey;
use trellis_core::traits::{DiscoveryProvider, StructuralTagReader};
use trellis_core::types::{FieldDescriptor, FieldModifiers, TypeDescriptor, TypeKind, ValueType};
use trellis_core::utils::LogLevel;
use trellis_core::{config_bail, log_event};
use trellis_graph::{ResourceGraph, ResourceNode};

use crate::attribute::{AttributeKind, AttributeRecord};
use crate::metadata::{MetadataProvider, ResourceMetadata};

/// A field every type implementing `marker` must expose.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructuralRequirement {
    /// The capability marker
    pub marker: TypeKey,

    /// The attribute the marker depends on
    pub field: String,
}

impl StructuralRequirement {
    /// Create a requirement.
    pub fn new(marker: impl Into<TypeKey>, field: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            field: field.into(),
        }
    }
}

/// Builds the catalogue of every type in a resource graph.
pub struct MetadataBuilder<'a> {
    /// The sealed graph
    graph: &'a ResourceGraph,

    /// Descriptor lookup for resource types and value objects
    provider: &'a dyn DiscoveryProvider,

    /// Field source
    fields: &'a dyn StructuralTagReader,

    /// Marker/field pairs to enforce
    requirements: Vec<StructuralRequirement>,
}

/// Where a field sits while it is being flattened.
struct Scope<'s> {
    /// Path of enclosing components
    path: &'s [String],

    /// Whether any enclosing component is nullable
    optional: bool,

    /// Whether any enclosing component is lazy
    lazy: bool,
}

impl<'a> MetadataBuilder<'a> {
    /// Create a builder.
    pub fn new(
        graph: &'a ResourceGraph,
        provider: &'a dyn DiscoveryProvider,
        fields: &'a dyn StructuralTagReader,
    ) -> Self {
        Self {
            graph,
            provider,
            fields,
            requirements: Vec::new(),
        }
    }

    /// Enforce a structural requirement.
    pub fn with_requirement(mut self, requirement: StructuralRequirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    /// Enforce several structural requirements.
    pub fn with_requirements(
        mut self,
        requirements: impl IntoIterator<Item = StructuralRequirement>,
    ) -> Self {
        self.requirements.extend(requirements);
        self
    }

    /// Build every catalogue.
    ///
    /// # Returns
    ///
    /// * `Ok(MetadataProvider)` - The catalogues of all graph nodes.
    /// * `Err` - On a duplicate or incompatible attribute, a cyclic value
    ///   object, or a missing structural field. All of these abort start-up.
    pub fn build(self) -> Result<MetadataProvider> {
        let mut catalogues: HashMap<TypeKey, ResourceMetadata> = HashMap::new();

        for node in self.graph.iter() {
            let metadata = self.build_type(node, &catalogues)?;

            log_event!(LogLevel::Debug, "Built attribute catalogue",
                type_key => node.key(),
                attributes => metadata.len(),
            );

            catalogues.insert(node.key().clone(), metadata);
        }

        for node in self.graph.iter() {
            self.check_requirements(node, &catalogues[node.key()])?;
        }

        log_event!(LogLevel::Info, "Metadata built", types => catalogues.len());

        Ok(MetadataProvider::new(catalogues))
    }

    fn build_type(
        &self,
        node: &ResourceNode,
        catalogues: &HashMap<TypeKey, ResourceMetadata>,
    ) -> Result<ResourceMetadata> {
        let own = match self.provider.describe(node.key()) {
            Some(descriptor) => self.own_attributes(&descriptor)?,
            None if node.is_root() => IndexMap::new(),
            None => config_bail!(ConfigurationError::UnknownType(node.key().clone())),
        };

        // Parents first, in declaration order. A name exposed by several
        // parents must have one shape unless this type redeclares it.
        let mut attributes: IndexMap<String, AttributeRecord> = IndexMap::new();
        let mut conflicts: Vec<(String, String, String)> = Vec::new();
        for parent in node.parents() {
            if let Some(parent_metadata) = catalogues.get(parent) {
                for (name, record) in &parent_metadata.attributes {
                    if let Some(merged) = attributes.get(name) {
                        if !same_shape(merged, record) {
                            conflicts.push((name.clone(), shape(merged), shape(record)));
                        }
                        continue;
                    }
                    attributes.insert(name.clone(), record.clone());
                }
            }
        }

        // Nested entries of an inherited component that an own declaration
        // replaces belong to the old value object.
        let own_roots: HashSet<&str> = own
            .values()
            .filter(|record| !record.is_nested())
            .map(|record| record.name.as_str())
            .collect();
        attributes.retain(|name, record| {
            !(record.is_nested()
                && own_roots.contains(record.path[0].as_str())
                && !own.contains_key(name))
        });

        for (name, first, second) in &conflicts {
            if !own.contains_key(name) && attributes.contains_key(name) {
                config_bail!(ConfigurationError::ConflictingInheritance {
                    type_key: node.key().clone(),
                    attribute: name.clone(),
                    first: first.clone(),
                    second: second.clone(),
                });
            }
        }

        for (name, record) in own {
            let resolves_conflict = conflicts.iter().any(|(conflict, _, _)| *conflict == name);
            if let Some(inherited) = attributes.get(&name).filter(|_| !resolves_conflict) {
                if inherited.kind != record.kind {
                    config_bail!(ConfigurationError::IncompatibleRedeclaration {
                        type_key: node.key().clone(),
                        attribute: name,
                        inherited: inherited.kind.to_string(),
                        declared: record.kind.to_string(),
                    });
                }
            }
            attributes.insert(name, record);
        }

        Ok(ResourceMetadata {
            type_key: node.key().clone(),
            is_abstract: node.is_abstract(),
            attributes,
        })
    }

    /// The flattened attributes declared directly on one type.
    fn own_attributes(
        &self,
        descriptor: &TypeDescriptor,
    ) -> Result<IndexMap<String, AttributeRecord>> {
        let fields = self
            .fields
            .managed_fields(descriptor)
            .unwrap_or_else(|| self.fields.declared_fields(descriptor));

        let mut records = IndexMap::new();
        let mut components = HashSet::new();
        let scope = Scope {
            path: &[],
            optional: false,
            lazy: false,
        };

        for field in fields.iter().filter(|f| f.is_persistent()) {
            self.flatten(
                &descriptor.key,
                field,
                &scope,
                &mut components,
                &mut records,
            )?;
        }

        Ok(records)
    }

    /// Record one field and, for value objects, every field nested in it.
    fn flatten(
        &self,
        owner: &TypeKey,
        field: &FieldDescriptor,
        scope: &Scope<'_>,
        components: &mut HashSet<TypeKey>,
        records: &mut IndexMap<String, AttributeRecord>,
    ) -> Result<()> {
        let mut path = scope.path.to_vec();
        path.push(field.name.clone());

        let optional = scope.optional || field.modifiers.contains(FieldModifiers::NULLABLE);
        let lazy = scope.lazy || field.modifiers.contains(FieldModifiers::LAZY);
        let (kind, component) = self.classify(&field.value_type);

        let record = AttributeRecord {
            name: path.join("."),
            path: path.clone(),
            value_type: field.value_type.clone(),
            kind,
            optional,
            lazy,
            identifier: scope.path.is_empty()
                && field.modifiers.contains(FieldModifiers::IDENTIFIER),
            declared_by: owner.clone(),
        };

        if records.contains_key(&record.name) {
            config_bail!(ConfigurationError::DuplicateAttribute {
                type_key: owner.clone(),
                attribute: record.name,
            });
        }
        records.insert(record.name.clone(), record);

        if let Some(component) = component {
            if !components.insert(component.key.clone()) {
                config_bail!(ConfigurationError::CycleDetected(component.key));
            }

            let nested = Scope {
                path: &path,
                optional,
                lazy,
            };
            let fields = self.fields.declared_fields(&component);
            for nested_field in fields.iter().filter(|f| f.is_persistent()) {
                self.flatten(owner, nested_field, &nested, components, records)?;
            }

            components.remove(&component.key);
        }

        Ok(())
    }

    /// Classify a value type; value objects are returned for flattening.
    fn classify(&self, value_type: &ValueType) -> (AttributeKind, Option<TypeDescriptor>) {
        match value_type {
            ValueType::Named(key) if self.graph.contains(key) => {
                (AttributeKind::SingularAssociation, None)
            }
            ValueType::Named(key) => match self.provider.describe(key) {
                Some(descriptor) if descriptor.kind == TypeKind::ValueObject => {
                    (AttributeKind::Component, Some(descriptor))
                }
                _ => (AttributeKind::Plain, None),
            },
            ValueType::Collection(inner) | ValueType::Array(inner) => match inner.as_ref() {
                ValueType::Named(key) if self.graph.contains(key) => {
                    (AttributeKind::PluralAssociation, None)
                }
                _ => (AttributeKind::Plain, None),
            },
            ValueType::Scalar(_) => (AttributeKind::Plain, None),
        }
    }

    fn check_requirements(&self, node: &ResourceNode, metadata: &ResourceMetadata) -> Result<()> {
        for requirement in &self.requirements {
            if node.key() == &requirement.marker {
                continue;
            }

            if !self.implements(node.key(), &requirement.marker, &mut HashSet::new()) {
                continue;
            }

            if !metadata.contains(&requirement.field) {
                config_bail!(ConfigurationError::MissingStructuralTag {
                    type_key: node.key().clone(),
                    marker: requirement.marker.clone(),
                    field: requirement.field.clone(),
                });
            }
        }

        Ok(())
    }

    /// Whether `key` reaches `marker` through its declared supertypes. The
    /// marker does not have to be a resource type.
    fn implements(&self, key: &TypeKey, marker: &TypeKey, seen: &mut HashSet<TypeKey>) -> bool {
        if !seen.insert(key.clone()) {
            return false;
        }

        match self.provider.describe(key) {
            Some(descriptor) => descriptor
                .supertypes()
                .any(|parent| parent == marker || self.implements(parent, marker, seen)),
            None => false,
        }
    }
}

/// Whether two inherited records describe the same attribute structure.
fn same_shape(left: &AttributeRecord, right: &AttributeRecord) -> bool {
    left.kind == right.kind
        && (left.kind != AttributeKind::Component || left.value_type == right.value_type)
}

fn shape(record: &AttributeRecord) -> String {
    format!("{} ({})", record.kind, record.value_type)
}
