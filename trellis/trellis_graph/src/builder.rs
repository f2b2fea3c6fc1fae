//! Graph construction.
//!
//! The builder is the only place the graph can be mutated. Types are added
//! one at a time; every missing ancestor is created on the way up, so a
//! node is always inserted after all of its parents. [`ResourceGraphBuilder::seal`]
//! consumes the builder and hands out the frozen [`ResourceGraph`].

use std::collections::{HashMap, HashSet};

use trellis_core::error::{ConfigurationError, Result};
use trellis_core::id::TypeKey;
use trellis_core::traits::DiscoveryProvider;
use trellis_core::types::{TypeDescriptor, TypeKind};
use trellis_core::utils::LogLevel;
use trellis_core::{config_bail, log_event};

use crate::graph::ResourceGraph;
use crate::node::ResourceNode;

/// Mutable resource graph under construction.
pub struct ResourceGraphBuilder<'a> {
    /// Source of ancestor descriptors
    provider: &'a dyn DiscoveryProvider,

    /// The root marker
    root: TypeKey,

    /// Nodes in insertion order; index 0 is the root
    nodes: Vec<ResourceNode>,

    /// Position of each node in `nodes`
    index: HashMap<TypeKey, usize>,

    /// Types known to descend from the root
    reaches_root: HashSet<TypeKey>,
}

impl<'a> ResourceGraphBuilder<'a> {
    /// Create a builder holding only the root marker.
    pub fn new(provider: &'a dyn DiscoveryProvider) -> Self {
        let root = provider.root_marker();
        let mut root_node = ResourceNode::new(root.clone(), TypeKind::Interface, true);
        root_node.depth = 0;

        let mut index = HashMap::new();
        index.insert(root.clone(), 0);

        let mut reaches_root = HashSet::new();
        reaches_root.insert(root.clone());

        Self {
            provider,
            root,
            nodes: vec![root_node],
            index,
            reaches_root,
        }
    }

    /// Number of nodes so far, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether only the root has been added.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Add a type, creating any missing ancestors.
    ///
    /// Supertypes that do not descend from the root marker (for example a
    /// serialisation marker) are ignored.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the type is now part of the graph.
    /// * `Err` - If the type hierarchy is cyclic, references an unknown
    ///   type, or has no path to the root.
    pub fn add_type(&mut self, descriptor: &TypeDescriptor) -> Result<()> {
        if self.index.contains_key(&descriptor.key) {
            return Ok(());
        }

        // Reject cyclic hierarchies before anything is attached
        let mut visited = HashSet::new();
        let mut in_stack = HashSet::new();
        self.check_acyclic(descriptor, &mut visited, &mut in_stack)?;

        self.attach(descriptor)?;

        Ok(())
    }

    /// Seal the graph. Parent and child sets are frozen from here on.
    pub fn seal(mut self) -> ResourceGraph {
        for node in &mut self.nodes {
            node.seal();
        }

        log_event!(LogLevel::Info, "Resource graph sealed",
            root => self.root,
            types => self.nodes.len(),
        );

        ResourceGraph::from_parts(self.root, self.nodes, self.index)
    }

    /// Depth-first cycle check over the descriptor hierarchy.
    fn check_acyclic(
        &self,
        descriptor: &TypeDescriptor,
        visited: &mut HashSet<TypeKey>,
        in_stack: &mut HashSet<TypeKey>,
    ) -> Result<()> {
        visited.insert(descriptor.key.clone());
        in_stack.insert(descriptor.key.clone());

        for parent in descriptor.supertypes() {
            if in_stack.contains(parent) {
                config_bail!(ConfigurationError::CycleDetected(parent.clone()));
            }

            // Nodes already in the graph were checked when they were added
            if visited.contains(parent) || self.index.contains_key(parent) {
                continue;
            }

            if let Some(parent_descriptor) = self.provider.describe(parent) {
                self.check_acyclic(&parent_descriptor, visited, in_stack)?;
            }
        }

        in_stack.remove(&descriptor.key);

        Ok(())
    }

    /// Whether `key` descends from the root. Only positive answers are
    /// memoised.
    fn descends_from_root(&mut self, key: &TypeKey) -> bool {
        if self.reaches_root.contains(key) {
            return true;
        }

        let Some(descriptor) = self.provider.describe(key) else {
            return false;
        };

        let parents: Vec<TypeKey> = descriptor.supertypes().cloned().collect();
        let reaches = parents.iter().any(|parent| self.descends_from_root(parent));

        if reaches {
            self.reaches_root.insert(key.clone());
        }

        reaches
    }

    /// Attach a type under every resource supertype, recursing upwards for
    /// ancestors not yet in the graph.
    fn attach(&mut self, descriptor: &TypeDescriptor) -> Result<usize> {
        if let Some(&position) = self.index.get(&descriptor.key) {
            return Ok(position);
        }

        let mut parents: Vec<usize> = Vec::new();

        for parent in descriptor.supertypes() {
            if !self.descends_from_root(parent) {
                log_event!(LogLevel::Trace, "Ignoring non-resource supertype",
                    type_key => descriptor.key,
                    supertype => parent,
                );
                continue;
            }

            let position = match self.index.get(parent) {
                Some(&position) => position,
                None => {
                    let parent_descriptor = self
                        .provider
                        .describe(parent)
                        .ok_or_else(|| ConfigurationError::UnknownType(parent.clone()))?;
                    self.attach(&parent_descriptor)?
                }
            };

            if !parents.contains(&position) {
                parents.push(position);
            }
        }

        if parents.is_empty() {
            config_bail!(ConfigurationError::UnreachableType(descriptor.key.clone()));
        }

        let depth = parents
            .iter()
            .map(|&p| self.nodes[p].depth)
            .max()
            .unwrap_or(0)
            + 1;

        let mut node = ResourceNode::new(
            descriptor.key.clone(),
            descriptor.kind,
            descriptor.is_abstract,
        );
        node.depth = depth;
        node.parents = parents.iter().map(|&p| self.nodes[p].key.clone()).collect();

        let position = self.nodes.len();
        for &p in &parents {
            self.nodes[p].children.push(descriptor.key.clone());
        }
        self.index.insert(descriptor.key.clone(), position);
        self.reaches_root.insert(descriptor.key.clone());
        self.nodes.push(node);

        log_event!(LogLevel::Debug, "Added resource type",
            type_key => descriptor.key,
            depth => depth,
            parents => parents.len(),
        );

        Ok(position)
    }
}
