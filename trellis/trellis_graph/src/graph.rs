//! The sealed resource graph.
//!
//! Traversals visit nodes in topological pre-order: a node is yielded only
//! after every one of its parents, starting from the root marker.

use std::collections::{HashMap, HashSet, VecDeque};

use trellis_core::error::Result;
use trellis_core::id::TypeKey;
use trellis_core::traits::DiscoveryProvider;
use trellis_core::utils::LogLevel;
use trellis_core::log_event;

use crate::builder::ResourceGraphBuilder;
use crate::node::ResourceNode;

/// The sealed DAG of resource types.
///
/// Every node is reachable from the root, no node is its own ancestor, and
/// nothing can be added once the graph exists. The graph is `Send + Sync`
/// and can be shared freely between request threads.
#[derive(Debug, Clone)]
pub struct ResourceGraph {
    /// The root marker
    root: TypeKey,

    /// Nodes in insertion order; index 0 is the root
    nodes: Vec<ResourceNode>,

    /// Position of each node in `nodes`
    index: HashMap<TypeKey, usize>,

    /// Traversal order: every node appears after all of its parents
    order: Vec<usize>,
}

impl ResourceGraph {
    /// Discover every resource type below the provider's root marker and
    /// build the sealed graph.
    ///
    /// # Returns
    ///
    /// * `Ok(ResourceGraph)` - The sealed graph.
    /// * `Err` - If any type cannot be attached; this aborts start-up.
    pub fn discover(provider: &dyn DiscoveryProvider) -> Result<Self> {
        let root = provider.root_marker();
        let descriptors = provider.find_types_implementing(&root)?;

        log_event!(LogLevel::Info, "Building resource graph",
            root => root,
            discovered => descriptors.len(),
        );

        let mut builder = ResourceGraphBuilder::new(provider);
        for descriptor in &descriptors {
            builder.add_type(descriptor)?;
        }

        Ok(builder.seal())
    }

    pub(crate) fn from_parts(
        root: TypeKey,
        nodes: Vec<ResourceNode>,
        index: HashMap<TypeKey, usize>,
    ) -> Self {
        let order = Self::traversal_order(&nodes, &index);

        Self {
            root,
            nodes,
            index,
            order,
        }
    }

    /// Pre-order from the root, descending into a child only once all of
    /// its parents have been visited.
    fn traversal_order(nodes: &[ResourceNode], index: &HashMap<TypeKey, usize>) -> Vec<usize> {
        let mut pending: Vec<usize> = nodes.iter().map(|n| n.parents.len()).collect();
        let mut order = Vec::with_capacity(nodes.len());
        let mut stack = vec![0usize];

        while let Some(position) = stack.pop() {
            order.push(position);

            // Push in reverse so children are visited in insertion order
            for child in nodes[position].children.iter().rev() {
                let child_position = index[child];
                pending[child_position] -= 1;
                if pending[child_position] == 0 {
                    stack.push(child_position);
                }
            }
        }

        order
    }

    /// The root node.
    pub fn root(&self) -> &ResourceNode {
        &self.nodes[0]
    }

    /// The root marker.
    pub fn root_key(&self) -> &TypeKey {
        &self.root
    }

    /// Number of nodes, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph holds only the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Find the node of a type.
    pub fn locate(&self, key: &TypeKey) -> Option<&ResourceNode> {
        self.index.get(key).map(|&position| &self.nodes[position])
    }

    /// Whether the type is part of the graph.
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.index.contains_key(key)
    }

    /// Iterate over all nodes, parents before children.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceNode> + '_ {
        self.order.iter().map(move |&position| &self.nodes[position])
    }

    /// Visit all nodes, parents before children.
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&ResourceNode),
    {
        for node in self.iter() {
            visitor(node);
        }
    }

    /// Map every node, in traversal order.
    pub fn collect<R, F>(&self, mapper: F) -> Vec<R>
    where
        F: FnMut(&ResourceNode) -> R,
    {
        self.iter().map(mapper).collect()
    }

    /// The direct parents of a node.
    pub fn parents_of<'g>(
        &'g self,
        node: &'g ResourceNode,
    ) -> impl Iterator<Item = &'g ResourceNode> {
        node.parents.iter().filter_map(move |key| self.locate(key))
    }

    /// The direct children of a node.
    pub fn children_of<'g>(
        &'g self,
        node: &'g ResourceNode,
    ) -> impl Iterator<Item = &'g ResourceNode> {
        node.children.iter().filter_map(move |key| self.locate(key))
    }

    /// All proper ancestors of a type, nearest first, the root last.
    pub fn ancestors(&self, key: &TypeKey) -> Vec<&ResourceNode> {
        let mut result = Vec::new();
        let Some(start) = self.locate(key) else {
            return result;
        };

        let mut seen: HashSet<&TypeKey> = HashSet::new();
        let mut queue: VecDeque<&ResourceNode> = VecDeque::new();
        queue.push_back(start);

        while let Some(node) = queue.pop_front() {
            for parent in self.parents_of(node) {
                if seen.insert(&parent.key) {
                    result.push(parent);
                    queue.push_back(parent);
                }
            }
        }

        // Breadth-first discovery can find the root before a deeper
        // ancestor on a longer path; order by depth to keep the root last.
        result.sort_by(|a, b| b.depth.cmp(&a.depth));
        result
    }

    /// Whether `key` is `ancestor` or one of its descendants.
    pub fn is_subtype_of(&self, key: &TypeKey, ancestor: &TypeKey) -> bool {
        (key == ancestor && self.contains(key))
            || self.ancestors(key).iter().any(|node| &node.key == ancestor)
    }
}
