use std::collections::HashSet;

use trellis_core::registry::StaticRegistry;
use trellis_core::types::TypeDescriptor;
use trellis_core::{ConfigurationError, DiscoveryProvider, Error, TypeKey};
use trellis_graph::{ResourceGraph, ResourceGraphBuilder};

/// A hierarchy with diamonds, a non-resource marker and a deep chain.
fn registry() -> StaticRegistry {
    let mut registry = StaticRegistry::new("Resource");
    let descriptors = vec![
        TypeDescriptor::interface("Serializable"),
        TypeDescriptor::interface("Named").implements("Resource"),
        TypeDescriptor::interface("Owned").implements("Resource"),
        TypeDescriptor::interface("Tagged").implements("Named"),
        TypeDescriptor::class("Entity")
            .implements("Resource")
            .implements("Serializable")
            .abstract_type(),
        TypeDescriptor::class("Animal")
            .extends("Entity")
            .implements("Named"),
        TypeDescriptor::class("Dog")
            .extends("Animal")
            .implements("Owned")
            .implements("Tagged"),
        TypeDescriptor::class("Puppy").extends("Dog"),
        TypeDescriptor::class("Invoice")
            .extends("Entity")
            .implements("Owned"),
    ];

    for descriptor in descriptors {
        registry.register(descriptor).unwrap();
    }

    registry
}

#[test]
fn every_node_is_reachable_from_the_root() {
    let graph = ResourceGraph::discover(&registry()).unwrap();

    let mut reachable = HashSet::new();
    let mut stack = vec![graph.root()];
    while let Some(node) = stack.pop() {
        if reachable.insert(node.key().clone()) {
            stack.extend(graph.children_of(node));
        }
    }

    assert_eq!(reachable.len(), graph.len());
    assert!(!graph.contains(&TypeKey::new("Serializable")));
}

#[test]
fn no_node_is_its_own_ancestor() {
    let graph = ResourceGraph::discover(&registry()).unwrap();

    graph.for_each(|node| {
        assert!(graph
            .ancestors(node.key())
            .iter()
            .all(|ancestor| ancestor.key() != node.key()));
    });
}

#[test]
fn depth_is_one_more_than_the_deepest_parent() {
    let graph = ResourceGraph::discover(&registry()).unwrap();

    graph.for_each(|node| {
        if node.is_root() {
            assert_eq!(node.depth(), 0);
            return;
        }

        let deepest = graph
            .parents_of(node)
            .map(|parent| parent.depth())
            .max()
            .unwrap();
        assert_eq!(node.depth(), deepest + 1, "depth of {}", node.key());
    });

    // Dog sits under Animal (2) and Tagged (2)
    assert_eq!(graph.locate(&TypeKey::new("Dog")).unwrap().depth(), 3);
}

#[test]
fn diamond_parents_are_recorded_once() {
    let graph = ResourceGraph::discover(&registry()).unwrap();

    let dog = graph.locate(&TypeKey::new("Dog")).unwrap();
    let parents: Vec<&str> = dog.parents().iter().map(TypeKey::as_str).collect();
    assert_eq!(parents, vec!["Animal", "Owned", "Tagged"]);

    let named = graph.locate(&TypeKey::new("Named")).unwrap();
    let children: Vec<&str> = named.children().iter().map(TypeKey::as_str).collect();
    assert_eq!(children, vec!["Tagged", "Animal"]);
}

#[test]
fn traversal_is_stable_and_topological() {
    let graph = ResourceGraph::discover(&registry()).unwrap();
    let first = graph.collect(|node| node.key().clone());
    let second = graph.collect(|node| node.key().clone());
    assert_eq!(first, second);

    for (position, key) in first.iter().enumerate() {
        let node = graph.locate(key).unwrap();
        for parent in node.parents() {
            let parent_position = first.iter().position(|k| k == parent).unwrap();
            assert!(parent_position < position);
        }
    }
}

#[test]
fn missing_ancestor_descriptor_is_fatal() {
    let registry = registry();
    let mut builder = ResourceGraphBuilder::new(&registry);

    // Points at a supertype nobody described; it cannot reach the root
    let stray = TypeDescriptor::class("Stray").extends("Ghost");
    let result = builder.add_type(&stray);

    assert!(matches!(
        result,
        Err(Error::Configuration(ConfigurationError::UnreachableType(key))) if key.as_str() == "Stray"
    ));
    assert_eq!(registry.root_marker().as_str(), "Resource");
}
