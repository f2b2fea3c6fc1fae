//! # Trellis Graph
//!
//! `trellis_graph` reconstructs the inheritance DAG of all resource types.
//!
//! A type's parents are its superclass and every implemented interface that
//! itself descends from the root marker, so a type can have several parents
//! and the structure is a DAG rather than a tree. Each node records its
//! depth, one more than its deepest parent.
//!
//! The graph is built through [`ResourceGraphBuilder`] and frozen by
//! [`ResourceGraphBuilder::seal`]; the resulting [`ResourceGraph`] offers
//! only read access.
//!
//! ```
//! use trellis_core::registry::StaticRegistry;
//! use trellis_core::types::TypeDescriptor;
//! use trellis_core::TypeKey;
//! use trellis_graph::ResourceGraph;
//!
//! let registry = StaticRegistry::new("Resource")
//!     .with(TypeDescriptor::class("Animal").implements("Resource")).unwrap()
//!     .with(TypeDescriptor::class("Dog").extends("Animal")).unwrap();
//!
//! let graph = ResourceGraph::discover(&registry).unwrap();
//! let dog = graph.locate(&TypeKey::new("Dog")).unwrap();
//! assert_eq!(dog.depth(), 2);
//! ```

mod builder;
mod graph;
mod node;

pub use builder::ResourceGraphBuilder;
pub use graph::ResourceGraph;
pub use node::ResourceNode;
