//! # Trellis Behavior
//!
//! `trellis_behavior` composes, for every resource type, one effective
//! behavior out of independently registered per-type contributions.
//!
//! The engine is generic over a [`BehaviorCapability`], which supplies the
//! discovery tag, the no-op placeholder, the "and" combinator and the
//! ordering policy. Two capabilities ship with the crate:
//!
//! - **Validation**: [`Validator`]s folded with [`AllValidators`], kept in
//!   propagation order.
//! - **Logic hooks**: [`LogicHook`]s folded with [`AllHooks`], ordered by
//!   the depth of the declaring type.
//!
//! A subtype inherits every contribution of its ancestors and adds its
//! own. Once a type has any real contribution, no-op placeholders are
//! dropped; a type with none resolves to the shared no-op composite.
//!
//! ## Usage Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use trellis_behavior::{BehaviorFactory, Validation, ValidationResult, Validator};
//! use trellis_core::registry::StaticRegistry;
//! use trellis_core::traits::DeclaredTargetReader;
//! use trellis_core::types::{Contributor, ContributorDescriptor, Instance, TypeDescriptor};
//! use trellis_core::TypeKey;
//! use trellis_graph::ResourceGraph;
//! use trellis_metadata::MetadataBuilder;
//!
//! let registry = StaticRegistry::new("Resource")
//!     .with(TypeDescriptor::class("Animal").implements("Resource"))?
//!     .with(TypeDescriptor::class("Dog").extends("Animal"))?;
//! let graph = ResourceGraph::discover(&registry)?;
//! let metadata = MetadataBuilder::new(&graph, &registry, &registry).build()?;
//!
//! let name_required: Arc<dyn Validator> = Arc::new(|instance: &Instance| {
//!     match instance.get("name") {
//!         Some(_) => ValidationResult::success(),
//!         None => ValidationResult::attribute_failure("name", "is required"),
//!     }
//! });
//!
//! let validators = BehaviorFactory::builder(Validation)
//!     .discovered(vec![Contributor::new(
//!         ContributorDescriptor::tagged("NameRequired", "Animal"),
//!         name_required,
//!     )])
//!     .build(&graph, &metadata, &DeclaredTargetReader)?;
//!
//! let dog = validators.get_behavior(&TypeKey::new("Dog")).unwrap();
//! assert!(!dog.validate(&Instance::new("Dog")).is_valid());
//! # Ok::<(), trellis_core::Error>(())
//! ```

mod capability;
mod composite;
mod contribution;
mod factory;
mod logic;
mod validation;

pub use capability::{BehaviorCapability, OrderingPolicy};
pub use composite::ComposedBehavior;
pub use contribution::{compose, Contribution, ContributionKey};
pub use factory::{BehaviorFactory, BehaviorFactoryBuilder};
pub use logic::{AllHooks, LogicHook, LogicHooks, NoOpHook, Operation};
pub use validation::{
    AllValidators, NoOpValidator, Validation, ValidationResult, Validator, Violation,
};
