use std::sync::Arc;

use trellis_behavior::{
    compose, BehaviorFactory, Contribution, Validation, ValidationResult, Validator,
};
use trellis_core::registry::StaticRegistry;
use trellis_core::traits::DeclaredTargetReader;
use trellis_core::types::{Contributor, ContributorDescriptor, Instance, TypeDescriptor};
use trellis_core::TypeKey;
use trellis_graph::ResourceGraph;
use trellis_metadata::{MetadataBuilder, MetadataProvider};

/// Fails when an attribute is missing.
struct Required(&'static str);

impl Validator for Required {
    fn validate(&self, instance: &Instance) -> ValidationResult {
        match instance.get(self.0) {
            Some(_) => ValidationResult::success(),
            None => ValidationResult::attribute_failure(self.0, "is required"),
        }
    }
}

fn required(attribute: &'static str, target: &str) -> Contributor<dyn Validator> {
    let instance: Arc<dyn Validator> = Arc::new(Required(attribute));
    Contributor::new(
        ContributorDescriptor::tagged(format!("Required[{}]", attribute), target),
        instance,
    )
}

fn zoo() -> (ResourceGraph, MetadataProvider) {
    let registry = StaticRegistry::new("Resource")
        .with(TypeDescriptor::interface("Owned").implements("Resource"))
        .unwrap()
        .with(TypeDescriptor::class("Animal").implements("Resource"))
        .unwrap()
        .with(TypeDescriptor::class("Dog").extends("Animal"))
        .unwrap()
        .with(TypeDescriptor::class("Puppy").extends("Dog").implements("Owned"))
        .unwrap()
        .with(TypeDescriptor::class("Rock").implements("Resource"))
        .unwrap()
        .with(TypeDescriptor::class("Pebble").extends("Rock"))
        .unwrap();

    let graph = ResourceGraph::discover(&registry).unwrap();
    let metadata = MetadataBuilder::new(&graph, &registry, &registry)
        .build()
        .unwrap();
    (graph, metadata)
}

fn key(name: &str) -> TypeKey {
    TypeKey::new(name)
}

#[test]
fn subtype_without_contributions_shares_ancestor_behavior() {
    let (graph, metadata) = zoo();
    let factory = BehaviorFactory::builder(Validation)
        .discovered(vec![required("name", "Animal")])
        .build(&graph, &metadata, &DeclaredTargetReader)
        .unwrap();

    let animal = factory.get_behavior(&key("Animal")).unwrap();
    let dog = factory.get_behavior(&key("Dog")).unwrap();
    assert_eq!(dog, animal);
    assert!(!dog.is_no_op());

    // Neither Rock nor Pebble has anything registered
    let pebble = factory.get_behavior(&key("Pebble")).unwrap();
    assert!(pebble.is_no_op());
    assert_eq!(pebble, factory.get_behavior(&key("Rock")).unwrap());
}

#[test]
fn same_type_contributions_fold_in_discovery_order() {
    let (graph, metadata) = zoo();
    let factory = BehaviorFactory::builder(Validation)
        .discovered(vec![required("name", "Dog"), required("breed", "Dog")])
        .build(&graph, &metadata, &DeclaredTargetReader)
        .unwrap();

    let dog = factory.get_behavior(&key("Dog")).unwrap();
    let contributors: Vec<String> = dog.contributors().iter().map(ToString::to_string).collect();
    assert_eq!(contributors, vec!["Required[name]@Dog", "Required[breed]@Dog"]);

    let cases = [
        Instance::new("Dog"),
        Instance::new("Dog").with("name", "Rex"),
        Instance::new("Dog").with("breed", "Collie"),
        Instance::new("Dog").with("name", "Rex").with("breed", "Collie"),
    ];
    for instance in &cases {
        let composed = dog.validate(instance);
        let separately = Required("name")
            .validate(instance)
            .and(Required("breed").validate(instance));

        assert_eq!(composed, separately);
        assert_eq!(
            composed.is_valid(),
            Required("name").validate(instance).is_valid()
                && Required("breed").validate(instance).is_valid()
        );
    }
}

#[test]
fn subtype_extends_ancestor_behavior() {
    let (graph, metadata) = zoo();
    let factory = BehaviorFactory::builder(Validation)
        .discovered(vec![
            required("breed", "Dog"),
            required("name", "Animal"),
            required("owner", "Owned"),
        ])
        .build(&graph, &metadata, &DeclaredTargetReader)
        .unwrap();

    let puppy = factory.get_behavior(&key("Puppy")).unwrap();
    let contributors: Vec<String> = puppy.contributors().iter().map(ToString::to_string).collect();
    assert_eq!(
        contributors,
        vec!["Required[name]@Animal", "Required[breed]@Dog", "Required[owner]@Owned"]
    );

    let result = puppy.validate(&Instance::new("Puppy").with("name", "Bit"));
    let offenders: Vec<_> = result
        .violations()
        .iter()
        .filter_map(|v| v.attribute.as_deref())
        .collect();
    assert_eq!(offenders, vec!["breed", "owner"]);
}

#[test]
fn appending_a_no_op_does_not_change_the_composite() {
    let name: Arc<dyn Validator> = Arc::new(Required("name"));
    let breed: Arc<dyn Validator> = Arc::new(Required("breed"));

    let plain = compose(
        &Validation,
        vec![Contribution::Real(name.clone()), Contribution::Real(breed.clone())],
    );
    let padded = compose(
        &Validation,
        vec![Contribution::Real(name.clone()), Contribution::Real(breed), Contribution::NoOp],
    );

    let instance = Instance::new("Dog").with("breed", "Collie");
    assert_eq!(plain.validate(&instance), padded.validate(&instance));

    // A singleton folds to itself, a lone placeholder to the no-op
    let single = compose(&Validation, vec![Contribution::Real(name.clone()), Contribution::NoOp]);
    assert!(Arc::ptr_eq(&single, &name));
    assert!(compose(&Validation, vec![Contribution::NoOp])
        .validate(&Instance::new("Dog"))
        .is_valid());
}

#[test]
fn no_op_parent_branch_does_not_change_the_factory_composite() {
    let (graph, metadata) = zoo();
    let factory = BehaviorFactory::builder(Validation)
        .discovered(vec![required("name", "Animal")])
        .build(&graph, &metadata, &DeclaredTargetReader)
        .unwrap();

    // Owned contributes only the placeholder; Puppy inherits it next to Animal's validator
    assert!(factory.get_behavior(&key("Owned")).unwrap().is_no_op());

    let animal = factory.get_behavior(&key("Animal")).unwrap();
    let puppy = factory.get_behavior(&key("Puppy")).unwrap();
    assert_eq!(puppy, animal);
    assert_eq!(
        puppy.contributors().iter().map(ToString::to_string).collect::<Vec<_>>(),
        vec!["Required[name]@Animal"]
    );
    assert!(!puppy.validate(&Instance::new("Puppy")).is_valid());
}
