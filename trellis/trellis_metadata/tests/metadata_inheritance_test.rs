use trellis_core::registry::StaticRegistry;
use trellis_core::types::{FieldDescriptor, FieldModifiers, TypeDescriptor, ValueType};
use trellis_core::{ConfigurationError, Error, TypeKey};
use trellis_graph::ResourceGraph;
use trellis_metadata::{AttributeKind, MetadataBuilder, MetadataProvider, StructuralRequirement};

fn string(name: &str) -> FieldDescriptor {
    FieldDescriptor::new(name, ValueType::scalar("string"))
}

fn zoo() -> StaticRegistry {
    let mut registry = StaticRegistry::new("Resource");
    let descriptors = vec![
        TypeDescriptor::interface("Versioned"),
        TypeDescriptor::class("Animal")
            .implements("Resource")
            .field(
                FieldDescriptor::new("id", ValueType::scalar("uuid"))
                    .with(FieldModifiers::IDENTIFIER),
            )
            .field(string("name")),
        TypeDescriptor::class("Person")
            .implements("Resource")
            .field(
                FieldDescriptor::new("id", ValueType::scalar("uuid"))
                    .with(FieldModifiers::IDENTIFIER),
            )
            .field(
                FieldDescriptor::new("pets", ValueType::collection_of("Animal"))
                    .with(FieldModifiers::LAZY),
            ),
        TypeDescriptor::class("Dog")
            .extends("Animal")
            .field(string("breed"))
            .field(
                FieldDescriptor::new("owner", ValueType::named("Person"))
                    .with(FieldModifiers::NULLABLE),
            ),
        TypeDescriptor::class("Puppy")
            .extends("Dog")
            .implements("Versioned")
            .field(string("name").with(FieldModifiers::NULLABLE))
            .field(FieldDescriptor::new("version", ValueType::scalar("i64"))),
    ];

    for descriptor in descriptors {
        registry.register(descriptor).unwrap();
    }

    registry
}

fn build(
    registry: &StaticRegistry,
    requirements: Vec<StructuralRequirement>,
) -> Result<MetadataProvider, Error> {
    let graph = ResourceGraph::discover(registry)?;
    MetadataBuilder::new(&graph, registry, registry)
        .with_requirements(requirements)
        .build()
}

#[test]
fn subtype_adds_to_inherited_attributes() {
    let provider = build(&zoo(), Vec::new()).unwrap();

    let animal = provider.get_metadata(&TypeKey::new("Animal")).unwrap();
    let dog = provider.get_metadata(&TypeKey::new("Dog")).unwrap();

    let animal_names: Vec<&str> = animal.attribute_names().collect();
    assert_eq!(animal_names, vec!["id", "name"]);

    let mut dog_names: Vec<&str> = dog.attribute_names().collect();
    dog_names.sort_unstable();
    assert_eq!(dog_names, vec!["breed", "id", "name", "owner"]);
}

#[test]
fn inherited_attributes_keep_their_classification() {
    let registry = zoo();
    let graph = ResourceGraph::discover(&registry).unwrap();
    let provider = MetadataBuilder::new(&graph, &registry, &registry)
        .build()
        .unwrap();

    graph.for_each(|node| {
        let child = provider.get_metadata(node.key()).unwrap();
        for parent in node.parents() {
            let parent_metadata = provider.get_metadata(parent).unwrap();
            for record in parent_metadata.attributes() {
                let inherited = child.attribute(&record.name).unwrap();
                assert_eq!(inherited.kind, record.kind, "{}.{}", node.key(), record.name);
            }
        }
    });
}

#[test]
fn own_declaration_wins_on_collision() {
    let provider = build(&zoo(), Vec::new()).unwrap();
    let puppy = provider.get_metadata(&TypeKey::new("Puppy")).unwrap();

    let name = puppy.attribute("name").unwrap();
    assert!(name.optional);
    assert_eq!(name.declared_by.as_str(), "Puppy");

    // Redeclaration keeps the inherited position
    let names: Vec<&str> = puppy.attribute_names().collect();
    assert_eq!(&names[..2], &["id", "name"]);
}

#[test]
fn associations_are_classified() {
    let provider = build(&zoo(), Vec::new()).unwrap();
    let dog = provider.get_metadata(&TypeKey::new("Dog")).unwrap();
    let person = provider.get_metadata(&TypeKey::new("Person")).unwrap();

    assert!(dog.is_association("owner"));
    assert!(dog.is_association_optional("owner"));
    assert_eq!(
        dog.attribute("owner").unwrap().kind,
        AttributeKind::SingularAssociation
    );
    assert_eq!(
        dog.attribute_type("breed"),
        Some(&ValueType::scalar("string"))
    );

    let pets = person.attribute("pets").unwrap();
    assert_eq!(pets.kind, AttributeKind::PluralAssociation);
    assert_eq!(pets.target_type().map(TypeKey::as_str), Some("Animal"));
    assert!(!person.is_association_optional("pets"));
    assert_eq!(person.non_lazy_attribute_names(), vec!["id"]);
    assert!(!dog.is_association("name"));
}

#[test]
fn incompatible_redeclaration_is_fatal() {
    let mut registry = zoo();
    registry
        .register(
            TypeDescriptor::class("Kennel")
                .extends("Animal")
                .field(FieldDescriptor::new("name", ValueType::named("Person"))),
        )
        .unwrap();

    let result = build(&registry, Vec::new());
    assert!(matches!(
        result,
        Err(Error::Configuration(ConfigurationError::IncompatibleRedeclaration { attribute, .. })) if attribute == "name"
    ));
}

#[test]
fn structural_requirement_is_enforced() {
    // Puppy implements Versioned and declares `version`
    build(&zoo(), vec![StructuralRequirement::new("Versioned", "version")]).unwrap();

    let mut registry = zoo();
    registry
        .register(
            TypeDescriptor::class("Kitten")
                .extends("Animal")
                .implements("Versioned"),
        )
        .unwrap();

    let result = build(&registry, vec![StructuralRequirement::new("Versioned", "version")]);
    assert!(matches!(
        result,
        Err(Error::Configuration(ConfigurationError::MissingStructuralTag { type_key, .. })) if type_key.as_str() == "Kitten"
    ));
}

/// Guide inherits `name` from Animal (plain) and from Pet (an association).
fn zoo_with_pets(guide: TypeDescriptor) -> StaticRegistry {
    let mut registry = zoo();
    registry
        .register(
            TypeDescriptor::interface("Pet")
                .implements("Resource")
                .field(FieldDescriptor::new("name", ValueType::named("Person"))),
        )
        .unwrap();
    registry.register(guide).unwrap();
    registry
}

#[test]
fn parents_disagreeing_on_an_attribute_is_fatal() {
    let registry = zoo_with_pets(
        TypeDescriptor::class("Guide")
            .extends("Animal")
            .implements("Pet"),
    );

    let result = build(&registry, Vec::new());
    assert!(matches!(
        result,
        Err(Error::Configuration(ConfigurationError::ConflictingInheritance { type_key, attribute, .. }))
            if type_key.as_str() == "Guide" && attribute == "name"
    ));
}

#[test]
fn redeclaration_settles_disagreeing_parents() {
    let registry = zoo_with_pets(
        TypeDescriptor::class("Guide")
            .extends("Animal")
            .implements("Pet")
            .field(string("name")),
    );

    let provider = build(&registry, Vec::new()).unwrap();
    let guide = provider.get_metadata(&TypeKey::new("Guide")).unwrap();
    let name = guide.attribute("name").unwrap();
    assert_eq!(name.kind, AttributeKind::Plain);
    assert_eq!(name.declared_by.as_str(), "Guide");

    let pet = provider.get_metadata(&TypeKey::new("Pet")).unwrap();
    assert!(pet.is_association("name"));
}

#[test]
fn redeclared_component_drops_the_old_structure() {
    let mut registry = StaticRegistry::new("Resource");
    let descriptors = vec![
        TypeDescriptor::value_object("Address").field(string("street")),
        TypeDescriptor::value_object("GeoPoint")
            .field(FieldDescriptor::new("lat", ValueType::scalar("f64"))),
        TypeDescriptor::class("Place")
            .implements("Resource")
            .field(FieldDescriptor::new("location", ValueType::named("Address")))
            .field(string("title")),
        TypeDescriptor::class("Peak")
            .extends("Place")
            .field(FieldDescriptor::new("location", ValueType::named("GeoPoint"))),
    ];
    for descriptor in descriptors {
        registry.register(descriptor).unwrap();
    }

    let provider = build(&registry, Vec::new()).unwrap();

    let place = provider.get_metadata(&TypeKey::new("Place")).unwrap();
    let place_names: Vec<&str> = place.attribute_names().collect();
    assert_eq!(place_names, vec!["location", "location.street", "title"]);

    let peak = provider.get_metadata(&TypeKey::new("Peak")).unwrap();
    let peak_names: Vec<&str> = peak.attribute_names().collect();
    assert_eq!(peak_names, vec!["location", "title", "location.lat"]);
    assert_eq!(peak.attribute_type("location"), Some(&ValueType::named("GeoPoint")));
    assert!(!peak.contains("location.street"));
}
