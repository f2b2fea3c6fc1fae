use trellis_core::registry::StaticRegistry;
use trellis_core::types::{FieldDescriptor, TypeDescriptor, ValueType};
use trellis_core::{AuthorizationError, ConfigurationError, Credential, Error, TypeKey};
use trellis_graph::ResourceGraph;
use trellis_metadata::{MetadataBuilder, MetadataProvider};
use trellis_security::{FailurePolicy, ReadSecurityManager, SecurityRules};

fn string(name: &str) -> FieldDescriptor {
    FieldDescriptor::new(name, ValueType::scalar("string"))
}

/// Animal {id, name}; Dog adds nothing, Collie adds `coat`.
fn zoo() -> (ResourceGraph, MetadataProvider) {
    let registry = StaticRegistry::new("Resource")
        .with(
            TypeDescriptor::class("Animal")
                .implements("Resource")
                .field(string("id"))
                .field(string("name")),
        )
        .unwrap()
        .with(TypeDescriptor::class("Dog").extends("Animal"))
        .unwrap()
        .with(TypeDescriptor::class("Collie").extends("Dog").field(string("coat")))
        .unwrap();

    let graph = ResourceGraph::discover(&registry).unwrap();
    let metadata = MetadataBuilder::new(&graph, &registry, &registry)
        .build()
        .unwrap();
    (graph, metadata)
}

fn manager(rules: SecurityRules, policy: FailurePolicy) -> Result<ReadSecurityManager, Error> {
    let (graph, metadata) = zoo();
    ReadSecurityManager::build(&graph, &metadata, &rules, policy)
}

fn key(name: &str) -> TypeKey {
    TypeKey::new(name)
}

#[test]
fn masked_attribute_is_withheld_from_one_credential_only() {
    let manager = manager(
        SecurityRules::new().hide("Animal", "ADMIN", "id"),
        FailurePolicy::Lenient,
    )
    .unwrap();

    let dog = key("Dog");
    assert_eq!(manager.check(&dog, &["id", "name"], &"GUEST").unwrap(), vec!["id", "name"]);
    assert_eq!(manager.check(&dog, &["id", "name"], &"ADMIN").unwrap(), vec!["name"]);
}

#[test]
fn lenient_policy_serves_the_full_authorized_set() {
    let manager = manager(
        SecurityRules::new().hide("Animal", "ADMIN", "id"),
        FailurePolicy::Lenient,
    )
    .unwrap();

    let served = manager.check(&key("Collie"), &["id"], &"ADMIN").unwrap();
    assert_eq!(served, vec!["name", "coat"]);
}

#[test]
fn strict_policy_names_the_offenders() {
    let manager = manager(
        SecurityRules::new().hide("Animal", "ADMIN", "id"),
        FailurePolicy::Strict,
    )
    .unwrap();

    let result = manager.check(&key("Dog"), &["id", "name", "age"], &"ADMIN");
    match result {
        Err(Error::Authorization(AuthorizationError::UnauthorizedAttributes {
            type_key,
            credential,
            offenders,
        })) => {
            assert_eq!(type_key, key("Dog"));
            assert_eq!(credential, Credential::new("ADMIN"));
            assert_eq!(offenders, vec!["id", "age"]);
        }
        other => panic!("expected unauthorized attributes, got {:?}", other),
    }
}

#[test]
fn fail_open_and_fail_closed_boundary() {
    let (graph, metadata) = zoo();
    let rules = SecurityRules::new()
        .show("Animal", "VET", "name")
        .hide("Dog", "OWNER", "id");
    let manager =
        ReadSecurityManager::build(&graph, &metadata, &rules, FailurePolicy::Lenient).unwrap();

    for credential in ["VET", "OWNER", "GUEST"] {
        let credential = Credential::new(credential);
        graph.for_each(|node| {
            let visible = manager.authorized_attributes(node.key(), &credential).unwrap();
            let catalogue: Vec<&str> = metadata
                .get_metadata(node.key())
                .unwrap()
                .attribute_names()
                .collect();

            if manager.is_restricted(node.key(), &credential) {
                assert!(visible.iter().all(|name| catalogue.contains(&name.as_str())));
            } else {
                assert_eq!(visible, catalogue.as_slice(), "{} under {}", node.key(), credential);
            }
        });
    }

    // Rules apply from their declaring type downwards
    assert!(!manager.is_restricted(&key("Animal"), &Credential::new("OWNER")));
    assert!(manager.is_restricted(&key("Collie"), &Credential::new("OWNER")));
    assert_eq!(
        manager.authorized_attributes(&key("Collie"), &"VET").unwrap(),
        &["name".to_string()]
    );
}

#[test]
fn empty_request_returns_everything_visible() {
    let manager = manager(
        SecurityRules::new().hide("Dog", "ADMIN", "name"),
        FailurePolicy::Strict,
    )
    .unwrap();

    let none: [&str; 0] = [];
    assert_eq!(manager.check(&key("Collie"), &none, &"ADMIN").unwrap(), vec!["id", "coat"]);
}

#[test]
fn aliases_are_undone_and_translated() {
    let manager = manager(
        SecurityRules::new()
            .type_alias("Animal", "name", "label")
            .alias("Dog", "PARTNER", "id", "externalId")
            .alias("Dog", "PARTNER", "name", "title"),
        FailurePolicy::Strict,
    )
    .unwrap();

    let dog = key("Dog");
    assert_eq!(
        manager.check(&dog, &["externalId", "title"], &"PARTNER").unwrap(),
        vec!["id", "name"]
    );
    assert_eq!(manager.check(&dog, &["label"], &"GUEST").unwrap(), vec!["name"]);

    let translated = manager.translate(&dog, &["id", "name"]).unwrap();
    assert_eq!(translated["id"], "id");
    assert_eq!(translated["name"], "label");

    let partner = manager
        .translate_for(&dog, &Credential::new("PARTNER"), &["id", "name"])
        .unwrap();
    assert_eq!(partner["id"], "externalId");
    assert_eq!(partner["name"], "title");

    // Inherited by subtypes
    let collie = manager.translate(&key("Collie"), &["name", "coat"]).unwrap();
    assert_eq!(collie["name"], "label");
    assert_eq!(collie["coat"], "coat");
}

#[test]
fn shared_alias_in_one_scope_is_fatal() {
    let result = manager(
        SecurityRules::new()
            .alias("Animal", "PARTNER", "id", "key")
            .alias("Dog", "PARTNER", "name", "key"),
        FailurePolicy::Lenient,
    );

    assert!(matches!(
        result,
        Err(Error::Configuration(ConfigurationError::AliasCollision { type_key, alias, .. }))
            if type_key.as_str() == "Dog" && alias == "key"
    ));
}

#[test]
fn rules_on_unknown_types_are_fatal() {
    let result = manager(SecurityRules::new().hide("Ghost", "ADMIN", "id"), FailurePolicy::Lenient);
    assert!(matches!(
        result,
        Err(Error::Configuration(ConfigurationError::UnknownType(_)))
    ));
}
