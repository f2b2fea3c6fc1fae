//! The read security manager.
//!
//! Rules are compiled once, in graph pre-order, into a visible-attribute
//! set and an alias map per (type, credential). A subtype starts from the
//! merged rules of its parents and overrides them attribute by attribute
//! with its own.
//!
//! A (type, credential) pair with no effective rule sees the whole
//! catalogue. Once any rule applies, the pair sees exactly the
//! rule-derived set: the granted attributes if any grant exists,
//! otherwise the catalogue minus the hidden ones.

use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use trellis_core::error::{AuthorizationError, ConfigurationError, Result};
use trellis_core::id::{Credential, Principal, TypeKey};
use trellis_core::utils::LogLevel;
use trellis_core::{config_bail, log_event};
use trellis_graph::ResourceGraph;
use trellis_metadata::{MetadataProvider, ResourceMetadata};

use crate::policy::{Denial, FailureHandler};
use crate::rule::SecurityRules;

/// Scope label of type-level aliases in error messages.
const ANY_CREDENTIAL: &str = "*";

/// The effective rule of one attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RuleState {
    visible: Option<bool>,
    alias: Option<String>,
}

impl RuleState {
    fn apply(&mut self, visible: Option<bool>, alias: Option<&String>) {
        if visible.is_some() {
            self.visible = visible;
        }
        if let Some(alias) = alias {
            self.alias = Some(alias.clone());
        }
    }
}

/// Effective, inherited rules of one type.
#[derive(Debug, Clone, Default)]
struct TypeRules {
    by_credential: IndexMap<Credential, IndexMap<String, RuleState>>,
    type_aliases: IndexMap<String, String>,
}

impl TypeRules {
    /// Union of the parents' rules; the first parent to mention an
    /// attribute wins.
    fn inherit<'r>(parents: impl Iterator<Item = &'r TypeRules>) -> Self {
        let mut merged = Self::default();
        for parent in parents {
            for (credential, rules) in &parent.by_credential {
                let scope = merged.by_credential.entry(credential.clone()).or_default();
                for (attribute, state) in rules {
                    scope
                        .entry(attribute.clone())
                        .or_insert_with(|| state.clone());
                }
            }
            for (attribute, alias) in &parent.type_aliases {
                merged
                    .type_aliases
                    .entry(attribute.clone())
                    .or_insert_with(|| alias.clone());
            }
        }
        merged
    }
}

/// The compiled view of one (type, credential) pair.
#[derive(Debug, Clone, Default)]
struct Scope {
    /// Visible attributes, in catalogue order
    authorized: Vec<String>,

    /// Membership index over `authorized`
    members: HashSet<String>,

    /// Attribute to alias, for aliased attributes only
    aliases: HashMap<String, String>,

    /// Alias to attribute
    reverse: HashMap<String, String>,
}

impl Scope {
    fn compile(
        metadata: &ResourceMetadata,
        credential: &str,
        rules: Option<&IndexMap<String, RuleState>>,
        type_aliases: &IndexMap<String, String>,
    ) -> Result<Self> {
        let rules = rules.filter(|rules| !rules.is_empty());
        let visibility = |name: &str| rules.and_then(|r| r.get(name)).and_then(|s| s.visible);

        let authorized: Vec<String> = match rules {
            None => metadata.attribute_names().map(str::to_string).collect(),
            Some(rules) if rules.values().any(|s| s.visible == Some(true)) => metadata
                .attribute_names()
                .filter(|name| visibility(*name) == Some(true))
                .map(str::to_string)
                .collect(),
            Some(_) => metadata
                .attribute_names()
                .filter(|name| visibility(*name) != Some(false))
                .map(str::to_string)
                .collect(),
        };

        let mut aliases: HashMap<String, String> = type_aliases
            .iter()
            .map(|(attribute, alias)| (attribute.clone(), alias.clone()))
            .collect();
        for (attribute, state) in rules.into_iter().flatten() {
            if let Some(alias) = &state.alias {
                aliases.insert(attribute.clone(), alias.clone());
            }
        }

        let mut reverse = HashMap::with_capacity(aliases.len());
        for (attribute, alias) in &aliases {
            // An alias may not name another attribute, nor be shared
            let shadows = alias != attribute && metadata.contains(alias);
            if shadows || reverse.insert(alias.clone(), attribute.clone()).is_some() {
                config_bail!(ConfigurationError::AliasCollision {
                    type_key: metadata.type_key().clone(),
                    credential: credential.to_string(),
                    alias: alias.clone(),
                });
            }
        }

        Ok(Self {
            members: authorized.iter().cloned().collect(),
            authorized,
            aliases,
            reverse,
        })
    }

    /// The underlying name of a requested attribute.
    fn underlying<'n>(&'n self, name: &'n str) -> &'n str {
        self.reverse.get(name).map(String::as_str).unwrap_or(name)
    }

    fn alias_of<'n>(&'n self, attribute: &'n str) -> &'n str {
        self.aliases.get(attribute).map(String::as_str).unwrap_or(attribute)
    }
}

/// Compiled rules of one type.
#[derive(Debug, Clone)]
struct TypeSecurity {
    /// View of credentials without any rule
    open: Scope,

    /// Views of credentials with rules
    scopes: HashMap<Credential, Scope>,
}

impl TypeSecurity {
    fn scope(&self, credential: &Credential) -> &Scope {
        self.scopes.get(credential).unwrap_or(&self.open)
    }
}

/// Attribute-level read authorization for every resource type.
///
/// The manager is immutable once built and can be shared between request
/// threads.
pub struct ReadSecurityManager {
    types: HashMap<TypeKey, TypeSecurity>,
    handler: Arc<dyn FailureHandler>,
}

impl ReadSecurityManager {
    /// Compile the contributed rules over the graph.
    ///
    /// # Arguments
    ///
    /// * `graph` - The sealed resource graph.
    /// * `metadata` - Catalogues of every graph type.
    /// * `rules` - The contributed rules.
    /// * `handler` - Decides the outcome of denied requests.
    ///
    /// # Returns
    ///
    /// * `Ok(ReadSecurityManager)` - The compiled manager.
    /// * `Err` - If a rule targets an unknown type or attribute, or two
    ///   attributes share an alias in one scope.
    pub fn build(
        graph: &ResourceGraph,
        metadata: &MetadataProvider,
        rules: &SecurityRules,
        handler: impl FailureHandler + 'static,
    ) -> Result<Self> {
        let mut own: HashMap<&TypeKey, TypeRules> = HashMap::new();

        for rule in rules.rules() {
            let Some(catalogue) = metadata.get_metadata(&rule.type_key) else {
                config_bail!(ConfigurationError::UnknownType(rule.type_key.clone()));
            };
            Self::require_attribute(catalogue, &rule.attribute)?;

            own.entry(&rule.type_key)
                .or_default()
                .by_credential
                .entry(rule.credential.clone())
                .or_default()
                .entry(rule.attribute.clone())
                .or_default()
                .apply(rule.visible, rule.alias.as_ref());
        }

        for alias in rules.type_aliases() {
            let Some(catalogue) = metadata.get_metadata(&alias.type_key) else {
                config_bail!(ConfigurationError::UnknownType(alias.type_key.clone()));
            };
            Self::require_attribute(catalogue, &alias.attribute)?;

            own.entry(&alias.type_key)
                .or_default()
                .type_aliases
                .insert(alias.attribute.clone(), alias.alias.clone());
        }

        let mut resolved: HashMap<TypeKey, TypeRules> = HashMap::with_capacity(graph.len());
        let mut types = HashMap::with_capacity(graph.len());

        for node in graph.iter() {
            let Some(catalogue) = metadata.get_metadata(node.key()) else {
                config_bail!(ConfigurationError::UnknownType(node.key().clone()));
            };

            let mut effective =
                TypeRules::inherit(node.parents().iter().filter_map(|p| resolved.get(p)));
            if let Some(declared) = own.remove(node.key()) {
                for (credential, attributes) in declared.by_credential {
                    let scope = effective.by_credential.entry(credential).or_default();
                    for (attribute, state) in attributes {
                        scope
                            .entry(attribute)
                            .or_default()
                            .apply(state.visible, state.alias.as_ref());
                    }
                }
                effective.type_aliases.extend(declared.type_aliases);
            }

            let open = Scope::compile(catalogue, ANY_CREDENTIAL, None, &effective.type_aliases)?;
            let mut scopes = HashMap::with_capacity(effective.by_credential.len());
            for (credential, attributes) in &effective.by_credential {
                let scope = Scope::compile(
                    catalogue,
                    credential.as_str(),
                    Some(attributes),
                    &effective.type_aliases,
                )?;
                scopes.insert(credential.clone(), scope);
            }

            log_event!(LogLevel::Trace, "Compiled read rules",
                type_key => node.key(),
                credentials => scopes.len(),
            );

            types.insert(node.key().clone(), TypeSecurity { open, scopes });
            resolved.insert(node.key().clone(), effective);
        }

        log_event!(LogLevel::Info, "Read security compiled",
            types => types.len(),
            rules => rules.len(),
        );

        Ok(Self {
            types,
            handler: Arc::new(handler),
        })
    }

    fn require_attribute(catalogue: &ResourceMetadata, attribute: &str) -> Result<()> {
        if !catalogue.contains(attribute) {
            config_bail!(ConfigurationError::UnknownAttribute {
                type_key: catalogue.type_key().clone(),
                attribute: attribute.to_string(),
            });
        }
        Ok(())
    }

    fn security(&self, type_key: &TypeKey) -> Result<&TypeSecurity> {
        self.types
            .get(type_key)
            .ok_or_else(|| AuthorizationError::UnknownType(type_key.clone()).into())
    }

    /// Check which of the requested attributes the caller may read.
    ///
    /// Requested names may be aliases; results always use underlying
    /// attribute names. An empty request asks for everything visible.
    ///
    /// # Arguments
    ///
    /// * `type_key` - The type being read.
    /// * `requested` - The requested attribute names or aliases.
    /// * `principal` - The caller.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<String>)` - The attributes to serve.
    /// * `Err` - If the caller may read nothing of the type, or the failure
    ///   handler rejects a request naming unauthorized attributes.
    pub fn check<S: AsRef<str>>(
        &self,
        type_key: &TypeKey,
        requested: &[S],
        principal: &impl Principal,
    ) -> Result<Vec<String>> {
        let credential = principal.credential();
        let scope = self.security(type_key)?.scope(&credential);

        if scope.authorized.is_empty() {
            log_event!(LogLevel::Warning, "Read denied",
                type_key => type_key,
                credential => credential,
            );
            return Err(AuthorizationError::NoAuthorizedAttributes {
                type_key: type_key.clone(),
                credential,
            }
            .into());
        }

        if requested.is_empty() {
            return Ok(scope.authorized.clone());
        }

        let mut granted = Vec::with_capacity(requested.len());
        let mut offenders = Vec::new();
        for name in requested {
            let name = name.as_ref();
            let attribute = scope.underlying(name);
            if scope.members.contains(attribute) {
                granted.push(attribute.to_string());
            } else {
                offenders.push(name.to_string());
            }
        }

        if offenders.is_empty() {
            return Ok(granted);
        }

        log_event!(LogLevel::Warning, "Unauthorized attributes requested",
            type_key => type_key,
            credential => credential,
            offenders => offenders.join(","),
        );

        self.handler.on_unauthorized(&Denial {
            type_key,
            credential: &credential,
            offenders: &offenders,
            authorized: &scope.authorized,
        })
    }

    /// The attributes a caller may read, in catalogue order.
    pub fn authorized_attributes(
        &self,
        type_key: &TypeKey,
        principal: &impl Principal,
    ) -> Result<&[String]> {
        let credential = principal.credential();
        Ok(&self.security(type_key)?.scope(&credential).authorized)
    }

    /// Whether any rule applies to the credential for the type.
    pub fn is_restricted(&self, type_key: &TypeKey, credential: &Credential) -> bool {
        self.types
            .get(type_key)
            .map(|security| security.scopes.contains_key(credential))
            .unwrap_or(false)
    }

    /// Map attributes to their type-level aliases. Attributes without one
    /// map to themselves.
    pub fn translate<S: AsRef<str>>(
        &self,
        type_key: &TypeKey,
        attributes: &[S],
    ) -> Result<IndexMap<String, String>> {
        let scope = &self.security(type_key)?.open;
        Ok(Self::alias_map(scope, attributes))
    }

    /// Map attributes to the aliases a credential sees, credential-scoped
    /// aliases taking precedence over type-level ones.
    pub fn translate_for<S: AsRef<str>>(
        &self,
        type_key: &TypeKey,
        credential: &Credential,
        attributes: &[S],
    ) -> Result<IndexMap<String, String>> {
        let scope = self.security(type_key)?.scope(credential);
        Ok(Self::alias_map(scope, attributes))
    }

    fn alias_map<S: AsRef<str>>(scope: &Scope, attributes: &[S]) -> IndexMap<String, String> {
        attributes
            .iter()
            .map(|attribute| {
                let attribute = attribute.as_ref();
                (attribute.to_string(), scope.alias_of(attribute).to_string())
            })
            .collect()
    }

    /// Number of types covered.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no type is covered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl fmt::Debug for ReadSecurityManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadSecurityManager")
            .field("types", &self.types.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::FailurePolicy;
    use trellis_core::registry::StaticRegistry;
    use trellis_core::types::{FieldDescriptor, TypeDescriptor, ValueType};
    use trellis_core::Error;
    use trellis_metadata::MetadataBuilder;

    fn string(name: &str) -> FieldDescriptor {
        FieldDescriptor::new(name, ValueType::scalar("string"))
    }

    fn build(rules: SecurityRules) -> Result<ReadSecurityManager> {
        let registry = StaticRegistry::new("Resource")
            .with(
                TypeDescriptor::class("Invoice")
                    .implements("Resource")
                    .field(string("number"))
                    .field(string("total"))
                    .field(string("notes")),
            )?
            .with(
                TypeDescriptor::class("CreditNote")
                    .extends("Invoice")
                    .field(string("reason")),
            )?;

        let graph = ResourceGraph::discover(&registry)?;
        let metadata = MetadataBuilder::new(&graph, &registry, &registry).build()?;
        ReadSecurityManager::build(&graph, &metadata, &rules, FailurePolicy::Strict)
    }

    fn key(name: &str) -> TypeKey {
        TypeKey::new(name)
    }

    #[test]
    fn test_grant_makes_an_allow_list() {
        let manager = build(SecurityRules::new().show("Invoice", "CLERK", "number")).unwrap();

        let visible = manager
            .authorized_attributes(&key("CreditNote"), &"CLERK")
            .unwrap();
        assert_eq!(visible, &["number".to_string()]);
        assert!(manager.is_restricted(&key("CreditNote"), &Credential::new("CLERK")));
    }

    #[test]
    fn test_subtype_override() {
        let manager = build(
            SecurityRules::new()
                .hide("Invoice", "CLERK", "notes")
                .show("CreditNote", "CLERK", "notes"),
        )
        .unwrap();

        // The subtype's grant turns its scope into an allow-list
        let credit = manager
            .authorized_attributes(&key("CreditNote"), &"CLERK")
            .unwrap();
        assert_eq!(credit, &["notes".to_string()]);

        let invoice = manager
            .authorized_attributes(&key("Invoice"), &"CLERK")
            .unwrap();
        assert_eq!(invoice, &["number".to_string(), "total".to_string()]);
    }

    #[test]
    fn test_everything_hidden_fails_the_request() {
        let manager = build(
            SecurityRules::new()
                .hide("Invoice", "GUEST", "number")
                .hide("Invoice", "GUEST", "total")
                .hide("Invoice", "GUEST", "notes"),
        )
        .unwrap();

        let result = manager.check(&key("Invoice"), &["number"], &"GUEST");
        assert!(matches!(
            result,
            Err(Error::Authorization(AuthorizationError::NoAuthorizedAttributes { .. }))
        ));
    }

    #[test]
    fn test_unknown_attribute_rule_is_fatal() {
        let result = build(SecurityRules::new().hide("Invoice", "GUEST", "reason"));
        assert!(matches!(
            result,
            Err(Error::Configuration(ConfigurationError::UnknownAttribute { attribute, .. })) if attribute == "reason"
        ));
    }

    #[test]
    fn test_alias_shadowing_another_attribute_is_fatal() {
        let result = build(SecurityRules::new().type_alias("Invoice", "notes", "total"));
        assert!(matches!(
            result,
            Err(Error::Configuration(ConfigurationError::AliasCollision { credential, .. })) if credential == "*"
        ));
    }

    #[test]
    fn test_unknown_type_check() {
        let manager = build(SecurityRules::new()).unwrap();
        let result = manager.check(&key("Ghost"), &["id"], &"GUEST");
        assert!(matches!(
            result,
            Err(Error::Authorization(AuthorizationError::UnknownType(_)))
        ));
    }
}
