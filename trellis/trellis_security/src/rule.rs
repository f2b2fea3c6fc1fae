//! Security rules and the builder that collects them.

use serde::{Deserialize, Serialize};

use trellis_core::id::{Credential, TypeKey};

/// One read rule for an attribute of a type, scoped to a credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRule {
    /// The type the rule is declared on; subtypes inherit it
    pub type_key: TypeKey,

    /// The caller identity the rule applies to
    pub credential: Credential,

    /// The underlying attribute name
    pub attribute: String,

    /// `Some(true)` grants, `Some(false)` hides, `None` leaves visibility
    /// as inherited
    pub visible: Option<bool>,

    /// Externally visible name for the attribute
    pub alias: Option<String>,
}

/// A type-level alias, applying to every credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeAlias {
    /// The type the alias is declared on; subtypes inherit it
    pub type_key: TypeKey,

    /// The underlying attribute name
    pub attribute: String,

    /// Externally visible name for the attribute
    pub alias: String,
}

/// Collects read rules during start-up.
///
/// Rules are only collected here; they are validated and compiled when the
/// [`crate::ReadSecurityManager`] is built.
///
/// # Examples
///
/// ```
/// use trellis_security::SecurityRules;
///
/// let rules = SecurityRules::new()
///     .hide("Animal", "GUEST", "id")
///     .show("Invoice", "CLERK", "number")
///     .alias("Invoice", "CLERK", "number", "invoiceNo")
///     .type_alias("Animal", "name", "label");
///
/// assert_eq!(rules.len(), 3);
/// assert_eq!(rules.type_aliases().len(), 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityRules {
    rules: Vec<SecurityRule>,
    type_aliases: Vec<TypeAlias>,
}

impl SecurityRules {
    /// Create an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule.
    pub fn rule(mut self, rule: SecurityRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Hide an attribute from a credential.
    pub fn hide(
        self,
        type_key: impl Into<TypeKey>,
        credential: impl Into<Credential>,
        attribute: impl Into<String>,
    ) -> Self {
        self.rule(SecurityRule {
            type_key: type_key.into(),
            credential: credential.into(),
            attribute: attribute.into(),
            visible: Some(false),
            alias: None,
        })
    }

    /// Grant an attribute to a credential. Once a credential holds any
    /// grant on a type, only granted attributes are visible to it.
    pub fn show(
        self,
        type_key: impl Into<TypeKey>,
        credential: impl Into<Credential>,
        attribute: impl Into<String>,
    ) -> Self {
        self.rule(SecurityRule {
            type_key: type_key.into(),
            credential: credential.into(),
            attribute: attribute.into(),
            visible: Some(true),
            alias: None,
        })
    }

    /// Expose an attribute under another name to a credential.
    pub fn alias(
        self,
        type_key: impl Into<TypeKey>,
        credential: impl Into<Credential>,
        attribute: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        self.rule(SecurityRule {
            type_key: type_key.into(),
            credential: credential.into(),
            attribute: attribute.into(),
            visible: None,
            alias: Some(alias.into()),
        })
    }

    /// Expose an attribute under another name to every credential.
    pub fn type_alias(
        mut self,
        type_key: impl Into<TypeKey>,
        attribute: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        self.type_aliases.push(TypeAlias {
            type_key: type_key.into(),
            attribute: attribute.into(),
            alias: alias.into(),
        });
        self
    }

    /// Add every rule and alias of another set.
    pub fn extend(mut self, other: SecurityRules) -> Self {
        self.rules.extend(other.rules);
        self.type_aliases.extend(other.type_aliases);
        self
    }

    /// The credential-scoped rules, in contribution order.
    pub fn rules(&self) -> &[SecurityRule] {
        &self.rules
    }

    /// The type-level aliases, in contribution order.
    pub fn type_aliases(&self) -> &[TypeAlias] {
        &self.type_aliases
    }

    /// Number of credential-scoped rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rule was contributed.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty() && self.type_aliases.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rules_deserialize() {
        let json = r#"{
            "rules": [
                { "type_key": "Animal", "credential": "ADMIN", "attribute": "id", "visible": false, "alias": null }
            ],
            "type_aliases": [
                { "type_key": "Animal", "attribute": "name", "alias": "label" }
            ]
        }"#;

        let rules: SecurityRules = serde_json::from_str(json).unwrap();
        assert_eq!(rules.rules()[0].credential.as_str(), "ADMIN");
        assert_eq!(rules.rules()[0].visible, Some(false));
        assert_eq!(rules.type_aliases()[0].alias, "label");
    }
}
