//! Error types for the Trellis substrate.
//!
//! Errors fall into two classes:
//!
//! - [`ConfigurationError`]: raised while the substrate is being built at
//!   start-up. These are never retried; the embedding application is expected
//!   to abort start-up.
//! - [`AuthorizationError`]: raised per request by the read security manager.
//!
//! The root error type, `Error`, wraps both so callers can use `?` uniformly.

use crate::id::{Credential, TypeKey};
use thiserror::Error;

/// Root error type for the Trellis substrate.
#[derive(Debug, Error)]
pub enum Error {
    /// Start-up configuration errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Per-request authorization errors
    #[error("Authorization error: {0}")]
    Authorization(#[from] AuthorizationError),

    /// General runtime errors
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl Error {
    /// Whether this error must abort start-up.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Errors detected while building the substrate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A discovered contributor does not declare its target type
    #[error("Contributor '{contributor}' does not declare a target resource type")]
    MissingTargetTag {
        /// Name of the contributor
        contributor: String,
    },

    /// A contributor targets a type that is not a known resource type
    #[error("Contributor '{contributor}' targets unknown resource type {target}")]
    UnknownTargetType {
        /// Name of the contributor
        contributor: String,

        /// The declared target
        target: TypeKey,
    },

    /// A type has no inheritance path to the root marker
    #[error("Type {0} has no path to the resource root")]
    UnreachableType(TypeKey),

    /// A type is referenced but no descriptor is known for it
    #[error("Unknown type: {0}")]
    UnknownType(TypeKey),

    /// A type is (transitively) its own ancestor
    #[error("Cycle detected in the type hierarchy at {0}")]
    CycleDetected(TypeKey),

    /// The same type was registered twice with different descriptors
    #[error("Duplicate type: {0}")]
    DuplicateType(TypeKey),

    /// A type descending from a structural marker lacks the marker's field
    #[error("Type {type_key} implements {marker} but declares no '{field}' attribute")]
    MissingStructuralTag {
        /// The offending type
        type_key: TypeKey,

        /// The marker requiring the field
        marker: TypeKey,

        /// The required field
        field: String,
    },

    /// A subtype redeclares an inherited attribute with another classification
    #[error(
        "Type {type_key} redeclares attribute '{attribute}' as {declared}, inherited as {inherited}"
    )]
    IncompatibleRedeclaration {
        /// The redeclaring type
        type_key: TypeKey,

        /// The attribute name
        attribute: String,

        /// Inherited classification
        inherited: String,

        /// Declared classification
        declared: String,
    },

    /// Two declarations of one type flatten to the same attribute name
    #[error("Type {type_key} declares attribute '{attribute}' more than once")]
    DuplicateAttribute {
        /// The offending type
        type_key: TypeKey,

        /// The attribute name
        attribute: String,
    },

    /// A rule or alias names an attribute the type does not have
    #[error("Type {type_key} has no attribute '{attribute}'")]
    UnknownAttribute {
        /// The type the rule targets
        type_key: TypeKey,

        /// The attribute name
        attribute: String,
    },

    /// An alias is not unique within its scope
    #[error("Alias '{alias}' is not unique for {type_key} under credential {credential}")]
    AliasCollision {
        /// The type the alias belongs to
        type_key: TypeKey,

        /// The credential scope (`*` for type-level aliases)
        credential: String,

        /// The colliding alias
        alias: String,
    },

    /// Two parents expose one attribute name with different shapes and the
    /// inheriting type does not redeclare it
    #[error(
        "Type {type_key} inherits attribute '{attribute}' as both {first} and {second}"
    )]
    ConflictingInheritance {
        /// The inheriting type
        type_key: TypeKey,

        /// The attribute name
        attribute: String,

        /// Shape exposed by the earlier parent
        first: String,

        /// Shape exposed by the later parent
        second: String,
    },
}

/// Errors raised by read authorization checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    /// The credential may not see any attribute of the type
    #[error("Credential {credential} is not authorized to read any attribute of {type_key}")]
    NoAuthorizedAttributes {
        /// The checked type
        type_key: TypeKey,

        /// The caller identity
        credential: Credential,
    },

    /// Some requested attributes are unknown or not visible to the credential
    #[error("Unknown or unauthorized attributes for {type_key} under {credential}: {}", offenders.join(", "))]
    UnauthorizedAttributes {
        /// The checked type
        type_key: TypeKey,

        /// The caller identity
        credential: Credential,

        /// The requested names that failed the check
        offenders: Vec<String>,
    },

    /// The type is not a known resource type
    #[error("Unknown resource type: {0}")]
    UnknownType(TypeKey),
}

/// Result type for Trellis operations.
pub type Result<T> = std::result::Result<T, Error>;
