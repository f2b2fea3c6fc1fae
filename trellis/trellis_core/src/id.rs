//! Strongly-typed identifiers for the Trellis substrate.
//!
//! Two families of identifiers live here:
//!
//! - [`TypeKey`] and [`Credential`], cheap-to-clone interned names used as
//!   map keys by every subsystem.
//! - [`Id<T>`], a UUID wrapper with a phantom marker, used for identifiers
//!   that are generated rather than declared (such as [`BuildId`]).
//!
//! # Examples
//!
//! ```
//! use trellis_core::id::{BuildId, TypeKey};
//! use std::str::FromStr;
//!
//! let animal = TypeKey::new("Animal");
//! assert_eq!(animal.as_str(), "Animal");
//!
//! let id_str = "550e8400-e29b-41d4-a716-446655440000";
//! let build_id = BuildId::from_str(id_str).unwrap();
//! assert_eq!(build_id.to_string(), id_str);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Identifier of a resource type (or any type known to discovery).
///
/// Cloning a `TypeKey` only bumps a reference count, so keys are passed
/// around by value freely.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(Arc<str>);

impl TypeKey {
    /// Create a new type key.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Get the type name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.0)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for TypeKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeKey {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl Serialize for TypeKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TypeKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from(name))
    }
}

/// Caller identity used to key read security rules.
///
/// A credential is typically a role name such as `ADMIN` or `GUEST`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    /// Create a new credential.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the credential name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", self.0)
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Credential {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Credential {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Anything that can be resolved to a [`Credential`] at check time.
///
/// Session or token types from the authentication layer implement this so
/// the security manager never has to know about them.
pub trait Principal {
    /// Resolve the caller identity.
    fn credential(&self) -> Credential;
}

impl Principal for Credential {
    fn credential(&self) -> Credential {
        self.clone()
    }
}

impl Principal for &str {
    fn credential(&self) -> Credential {
        Credential::new(*self)
    }
}

/// A type-safe identifier based on UUID.
///
/// This is a generic identifier type that is specialized for different
/// entity types using the phantom type parameter `T`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct Id<T> {
    uuid: Uuid,
    #[serde(skip)]
    _marker: std::marker::PhantomData<T>,
}

impl<T> Id<T> {
    /// Create a new random identifier.
    pub fn new() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            _marker: std::marker::PhantomData,
        }
    }

    /// Create an identifier from a specific UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self {
            uuid,
            _marker: std::marker::PhantomData,
        }
    }

    /// Get the underlying UUID.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uuid)
    }
}

impl<T> FromStr for Id<T> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            uuid: Uuid::parse_str(s)?,
            _marker: std::marker::PhantomData,
        })
    }
}

/// Marker type for substrate builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuildMarker;
/// Identifier for one start-up build of the substrate.
pub type BuildId = Id<BuildMarker>;
