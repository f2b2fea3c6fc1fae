//! What happens when a request names attributes it may not read.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use trellis_core::error::{AuthorizationError, Error, Result};
use trellis_core::id::{Credential, TypeKey};

/// A request that named attributes outside its authorized set.
#[derive(Debug, Clone, Copy)]
pub struct Denial<'a> {
    /// The checked type
    pub type_key: &'a TypeKey,

    /// The caller identity
    pub credential: &'a Credential,

    /// Requested names that are unknown or not visible
    pub offenders: &'a [String],

    /// Everything the credential may read, in catalogue order
    pub authorized: &'a [String],
}

/// Decides the outcome of a denied request.
pub trait FailureHandler: Send + Sync {
    /// Handle a denial.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<String>)` - The attributes to serve instead.
    /// * `Err` - To reject the request.
    fn on_unauthorized(&self, denial: &Denial<'_>) -> Result<Vec<String>>;
}

impl<H: FailureHandler + ?Sized> FailureHandler for Arc<H> {
    fn on_unauthorized(&self, denial: &Denial<'_>) -> Result<Vec<String>> {
        (**self).on_unauthorized(denial)
    }
}

/// The built-in failure policies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Serve the full authorized set instead
    #[default]
    Lenient,

    /// Reject the request, naming the offenders
    Strict,
}

impl FailureHandler for FailurePolicy {
    fn on_unauthorized(&self, denial: &Denial<'_>) -> Result<Vec<String>> {
        match self {
            Self::Lenient => Ok(denial.authorized.to_vec()),
            Self::Strict => Err(AuthorizationError::UnauthorizedAttributes {
                type_key: denial.type_key.clone(),
                credential: denial.credential.clone(),
                offenders: denial.offenders.to_vec(),
            }
            .into()),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lenient => write!(f, "lenient"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            _ => Err(Error::Runtime(format!("Unknown failure policy: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn denial<'a>(
        type_key: &'a TypeKey,
        credential: &'a Credential,
        offenders: &'a [String],
        authorized: &'a [String],
    ) -> Denial<'a> {
        Denial {
            type_key,
            credential,
            offenders,
            authorized,
        }
    }

    #[test]
    fn test_lenient_substitutes_authorized_set() {
        let type_key = TypeKey::new("Dog");
        let credential = Credential::new("ADMIN");
        let offenders = vec!["id".to_string()];
        let authorized = vec!["name".to_string(), "breed".to_string()];

        let served = FailurePolicy::Lenient
            .on_unauthorized(&denial(&type_key, &credential, &offenders, &authorized))
            .unwrap();
        assert_eq!(served, authorized);
    }

    #[test]
    fn test_strict_names_offenders() {
        let type_key = TypeKey::new("Dog");
        let credential = Credential::new("ADMIN");
        let offenders = vec!["id".to_string()];
        let authorized = vec!["name".to_string()];

        let result = FailurePolicy::Strict
            .on_unauthorized(&denial(&type_key, &credential, &offenders, &authorized));
        assert!(matches!(
            result,
            Err(Error::Authorization(AuthorizationError::UnauthorizedAttributes { offenders, .. })) if offenders == vec!["id".to_string()]
        ));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("Strict".parse::<FailurePolicy>().unwrap(), FailurePolicy::Strict);
        assert_eq!(FailurePolicy::default(), FailurePolicy::Lenient);
        assert!("open".parse::<FailurePolicy>().is_err());
    }
}
