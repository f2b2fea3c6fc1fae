//! The validation capability.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use trellis_core::types::Instance;

use crate::capability::{BehaviorCapability, OrderingPolicy};

/// One failed check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Violation {
    /// The offending attribute, when the failure is attribute-specific
    pub attribute: Option<String>,

    /// What went wrong
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attribute {
            Some(attribute) => write!(f, "{}: {}", attribute, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// The outcome of evaluating a behavior.
///
/// Failures are data, never errors: a result is valid exactly when it
/// carries no violations, and [`ValidationResult::and`] aggregates two
/// outcomes the same way behaviors are composed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    violations: Vec<Violation>,
}

impl ValidationResult {
    /// A successful result.
    pub fn success() -> Self {
        Self::default()
    }

    /// A failure on one attribute.
    pub fn attribute_failure(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violations: vec![Violation {
                attribute: Some(attribute.into()),
                message: message.into(),
            }],
        }
    }

    /// A failure on the instance as a whole.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            violations: vec![Violation {
                attribute: None,
                message: message.into(),
            }],
        }
    }

    /// Whether no check failed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// All violations, in evaluation order.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Violations concerning one attribute.
    pub fn violations_for<'a>(&'a self, attribute: &'a str) -> impl Iterator<Item = &'a Violation> {
        self.violations
            .iter()
            .filter(move |v| v.attribute.as_deref() == Some(attribute))
    }

    /// Combine with another result: valid only if both are, with the
    /// violations of both.
    pub fn and(mut self, other: ValidationResult) -> Self {
        self.violations.extend(other.violations);
        self
    }
}

/// Checks a resource value.
///
/// Validators are shared across concurrent requests and must not mutate
/// shared state.
pub trait Validator: Send + Sync {
    /// Check an instance.
    fn validate(&self, instance: &Instance) -> ValidationResult;
}

impl<F> Validator for F
where
    F: Fn(&Instance) -> ValidationResult + Send + Sync,
{
    fn validate(&self, instance: &Instance) -> ValidationResult {
        self(instance)
    }
}

/// A validator that accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpValidator;

impl Validator for NoOpValidator {
    fn validate(&self, _instance: &Instance) -> ValidationResult {
        ValidationResult::success()
    }
}

/// Runs every validator and aggregates their results.
#[derive(Clone)]
pub struct AllValidators {
    validators: Vec<Arc<dyn Validator>>,
}

impl AllValidators {
    /// Combine validators, evaluated in the given order.
    pub fn new(validators: Vec<Arc<dyn Validator>>) -> Self {
        Self { validators }
    }

    /// The combined validators.
    pub fn validators(&self) -> &[Arc<dyn Validator>] {
        &self.validators
    }
}

impl Validator for AllValidators {
    fn validate(&self, instance: &Instance) -> ValidationResult {
        self.validators
            .iter()
            .fold(ValidationResult::success(), |result, validator| {
                result.and(validator.validate(instance))
            })
    }
}

impl fmt::Debug for AllValidators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllValidators")
            .field("validators", &format!("{} validators", self.validators.len()))
            .finish()
    }
}

/// The validation capability. Contributions keep propagation order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validation;

impl BehaviorCapability for Validation {
    type Behavior = dyn Validator;

    fn name(&self) -> &'static str {
        "validation"
    }

    fn ordering(&self) -> OrderingPolicy {
        OrderingPolicy::PropagationOrder
    }

    fn no_op(&self) -> Arc<dyn Validator> {
        Arc::new(NoOpValidator)
    }

    fn and(&self, left: Arc<dyn Validator>, right: Arc<dyn Validator>) -> Arc<dyn Validator> {
        Arc::new(AllValidators::new(vec![left, right]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_required(instance: &Instance) -> ValidationResult {
        match instance.get("name") {
            Some(_) => ValidationResult::success(),
            None => ValidationResult::attribute_failure("name", "is required"),
        }
    }

    #[test]
    fn test_and_aggregates_violations() {
        let left = ValidationResult::attribute_failure("name", "is required");
        let right = ValidationResult::failure("is archived");

        let combined = left.and(right);
        assert!(!combined.is_valid());
        assert_eq!(combined.violations().len(), 2);
        assert_eq!(combined.violations_for("name").count(), 1);
        assert_eq!(combined.violations()[1].to_string(), "is archived");
    }

    #[test]
    fn test_all_validators_runs_every_validator() {
        let first: Arc<dyn Validator> = Arc::new(name_required);
        let second: Arc<dyn Validator> =
            Arc::new(|_: &Instance| ValidationResult::attribute_failure("breed", "is unknown"));
        let composite = Validation.and(first, second);

        let result = composite.validate(&Instance::new("Dog"));
        let attributes: Vec<_> = result
            .violations()
            .iter()
            .filter_map(|v| v.attribute.as_deref())
            .collect();
        assert_eq!(attributes, vec!["name", "breed"]);
    }

    #[test]
    fn test_no_op_accepts_everything() {
        assert!(Validation.no_op().validate(&Instance::new("Dog")).is_valid());
    }

    #[test]
    fn test_result_serializes() {
        let result = ValidationResult::attribute_failure("name", "is required");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["violations"][0]["attribute"], "name");
    }
}
