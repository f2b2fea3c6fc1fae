//! The logic hook capability.
//!
//! Hooks run when a resource is created, updated or deleted, and may
//! adjust the instance before it is persisted. Unlike validators, hooks
//! are ordered by the depth of their declaring type, so an ancestor's
//! hooks always run before a descendant's.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use trellis_core::types::Instance;

use crate::capability::{BehaviorCapability, OrderingPolicy};
use crate::validation::ValidationResult;

/// The persistence operation a hook runs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// A new resource
    Create,

    /// A changed resource
    Update,

    /// A removed resource
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Business logic attached to a resource type.
pub trait LogicHook: Send + Sync {
    /// Run the hook for an operation.
    ///
    /// # Arguments
    ///
    /// * `instance` - The resource value; the hook may modify it.
    /// * `operation` - The operation being performed.
    ///
    /// # Returns
    ///
    /// The outcome; violations veto the operation.
    fn apply(&self, instance: &mut Instance, operation: Operation) -> ValidationResult;
}

/// A hook that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpHook;

impl LogicHook for NoOpHook {
    fn apply(&self, _instance: &mut Instance, _operation: Operation) -> ValidationResult {
        ValidationResult::success()
    }
}

/// Runs every hook in order, each seeing the changes of the previous one.
#[derive(Clone)]
pub struct AllHooks {
    hooks: Vec<Arc<dyn LogicHook>>,
}

impl AllHooks {
    /// Combine hooks, run in the given order.
    pub fn new(hooks: Vec<Arc<dyn LogicHook>>) -> Self {
        Self { hooks }
    }
}

impl LogicHook for AllHooks {
    fn apply(&self, instance: &mut Instance, operation: Operation) -> ValidationResult {
        let mut result = ValidationResult::success();
        for hook in &self.hooks {
            result = result.and(hook.apply(instance, operation));
        }
        result
    }
}

impl fmt::Debug for AllHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AllHooks")
            .field("hooks", &format!("{} hooks", self.hooks.len()))
            .finish()
    }
}

/// The logic hook capability. Contributions are ordered by declaring depth.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogicHooks;

impl BehaviorCapability for LogicHooks {
    type Behavior = dyn LogicHook;

    fn name(&self) -> &'static str {
        "logic"
    }

    fn ordering(&self) -> OrderingPolicy {
        OrderingPolicy::DeclarationDepth
    }

    fn no_op(&self) -> Arc<dyn LogicHook> {
        Arc::new(NoOpHook)
    }

    fn and(&self, left: Arc<dyn LogicHook>, right: Arc<dyn LogicHook>) -> Arc<dyn LogicHook> {
        Arc::new(AllHooks::new(vec![left, right]))
    }
}
