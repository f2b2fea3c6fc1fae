//! # Trellis Security
//!
//! `trellis_security` decides which attributes of a resource type a caller
//! may read, and under which names.
//!
//! Rules are contributed through [`SecurityRules`] at start-up and compiled
//! by [`ReadSecurityManager::build`] down the resource graph, so a subtype
//! inherits its ancestors' rules and may override them per credential.
//!
//! A type with no rule for a credential exposes its whole catalogue to
//! that credential. This fail-open default keeps unconfigured types
//! readable; restricting a type requires at least one rule per credential
//! that should be restricted.
//!
//! Requests naming attributes outside the authorized set are handed to a
//! [`FailureHandler`]. [`FailurePolicy::Lenient`] serves the full authorized
//! set instead, [`FailurePolicy::Strict`] rejects the request.

mod manager;
mod policy;
mod rule;

pub use manager::ReadSecurityManager;
pub use policy::{Denial, FailureHandler, FailurePolicy};
pub use rule::{SecurityRule, SecurityRules, TypeAlias};
