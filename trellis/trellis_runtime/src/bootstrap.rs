//! Substrate bootstrap
//!
//! Builds the four subsystems in order, on the calling thread:
//!
//! 0. Resource graph
//! 1. Metadata
//! 2. Behaviors (validation and logic hooks)
//! 3. Read security
//!
//! Any failure aborts the build; a partially built substrate is never
//! returned.

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use trellis_behavior::{
    BehaviorFactory, BehaviorFactoryBuilder, LogicHook, LogicHooks, Operation, Validation,
    ValidationResult, Validator,
};
use trellis_core::id::{BuildId, Principal, TypeKey};
use trellis_core::traits::{
    DeclaredTargetReader, DescriptorFieldReader, DiscoveryProvider, ImplementationProvider,
    StructuralTagReader, TargetTypeTagReader,
};
use trellis_core::types::{Contributor, Instance};
use trellis_graph::ResourceGraph;
use trellis_metadata::{MetadataBuilder, MetadataProvider};
use trellis_security::{FailureHandler, ReadSecurityManager, SecurityRules};

use crate::config::SubstrateConfig;
use crate::logging;

/// Errors that can occur during bootstrap
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Phase {0} bootstrap failed: {1}")]
    PhaseFailed(u8, String),

    #[error("No discovery provider configured")]
    MissingDiscovery,

    #[error("Discovery provider roots at {found}, configuration expects {expected}")]
    RootMismatch { expected: String, found: String },
}

/// Bootstrap phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BootstrapPhase {
    /// Phase 0: Resource graph
    Graph = 0,

    /// Phase 1: Attribute catalogues
    Metadata = 1,

    /// Phase 2: Behavior composition
    Behaviors = 2,

    /// Phase 3: Read security
    Security = 3,

    /// The substrate is fully built
    Complete = 4,
}

impl fmt::Display for BootstrapPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Graph => write!(f, "resource graph"),
            Self::Metadata => write!(f, "metadata"),
            Self::Behaviors => write!(f, "behaviors"),
            Self::Security => write!(f, "read security"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// Identity and timing of one substrate build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    /// Unique identifier of the build
    pub id: BuildId,

    /// When the build started
    pub started_at: DateTime<Utc>,

    /// When the build completed
    pub completed_at: DateTime<Utc>,
}

/// Collects the collaborators and contributions of a substrate build
pub struct SubstrateBuilder<'a> {
    config: SubstrateConfig,
    discovery: Option<&'a dyn DiscoveryProvider>,
    fields: &'a dyn StructuralTagReader,
    tags: &'a dyn TargetTypeTagReader,
    validator_provider: Option<&'a dyn ImplementationProvider<dyn Validator>>,
    hook_provider: Option<&'a dyn ImplementationProvider<dyn LogicHook>>,
    validators: BehaviorFactoryBuilder<Validation>,
    logic_hooks: BehaviorFactoryBuilder<LogicHooks>,
    security_rules: SecurityRules,
    failure_handler: Option<Arc<dyn FailureHandler>>,
}

impl<'a> SubstrateBuilder<'a> {
    /// Create a builder
    pub fn new(config: SubstrateConfig) -> Self {
        Self {
            config,
            discovery: None,
            fields: &DescriptorFieldReader,
            tags: &DeclaredTargetReader,
            validator_provider: None,
            hook_provider: None,
            validators: BehaviorFactory::builder(Validation),
            logic_hooks: BehaviorFactory::builder(LogicHooks),
            security_rules: SecurityRules::new(),
            failure_handler: None,
        }
    }

    /// Set the provider that enumerates resource types
    pub fn discovery(mut self, provider: &'a dyn DiscoveryProvider) -> Self {
        self.discovery = Some(provider);
        self
    }

    /// Set the reader for declared fields
    pub fn fields(mut self, reader: &'a dyn StructuralTagReader) -> Self {
        self.fields = reader;
        self
    }

    /// Set the reader for contributor target tags
    pub fn target_tags(mut self, reader: &'a dyn TargetTypeTagReader) -> Self {
        self.tags = reader;
        self
    }

    /// Set the provider of tagged validators
    pub fn validators(mut self, provider: &'a dyn ImplementationProvider<dyn Validator>) -> Self {
        self.validator_provider = Some(provider);
        self
    }

    /// Add a built-in validator
    pub fn fixed_validator(
        mut self,
        target: impl Into<TypeKey>,
        contributor: Contributor<dyn Validator>,
    ) -> Self {
        self.validators = self.validators.fixed(target, contributor);
        self
    }

    /// Set the provider of tagged logic hooks
    pub fn logic_hooks(mut self, provider: &'a dyn ImplementationProvider<dyn LogicHook>) -> Self {
        self.hook_provider = Some(provider);
        self
    }

    /// Add a built-in logic hook
    pub fn fixed_logic_hook(
        mut self,
        target: impl Into<TypeKey>,
        contributor: Contributor<dyn LogicHook>,
    ) -> Self {
        self.logic_hooks = self.logic_hooks.fixed(target, contributor);
        self
    }

    /// Add read security rules
    pub fn security_rules(mut self, rules: SecurityRules) -> Self {
        self.security_rules = self.security_rules.extend(rules);
        self
    }

    /// Replace the configured failure policy with a custom handler
    pub fn failure_handler(mut self, handler: Arc<dyn FailureHandler>) -> Self {
        self.failure_handler = Some(handler);
        self
    }

    /// Build the substrate
    ///
    /// Installs the configured log subscriber first unless the embedder
    /// already installed one.
    pub fn build(self) -> Result<Substrate> {
        logging::init(&self.config.logging)?;

        let id = BuildId::new();
        let started_at = Utc::now();
        info!(build_id = %id, "Starting substrate build");

        self.config.validate()?;

        let discovery = self.discovery.ok_or(BootstrapError::MissingDiscovery)?;
        let root = discovery.root_marker();
        if root.as_str() != self.config.root_marker {
            return Err(BootstrapError::RootMismatch {
                expected: self.config.root_marker.clone(),
                found: root.to_string(),
            }
            .into());
        }

        // Phase 0: Resource graph
        info!("Bootstrap Phase 0: {}", BootstrapPhase::Graph);
        let graph = ResourceGraph::discover(discovery)
            .map_err(|e| Self::phase_failed(BootstrapPhase::Graph, e))?;
        debug!(types = graph.len(), "Resource graph sealed");

        // Phase 1: Metadata
        info!("Bootstrap Phase 1: {}", BootstrapPhase::Metadata);
        let metadata = MetadataBuilder::new(&graph, discovery, self.fields)
            .with_requirements(self.config.structural_requirements.iter().cloned())
            .build()
            .map_err(|e| Self::phase_failed(BootstrapPhase::Metadata, e))?;

        // Phase 2: Behaviors
        info!("Bootstrap Phase 2: {}", BootstrapPhase::Behaviors);
        let mut validators = self.validators;
        if let Some(provider) = self.validator_provider {
            validators = validators
                .discover(provider)
                .context("Failed to discover validators")?;
        }
        let validators = validators
            .build(&graph, &metadata, self.tags)
            .map_err(|e| Self::phase_failed(BootstrapPhase::Behaviors, e))?;

        let mut logic_hooks = self.logic_hooks;
        if let Some(provider) = self.hook_provider {
            logic_hooks = logic_hooks
                .discover(provider)
                .context("Failed to discover logic hooks")?;
        }
        let logic_hooks = logic_hooks
            .build(&graph, &metadata, self.tags)
            .map_err(|e| Self::phase_failed(BootstrapPhase::Behaviors, e))?;

        // Phase 3: Read security
        info!("Bootstrap Phase 3: {}", BootstrapPhase::Security);
        let handler: Arc<dyn FailureHandler> = match self.failure_handler {
            Some(handler) => handler,
            None => Arc::new(self.config.failure_policy),
        };
        let security = ReadSecurityManager::build(&graph, &metadata, &self.security_rules, handler)
            .map_err(|e| Self::phase_failed(BootstrapPhase::Security, e))?;

        let info = BuildInfo {
            id,
            started_at,
            completed_at: Utc::now(),
        };
        info!(
            build_id = %id,
            types = graph.len(),
            elapsed_ms = (info.completed_at - info.started_at).num_milliseconds(),
            "Substrate build complete"
        );

        Ok(Substrate {
            config: self.config,
            info,
            graph,
            metadata,
            validators,
            logic_hooks,
            security,
        })
    }

    fn phase_failed(phase: BootstrapPhase, cause: trellis_core::Error) -> anyhow::Error {
        error!("Bootstrap phase {} ({}) failed: {}", phase as u8, phase, cause);
        anyhow::Error::new(cause)
            .context(BootstrapError::PhaseFailed(phase as u8, phase.to_string()))
    }
}

/// The built substrate
///
/// Immutable once built; share it between request threads behind an `Arc`.
pub struct Substrate {
    config: SubstrateConfig,
    info: BuildInfo,
    graph: ResourceGraph,
    metadata: MetadataProvider,
    validators: BehaviorFactory<Validation>,
    logic_hooks: BehaviorFactory<LogicHooks>,
    security: ReadSecurityManager,
}

impl Substrate {
    /// Start a build
    pub fn builder<'a>(config: SubstrateConfig) -> SubstrateBuilder<'a> {
        SubstrateBuilder::new(config)
    }

    /// The configuration the substrate was built with
    pub fn config(&self) -> &SubstrateConfig {
        &self.config
    }

    /// Identity and timing of the build
    pub fn build_info(&self) -> &BuildInfo {
        &self.info
    }

    /// The resource graph
    pub fn graph(&self) -> &ResourceGraph {
        &self.graph
    }

    /// The attribute catalogues
    pub fn metadata(&self) -> &MetadataProvider {
        &self.metadata
    }

    /// The composed validators
    pub fn validators(&self) -> &BehaviorFactory<Validation> {
        &self.validators
    }

    /// The composed logic hooks
    pub fn logic_hooks(&self) -> &BehaviorFactory<LogicHooks> {
        &self.logic_hooks
    }

    /// The read security manager
    pub fn security(&self) -> &ReadSecurityManager {
        &self.security
    }

    /// Run the effective validator of the instance's type
    pub fn validate(&self, instance: &Instance) -> ValidationResult {
        match self.validators.get_behavior(&instance.type_key) {
            Some(validator) => validator.validate(instance),
            None => Self::unknown_type(&instance.type_key),
        }
    }

    /// Run the effective logic hooks of the instance's type
    pub fn apply_logic(&self, instance: &mut Instance, operation: Operation) -> ValidationResult {
        match self.logic_hooks.get_behavior(&instance.type_key) {
            Some(hooks) => hooks.apply(instance, operation),
            None => Self::unknown_type(&instance.type_key),
        }
    }

    /// Check a read request against the security rules
    pub fn check<S: AsRef<str>>(
        &self,
        type_key: &TypeKey,
        requested: &[S],
        principal: &impl Principal,
    ) -> trellis_core::Result<Vec<String>> {
        self.security.check(type_key, requested, principal)
    }

    fn unknown_type(type_key: &TypeKey) -> ValidationResult {
        ValidationResult::failure(format!("Unknown resource type {}", type_key))
    }
}

impl fmt::Debug for Substrate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Substrate")
            .field("build", &self.info.id)
            .field("types", &self.graph.len())
            .finish_non_exhaustive()
    }
}
