//! The behavior composition engine.
//!
//! One factory exists per capability. Building it runs, in order:
//!
//! 1. **Discovery**: every discovered contributor must carry a target tag
//!    naming a resource type. Fixed contributors arrive already paired.
//! 2. **Join**: contributions are grouped per target type, discovered
//!    before fixed, with duplicates collapsed.
//! 3. **Propagation**: in graph pre-order, each type starts from the
//!    resolved sets of its parents and appends its own contributions, or a
//!    no-op placeholder when it has none.
//! 4. **Elision**: placeholders are dropped from sets with real members.
//! 5. **Ordering**: per the capability's [`OrderingPolicy`].
//! 6. **Fold**: each ordered set is folded with the capability's "and".
//!
//! Folding is memoised on the ordered contribution list, so types that
//! resolve to the same list share one composite.

use std::collections::{HashMap, HashSet};
use std::fmt;

use trellis_core::error::{ConfigurationError, Result};
use trellis_core::id::TypeKey;
use trellis_core::traits::{ImplementationProvider, TargetTypeTagReader};
use trellis_core::types::Contributor;
use trellis_core::utils::LogLevel;
use trellis_core::{config_bail, log_event};
use trellis_graph::ResourceGraph;
use trellis_metadata::MetadataProvider;

use crate::capability::{BehaviorCapability, OrderingPolicy};
use crate::composite::ComposedBehavior;
use crate::contribution::{compose, elide, Contribution, ContributionKey, Entry};

/// Collects the contributions of one capability before the build.
pub struct BehaviorFactoryBuilder<C: BehaviorCapability> {
    /// The capability being composed
    capability: C,

    /// Discovered contributors, in discovery order
    discovered: Vec<Contributor<C::Behavior>>,

    /// Built-in contributors with their target types
    fixed: Vec<(TypeKey, Contributor<C::Behavior>)>,
}

impl<C: BehaviorCapability> BehaviorFactoryBuilder<C> {
    /// Create a builder for a capability.
    pub fn new(capability: C) -> Self {
        Self {
            capability,
            discovered: Vec::new(),
            fixed: Vec::new(),
        }
    }

    /// Add discovered contributors. Their target types are read from
    /// their tags at build time.
    pub fn discovered(
        mut self,
        contributors: impl IntoIterator<Item = Contributor<C::Behavior>>,
    ) -> Self {
        self.discovered.extend(contributors);
        self
    }

    /// Ask a provider for every contributor tagged with this capability.
    ///
    /// # Arguments
    ///
    /// * `provider` - The implementation provider.
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - The builder with the contributors added.
    /// * `Err` - If the provider fails.
    pub fn discover(self, provider: &dyn ImplementationProvider<C::Behavior>) -> Result<Self> {
        let contributors = provider.find_tagged_implementations(self.capability.name())?;

        log_event!(LogLevel::Debug, "Discovered contributors",
            capability => self.capability.name(),
            count => contributors.len(),
        );

        Ok(self.discovered(contributors))
    }

    /// Add a built-in contributor for a target type.
    pub fn fixed(
        mut self,
        target: impl Into<TypeKey>,
        contributor: Contributor<C::Behavior>,
    ) -> Self {
        self.fixed.push((target.into(), contributor));
        self
    }

    /// Compose the effective behavior of every type in the graph.
    ///
    /// # Arguments
    ///
    /// * `graph` - The sealed resource graph.
    /// * `metadata` - Catalogues of every graph type.
    /// * `tags` - Reads target tags of discovered contributors.
    ///
    /// # Returns
    ///
    /// * `Ok(BehaviorFactory)` - The immutable type to behavior map.
    /// * `Err` - If a discovered contributor has no target tag, or any
    ///   contributor targets a type outside the graph.
    pub fn build(
        self,
        graph: &ResourceGraph,
        metadata: &MetadataProvider,
        tags: &dyn TargetTypeTagReader,
    ) -> Result<BehaviorFactory<C>> {
        let name = self.capability.name();
        let mut paired = Vec::with_capacity(self.discovered.len() + self.fixed.len());

        for contributor in self.discovered {
            let Some(target) = tags.target_type(&contributor.descriptor) else {
                config_bail!(ConfigurationError::MissingTargetTag {
                    contributor: contributor.descriptor.name.clone(),
                });
            };
            paired.push((target, contributor));
        }
        paired.extend(self.fixed);

        let own = Self::join(paired, graph, metadata)?;
        let behaviors = Self::propagate(&self.capability, graph, own);

        log_event!(LogLevel::Info, "Behaviors composed",
            capability => name,
            types => behaviors.len(),
        );

        let no_op = ComposedBehavior::new(self.capability.no_op(), vec![ContributionKey::NoOp]);
        let no_op = behaviors
            .get(graph.root_key())
            .filter(|composite| composite.is_no_op())
            .cloned()
            .unwrap_or(no_op);

        Ok(BehaviorFactory {
            capability: self.capability,
            behaviors,
            no_op,
        })
    }

    /// Group contributions per target type, preserving order and
    /// collapsing duplicates.
    fn join(
        paired: Vec<(TypeKey, Contributor<C::Behavior>)>,
        graph: &ResourceGraph,
        metadata: &MetadataProvider,
    ) -> Result<HashMap<TypeKey, Vec<Entry<C::Behavior>>>> {
        let mut own: HashMap<TypeKey, Vec<Entry<C::Behavior>>> = HashMap::new();
        let mut seen: HashSet<ContributionKey> = HashSet::new();

        for (discovery_index, (target, contributor)) in paired.into_iter().enumerate() {
            let node = match graph.locate(&target) {
                Some(node) if metadata.get_metadata(&target).is_some() => node,
                _ => config_bail!(ConfigurationError::UnknownTargetType {
                    contributor: contributor.descriptor.name,
                    target,
                }),
            };

            let key = ContributionKey::Named {
                name: contributor.descriptor.name,
                target: target.clone(),
            };
            if !seen.insert(key.clone()) {
                log_event!(LogLevel::Trace, "Collapsed duplicate contribution", key => key);
                continue;
            }

            own.entry(target).or_default().push(Entry {
                key,
                depth: node.depth(),
                discovery_index,
                contribution: Contribution::Real(contributor.instance),
            });
        }

        Ok(own)
    }

    fn propagate(
        capability: &C,
        graph: &ResourceGraph,
        mut own: HashMap<TypeKey, Vec<Entry<C::Behavior>>>,
    ) -> HashMap<TypeKey, ComposedBehavior<C::Behavior>> {
        let mut resolved: HashMap<TypeKey, Vec<Entry<C::Behavior>>> = HashMap::new();
        let mut memo: HashMap<Vec<ContributionKey>, ComposedBehavior<C::Behavior>> = HashMap::new();
        let mut behaviors = HashMap::with_capacity(graph.len());

        for node in graph.iter() {
            let mut set: Vec<Entry<C::Behavior>> = Vec::new();
            let mut keys: HashSet<ContributionKey> = HashSet::new();

            for parent in node.parents() {
                for entry in resolved.get(parent).into_iter().flatten() {
                    if keys.insert(entry.key.clone()) {
                        set.push(entry.clone());
                    }
                }
            }

            match own.remove(node.key()) {
                Some(entries) => {
                    for entry in entries {
                        if keys.insert(entry.key.clone()) {
                            set.push(entry);
                        }
                    }
                }
                None => {
                    if keys.insert(ContributionKey::NoOp) {
                        set.push(Entry::no_op());
                    }
                }
            }

            elide(&mut set, |entry| entry.contribution.is_no_op());

            if capability.ordering() == OrderingPolicy::DeclarationDepth {
                set.sort_by_key(|entry| (entry.depth, entry.discovery_index));
            }

            let sequence: Vec<ContributionKey> =
                set.iter().map(|entry| entry.key.clone()).collect();
            let composite = match memo.get(&sequence) {
                Some(composite) => composite.clone(),
                None => {
                    let composite = Self::fold(capability, &set, sequence.clone());
                    memo.insert(sequence, composite.clone());
                    composite
                }
            };

            log_event!(LogLevel::Trace, "Resolved behavior",
                capability => capability.name(),
                type_key => node.key(),
                contributions => composite.contributors().len(),
            );

            behaviors.insert(node.key().clone(), composite);
            resolved.insert(node.key().clone(), set);
        }

        behaviors
    }

    fn fold(
        capability: &C,
        set: &[Entry<C::Behavior>],
        sequence: Vec<ContributionKey>,
    ) -> ComposedBehavior<C::Behavior> {
        let behavior = compose(capability, set.iter().map(|entry| entry.contribution.clone()));

        ComposedBehavior::new(behavior, sequence)
    }
}

/// The immutable map from resource type to effective behavior for one
/// capability.
pub struct BehaviorFactory<C: BehaviorCapability> {
    /// The composed capability
    capability: C,

    /// Effective behavior per type
    behaviors: HashMap<TypeKey, ComposedBehavior<C::Behavior>>,

    /// The shared "nothing registered" composite
    no_op: ComposedBehavior<C::Behavior>,
}

impl<C: BehaviorCapability> BehaviorFactory<C> {
    /// Start collecting contributions for a capability.
    pub fn builder(capability: C) -> BehaviorFactoryBuilder<C> {
        BehaviorFactoryBuilder::new(capability)
    }

    /// The effective behavior of a type, or `None` for types outside the
    /// graph.
    pub fn get_behavior(&self, key: &TypeKey) -> Option<&ComposedBehavior<C::Behavior>> {
        self.behaviors.get(key)
    }

    /// The effective behavior of a type, falling back to the no-op for
    /// types outside the graph.
    pub fn behavior_or_no_op(&self, key: &TypeKey) -> &ComposedBehavior<C::Behavior> {
        self.behaviors.get(key).unwrap_or(&self.no_op)
    }

    /// The shared "nothing registered" composite.
    pub fn no_op(&self) -> &ComposedBehavior<C::Behavior> {
        &self.no_op
    }

    /// The composed capability.
    pub fn capability(&self) -> &C {
        &self.capability
    }

    /// Number of types with a resolved behavior.
    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    /// Whether no type was resolved.
    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}

impl<C: BehaviorCapability> fmt::Debug for BehaviorFactory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorFactory")
            .field("capability", &self.capability.name())
            .field("types", &self.behaviors.len())
            .finish()
    }
}
