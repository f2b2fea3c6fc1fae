//! Contributions and their identity.

use std::fmt;
use std::sync::Arc;

use trellis_core::id::TypeKey;

use crate::capability::BehaviorCapability;

/// Identity of a contribution. Two contributions with the same key are
/// the same contribution and collapse when joined.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContributionKey {
    /// The "nothing registered" placeholder
    NoOp,

    /// A real contribution, by contributor name and target type
    Named {
        /// Name of the contributor
        name: String,

        /// The type it was declared for
        target: TypeKey,
    },
}

impl ContributionKey {
    /// Whether this is the placeholder.
    pub fn is_no_op(&self) -> bool {
        matches!(self, Self::NoOp)
    }
}

impl fmt::Display for ContributionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOp => write!(f, "no-op"),
            Self::Named { name, target } => write!(f, "{}@{}", name, target),
        }
    }
}

/// A behavior slot: either a real behavior or the no-op placeholder.
pub enum Contribution<B: ?Sized> {
    /// A registered behavior
    Real(Arc<B>),

    /// Nothing registered
    NoOp,
}

impl<B: ?Sized> Contribution<B> {
    /// Whether this is the placeholder.
    pub fn is_no_op(&self) -> bool {
        matches!(self, Self::NoOp)
    }

    /// The behavior, for real contributions.
    pub fn behavior(&self) -> Option<&Arc<B>> {
        match self {
            Self::Real(behavior) => Some(behavior),
            Self::NoOp => None,
        }
    }
}

impl<B: ?Sized> Clone for Contribution<B> {
    fn clone(&self) -> Self {
        match self {
            Self::Real(behavior) => Self::Real(Arc::clone(behavior)),
            Self::NoOp => Self::NoOp,
        }
    }
}

impl<B: ?Sized> fmt::Debug for Contribution<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Real(_) => write!(f, "Real(..)"),
            Self::NoOp => write!(f, "NoOp"),
        }
    }
}

/// One member of a type's resolved contribution set.
pub(crate) struct Entry<B: ?Sized> {
    /// Identity
    pub(crate) key: ContributionKey,

    /// Depth of the declaring type
    pub(crate) depth: usize,

    /// Position in the joined discovered-then-fixed list
    pub(crate) discovery_index: usize,

    /// The behavior
    pub(crate) contribution: Contribution<B>,
}

impl<B: ?Sized> Entry<B> {
    pub(crate) fn no_op() -> Self {
        Self {
            key: ContributionKey::NoOp,
            depth: 0,
            discovery_index: usize::MAX,
            contribution: Contribution::NoOp,
        }
    }
}

impl<B: ?Sized> Clone for Entry<B> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            depth: self.depth,
            discovery_index: self.discovery_index,
            contribution: self.contribution.clone(),
        }
    }
}

/// Drop no-op placeholders from a set with more than one member. A lone
/// placeholder stays: it is the canonical "nothing registered" state.
pub(crate) fn elide<T>(items: &mut Vec<T>, is_no_op: impl Fn(&T) -> bool) {
    if items.len() > 1 {
        items.retain(|item| !is_no_op(item));
    }
}

/// Elide and fold an ordered list of contributions into one behavior.
///
/// An empty list, or one holding only placeholders, folds to the
/// capability's no-op. A single real contribution folds to itself.
///
/// # Arguments
///
/// * `capability` - Supplies the combinator and the no-op.
/// * `contributions` - The contributions, in fold order.
///
/// # Returns
///
/// The composed behavior.
pub fn compose<C: BehaviorCapability>(
    capability: &C,
    contributions: impl IntoIterator<Item = Contribution<C::Behavior>>,
) -> Arc<C::Behavior> {
    let mut contributions: Vec<_> = contributions.into_iter().collect();
    elide(&mut contributions, Contribution::is_no_op);

    contributions
        .iter()
        .filter_map(Contribution::behavior)
        .cloned()
        .reduce(|left, right| capability.and(left, right))
        .unwrap_or_else(|| capability.no_op())
}
