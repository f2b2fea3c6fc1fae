//! Composed behaviors shared between resource types.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::contribution::ContributionKey;

/// The effective behavior of one type for one capability.
///
/// Composites are shared: every type that resolves to the same ordered
/// contribution list holds the same composite, and equality is identity
/// of the underlying behavior.
pub struct ComposedBehavior<B: ?Sized> {
    /// The folded behavior
    behavior: Arc<B>,

    /// The contributions it was folded from, in fold order
    contributors: Arc<[ContributionKey]>,
}

impl<B: ?Sized> ComposedBehavior<B> {
    pub(crate) fn new(behavior: Arc<B>, contributors: Vec<ContributionKey>) -> Self {
        Self {
            behavior,
            contributors: contributors.into(),
        }
    }

    /// The folded behavior.
    pub fn behavior(&self) -> &Arc<B> {
        &self.behavior
    }

    /// The contributions in fold order.
    pub fn contributors(&self) -> &[ContributionKey] {
        &self.contributors
    }

    /// Whether nothing is registered for the type.
    pub fn is_no_op(&self) -> bool {
        matches!(&*self.contributors, [ContributionKey::NoOp])
    }
}

impl<B: ?Sized> Clone for ComposedBehavior<B> {
    fn clone(&self) -> Self {
        Self {
            behavior: Arc::clone(&self.behavior),
            contributors: Arc::clone(&self.contributors),
        }
    }
}

impl<B: ?Sized> Deref for ComposedBehavior<B> {
    type Target = B;

    fn deref(&self) -> &B {
        &self.behavior
    }
}

impl<B: ?Sized> PartialEq for ComposedBehavior<B> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.behavior, &other.behavior)
    }
}

impl<B: ?Sized> Eq for ComposedBehavior<B> {}

impl<B: ?Sized> fmt::Debug for ComposedBehavior<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let contributors: Vec<String> = self.contributors.iter().map(ToString::to_string).collect();
        f.debug_struct("ComposedBehavior")
            .field("contributors", &contributors)
            .finish()
    }
}
