use std::sync::Arc;

/// How a type's contributions are ordered before they are folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderingPolicy {
    /// Keep the order produced by propagation: inherited contributions
    /// first, parent by parent, then the type's own in discovery order
    PropagationOrder,

    /// Sort by the depth of the type that declared each contribution,
    /// ancestors first, ties broken by discovery order
    DeclarationDepth,
}

/// A family of composable behaviors, such as validation or logic hooks.
///
/// A capability tells the factory how to compose its behaviors: the tag
/// contributors are discovered under, the behavior that stands for
/// "nothing registered", and the binary "and" combinator.
pub trait BehaviorCapability: Send + Sync + 'static {
    /// The behavior type contributors implement
    type Behavior: ?Sized + Send + Sync + 'static;

    /// The capability tag contributors are discovered under.
    fn name(&self) -> &'static str;

    /// How contributions are ordered before folding.
    fn ordering(&self) -> OrderingPolicy;

    /// The behavior used when nothing is registered for a type.
    fn no_op(&self) -> Arc<Self::Behavior>;

    /// Combine two behaviors into one that runs both, left first, and
    /// succeeds only if both succeed.
    fn and(&self, left: Arc<Self::Behavior>, right: Arc<Self::Behavior>) -> Arc<Self::Behavior>;
}
