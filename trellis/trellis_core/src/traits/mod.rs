//! Core traits.
//!
//! These are the seams between the substrate and the collaborators that
//! feed it at start-up.

pub mod discovery;

pub use discovery::{
    DeclaredTargetReader, DescriptorFieldReader, DiscoveryProvider, ImplementationProvider,
    StructuralTagReader, TargetTypeTagReader,
};
