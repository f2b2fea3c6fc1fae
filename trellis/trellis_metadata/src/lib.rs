//! # Trellis Metadata
//!
//! `trellis_metadata` derives, for every resource type, a flattened
//! attribute catalogue that honours inheritance.
//!
//! Key concepts:
//!
//! 1. **Attribute record**: one attribute with its value type, its
//!    classification (plain, component, singular or plural association),
//!    optionality, laziness and identifier role.
//!
//! 2. **Flattening**: value objects are expanded into dotted attributes
//!    (`address.street`) that remember their access path.
//!
//! 3. **Inheritance**: a type's catalogue is the union of its parents'
//!    catalogues and its own declarations, own declarations winning.
//!
//! 4. **Structural requirements**: a marker can demand that every type
//!    implementing it exposes a given attribute.

mod attribute;
mod builder;
mod metadata;

pub use attribute::{AttributeKind, AttributeRecord};
pub use builder::{MetadataBuilder, StructuralRequirement};
pub use metadata::{MetadataProvider, ResourceMetadata};
