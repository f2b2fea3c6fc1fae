//! Data structures shared by every Trellis subsystem.

pub mod contributor;
pub mod descriptor;
pub mod instance;

pub use contributor::{Contributor, ContributorDescriptor};
pub use descriptor::{FieldDescriptor, FieldModifiers, TypeDescriptor, TypeKind, ValueType};
pub use instance::Instance;
