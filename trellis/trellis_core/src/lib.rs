//! # Trellis Core
//!
//! `trellis_core` provides the building blocks shared by every subsystem of
//! the Trellis resource substrate: identifiers, type descriptors, the
//! interfaces to discovery collaborators, and the error hierarchy.
//!
//! ## Build model
//!
//! The substrate is built once, synchronously, at start-up:
//!
//! 1. **Resource graph**: the DAG of resource types, rooted at one marker.
//! 2. **Metadata**: a flattened attribute catalogue per type.
//! 3. **Behaviors**: one composed behavior per type and capability.
//! 4. **Read security**: visible attributes per type and credential.
//!
//! After the build every structure is immutable, so lookups need no
//! synchronisation.
//!
//! ## Crate Structure
//!
//! - **error**: Configuration and authorization errors
//! - **id**: Type keys, credentials and generated identifiers
//! - **traits**: Discovery collaborator interfaces
//! - **types**: Descriptors, contributors and runtime instances
//! - **registry**: In-memory discovery registries
//! - **utils**: Logging helpers
//! - **macros**: `log_event!` and `config_bail!`

pub mod error;
pub mod id;
pub mod macros;
pub mod registry;
pub mod traits;
pub mod types;
pub mod utils;

pub use error::{AuthorizationError, ConfigurationError, Error, Result};
pub use id::{BuildId, Credential, Principal, TypeKey};
pub use registry::{ContributorRegistry, StaticRegistry};
pub use traits::{
    DeclaredTargetReader, DescriptorFieldReader, DiscoveryProvider, ImplementationProvider,
    StructuralTagReader, TargetTypeTagReader,
};
pub use types::{
    Contributor, ContributorDescriptor, FieldDescriptor, FieldModifiers, Instance,
    TypeDescriptor, TypeKind, ValueType,
};
pub use utils::LogLevel;
