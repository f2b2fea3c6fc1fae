//! # Trellis Runtime
//!
//! `trellis_runtime` wires the Trellis subsystems together at start-up.
//!
//! - **config**: Loading and validating [`SubstrateConfig`]
//! - **logging**: Installing a log subscriber
//! - **bootstrap**: Building the [`Substrate`] phase by phase
//!
//! ```
//! use trellis_core::registry::StaticRegistry;
//! use trellis_core::types::TypeDescriptor;
//! use trellis_runtime::{Substrate, SubstrateConfig};
//!
//! let registry = StaticRegistry::new("Resource")
//!     .with(TypeDescriptor::class("Animal").implements("Resource"))?;
//!
//! let substrate = Substrate::builder(SubstrateConfig::default())
//!     .discovery(&registry)
//!     .fields(&registry)
//!     .build()?;
//!
//! assert_eq!(substrate.graph().len(), 2);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod bootstrap;
pub mod config;
pub mod logging;

pub use bootstrap::{BootstrapError, BootstrapPhase, BuildInfo, Substrate, SubstrateBuilder};
pub use config::{ConfigError, LoggingConfig, SubstrateConfig};
