//! Utility types used throughout the substrate.

pub mod logging;

pub use logging::LogLevel;
