//! Core types, schedule normalization, and service wiring for the binday
//! waste collection schedule normalizer.

/// Environment-driven application configuration.
pub mod config;
/// Calendar date extraction from council date encodings.
pub mod date;
/// Domain models and identifiers shared by all providers.
pub mod model;
/// Category mapping and next-collection derivation.
pub mod normalize;
/// Registry for plugging council-specific providers into the service.
pub mod plugin;
/// Traits describing the provider interfaces.
pub mod ports;
/// High-level service facade used by clients.
pub mod service;

pub use config::*;
pub use date::*;
pub use model::*;
pub use normalize::*;
pub use plugin::*;
pub use ports::*;
pub use service::*;
