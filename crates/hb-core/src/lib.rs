//! hb-core: Shared configuration and abstractions for helper-bridge
//!
//! This crate provides the configuration structures, default paths, the
//! package registry the bridge consults before starting helpers, and the
//! logger abstraction that is injected into every component.

pub mod config;
pub mod error;
pub mod logger;
pub mod packages;
pub mod schedule;

pub use error::ConfigError;
pub use logger::{Logger, TracingLogger};
pub use packages::{PackageRegistry, PackageStage, PackageState, PackageTable};
