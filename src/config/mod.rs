//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → EngineConfig (validated, immutable)
//!     → RouterConfig handed to the router, RouteConfig[] to RouteTree::from_config
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a router is built from one snapshot
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Callbacks (guards, loaders) cannot live in config; they are attached in code

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::EngineConfig;
pub use schema::LoggingConfig;
pub use schema::NotFoundMode;
pub use schema::RouteConfig;
pub use schema::RouteMaskConfig;
pub use schema::RouterConfig;
