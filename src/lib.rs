//! Client-side route resolution and data loading engine.
//!
//! Resolves URL-like locations into chains of route matches, keeps that
//! resolution consistent under overlapping navigations, and drives each
//! match through a stale-while-revalidate load lifecycle.

// Core
pub mod error;
pub mod routing;
pub mod value;

// Locations and matches
pub mod history;
pub mod location;
pub mod matches;

// Loading and the router handle
pub mod load;
pub mod router;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use config::schema::EngineConfig;
pub use error::{LoadError, NotFound, Redirect, RouteError, RouterError};
pub use history::{History, MemoryHistory};
pub use location::{BuildOptions, ParsedLocation};
pub use matches::{MatchStatus, RouteMatch};
pub use router::{Router, RouterEvent, RouterEventKind, RouterState};
pub use routing::{RouteDef, RouteTree};
pub use value::Value;
