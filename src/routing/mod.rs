//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route declarations (RouteDef)
//!     → tree.rs (arena, ids, full paths)
//!     → rank.rs (segment scores → total match order)
//!     → Freeze as immutable RouteTree
//!
//! Pathname
//!     → segment.rs (split into static / param / wildcard)
//!     → matcher.rs (walk route and pathname segments pairwise)
//!     → Return: captured params or no match
//! ```
//!
//! # Design Decisions
//! - Routes compiled once, immutable at runtime
//! - No regex in hot path (segment comparison only)
//! - Deterministic: same route set always ranks the same way
//! - First match in rank order wins

pub mod matcher;
pub mod options;
pub mod path;
pub mod rank;
pub mod segment;
pub mod tree;

pub use matcher::{match_by_path, match_pathname, MatchLocation, RawParams};
pub use options::RouteOptions;
pub use path::{interpolate_path, resolve_path, TrailingSlash};
pub use tree::{RouteDef, RouteId, RouteNode, RouteTree, ROOT_ROUTE_ID};
