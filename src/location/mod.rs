//! Locations: parsing, building and masking.
//!
//! # Data Flow
//! ```text
//! History entry ──parse_location──▶ ParsedLocation ──▶ router state
//!
//! BuildOptions ──LocationBuilder──▶ ParsedLocation (+ masked_location)
//!     ──commit──▶ History push/replace (masked href, real target in state)
//! ```
//!
//! # Design Decisions
//! - Search is a `Value` map; its string form is owned by a `SearchSerializer`
//! - Every produced location shares unchanged subtrees with its predecessor

pub mod builder;
pub mod mask;
pub mod parsed;
pub mod search;

pub use builder::{BuildOptions, LocationBuilder, Updater};
pub use mask::RouteMask;
pub use parsed::{parse_location, ParsedLocation};
pub use search::{JsonSearchSerializer, SearchSerializer};
