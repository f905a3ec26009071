//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the engine.
//! All types derive Serde traits for deserialization from config files.

use crate::routing::path::TrailingSlash;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Router-wide matching and loading defaults.
    pub router: RouterConfig,

    /// Logging settings.
    pub logging: LoggingConfig,

    /// Declarative route tree (paths only; callbacks are attached in code).
    pub routes: Vec<RouteConfig>,

    /// Route masks applied when building locations.
    pub masks: Vec<RouteMaskConfig>,
}

/// How an unmatched pathname is attributed to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotFoundMode {
    /// Nearest matched route that handles not-found or has children.
    #[default]
    Fuzzy,
    /// Always the root route.
    Root,
}

/// Router-wide options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Prefix stripped before matching and re-added when building.
    pub basepath: String,

    /// Default case sensitivity of static segments.
    pub case_sensitive: bool,

    pub not_found_mode: NotFoundMode,

    pub trailing_slash: TrailingSlash,

    /// Age after which loader data is considered stale.
    pub default_stale_time_ms: u64,

    /// Stale time applied to preloads.
    pub default_preload_stale_time_ms: u64,

    /// Age after which cached matches are evicted.
    pub default_gc_time_ms: u64,

    /// GC time for matches created by preloading.
    pub default_preload_gc_time_ms: u64,

    /// Delay before a slow load is flagged as pending. `None` disables it.
    pub default_pending_ms: Option<u64>,

    /// Minimum time a pending flag stays raised once shown.
    pub default_pending_min_ms: u64,

    /// Masked locations reveal their real target after a reload.
    pub unmask_on_reload: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            basepath: "/".to_string(),
            case_sensitive: false,
            not_found_mode: NotFoundMode::Fuzzy,
            trailing_slash: TrailingSlash::Never,
            default_stale_time_ms: 0,
            default_preload_stale_time_ms: 30_000,
            default_gc_time_ms: 30 * 60 * 1000,
            default_preload_gc_time_ms: 30 * 60 * 1000,
            default_pending_ms: Some(1000),
            default_pending_min_ms: 500,
            unmask_on_reload: false,
        }
    }
}

impl RouterConfig {
    pub fn stale_time(&self) -> Duration {
        Duration::from_millis(self.default_stale_time_ms)
    }

    pub fn preload_stale_time(&self) -> Duration {
        Duration::from_millis(self.default_preload_stale_time_ms)
    }

    pub fn gc_time(&self) -> Duration {
        Duration::from_millis(self.default_gc_time_ms)
    }

    pub fn preload_gc_time(&self) -> Duration {
        Duration::from_millis(self.default_preload_gc_time_ms)
    }

    pub fn pending_ms(&self) -> Option<Duration> {
        self.default_pending_ms.map(Duration::from_millis)
    }

    pub fn pending_min_ms(&self) -> Duration {
        Duration::from_millis(self.default_pending_min_ms)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,

    /// Colourised output.
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "route_engine=info".to_string(),
            ansi: true,
        }
    }
}

/// One declared route.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouteConfig {
    /// Path template relative to the parent (e.g. "teams", "$teamId", "/").
    pub path: Option<String>,

    /// Id for pathless layout routes. Mutually exclusive with `path`.
    pub id: Option<String>,

    pub case_sensitive: Option<bool>,

    pub stale_time_ms: Option<u64>,
    pub gc_time_ms: Option<u64>,

    /// Route renders not-found content for its subtree.
    pub not_found_handler: bool,

    pub children: Vec<RouteConfig>,
}

/// A mask rewriting the displayed URL for locations matching `from`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteMaskConfig {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub unmask_on_reload: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let cfg = RouterConfig::default();
        assert_eq!(cfg.basepath, "/");
        assert_eq!(cfg.preload_stale_time(), Duration::from_secs(30));
        assert_eq!(cfg.stale_time(), Duration::ZERO);
        assert_eq!(cfg.not_found_mode, NotFoundMode::Fuzzy);
    }

    #[test]
    fn test_minimal_toml_fills_defaults() {
        let cfg: EngineConfig = toml::from_str(
            r#"
            [router]
            basepath = "/app"
            not_found_mode = "root"

            [[routes]]
            path = "teams"

            [[routes.children]]
            path = "$teamId"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.router.basepath, "/app");
        assert_eq!(cfg.router.not_found_mode, NotFoundMode::Root);
        assert_eq!(cfg.router.default_gc_time_ms, 1_800_000);
        assert_eq!(cfg.routes[0].children[0].path.as_deref(), Some("$teamId"));
    }
}
