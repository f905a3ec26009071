//! Route masks: show one URL while routing to another.

use crate::config::schema::RouteMaskConfig;
use crate::location::builder::BuildOptions;
use crate::location::parsed::{ParsedLocation, TEMP_KEY, TEMP_LOCATION_KEY};
use crate::value::Value;

/// Locations whose pathname matches `from` are displayed as `build`.
#[derive(Debug, Clone)]
pub struct RouteMask {
    /// Route template matched (non-fuzzy, case-insensitive) against the real pathname.
    pub from: String,
    /// Displayed destination; params captured from `from` are passed along.
    pub build: BuildOptions,
    pub unmask_on_reload: Option<bool>,
}

impl RouteMask {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            build: BuildOptions::to(to),
            unmask_on_reload: None,
        }
    }

    pub fn unmask_on_reload(mut self, yes: bool) -> Self {
        self.unmask_on_reload = Some(yes);
        self
    }
}

impl From<&RouteMaskConfig> for RouteMask {
    fn from(config: &RouteMaskConfig) -> Self {
        Self {
            from: config.from.clone(),
            build: BuildOptions::to(config.to.clone()),
            unmask_on_reload: config.unmask_on_reload,
        }
    }
}

/// History state to write for a masked location.
///
/// The displayed entry's state gains the real target under
/// `__tempLocation`, and `__tempKey` when the mask should not survive a reload.
pub fn masked_history_state(next: &ParsedLocation, masked: &ParsedLocation, temp_key: Option<&str>) -> Value {
    let real_state = next.state.without(TEMP_LOCATION_KEY).without(TEMP_KEY);
    let temp = Value::object()
        .with("href", next.href.clone())
        .with("pathname", next.pathname.clone())
        .with("search", next.search_str.clone())
        .with(
            "hash",
            if next.hash.is_empty() { String::new() } else { format!("#{}", next.hash) },
        )
        .with("state", real_state);

    let state = masked.state.with(TEMP_LOCATION_KEY, temp);
    match temp_key {
        Some(key) => state.with(TEMP_KEY, key),
        None => state.without(TEMP_KEY),
    }
}
