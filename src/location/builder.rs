//! Location building.
//!
//! # Data Flow
//! ```text
//! BuildOptions (to, from, params, search, hash, state, mask)
//!     → resolve destination path against origin
//!     → params: keep / set / update, then each destination route's stringify
//!     → interpolate path
//!     → search: staying routes' pre filters → update → post filters
//!     → hash, state
//!     → structural sharing against the origin location
//!     → optional mask build
//! ```
//!
//! # Design Decisions
//! - Building is pure: it never touches history or router state
//! - With no search/state instruction, a build that stays on the origin
//!   pathname keeps them; one that moves elsewhere starts empty

use crate::config::schema::RouterConfig;
use crate::location::mask::RouteMask;
use crate::location::parsed::ParsedLocation;
use crate::location::search::SearchSerializer;
use crate::matches::resolver::{parse_branch_params, resolve_branch};
use crate::routing::matcher::{match_pathname, MatchLocation};
use crate::routing::path::{interpolate_path, resolve_path, InterpolateOptions};
use crate::routing::segment::trim_path_right;
use crate::routing::tree::{RouteId, RouteTree};
use crate::value::{replace_equal_deep, Value};
use std::fmt;
use std::sync::Arc;

/// How to derive one field of the next location from the current one.
pub enum Updater<T> {
    /// No instruction; the field's default applies.
    Unset,
    /// Carry the current value over.
    Keep,
    Set(T),
    Update(Arc<dyn Fn(&T) -> T + Send + Sync>),
}

impl<T> Default for Updater<T> {
    fn default() -> Self {
        Updater::Unset
    }
}

impl<T: Clone> Clone for Updater<T> {
    fn clone(&self) -> Self {
        match self {
            Updater::Unset => Updater::Unset,
            Updater::Keep => Updater::Keep,
            Updater::Set(v) => Updater::Set(v.clone()),
            Updater::Update(f) => Updater::Update(f.clone()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Updater<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Updater::Unset => write!(f, "Unset"),
            Updater::Keep => write!(f, "Keep"),
            Updater::Set(v) => f.debug_tuple("Set").field(v).finish(),
            Updater::Update(_) => write!(f, "Update(..)"),
        }
    }
}

impl<T: Clone> Updater<T> {
    /// Apply to `current`; `Unset` yields `fallback`.
    fn apply(&self, current: &T, fallback: impl FnOnce() -> T) -> T {
        match self {
            Updater::Unset => fallback(),
            Updater::Keep => current.clone(),
            Updater::Set(v) => v.clone(),
            Updater::Update(f) => f(current),
        }
    }
}

/// Description of a destination.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Destination path, absolute or relative to `from`.
    pub to: Option<String>,
    /// Origin pathname. Defaults to the current location.
    pub from: Option<String>,
    pub params: Updater<Value>,
    pub search: Updater<Value>,
    pub hash: Updater<String>,
    pub state: Updater<Value>,
    /// Location to display instead of the real one.
    pub mask: Option<Box<BuildOptions>>,
    pub unmask_on_reload: Option<bool>,
    /// Replace the current history entry when navigating.
    pub replace: bool,
}

impl BuildOptions {
    pub fn to(to: impl Into<String>) -> Self {
        Self {
            to: Some(to.into()),
            ..Default::default()
        }
    }

    /// The current location.
    pub fn here() -> Self {
        Self::to(".")
    }

    pub fn from_path(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn params(mut self, params: impl Into<Value>) -> Self {
        self.params = Updater::Set(params.into());
        self
    }

    pub fn update_params(mut self, f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        self.params = Updater::Update(Arc::new(f));
        self
    }

    pub fn search(mut self, search: impl Into<Value>) -> Self {
        self.search = Updater::Set(search.into());
        self
    }

    pub fn keep_search(mut self) -> Self {
        self.search = Updater::Keep;
        self
    }

    pub fn update_search(mut self, f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        self.search = Updater::Update(Arc::new(f));
        self
    }

    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Updater::Set(hash.into());
        self
    }

    pub fn update_hash(mut self, f: impl Fn(&String) -> String + Send + Sync + 'static) -> Self {
        self.hash = Updater::Update(Arc::new(f));
        self
    }

    pub fn state(mut self, state: impl Into<Value>) -> Self {
        self.state = Updater::Set(state.into());
        self
    }

    pub fn update_state(mut self, f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        self.state = Updater::Update(Arc::new(f));
        self
    }

    pub fn mask(mut self, mask: BuildOptions) -> Self {
        self.mask = Some(Box::new(mask));
        self
    }

    pub fn unmask_on_reload(mut self, yes: bool) -> Self {
        self.unmask_on_reload = Some(yes);
        self
    }

    pub fn replace(mut self, yes: bool) -> Self {
        self.replace = yes;
        self
    }
}

/// Builds locations against one route tree.
pub struct LocationBuilder<'a> {
    pub tree: &'a RouteTree,
    pub config: &'a RouterConfig,
    pub serializer: &'a dyn SearchSerializer,
    pub masks: &'a [RouteMask],
}

impl LocationBuilder<'_> {
    /// Build the destination described by `dest`, starting at `current`.
    ///
    /// `from_search` is the search of the deepest active match, which may carry
    /// validated defaults the raw location lacks.
    pub fn build(&self, current: &ParsedLocation, from_search: &Value, dest: &BuildOptions) -> ParsedLocation {
        let mut next = self.build_one(current, from_search, dest);

        let masked = match &dest.mask {
            Some(mask) => {
                let mut mask = (**mask).clone();
                if mask.from.is_none() {
                    mask.from = dest.from.clone();
                }
                Some((self.build_one(current, from_search, &mask), None))
            }
            None => self.registered_mask(current, from_search, dest, &next),
        };

        if let Some(masked) = masked {
            next.unmask_on_reload = dest.unmask_on_reload.or(masked.1);
            next.masked_location = Some(Box::new(masked.0));
        } else {
            next.unmask_on_reload = dest.unmask_on_reload;
        }

        next
    }

    fn registered_mask(
        &self,
        current: &ParsedLocation,
        from_search: &Value,
        dest: &BuildOptions,
        next: &ParsedLocation,
    ) -> Option<(ParsedLocation, Option<bool>)> {
        self.masks.iter().find_map(|mask| {
            let location = MatchLocation {
                to: Some(&mask.from),
                case_sensitive: false,
                fuzzy: false,
            };
            let params = match_pathname(&self.config.basepath, &next.pathname, &location)?;
            let params = Value::from_pairs(params);
            let mut masked_dest = mask.build.clone();
            masked_dest.from = dest.from.clone();
            masked_dest.params = Updater::Set(params);
            Some((self.build_one(current, from_search, &masked_dest), mask.unmask_on_reload))
        })
    }

    fn build_one(&self, current: &ParsedLocation, from_search: &Value, dest: &BuildOptions) -> ParsedLocation {
        let basepath = &self.config.basepath;
        let from_path = dest.from.as_deref().unwrap_or(&current.pathname);
        let to = dest.to.as_deref().unwrap_or(".");
        let resolved = resolve_path(basepath, from_path, to, self.config.trailing_slash);

        let from_branch = resolve_branch(self.tree, self.config, from_path);
        let (prev_params, _) = parse_branch_params(self.tree, &from_branch);
        let dest_branch = resolve_branch(self.tree, self.config, &resolved);

        let mut params = dest.params.apply(&prev_params, || prev_params.clone());
        for id in &dest_branch.routes {
            if let Some(stringify) = &self.tree.node(*id).options.stringify_params {
                params = params.merge(&stringify(&params));
            }
        }
        let params = replace_equal_deep(&prev_params, params);

        let pathname = interpolate_path(&resolved, &params, InterpolateOptions::default()).path;
        let stays_put = trim_path_right(&pathname) == trim_path_right(&current.pathname);

        let staying: Vec<RouteId> = dest_branch
            .routes
            .iter()
            .copied()
            .filter(|id| from_branch.routes.contains(id))
            .collect();
        let pre_filters: Vec<_> = staying
            .iter()
            .flat_map(|id| self.tree.node(*id).options.pre_search_filters.iter().cloned())
            .collect();
        let pre_filtered = pre_filters
            .iter()
            .fold(from_search.clone(), |search, filter| filter(search));

        let search = dest.search.apply(&pre_filtered, || {
            if stays_put || !pre_filters.is_empty() {
                pre_filtered.clone()
            } else {
                Value::object()
            }
        });
        let search = dest_branch
            .routes
            .iter()
            .flat_map(|id| self.tree.node(*id).options.post_search_filters.iter())
            .fold(search, |search, filter| filter(search));
        let search = replace_equal_deep(from_search, search);
        let search_str = self.serializer.stringify(&search);

        let hash = dest.hash.apply(&current.hash, || current.hash.clone());

        let state = dest.state.apply(&current.state, || {
            if stays_put {
                current.state.clone()
            } else {
                Value::object()
            }
        });
        let state = replace_equal_deep(&current.state, state);

        ParsedLocation::new(pathname, search, search_str, hash, state)
    }
}
