//! Route declarations and the compiled route tree.
//!
//! # Data Flow
//! ```text
//! RouteDef (nested builder) / RouteConfig (TOML)
//!     → RouteTree::build (preorder walk)
//!     → ids + full paths computed, duplicates rejected
//!     → routes with a path ranked into the flat match list
//! ```
//!
//! # Design Decisions
//! - Nodes live in one `Vec`; parent/child links are indices
//! - The first node is always the root (`__root__`, full path `/`)
//! - Pathless layout routes join the tree but not the flat match list
//! - When two routes share a trimmed full path, the index route (trailing `/`)
//!   owns it, otherwise the first declared one does

use crate::config::schema::RouteConfig;
use crate::error::{LoadError, RouteError, TreeError};
use crate::routing::options::{
    GuardContext, LoaderContext, ReloadContext, RouteOptions,
};
use crate::routing::rank::{rank_routes, RankEntry};
use crate::routing::segment::{join_paths, trim_path_left, trim_path_right};
use crate::matches::RouteMatch;
use crate::value::Value;
use futures_util::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Id of the root route.
pub const ROOT_ROUTE_ID: &str = "__root__";

/// Index of a node in a [`RouteTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(pub usize);

/// A declared route and its children.
#[derive(Debug, Clone, Default)]
pub struct RouteDef {
    pub options: RouteOptions,
    pub children: Vec<RouteDef>,
}

impl RouteDef {
    /// The root route. Its path and id are fixed.
    pub fn root() -> Self {
        Self::default()
    }

    /// A route matching `path` relative to its parent.
    pub fn new(path: impl Into<String>) -> Self {
        let mut def = Self::default();
        def.options.path = Some(path.into());
        def
    }

    /// A pathless layout route.
    pub fn layout(id: impl Into<String>) -> Self {
        let mut def = Self::default();
        def.options.id = Some(id.into());
        def
    }

    pub fn child(mut self, child: RouteDef) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = RouteDef>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.options.case_sensitive = Some(yes);
        self
    }

    pub fn parse_params<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.options.parse_params = Some(Arc::new(f));
        self
    }

    pub fn stringify_params<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.options.stringify_params = Some(Arc::new(f));
        self
    }

    pub fn validate_search<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.options.validate_search = Some(Arc::new(f));
        self
    }

    pub fn pre_search_filter<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.options.pre_search_filters.push(Arc::new(f));
        self
    }

    pub fn post_search_filter<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.options.post_search_filters.push(Arc::new(f));
        self
    }

    pub fn loader_deps<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.options.loader_deps = Some(Arc::new(f));
        self
    }

    pub fn before_load<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(GuardContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Value>, LoadError>> + Send + 'static,
    {
        self.options.before_load = Some(Arc::new(move |ctx| f(ctx).boxed()));
        self
    }

    pub fn loader<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(LoaderContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, LoadError>> + Send + 'static,
    {
        self.options.loader = Some(Arc::new(move |ctx| f(ctx).boxed()));
        self
    }

    pub fn should_reload<F>(mut self, f: F) -> Self
    where
        F: Fn(&ReloadContext) -> bool + Send + Sync + 'static,
    {
        self.options.should_reload = Some(Arc::new(f));
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&RouteError) -> Result<(), LoadError> + Send + Sync + 'static,
    {
        self.options.on_error = Some(Arc::new(f));
        self
    }

    pub fn on_enter<F>(mut self, f: F) -> Self
    where
        F: Fn(&RouteMatch) + Send + Sync + 'static,
    {
        self.options.on_enter = Some(Arc::new(f));
        self
    }

    pub fn on_stay<F>(mut self, f: F) -> Self
    where
        F: Fn(&RouteMatch) + Send + Sync + 'static,
    {
        self.options.on_stay = Some(Arc::new(f));
        self
    }

    pub fn on_leave<F>(mut self, f: F) -> Self
    where
        F: Fn(&RouteMatch) + Send + Sync + 'static,
    {
        self.options.on_leave = Some(Arc::new(f));
        self
    }

    pub fn stale_time(mut self, d: Duration) -> Self {
        self.options.stale_time = Some(d);
        self
    }

    pub fn preload_stale_time(mut self, d: Duration) -> Self {
        self.options.preload_stale_time = Some(d);
        self
    }

    pub fn gc_time(mut self, d: Duration) -> Self {
        self.options.gc_time = Some(d);
        self
    }

    pub fn preload_gc_time(mut self, d: Duration) -> Self {
        self.options.preload_gc_time = Some(d);
        self
    }

    pub fn pending_ms(mut self, d: Duration) -> Self {
        self.options.pending_ms = Some(d);
        self
    }

    pub fn pending_min_ms(mut self, d: Duration) -> Self {
        self.options.pending_min_ms = Some(d);
        self
    }

    pub fn not_found_handler(mut self) -> Self {
        self.options.not_found_handler = true;
        self
    }
}

impl From<&RouteConfig> for RouteDef {
    fn from(config: &RouteConfig) -> Self {
        let mut def = RouteDef::default();
        def.options.path = config.path.clone();
        def.options.id = config.id.clone();
        def.options.case_sensitive = config.case_sensitive;
        def.options.stale_time = config.stale_time_ms.map(Duration::from_millis);
        def.options.gc_time = config.gc_time_ms.map(Duration::from_millis);
        def.options.not_found_handler = config.not_found_handler;
        def.children = config.children.iter().map(RouteDef::from).collect();
        def
    }
}

/// A compiled route.
#[derive(Debug, Clone)]
pub struct RouteNode {
    pub id: String,
    /// Path relative to the parent, `None` for layout routes.
    pub path: Option<String>,
    pub full_path: String,
    pub parent: Option<RouteId>,
    pub children: Vec<RouteId>,
    /// Position in the flat match list, if the route takes part in matching.
    pub rank: Option<usize>,
    pub is_root: bool,
    pub options: RouteOptions,
}

impl RouteNode {
    pub fn has_loader(&self) -> bool {
        self.options.loader.is_some()
    }
}

/// Immutable route tree with ranked match order.
#[derive(Debug, Clone)]
pub struct RouteTree {
    nodes: Vec<RouteNode>,
    by_id: HashMap<String, RouteId>,
    by_path: HashMap<String, RouteId>,
    flat: Vec<RouteId>,
}

impl RouteTree {
    /// Compile a tree rooted at `root`.
    pub fn build(root: RouteDef) -> Result<Self, TreeError> {
        let mut tree = RouteTree {
            nodes: Vec::new(),
            by_id: HashMap::new(),
            by_path: HashMap::new(),
            flat: Vec::new(),
        };

        let RouteDef { options, children } = root;
        tree.nodes.push(RouteNode {
            id: ROOT_ROUTE_ID.to_string(),
            path: Some("/".to_string()),
            full_path: "/".to_string(),
            parent: None,
            children: Vec::new(),
            rank: None,
            is_root: true,
            options,
        });
        tree.by_id.insert(ROOT_ROUTE_ID.to_string(), RouteId(0));

        let mut stack: Vec<(RouteId, RouteDef)> =
            children.into_iter().rev().map(|c| (RouteId(0), c)).collect();
        while let Some((parent, def)) = stack.pop() {
            let id = tree.insert(parent, def.options)?;
            stack.extend(def.children.into_iter().rev().map(|c| (id, c)));
        }

        tree.rank();
        Ok(tree)
    }

    /// Build a path-only tree from configuration.
    pub fn from_config(routes: &[RouteConfig]) -> Result<Self, TreeError> {
        Self::build(RouteDef::root().children(routes.iter().map(RouteDef::from)))
    }

    fn insert(&mut self, parent: RouteId, options: RouteOptions) -> Result<RouteId, TreeError> {
        let parent_node = &self.nodes[parent.0];

        let path = match (&options.path, &options.id) {
            (Some(path), Some(id)) => {
                return Err(TreeError::IdAndPath {
                    id: id.clone(),
                    path: path.clone(),
                })
            }
            (None, None) => {
                return Err(TreeError::MissingPath {
                    parent: parent_node.id.clone(),
                })
            }
            (Some(path), None) if path != "/" => Some(trim_path_left(path).to_string()),
            (Some(path), None) => Some(path.clone()),
            (None, Some(_)) => None,
        };

        let custom_id = options
            .id
            .clone()
            .or_else(|| path.clone())
            .unwrap_or_default();
        let parent_id = if parent_node.is_root { "" } else { parent_node.id.as_str() };
        let id = join_paths(["/", &join_paths([parent_id, custom_id.as_str()])]);

        let full_path = match &path {
            Some(path) => join_paths([parent_node.full_path.as_str(), path.as_str()]),
            None => parent_node.full_path.clone(),
        };

        if self.by_id.contains_key(&id) {
            return Err(TreeError::DuplicateId(id));
        }

        let route_id = RouteId(self.nodes.len());
        self.nodes.push(RouteNode {
            id: id.clone(),
            path,
            full_path,
            parent: Some(parent),
            children: Vec::new(),
            rank: None,
            is_root: false,
            options,
        });
        self.nodes[parent.0].children.push(route_id);
        self.by_id.insert(id, route_id);
        Ok(route_id)
    }

    fn rank(&mut self) {
        for (index, node) in self.nodes.iter().enumerate() {
            if node.is_root || node.path.is_none() {
                continue;
            }
            let trimmed = trim_path_right(&node.full_path).to_string();
            let replace = match self.by_path.get(&trimmed) {
                None => true,
                Some(_) => node.full_path.ends_with('/'),
            };
            if replace {
                self.by_path.insert(trimmed, RouteId(index));
            }
        }

        let entries = self
            .by_path
            .values()
            .map(|id| RankEntry::new(*id, &self.nodes[id.0].full_path, id.0))
            .collect();
        self.flat = rank_routes(entries).into_iter().map(|e| e.key).collect();

        for (rank, id) in self.flat.iter().enumerate() {
            self.nodes[id.0].rank = Some(rank);
        }
    }

    pub fn root_id(&self) -> RouteId {
        RouteId(0)
    }

    pub fn root(&self) -> &RouteNode {
        &self.nodes[0]
    }

    pub fn node(&self, id: RouteId) -> &RouteNode {
        &self.nodes[id.0]
    }

    /// Look a route up by its string id.
    pub fn lookup(&self, id: &str) -> Option<RouteId> {
        self.by_id.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&RouteNode> {
        self.lookup(id).map(|id| self.node(id))
    }

    /// Route owning a (right-trimmed) full path.
    pub fn by_path(&self, full_path: &str) -> Option<RouteId> {
        self.by_path.get(trim_path_right(full_path)).copied()
    }

    /// Routes in match order.
    pub fn flat(&self) -> &[RouteId] {
        &self.flat
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RouteId, &RouteNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (RouteId(i), n))
    }

    /// `id` and its ancestors, root first.
    pub fn branch(&self, id: RouteId) -> Vec<RouteId> {
        let mut chain = vec![id];
        let mut cursor = self.nodes[id.0].parent;
        while let Some(parent) = cursor {
            chain.push(parent);
            cursor = self.nodes[parent.0].parent;
        }
        chain.reverse();
        chain
    }

    /// Walk upward from `from` (inclusive) to the first route satisfying `pred`.
    pub fn find_ancestor(&self, from: RouteId, pred: impl Fn(&RouteNode) -> bool) -> Option<RouteId> {
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            let node = &self.nodes[id.0];
            if pred(node) {
                return Some(id);
            }
            cursor = node.parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> RouteTree {
        RouteTree::build(RouteDef::root().children([
            RouteDef::new("/"),
            RouteDef::new("about"),
            RouteDef::new("teams").children([
                RouteDef::new("/"),
                RouteDef::new("$teamId").child(RouteDef::new("settings")),
            ]),
            RouteDef::layout("_auth").child(RouteDef::new("account")),
            RouteDef::new("files/$"),
        ]))
        .unwrap()
    }

    #[test]
    fn test_ids_and_full_paths() {
        let tree = sample();
        assert_eq!(tree.root().id, ROOT_ROUTE_ID);
        let settings = tree.get("/teams/$teamId/settings").unwrap();
        assert_eq!(settings.full_path, "/teams/$teamId/settings");
        let index = tree.get("/teams/").unwrap();
        assert_eq!(index.full_path, "/teams/");
        let account = tree.get("/_auth/account").unwrap();
        assert_eq!(account.full_path, "/account");
        assert_eq!(tree.get("/_auth").unwrap().full_path, "/");
    }

    #[test]
    fn test_index_route_owns_parent_path() {
        let tree = sample();
        let owner = tree.by_path("/teams").unwrap();
        assert_eq!(tree.node(owner).id, "/teams/");
    }

    #[test]
    fn test_layouts_are_not_ranked() {
        let tree = sample();
        assert!(tree.get("/_auth").unwrap().rank.is_none());
        assert!(tree.root().rank.is_none());
        assert!(tree.get("/about").unwrap().rank.is_some());
    }

    #[test]
    fn test_flat_order_prefers_specific_routes() {
        let tree = sample();
        let order: Vec<&str> = tree.flat().iter().map(|id| tree.node(*id).full_path.as_str()).collect();
        let pos = |p: &str| order.iter().position(|x| *x == p).unwrap();
        assert_eq!(order[0], "/");
        assert!(pos("/teams/$teamId/settings") < pos("/teams/$teamId"));
        assert!(pos("/teams/") < pos("/teams/$teamId"));
    }

    #[test]
    fn test_branch_is_root_first() {
        let tree = sample();
        let leaf = tree.lookup("/teams/$teamId/settings").unwrap();
        let ids: Vec<&str> = tree.branch(leaf).iter().map(|id| tree.node(*id).id.as_str()).collect();
        assert_eq!(ids, vec![ROOT_ROUTE_ID, "/teams", "/teams/$teamId", "/teams/$teamId/settings"]);
    }

    #[test]
    fn test_rejects_bad_declarations() {
        let both = RouteDef { options: RouteOptions { path: Some("a".into()), id: Some("b".into()), ..Default::default() }, children: vec![] };
        assert!(matches!(RouteTree::build(RouteDef::root().child(both)), Err(TreeError::IdAndPath { .. })));

        let neither = RouteDef::default();
        assert!(matches!(RouteTree::build(RouteDef::root().child(neither)), Err(TreeError::MissingPath { .. })));

        let dup = RouteDef::root().children([RouteDef::new("a"), RouteDef::new("/a")]);
        assert_eq!(RouteTree::build(dup).unwrap_err(), TreeError::DuplicateId("/a".into()));
    }

    #[test]
    fn test_from_config() {
        let config = vec![RouteConfig {
            path: Some("docs".into()),
            children: vec![RouteConfig { path: Some("$page".into()), ..Default::default() }],
            ..Default::default()
        }];
        let tree = RouteTree::from_config(&config).unwrap();
        assert!(tree.get("/docs/$page").is_some());
        assert_eq!(tree.len(), 3);
    }
}
