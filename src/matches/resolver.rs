//! Match resolution.
//!
//! # Responsibilities
//! - Pick the best ranked route for a pathname (fuzzy, so parents still
//!   match when children do not)
//! - Walk the branch to the root and attribute unmatched segments
//! - Parse params and validate search per route, isolating failures
//! - Reuse existing matches by id so loaded data survives navigation

use crate::config::schema::{NotFoundMode, RouterConfig};
use crate::error::RouteError;
use crate::matches::{MatchCause, RouteMatch};
use crate::router::state::RouterState;
use crate::routing::matcher::{match_pathname, MatchLocation, RawParams, FUZZY_REST};
use crate::routing::path::{interpolate_path, InterpolateOptions};
use crate::routing::segment::{join_paths, trim_path_right};
use crate::routing::tree::{RouteId, RouteTree};
use crate::value::{replace_equal_deep, Value};

/// The routes a pathname resolves to, before any per-route processing.
#[derive(Debug, Clone)]
pub struct Branch {
    /// Root first.
    pub routes: Vec<RouteId>,
    pub raw_params: RawParams,
    /// Deepest route whose path matched, `None` if only the root applies.
    pub found: Option<RouteId>,
    /// Route attributed with the unmatched remainder of the pathname.
    pub not_found: Option<RouteId>,
}

/// Resolve the route branch for `pathname`.
pub fn resolve_branch(tree: &RouteTree, config: &RouterConfig, pathname: &str) -> Branch {
    let trimmed = trim_path_right(pathname);
    let mut raw_params = RawParams::new();

    let found = tree.flat().iter().copied().find(|id| {
        let node = tree.node(*id);
        let location = MatchLocation {
            to: Some(&node.full_path),
            case_sensitive: node.options.case_sensitive.unwrap_or(config.case_sensitive),
            fuzzy: true,
        };
        match match_pathname(&config.basepath, trimmed, &location) {
            Some(params) => {
                raw_params = params;
                true
            }
            None => false,
        }
    });

    let leftover = match found {
        Some(id) => {
            tree.node(id).path.as_deref() != Some("/") && raw_params.contains_key(FUZZY_REST)
        }
        None => !trimmed.is_empty(),
    };
    raw_params.remove(FUZZY_REST);

    let cursor = found.unwrap_or_else(|| tree.root_id());
    let not_found = leftover.then(|| attribute_not_found(tree, config.not_found_mode, cursor));

    Branch {
        routes: tree.branch(cursor),
        raw_params,
        found,
        not_found,
    }
}

/// Route responsible for rendering a path that matched only partially.
pub fn attribute_not_found(tree: &RouteTree, mode: NotFoundMode, deepest: RouteId) -> RouteId {
    match mode {
        NotFoundMode::Root => tree.root_id(),
        NotFoundMode::Fuzzy => tree
            .find_ancestor(deepest, |node| {
                node.options.not_found_handler || !node.children.is_empty()
            })
            .unwrap_or_else(|| tree.root_id()),
    }
}

/// Run each route's `parse_params` over the accumulated params.
///
/// Returns the merged params and, per route, the parse error if any.
pub fn parse_branch_params(tree: &RouteTree, branch: &Branch) -> (Value, Vec<Option<RouteError>>) {
    let mut params = Value::from_pairs(branch.raw_params.clone());
    let mut errors = Vec::with_capacity(branch.routes.len());

    for id in &branch.routes {
        let node = tree.node(*id);
        let error = node.options.parse_params.as_ref().and_then(|parse| {
            match parse(&params) {
                Ok(parsed) => {
                    params = params.merge(&parsed);
                    None
                }
                Err(message) => Some(RouteError::ParamParse {
                    route_id: node.id.clone(),
                    message,
                }),
            }
        });
        errors.push(error);
    }

    (params, errors)
}

/// Options for [`match_routes`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchRoutesOptions {
    /// Fail on the first params or search error instead of recording it.
    pub throw_on_error: bool,
    /// Matches are being built for a preload.
    pub preload: bool,
}

/// Resolve `pathname` and `search` into a root-first match chain.
pub fn match_routes(
    tree: &RouteTree,
    config: &RouterConfig,
    state: &RouterState,
    pathname: &str,
    search: &Value,
    options: MatchRoutesOptions,
) -> Result<Vec<RouteMatch>, RouteError> {
    let branch = resolve_branch(tree, config, pathname);
    let (params, param_errors) = parse_branch_params(tree, &branch);

    if options.throw_on_error {
        if let Some(err) = param_errors.iter().flatten().next() {
            return Err(err.clone());
        }
    }

    let mut matches = Vec::with_capacity(branch.routes.len());
    let mut parent_search = search.clone();

    for (index, route) in branch.routes.iter().copied().enumerate() {
        let node = tree.node(route);

        let (match_search, search_error) = match &node.options.validate_search {
            Some(validate) => match validate(&parent_search) {
                Ok(validated) => (parent_search.merge(&validated), None),
                Err(message) => {
                    let err = RouteError::SearchValidation {
                        route_id: node.id.clone(),
                        message,
                    };
                    if options.throw_on_error {
                        return Err(err);
                    }
                    (parent_search.clone(), Some(err))
                }
            },
            None => (parent_search.clone(), None),
        };
        parent_search = match_search.clone();

        let loader_deps = node
            .options
            .loader_deps
            .as_ref()
            .map(|deps| deps(&match_search))
            .unwrap_or(Value::Null);
        let deps_key = if loader_deps.is_null() {
            String::new()
        } else {
            loader_deps.to_string()
        };

        let leave = InterpolateOptions {
            leave_params: true,
            ..Default::default()
        };
        let id = format!("{}{}", interpolate_path(&node.id, &params, leave).path, deps_key);
        let match_pathname = join_paths([
            config.basepath.as_str(),
            interpolate_path(&node.full_path, &params, InterpolateOptions::default())
                .path
                .as_str(),
        ]);

        let cause = if state.matches.iter().any(|m| m.id == id) {
            MatchCause::Stay
        } else {
            MatchCause::Enter
        };

        let mut route_match = match state.find_match(&id) {
            Some(existing) => {
                let mut reused = existing.clone();
                reused.params = replace_equal_deep(&existing.params, params.clone());
                reused.search = replace_equal_deep(&existing.search, match_search);
                reused
            }
            None => {
                let mut fresh = RouteMatch::new(id, node.id.clone(), route, index);
                fresh.params = params.clone();
                fresh.search = match_search;
                fresh.loader_deps = loader_deps;
                fresh.preload = options.preload;
                fresh
            }
        };

        route_match.index = index;
        route_match.pathname = match_pathname;
        route_match.cause = cause;
        route_match.params_error = param_errors[index].clone();
        route_match.search_error = search_error;
        route_match.global_not_found = branch.not_found == Some(route);
        matches.push(route_match);
    }

    tracing::debug!(
        pathname,
        matches = matches.len(),
        not_found = branch.not_found.is_some(),
        "Resolved route matches"
    );

    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::tree::RouteDef;
    use serde_json::json;

    fn tree() -> RouteTree {
        RouteTree::build(RouteDef::root().children([
            RouteDef::new("/"),
            RouteDef::new("teams").children([
                RouteDef::new("/"),
                RouteDef::new("$teamId")
                    .parse_params(|p| {
                        let raw = p.get("teamId").and_then(Value::as_str).unwrap_or_default();
                        raw.parse::<i64>()
                            .map(|n| Value::object().with("teamId", n))
                            .map_err(|e| e.to_string())
                    })
                    .child(RouteDef::new("settings")),
            ]),
            RouteDef::new("docs").not_found_handler().child(RouteDef::new("$page")),
        ]))
        .unwrap()
    }

    fn ids(matches: &[RouteMatch]) -> Vec<&str> {
        matches.iter().map(|m| m.route_id.as_str()).collect()
    }

    #[test]
    fn test_resolves_deepest_branch() {
        let tree = tree();
        let state = RouterState::default();
        let matches = match_routes(&tree, &RouterConfig::default(), &state, "/teams/5/settings", &Value::object(), Default::default()).unwrap();
        assert_eq!(ids(&matches), vec!["__root__", "/teams", "/teams/$teamId", "/teams/$teamId/settings"]);
        assert_eq!(matches[2].params.get("teamId"), Some(&Value::from(5i64)));
        assert_eq!(matches[2].id, "/teams/$teamId5");
        assert_eq!(matches[2].pathname, "/teams/5");
        assert!(matches.iter().all(|m| !m.global_not_found));
    }

    #[test]
    fn test_index_route_resolves_parent_path() {
        let tree = tree();
        let matches = match_routes(&tree, &RouterConfig::default(), &RouterState::default(), "/teams", &Value::object(), Default::default()).unwrap();
        assert_eq!(ids(&matches), vec!["__root__", "/teams", "/teams/"]);
    }

    #[test]
    fn test_param_errors_are_isolated() {
        let tree = tree();
        let matches = match_routes(&tree, &RouterConfig::default(), &RouterState::default(), "/teams/abc/settings", &Value::object(), Default::default()).unwrap();
        assert!(matches[2].params_error.is_some());
        assert!(matches[1].params_error.is_none());
        assert!(matches[3].params_error.is_none());

        let thrown = match_routes(
            &tree,
            &RouterConfig::default(),
            &RouterState::default(),
            "/teams/abc",
            &Value::object(),
            MatchRoutesOptions { throw_on_error: true, ..Default::default() },
        );
        assert!(matches!(thrown, Err(RouteError::ParamParse { .. })));
    }

    #[test]
    fn test_unmatched_remainder_attributed_fuzzy() {
        let tree = tree();
        let branch = resolve_branch(&tree, &RouterConfig::default(), "/teams/5/settings/extra");
        let owner = tree.node(branch.not_found.unwrap());
        assert_eq!(owner.id, "/teams/$teamId");

        let branch = resolve_branch(&tree, &RouterConfig::default(), "/docs/intro/more");
        assert_eq!(tree.node(branch.not_found.unwrap()).id, "/docs");
    }

    #[test]
    fn test_unmatched_remainder_attributed_root_mode() {
        let tree = tree();
        let config = RouterConfig { not_found_mode: NotFoundMode::Root, ..Default::default() };
        let branch = resolve_branch(&tree, &config, "/docs/intro/more");
        assert_eq!(branch.not_found, Some(tree.root_id()));
    }

    #[test]
    fn test_nothing_matched_flags_root() {
        let tree = tree();
        let matches = match_routes(&tree, &RouterConfig::default(), &RouterState::default(), "/nowhere", &Value::object(), Default::default()).unwrap();
        assert_eq!(ids(&matches), vec!["__root__"]);
        assert!(matches[0].global_not_found);
    }

    #[test]
    fn test_search_validation_cascades() {
        let tree = RouteTree::build(
            RouteDef::root()
                .validate_search(|s| Ok(Value::object().with("theme", s.get("theme").cloned().unwrap_or(Value::from("light")))))
                .child(RouteDef::new("list").validate_search(|s| match s.get("page") {
                    Some(p) if p.as_i64().is_some() => Ok(Value::object().with("page", p.clone())),
                    _ => Err("page must be a number".to_string()),
                })),
        )
        .unwrap();
        let search = Value::from(json!({"page": 2}));
        let matches = match_routes(&tree, &RouterConfig::default(), &RouterState::default(), "/list", &search, Default::default()).unwrap();
        assert_eq!(matches[1].search.to_json(), json!({"page": 2, "theme": "light"}));

        let bad = Value::from(json!({"page": "x"}));
        let matches = match_routes(&tree, &RouterConfig::default(), &RouterState::default(), "/list", &bad, Default::default()).unwrap();
        assert!(matches[1].search_error.is_some());
        assert_eq!(matches[1].search.get("theme"), Some(&Value::from("light")));
    }

    #[test]
    fn test_loader_deps_extend_match_id() {
        let tree = RouteTree::build(
            RouteDef::root().child(RouteDef::new("posts").loader_deps(|s| Value::object().with("page", s.get("page").cloned().unwrap_or(Value::Null)))),
        )
        .unwrap();
        let search = Value::from(json!({"page": 3}));
        let matches = match_routes(&tree, &RouterConfig::default(), &RouterState::default(), "/posts", &search, Default::default()).unwrap();
        assert_eq!(matches[1].id, "/posts{\"page\":3}");
    }
}
