//! Path resolution and interpolation.
//!
//! # Responsibilities
//! - Strip a configured basepath from pathnames
//! - Resolve a relative destination (`.`, `..`, absolute) against a base
//! - Fill a route template with param values
//!
//! # Design Decisions
//! - Param values are percent-encoded as URI components; the splat keeps `/`
//! - With `leave_params` the placeholder is kept and the value appended, which
//!   gives every concrete match a unique, reversible-enough identity

use crate::routing::segment::{join_paths, parse_pathname, SegmentKind};
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// Policy for a trailing `/` on resolved paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrailingSlash {
    #[default]
    Never,
    Always,
    Preserve,
}

/// Remove `basepath` from the front of `pathname`.
///
/// Only strips on a segment boundary; an exact match yields `""`.
pub fn remove_basepath<'a>(basepath: &str, pathname: &'a str, case_sensitive: bool) -> &'a str {
    if basepath == "/" || basepath.is_empty() {
        return pathname;
    }
    let (Some(head), Some(rest)) = (pathname.get(..basepath.len()), pathname.get(basepath.len()..))
    else {
        return pathname;
    };
    let prefixed = if case_sensitive {
        head == basepath
    } else {
        head.eq_ignore_ascii_case(basepath)
    };
    if !prefixed {
        return pathname;
    }
    if rest.is_empty() {
        return "";
    }
    if !rest.starts_with('/') {
        return pathname;
    }
    rest
}

/// Resolve `to` relative to `base`, re-joined under `basepath`.
pub fn resolve_path(basepath: &str, base: &str, to: &str, trailing_slash: TrailingSlash) -> String {
    let base = remove_basepath(basepath, base, false);
    let to = remove_basepath(basepath, to, false);

    let mut segments = parse_pathname(base);
    if segments.len() > 1 && segments.last().is_some_and(|s| s.is_slash()) {
        segments.pop();
    }

    let to_segments = parse_pathname(to);
    let last = to_segments.len().saturating_sub(1);
    for (index, segment) in to_segments.into_iter().enumerate() {
        if segment.is_slash() {
            if index == 0 {
                segments = vec![segment];
            } else if index == last {
                segments.push(segment);
            }
        } else if segment.value == ".." {
            segments.pop();
        } else if segment.value == "." {
            continue;
        } else {
            segments.push(segment);
        }
    }

    if segments.len() > 1 {
        let ends_with_slash = segments.last().is_some_and(|s| s.is_slash());
        match trailing_slash {
            TrailingSlash::Never if ends_with_slash => {
                segments.pop();
            }
            TrailingSlash::Always if !ends_with_slash => {
                segments.push(crate::routing::segment::Segment::slash());
            }
            _ => {}
        }
    }

    let joined = join_paths(
        std::iter::once(basepath).chain(segments.iter().map(|s| s.value.as_str())),
    );
    if joined.is_empty() {
        "/".to_string()
    } else {
        joined
    }
}

/// Result of [`interpolate_path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpolated {
    pub path: String,
    /// A param or splat had no value.
    pub missing_params: bool,
}

/// Options for [`interpolate_path`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpolateOptions {
    pub leave_wildcards: bool,
    pub leave_params: bool,
}

/// Substitute params into a route template.
pub fn interpolate_path(template: &str, params: &Value, options: InterpolateOptions) -> Interpolated {
    if template.is_empty() {
        return Interpolated {
            path: "/".to_string(),
            missing_params: false,
        };
    }

    let mut missing_params = false;
    let parts: Vec<String> = parse_pathname(template)
        .into_iter()
        .map(|segment| match segment.kind {
            SegmentKind::Wildcard => {
                let splat = params
                    .get("_splat")
                    .or_else(|| params.get("*"))
                    .and_then(Value::to_path_string);
                if splat.is_none() {
                    missing_params = true;
                }
                let encoded = splat.map(|s| encode_uri(&s)).unwrap_or_default();
                if options.leave_wildcards {
                    format!("{}{}", segment.value, encoded)
                } else {
                    encoded
                }
            }
            SegmentKind::Param => {
                let value = params
                    .get(segment.param_name())
                    .and_then(Value::to_path_string)
                    .map(|v| urlencoding::encode(&v).into_owned());
                if value.is_none() {
                    missing_params = true;
                }
                if options.leave_params {
                    format!("{}{}", segment.value, value.unwrap_or_default())
                } else {
                    value.unwrap_or_else(|| segment.value.clone())
                }
            }
            SegmentKind::Static => segment.value,
        })
        .collect();

    let path = join_paths(parts);
    Interpolated {
        path: if path.is_empty() { "/".to_string() } else { path },
        missing_params,
    }
}

/// Percent-encode each component of a `/`-separated value, keeping the slashes.
pub fn encode_uri(value: &str) -> String {
    value
        .split('/')
        .map(|part| urlencoding::encode(part).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Percent-decode, falling back to the raw text on invalid UTF-8.
pub fn decode_uri(value: &str) -> String {
    urlencoding::decode(value)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve(base: &str, to: &str) -> String {
        resolve_path("/", base, to, TrailingSlash::Never)
    }

    #[test]
    fn test_remove_basepath_boundaries() {
        assert_eq!(remove_basepath("/app", "/app/users", false), "/users");
        assert_eq!(remove_basepath("/app", "/app", false), "");
        assert_eq!(remove_basepath("/app", "/apple", false), "/apple");
        assert_eq!(remove_basepath("/app", "/ap", false), "/ap");
        assert_eq!(remove_basepath("/", "/x", false), "/x");
        assert_eq!(remove_basepath("/App", "/app/x", true), "/app/x");
    }

    #[test]
    fn test_resolve_relative_segments() {
        assert_eq!(resolve("/a/b", "c"), "/a/b/c");
        assert_eq!(resolve("/a/b", "../c"), "/a/c");
        assert_eq!(resolve("/a/b", "./c"), "/a/b/c");
        assert_eq!(resolve("/a/b", "/x"), "/x");
        assert_eq!(resolve("/a/b", "."), "/a/b");
        assert_eq!(resolve("/a/b", ""), "/a/b");
        assert_eq!(resolve("/", ".."), "/");
    }

    #[test]
    fn test_resolve_trailing_slash_policy() {
        assert_eq!(resolve_path("/", "/a", "b/", TrailingSlash::Never), "/a/b");
        assert_eq!(resolve_path("/", "/a", "b/", TrailingSlash::Preserve), "/a/b/");
        assert_eq!(resolve_path("/", "/a", "b", TrailingSlash::Always), "/a/b/");
        assert_eq!(resolve_path("/", "/", "/", TrailingSlash::Always), "/");
    }

    #[test]
    fn test_resolve_under_basepath() {
        assert_eq!(resolve_path("/app", "/app/a", "b", TrailingSlash::Never), "/app/a/b");
        assert_eq!(resolve_path("/app", "/app/a", "/c", TrailingSlash::Never), "/app/c");
    }

    #[test]
    fn test_interpolate_encodes_values() {
        let params = Value::from(json!({"teamId": "a b", "_splat": "x y/z"}));
        let out = interpolate_path("/teams/$teamId/files/$", &params, InterpolateOptions::default());
        assert_eq!(out.path, "/teams/a%20b/files/x%20y/z");
        assert!(!out.missing_params);
    }

    #[test]
    fn test_interpolate_leave_params_appends_value() {
        let params = Value::from(json!({"teamId": 5}));
        let out = interpolate_path(
            "/teams/$teamId",
            &params,
            InterpolateOptions { leave_params: true, ..Default::default() },
        );
        assert_eq!(out.path, "/teams/$teamId5");
    }

    #[test]
    fn test_interpolate_reports_missing() {
        let out = interpolate_path("/teams/$teamId", &Value::object(), InterpolateOptions::default());
        assert!(out.missing_params);
        assert_eq!(out.path, "/teams/$teamId");
    }
}
