//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check route declarations (id xor path, no duplicate siblings)
//! - Validate value ranges and path shapes
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EngineConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::{EngineConfig, RouteConfig, RouterConfig};
use std::collections::HashSet;
use thiserror::Error;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("basepath must start with '/': {0:?}")]
    Basepath(String),

    #[error("route at {location} declares both id and path")]
    IdAndPath { location: String },

    #[error("route at {location} declares neither id nor path")]
    MissingPath { location: String },

    #[error("duplicate route {segment:?} under {location}")]
    DuplicateRoute { location: String, segment: String },

    #[error("mask {0:?} must have absolute from/to paths")]
    Mask(String),

    #[error("pending delay must be greater than zero (omit it to disable)")]
    PendingDelay,
}

/// Validate a complete engine configuration.
pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_router(&config.router, &mut errors);
    validate_routes(&config.routes, "/", &mut errors);

    for mask in &config.masks {
        if !mask.from.starts_with('/') || !mask.to.starts_with('/') {
            errors.push(ValidationError::Mask(mask.from.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate router-wide options only.
pub fn validate_router_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    validate_router(config, &mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_router(config: &RouterConfig, errors: &mut Vec<ValidationError>) {
    if !config.basepath.starts_with('/') {
        errors.push(ValidationError::Basepath(config.basepath.clone()));
    }
    if config.default_pending_ms == Some(0) {
        errors.push(ValidationError::PendingDelay);
    }
}

fn validate_routes(routes: &[RouteConfig], location: &str, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();

    for route in routes {
        let segment = match (&route.path, &route.id) {
            (Some(_), Some(_)) => {
                errors.push(ValidationError::IdAndPath {
                    location: location.to_string(),
                });
                continue;
            }
            (None, None) => {
                errors.push(ValidationError::MissingPath {
                    location: location.to_string(),
                });
                continue;
            }
            (Some(path), None) => path.clone(),
            (None, Some(id)) => id.clone(),
        };

        if !seen.insert(segment.clone()) {
            errors.push(ValidationError::DuplicateRoute {
                location: location.to_string(),
                segment: segment.clone(),
            });
        }

        let child_location = format!("{}/{}", location.trim_end_matches('/'), segment.trim_matches('/'));
        validate_routes(&route.children, &child_location, errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteMaskConfig;

    fn route(path: Option<&str>, id: Option<&str>) -> RouteConfig {
        RouteConfig {
            path: path.map(String::from),
            id: id.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = EngineConfig::default();
        config.router.basepath = "app".to_string();
        config.routes = vec![
            route(Some("a"), Some("x")),
            route(None, None),
            route(Some("b"), None),
            route(Some("b"), None),
        ];
        config.masks.push(RouteMaskConfig {
            from: "photos".into(),
            to: "/p".into(),
            unmask_on_reload: None,
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::Basepath("app".into())));
    }

    #[test]
    fn test_nested_routes_report_location() {
        let mut parent = route(Some("teams"), None);
        parent.children = vec![route(None, None)];
        let mut config = EngineConfig::default();
        config.routes = vec![parent];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::MissingPath { location: "/teams".into() }]
        );
    }
}
