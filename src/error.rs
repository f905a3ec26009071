//! Error taxonomy.
//!
//! Two families live here: control-flow signals and failures raised by route
//! callbacks ([`LoadError`], carrying [`Redirect`] and [`NotFound`]), and the
//! per-match errors the engine records ([`RouteError`]). Tree construction and
//! router misuse have their own enums.

use crate::config::validation::ValidationError;
use crate::value::Value;
use thiserror::Error;

/// Instruction to navigate somewhere else instead of finishing the current load.
#[derive(Debug, Clone, PartialEq)]
pub struct Redirect {
    pub to: String,
    pub from: Option<String>,
    pub params: Option<Value>,
    pub search: Option<Value>,
    pub hash: Option<String>,
    /// Replace the current history entry. Redirects replace unless told otherwise.
    pub replace: bool,
    pub status: u16,
}

impl Redirect {
    pub fn to(to: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            from: None,
            params: None,
            search: None,
            hash: None,
            replace: true,
            status: 307,
        }
    }

    pub fn from_path(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    pub fn params(mut self, params: impl Into<Value>) -> Self {
        self.params = Some(params.into());
        self
    }

    pub fn search(mut self, search: impl Into<Value>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn push(mut self) -> Self {
        self.replace = false;
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }
}

/// Signal that some part of the requested location does not exist.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NotFound {
    /// Route that should handle it. Defaults to the raising route.
    pub route_id: Option<String>,
    /// Raised by the resolver because the pathname had unmatched segments.
    pub global: bool,
    pub data: Option<Value>,
}

impl NotFound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, route_id: impl Into<String>) -> Self {
        self.route_id = Some(route_id.into());
        self
    }

    pub fn data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }
}

/// What a guard, loader or error hook may return instead of a value.
#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("redirect to {}", .0.to)]
    Redirect(Redirect),

    #[error("not found")]
    NotFound(NotFound),

    #[error("{0}")]
    Failed(String),
}

impl LoadError {
    pub fn failed(message: impl std::fmt::Display) -> Self {
        LoadError::Failed(message.to_string())
    }

    pub fn redirect(to: impl Into<String>) -> Self {
        LoadError::Redirect(Redirect::to(to))
    }

    pub fn not_found() -> Self {
        LoadError::NotFound(NotFound::new())
    }
}

impl From<Redirect> for LoadError {
    fn from(redirect: Redirect) -> Self {
        LoadError::Redirect(redirect)
    }
}

impl From<NotFound> for LoadError {
    fn from(not_found: NotFound) -> Self {
        LoadError::NotFound(not_found)
    }
}

/// Which callback produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Guard,
    Loader,
}

/// Error recorded on a route match.
#[derive(Debug, Clone, Error)]
pub enum RouteError {
    #[error("invalid params for route {route_id}: {message}")]
    ParamParse { route_id: String, message: String },

    #[error("invalid search for route {route_id}: {message}")]
    SearchValidation { route_id: String, message: String },

    #[error("guard for route {route_id} failed: {message}")]
    Guard { route_id: String, message: String },

    #[error("loader for route {route_id} failed: {message}")]
    Loader { route_id: String, message: String },

    #[error("guard for route {route_id} was cancelled")]
    Cancelled { route_id: String },

    #[error("redirect to {}", .0.to)]
    Redirect(Redirect),

    #[error("not found")]
    NotFound(NotFound),
}

impl RouteError {
    /// Attach a route id to a callback failure.
    pub fn from_load(route_id: &str, phase: Phase, err: LoadError) -> Self {
        match err {
            LoadError::Redirect(r) => RouteError::Redirect(r),
            LoadError::NotFound(n) => RouteError::NotFound(n),
            LoadError::Failed(message) => match phase {
                Phase::Guard => RouteError::Guard {
                    route_id: route_id.to_string(),
                    message,
                },
                Phase::Loader => RouteError::Loader {
                    route_id: route_id.to_string(),
                    message,
                },
            },
        }
    }

    pub fn route_id(&self) -> Option<&str> {
        match self {
            RouteError::ParamParse { route_id, .. }
            | RouteError::SearchValidation { route_id, .. }
            | RouteError::Guard { route_id, .. }
            | RouteError::Loader { route_id, .. }
            | RouteError::Cancelled { route_id } => Some(route_id),
            RouteError::NotFound(n) => n.route_id.as_deref(),
            RouteError::Redirect(_) => None,
        }
    }

    pub fn is_redirect(&self) -> bool {
        matches!(self, RouteError::Redirect(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RouteError::NotFound(_))
    }
}

/// Errors building a route tree.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TreeError {
    #[error("duplicate route id: {0}")]
    DuplicateId(String),

    #[error("route declares both id {id:?} and path {path:?}")]
    IdAndPath { id: String, path: String },

    #[error("route under {parent} declares neither id nor path")]
    MissingPath { parent: String },
}

/// Errors surfaced by the router handle.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("invalid router configuration: {}", format_validation(.0))]
    Config(Vec<ValidationError>),

    #[error("refusing to navigate to external url: {0}")]
    ExternalUrl(String),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error("navigation blocked")]
    Blocked,
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
