//! Error types for the DI engine

use std::fmt;
use thiserror::Error;
use weave_graph::GraphError;

/// Result type alias for DI operations
pub type DiResult<T> = Result<T, DiError>;

/// Which graph an error originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Module,
    Service,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Module => write!(f, "Module"),
            ResourceKind::Service => write!(f, "Service"),
        }
    }
}

/// Errors that can occur during DI operations
#[derive(Error, Debug)]
pub enum DiError {
    /// A referenced name does not correspond to any registered resource
    #[error("{kind} not found: {name} (while resolving {requested})")]
    ResourceNotFound {
        kind: ResourceKind,
        /// The missing name
        name: String,
        /// The module or service that was requested
        requested: String,
    },

    /// Resolution revisited a resource already on the recursion stack
    #[error("Circular {kind} dependency detected at {name} (while resolving {requested})")]
    CircularDependency {
        kind: ResourceKind,
        /// The resource at which the cycle was detected
        name: String,
        requested: String,
    },

    /// A name supplied at registration time is malformed
    #[error("Invalid dependency list for {owner}: {reason}")]
    InvalidDependencyList { owner: String, reason: String },

    /// A factory returned an error
    #[error("Failed to create service: {service}")]
    ServiceCreationFailed {
        service: String,
        #[source]
        source: anyhow::Error,
    },

    /// A resolved instance is not of the requested type
    #[error("Service {service} is not of type {expected}")]
    TypeMismatch {
        service: String,
        expected: &'static str,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl DiError {
    /// Map a graph check failure onto the engine taxonomy
    pub(crate) fn from_graph(kind: ResourceKind, requested: &str, err: GraphError) -> Self {
        match err {
            GraphError::NotFound { name } => DiError::ResourceNotFound {
                kind,
                name,
                requested: requested.to_string(),
            },
            GraphError::Circular { name } => DiError::CircularDependency {
                kind,
                name,
                requested: requested.to_string(),
            },
        }
    }

    /// Whether this is a missing module or service
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiError::ResourceNotFound { .. })
    }

    /// Whether this is a dependency cycle
    pub fn is_circular(&self) -> bool {
        matches!(self, DiError::CircularDependency { .. })
    }
}
