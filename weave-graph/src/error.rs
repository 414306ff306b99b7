//! Graph error types

use thiserror::Error;

/// Type alias for graph results
pub type Result<T> = std::result::Result<T, GraphError>;

/// Single-fault error record produced by a dependency check
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A dependency name does not correspond to any resource in the graph
    #[error("Resource not found: {name}")]
    NotFound {
        /// The missing resource name
        name: String,
    },

    /// The traversal reached a resource already on the recursion stack
    #[error("Circular dependency detected at: {name}")]
    Circular {
        /// The resource that closed the cycle
        name: String,
    },
}

impl GraphError {
    /// Numeric error code: 1 for a missing resource, 2 for a cycle
    pub fn code(&self) -> u8 {
        match self {
            GraphError::NotFound { .. } => 1,
            GraphError::Circular { .. } => 2,
        }
    }

    /// Name of the resource the error refers to
    pub fn name(&self) -> &str {
        match self {
            GraphError::NotFound { name } | GraphError::Circular { name } => name,
        }
    }
}
