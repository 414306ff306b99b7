//! Named dependency graphs for the Weave engine
//!
//! This crate provides the generic graph structure used by the engine for
//! both modules and services:
//! - Resources identified by unique names
//! - Ordered dependency edges, resolved lazily by name
//! - Circular dependency detection
//! - Deterministic, dependencies-first resolution orders

pub mod error;
pub mod graph;

pub use error::{GraphError, Result};
pub use graph::{DependencyGraph, Node};
