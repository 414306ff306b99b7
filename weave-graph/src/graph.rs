//! Dependency graph and resolution order

use crate::error::{GraphError, Result};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

/// A named resource and its direct dependencies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    dependencies: Vec<String>,
}

impl Node {
    fn new(name: String) -> Self {
        Self {
            name,
            dependencies: Vec::new(),
        }
    }

    /// The resource name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Direct dependency names in declaration order
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }
}

/// Outcome of the most recent `run_dependency_check`
#[derive(Debug, Clone, Default)]
struct CheckOutcome {
    order: Vec<String>,
    error: Option<GraphError>,
}

/// Per-traversal markers. They never outlive a single check.
#[derive(Default)]
struct Traversal<'g> {
    on_stack: FxHashSet<&'g str>,
    processed: FxHashSet<&'g str>,
    order: Vec<String>,
}

/// Directed graph mapping resource names to their direct dependency names
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: FxHashMap<String, Node>,
    /// Resource names in registration order
    registration: Vec<String>,
    last_check: CheckOutcome,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a resource exists. Existing edges are left untouched.
    ///
    /// Returns `true` if the resource was newly created.
    pub fn add_resource(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.nodes.contains_key(&name) {
            return false;
        }
        trace!("Adding resource: {}", name);
        self.registration.push(name.clone());
        self.nodes.insert(name.clone(), Node::new(name));
        true
    }

    /// Append dependency edges to `name`, creating it if absent.
    ///
    /// Targets are recorded by name only; their existence is checked when a
    /// resolution runs.
    pub fn add_dependencies<I, S>(&mut self, name: &str, dependencies: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_resource(name);
        if let Some(node) = self.nodes.get_mut(name) {
            node.dependencies
                .extend(dependencies.into_iter().map(Into::into));
        }
    }

    /// Drop every dependency edge of `name`
    pub fn clear_dependencies(&mut self, name: &str) {
        if let Some(node) = self.nodes.get_mut(name) {
            node.dependencies.clear();
        }
    }

    /// Remove a resource. Edges from other resources that point at it are
    /// kept and will fail resolution as not found.
    pub fn remove_resource(&mut self, name: &str) -> Option<Node> {
        let node = self.nodes.remove(name)?;
        self.registration.retain(|n| n != name);
        Some(node)
    }

    /// Membership test
    pub fn is_resource(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Look up a resource
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    /// Direct dependencies of `name`, empty when it has none or is unknown
    pub fn dependencies(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(Node::dependencies)
            .unwrap_or_default()
    }

    /// Resources that directly depend on `name`, in registration order
    pub fn dependents(&self, name: &str) -> Vec<&str> {
        self.resources()
            .filter(|candidate| {
                self.dependencies(candidate)
                    .iter()
                    .any(|dep| dep == name)
            })
            .collect()
    }

    /// Resource names in registration order
    pub fn resources(&self) -> impl Iterator<Item = &str> {
        self.registration.iter().map(String::as_str)
    }

    /// Number of resources
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no resources
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Compute the resolution order of `root` and its transitive dependencies.
    ///
    /// Every dependency appears before its dependents. The first missing
    /// resource or cycle aborts the traversal.
    ///
    /// The traversal recurses once per edge, so the longest dependency chain
    /// is bounded by the calling thread's stack size.
    pub fn resolution_order(&self, root: &str) -> Result<Vec<String>> {
        let mut traversal = Traversal::default();
        self.visit(root, &mut traversal)?;
        debug!(
            "Resolved {} resource(s) for {}",
            traversal.order.len(),
            root
        );
        Ok(traversal.order)
    }

    /// Topological order of the whole graph; registration order breaks ties
    pub fn full_order(&self) -> Result<Vec<String>> {
        let mut traversal = Traversal::default();
        for name in &self.registration {
            self.visit(name, &mut traversal)?;
        }
        Ok(traversal.order)
    }

    /// Run a dependency check rooted at `root` and remember its outcome.
    ///
    /// The outcome is available through [`dependency_error`] and
    /// [`resolve_order`] until the next check or reset.
    ///
    /// [`dependency_error`]: DependencyGraph::dependency_error
    /// [`resolve_order`]: DependencyGraph::resolve_order
    pub fn run_dependency_check(&mut self, root: &str) -> Result<&[String]> {
        match self.resolution_order(root) {
            Ok(order) => {
                self.last_check = CheckOutcome { order, error: None };
                Ok(&self.last_check.order)
            }
            Err(err) => {
                debug!("Dependency check for {} failed: {}", root, err);
                self.last_check = CheckOutcome {
                    order: Vec::new(),
                    error: Some(err.clone()),
                };
                Err(err)
            }
        }
    }

    /// Error from the most recent check, if any
    pub fn dependency_error(&self) -> Option<&GraphError> {
        self.last_check.error.as_ref()
    }

    /// Order produced by the most recent successful check
    pub fn resolve_order(&self) -> &[String] {
        &self.last_check.order
    }

    /// Forget the outcome of the most recent check
    pub fn reset_dependency_check(&mut self) {
        self.last_check = CheckOutcome::default();
    }

    fn visit<'g>(&'g self, name: &str, traversal: &mut Traversal<'g>) -> Result<()> {
        let node = self.nodes.get(name).ok_or_else(|| GraphError::NotFound {
            name: name.to_string(),
        })?;
        let name = node.name.as_str();

        if traversal.on_stack.contains(name) {
            return Err(GraphError::Circular {
                name: name.to_string(),
            });
        }
        if traversal.processed.contains(name) {
            return Ok(());
        }

        trace!("Visiting resource: {}", name);
        traversal.on_stack.insert(name);
        for dep in &node.dependencies {
            self.visit(dep, traversal)?;
        }
        traversal.on_stack.remove(name);
        traversal.processed.insert(name);
        traversal.order.push(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &[&str])]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for (name, deps) in edges {
            graph.add_dependencies(name, deps.iter().copied());
        }
        graph
    }

    #[test]
    fn test_leaf_resolves_to_itself() {
        let mut graph = graph(&[("a", &[])]);
        let order = graph.run_dependency_check("a").unwrap();
        assert_eq!(order, ["a"]);
        assert!(graph.dependency_error().is_none());
    }

    #[test]
    fn test_chain_order() {
        let graph = graph(&[("a", &["b"]), ("b", &["c"]), ("c", &[])]);
        assert_eq!(graph.resolution_order("a").unwrap(), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_order_restricted_to_closure() {
        let graph = graph(&[("a", &["b"]), ("b", &[]), ("unrelated", &[])]);
        let order = graph.resolution_order("a").unwrap();
        assert_eq!(order, vec!["b", "a"]);
    }

    #[test]
    fn test_diamond_visits_shared_dependency_once() {
        let graph = graph(&[
            ("app", &["left", "right"]),
            ("left", &["base"]),
            ("right", &["base"]),
            ("base", &[]),
        ]);
        let order = graph.resolution_order("app").unwrap();
        assert_eq!(order, vec!["base", "left", "right", "app"]);
    }

    #[test]
    fn test_duplicate_edges_are_tolerated() {
        let graph = graph(&[("a", &["b", "b"]), ("b", &[])]);
        assert_eq!(graph.resolution_order("a").unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn test_self_reference_is_circular() {
        let mut graph = graph(&[("a", &["a"])]);
        let err = graph.run_dependency_check("a").unwrap_err();
        assert_eq!(err, GraphError::Circular { name: "a".into() });
        assert_eq!(err.code(), 2);
        assert_eq!(graph.dependency_error(), Some(&err));
        assert!(graph.resolve_order().is_empty());
    }

    #[test]
    fn test_cycle_names_closing_node() {
        let graph = graph(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        let err = graph.resolution_order("a").unwrap_err();
        assert_eq!(err, GraphError::Circular { name: "a".into() });
    }

    #[test]
    fn test_missing_dependency() {
        let mut graph = graph(&[("s", &["t"])]);
        let err = graph.run_dependency_check("s").unwrap_err();
        assert_eq!(err, GraphError::NotFound { name: "t".into() });
        assert_eq!(err.code(), 1);
        assert_eq!(err.name(), "t");
    }

    #[test]
    fn test_missing_root() {
        let graph = DependencyGraph::new();
        let err = graph.resolution_order("ghost").unwrap_err();
        assert_eq!(err, GraphError::NotFound { name: "ghost".into() });
    }

    #[test]
    fn test_add_resource_keeps_edges() {
        let mut graph = graph(&[("a", &["b"])]);
        assert!(!graph.add_resource("a"));
        assert_eq!(graph.dependencies("a"), ["b"]);
        assert!(graph.dependencies("unknown").is_empty());
    }

    #[test]
    fn test_reset_clears_outcome() {
        let mut graph = graph(&[("a", &["missing"])]);
        assert!(graph.run_dependency_check("a").is_err());
        graph.reset_dependency_check();
        assert!(graph.dependency_error().is_none());

        graph.add_resource("missing");
        assert_eq!(graph.run_dependency_check("a").unwrap(), ["missing", "a"]);
    }

    #[test]
    fn test_long_chain_resolves() {
        let mut graph = DependencyGraph::new();
        for i in 0..1000 {
            graph.add_dependencies(&format!("n{}", i), [format!("n{}", i + 1)]);
        }
        graph.add_resource("n1000");

        let order = graph.resolution_order("n0").unwrap();
        assert_eq!(order.len(), 1001);
        assert_eq!(order.first().map(String::as_str), Some("n1000"));
        assert_eq!(order.last().map(String::as_str), Some("n0"));
    }

    #[test]
    fn test_full_order_uses_registration_order() {
        let graph = graph(&[("z", &[]), ("y", &["x"]), ("x", &[])]);
        assert_eq!(graph.full_order().unwrap(), vec!["z", "x", "y"]);
    }

    #[test]
    fn test_dependents_and_removal() {
        let mut graph = graph(&[("a", &["c"]), ("b", &["c"]), ("c", &[])]);
        assert_eq!(graph.dependents("c"), vec!["a", "b"]);

        graph.remove_resource("c");
        assert_eq!(graph.len(), 2);
        assert_eq!(
            graph.resolution_order("a").unwrap_err(),
            GraphError::NotFound { name: "c".into() }
        );
    }
}
