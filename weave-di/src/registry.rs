//! Service and module bookkeeping
//!
//! Both registries only associate names with descriptors. All resolution
//! happens in the engine.

use rustc_hash::FxHashMap;
use tracing::debug;
use weave_graph::DependencyGraph;

use crate::error::{DiError, DiResult};
use crate::service::{BuildType, ServiceDescriptor, ServiceInfo};

/// Reject empty names and names containing whitespace
pub(crate) fn validate_name(owner: &str, name: &str) -> DiResult<()> {
    if name.is_empty() {
        return Err(DiError::InvalidDependencyList {
            owner: owner.to_string(),
            reason: "empty name".to_string(),
        });
    }
    if name.chars().any(char::is_whitespace) {
        return Err(DiError::InvalidDependencyList {
            owner: owner.to_string(),
            reason: format!("name contains whitespace: {:?}", name),
        });
    }
    Ok(())
}

pub(crate) fn validate_dependencies(owner: &str, dependencies: &[String]) -> DiResult<()> {
    dependencies
        .iter()
        .try_for_each(|dep| validate_name(owner, dep))
}

#[derive(Debug)]
struct RegisteredService {
    descriptor: ServiceDescriptor,
    module: String,
}

/// Build type and factory of every service that has been loaded
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: FxHashMap<String, RegisteredService>,
}

impl ServiceRegistry {
    /// Create a new service registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor owned by `module`, returning the one it replaces
    pub fn register(
        &mut self,
        module: &str,
        descriptor: ServiceDescriptor,
    ) -> Option<ServiceDescriptor> {
        debug!(
            "Registering {} service {} from module {}",
            descriptor.build_type, descriptor.name, module
        );
        self.services
            .insert(
                descriptor.name.clone(),
                RegisteredService {
                    descriptor,
                    module: module.to_string(),
                },
            )
            .map(|previous| previous.descriptor)
    }

    pub fn get(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services.get(name).map(|s| &s.descriptor)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn build_type(&self, name: &str) -> Option<BuildType> {
        self.get(name).map(|d| d.build_type)
    }

    /// Summary of a registered service
    pub fn info(&self, name: &str) -> Option<ServiceInfo> {
        self.services.get(name).map(|s| ServiceInfo {
            name: s.descriptor.name.clone(),
            build_type: s.descriptor.build_type,
            dependencies: s.descriptor.dependencies.clone(),
            module: s.module.clone(),
        })
    }

    pub fn remove(&mut self, name: &str) -> Option<ServiceDescriptor> {
        self.services.remove(name).map(|s| s.descriptor)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn clear(&mut self) {
        self.services.clear();
    }
}

/// Services declared by a module that has not been loaded yet
#[derive(Debug, Default)]
pub struct ModuleDescriptor {
    pub dependencies: Vec<String>,
    pub services: Vec<ServiceDescriptor>,
}

/// Module descriptors awaiting load
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: FxHashMap<String, ModuleDescriptor>,
}

impl ModuleRegistry {
    /// Create a new module registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or fetch a module and record its dependency edges in `graph`
    pub fn define_module(
        &mut self,
        name: &str,
        dependencies: Vec<String>,
        graph: &mut DependencyGraph,
    ) -> DiResult<()> {
        validate_name(name, name)?;
        validate_dependencies(name, &dependencies)?;

        debug!("Defining module {} depending on {:?}", name, dependencies);
        graph.add_dependencies(name, dependencies.iter().cloned());
        self.modules
            .entry(name.to_string())
            .or_default()
            .dependencies
            .extend(dependencies);
        Ok(())
    }

    /// Append a service descriptor to a module, creating the module if needed
    pub fn declare_service(&mut self, module: &str, descriptor: ServiceDescriptor) -> DiResult<()> {
        validate_name(module, &descriptor.name)?;
        validate_dependencies(&descriptor.name, &descriptor.dependencies)?;

        self.modules
            .entry(module.to_string())
            .or_default()
            .services
            .push(descriptor);
        Ok(())
    }

    /// Remove a module's descriptor, handing its services over to the caller
    pub fn take_services(&mut self, module: &str) -> Vec<ServiceDescriptor> {
        self.modules
            .remove(module)
            .map(|m| m.services)
            .unwrap_or_default()
    }

    /// Services declared on a module that has not been loaded yet
    pub fn services(&self, module: &str) -> &[ServiceDescriptor] {
        self.modules
            .get(module)
            .map(|m| m.services.as_slice())
            .unwrap_or_default()
    }

    pub fn contains(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    pub fn dependencies(&self, module: &str) -> &[String] {
        self.modules
            .get(module)
            .map(|m| m.dependencies.as_slice())
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.modules.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::unit;

    fn descriptor(name: &str, deps: &[&str]) -> ServiceDescriptor {
        ServiceDescriptor::new(
            name,
            BuildType::Singleton,
            deps.iter().map(|d| d.to_string()).collect(),
            |_| Ok(unit()),
        )
    }

    #[test]
    fn test_define_module_records_edges() {
        let mut graph = DependencyGraph::new();
        let mut modules = ModuleRegistry::new();

        modules
            .define_module("b", vec!["a".into()], &mut graph)
            .unwrap();
        assert!(modules.contains("b"));
        assert_eq!(modules.dependencies("b"), ["a"]);
        assert_eq!(graph.dependencies("b"), ["a"]);
        assert!(!graph.is_resource("a"));
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let mut graph = DependencyGraph::new();
        let mut modules = ModuleRegistry::new();

        let err = modules
            .define_module("m", vec!["".into()], &mut graph)
            .unwrap_err();
        assert!(matches!(err, DiError::InvalidDependencyList { .. }));
        assert!(graph.is_empty());

        let err = modules
            .declare_service("m", descriptor("svc", &["has space"]))
            .unwrap_err();
        assert!(matches!(err, DiError::InvalidDependencyList { .. }));
        assert!(modules.take_services("m").is_empty());
    }

    #[test]
    fn test_take_services_discards_descriptor() {
        let mut modules = ModuleRegistry::new();
        modules.declare_service("m", descriptor("one", &[])).unwrap();
        modules.declare_service("m", descriptor("two", &["one"])).unwrap();

        let services = modules.take_services("m");
        assert_eq!(services.len(), 2);
        assert_eq!(services[1].dependencies, ["one"]);
        assert!(!modules.contains("m"));
    }

    #[test]
    fn test_service_registry_replacement() {
        let mut services = ServiceRegistry::new();
        assert!(services.register("m", descriptor("svc", &[])).is_none());
        assert!(services.register("n", descriptor("svc", &["x"])).is_some());

        let info = services.info("svc").unwrap();
        assert_eq!(info.module, "n");
        assert_eq!(info.dependencies, ["x"]);
        assert_eq!(services.build_type("svc"), Some(BuildType::Singleton));
        assert_eq!(services.len(), 1);
    }
}
