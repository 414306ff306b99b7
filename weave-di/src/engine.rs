//! Resolution engine
//!
//! The engine owns both dependency graphs, both registries, the singleton
//! cache and the set of loaded modules. Loading a module walks the module
//! graph and moves each module's services into the service graph; injecting
//! a service walks the service graph and builds dependencies bottom-up.

use rustc_hash::{FxHashMap, FxHashSet};
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};
use weave_graph::DependencyGraph;

use crate::config::EngineConfig;
use crate::error::{DiError, DiResult, ResourceKind};
use crate::registry::{validate_dependencies, validate_name, ModuleRegistry, ServiceRegistry};
use crate::service::{BuildType, Instance, ServiceDescriptor, ServiceInfo};

/// A single DI environment
#[derive(Debug, Default)]
pub struct Engine {
    config: EngineConfig,
    module_graph: DependencyGraph,
    service_graph: DependencyGraph,
    modules: ModuleRegistry,
    services: ServiceRegistry,
    singletons: FxHashMap<String, Instance>,
    loaded: FxHashSet<String>,
    /// Loaded module names in load order
    load_order: Vec<String>,
}

impl Engine {
    /// Create an engine with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Define a module, or fetch it if it already exists, and return a
    /// handle for declaring its services.
    ///
    /// Dependencies are appended to any recorded earlier and only need to
    /// exist once the module is loaded.
    ///
    /// A loaded module is never loaded again, so new dependencies passed for
    /// it are ignored with a warning.
    pub fn module(&mut self, name: &str, dependencies: &[&str]) -> DiResult<ModuleHandle<'_>> {
        let dependencies: Vec<String> = dependencies.iter().map(|d| d.to_string()).collect();
        if self.loaded.contains(name) {
            validate_name(name, name)?;
            validate_dependencies(name, &dependencies)?;
            if !dependencies.is_empty() {
                warn!(
                    "Ignoring dependencies {:?} of already loaded module {}",
                    dependencies, name
                );
            }
        } else {
            self.modules
                .define_module(name, dependencies, &mut self.module_graph)?;
        }
        Ok(ModuleHandle {
            engine: self,
            name: name.to_string(),
        })
    }

    fn declare_service(&mut self, module: &str, descriptor: ServiceDescriptor) -> DiResult<()> {
        if self.loaded.contains(module) {
            // The module's descriptor is gone, so the service goes straight in
            validate_name(module, &descriptor.name)?;
            validate_dependencies(&descriptor.name, &descriptor.dependencies)?;
            self.install_service(module, descriptor);
            Ok(())
        } else {
            self.modules.declare_service(module, descriptor)
        }
    }

    fn install_service(&mut self, module: &str, descriptor: ServiceDescriptor) {
        let name = descriptor.name.clone();
        let dependencies = descriptor.dependencies.clone();

        if self.services.register(module, descriptor).is_some() {
            warn!("Service {} redefined by module {}", name, module);
            self.service_graph.clear_dependencies(&name);
            self.singletons.remove(&name);
        }
        self.service_graph.add_dependencies(&name, dependencies);
    }

    /// Load a module together with every module it transitively depends on.
    ///
    /// Loading a module that is already loaded does nothing. Run hooks of the
    /// newly loaded modules are invoked in resolution order once all of their
    /// services are registered. The dependencies of every run hook are checked
    /// before anything is registered, so a failed check leaves the engine as
    /// it was and the load can be retried.
    pub fn load_module(&mut self, id: &str) -> DiResult<()> {
        if self.loaded.contains(id) {
            trace!("Module already loaded: {}", id);
            return Ok(());
        }

        let checked = self
            .module_graph
            .run_dependency_check(id)
            .map(<[String]>::to_vec);
        self.module_graph.reset_dependency_check();
        let order = checked.map_err(|e| DiError::from_graph(ResourceKind::Module, id, e))?;

        let newly_loaded: Vec<String> = order
            .into_iter()
            .filter(|module| !self.loaded.contains(module))
            .collect();
        self.check_run_hooks(&newly_loaded)?;

        for module in &newly_loaded {
            for descriptor in self.modules.take_services(module) {
                self.install_service(module, descriptor);
            }
            info!("Loaded module: {}", module);
            self.loaded.insert(module.clone());
            self.load_order.push(module.clone());
        }

        for module in &newly_loaded {
            let hook = self.config.run_hook(module);
            if self.service_graph.is_resource(&hook) {
                debug!("Running startup hook {}", hook);
                self.invoke(&hook)?;
            }
        }
        Ok(())
    }

    /// Check the run hooks of `batch` against the service graph as it will be
    /// once the batch's services are installed.
    fn check_run_hooks(&self, batch: &[String]) -> DiResult<()> {
        let mut pending = self.service_graph.clone();
        for module in batch {
            for descriptor in self.modules.services(module) {
                pending.clear_dependencies(&descriptor.name);
                pending.add_dependencies(&descriptor.name, descriptor.dependencies.iter().cloned());
            }
        }

        for module in batch {
            let hook = self.config.run_hook(module);
            if pending.is_resource(&hook) {
                pending
                    .resolution_order(&hook)
                    .map_err(|e| DiError::from_graph(ResourceKind::Service, &hook, e))?;
            }
        }
        Ok(())
    }

    /// Invoke the exec hook of every loaded module, in load order
    pub fn execute(&mut self) -> DiResult<()> {
        let hooks: Vec<String> = self
            .load_order
            .iter()
            .map(|module| self.config.exec_hook(module))
            .collect();
        for hook in hooks {
            if self.service_graph.is_resource(&hook) {
                debug!("Running exec hook {}", hook);
                self.invoke(&hook)?;
            }
        }
        Ok(())
    }

    /// Resolve a service and return its instance
    pub fn inject(&mut self, id: &str) -> DiResult<Instance> {
        let checked = self.service_graph.run_dependency_check(id).map(|_| ());
        self.service_graph.reset_dependency_check();
        checked.map_err(|e| DiError::from_graph(ResourceKind::Service, id, e))?;

        self.resolve(id)
    }

    /// Resolve a service and downcast it to `T`
    pub fn inject_as<T: Any + Send + Sync>(&mut self, id: &str) -> DiResult<Arc<T>> {
        self.inject(id)?
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch {
                service: id.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Resolve a service for its side effects only
    pub fn invoke(&mut self, id: &str) -> DiResult<()> {
        self.invoke_service(id, false).map(|_| ())
    }

    /// Resolve a service, returning the instance only when `want_return` is set
    pub fn invoke_service(&mut self, id: &str, want_return: bool) -> DiResult<Option<Instance>> {
        let instance = self.inject(id)?;
        Ok(want_return.then_some(instance))
    }

    /// Dependencies are resolved depth-first in declaration order and passed
    /// to the factory positionally. The caller has already checked the
    /// closure of `name` for missing services and cycles.
    ///
    /// Recursion goes one frame per edge, so the longest dependency chain is
    /// bounded by the calling thread's stack size.
    fn resolve(&mut self, name: &str) -> DiResult<Instance> {
        let dependencies = self.service_graph.dependencies(name).to_vec();
        let mut args = Vec::with_capacity(dependencies.len());
        for dep in &dependencies {
            args.push(self.resolve(dep)?);
        }
        self.instantiate(name, &args)
    }

    fn instantiate(&mut self, name: &str, args: &[Instance]) -> DiResult<Instance> {
        let descriptor = self
            .services
            .get(name)
            .ok_or_else(|| DiError::ResourceNotFound {
                kind: ResourceKind::Service,
                name: name.to_string(),
                requested: name.to_string(),
            })?;
        let build_type = descriptor.build_type;
        let factory = Arc::clone(&descriptor.factory);

        if build_type == BuildType::Singleton {
            if let Some(cached) = self.singletons.get(name) {
                return Ok(Arc::clone(cached));
            }
        }

        debug!("Instantiating {} service {}", build_type, name);
        let instance = factory(args).map_err(|source| DiError::ServiceCreationFailed {
            service: name.to_string(),
            source,
        })?;

        if build_type == BuildType::Singleton {
            self.singletons.insert(name.to_string(), Arc::clone(&instance));
        }
        Ok(instance)
    }

    /// Whether a service has been registered by a loaded module
    pub fn is_service(&self, name: &str) -> bool {
        self.services.contains(name)
    }

    pub fn service_build_type(&self, name: &str) -> Option<BuildType> {
        self.services.build_type(name)
    }

    /// Build type, dependencies and owning module of a registered service
    pub fn service_type(&self, name: &str) -> Option<ServiceInfo> {
        self.services.info(name)
    }

    pub fn is_module_defined(&self, name: &str) -> bool {
        self.module_graph.is_resource(name)
    }

    pub fn is_module_loaded(&self, name: &str) -> bool {
        self.loaded.contains(name)
    }

    /// Loaded modules in load order
    pub fn loaded_modules(&self) -> &[String] {
        &self.load_order
    }

    pub fn module_graph(&self) -> &DependencyGraph {
        &self.module_graph
    }

    pub fn service_graph(&self) -> &DependencyGraph {
        &self.service_graph
    }

    /// Drop every module, service, cached instance and loaded marker.
    ///
    /// The configuration is kept; the engine is afterwards indistinguishable
    /// from a freshly created one.
    pub fn destroy(&mut self) {
        info!(
            "Destroying environment with {} module(s) and {} service(s)",
            self.load_order.len(),
            self.services.len()
        );
        let config = std::mem::take(&mut self.config);
        *self = Self::with_config(config);
    }
}

/// Handle for declaring services on a module
pub struct ModuleHandle<'e> {
    engine: &'e mut Engine,
    name: String,
}

impl<'e> ModuleHandle<'e> {
    /// The module name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a service on this module
    pub fn service<F>(
        &mut self,
        name: &str,
        build_type: BuildType,
        dependencies: &[&str],
        factory: F,
    ) -> DiResult<&mut Self>
    where
        F: Fn(&[Instance]) -> anyhow::Result<Instance> + Send + Sync + 'static,
    {
        let dependencies = dependencies.iter().map(|d| d.to_string()).collect();
        let descriptor = ServiceDescriptor::new(name, build_type, dependencies, factory);
        self.engine.declare_service(&self.name, descriptor)?;
        Ok(self)
    }

    /// Declare a singleton service
    pub fn singleton<F>(&mut self, name: &str, dependencies: &[&str], factory: F) -> DiResult<&mut Self>
    where
        F: Fn(&[Instance]) -> anyhow::Result<Instance> + Send + Sync + 'static,
    {
        self.service(name, BuildType::Singleton, dependencies, factory)
    }

    /// Declare a transient service
    pub fn transient<F>(&mut self, name: &str, dependencies: &[&str], factory: F) -> DiResult<&mut Self>
    where
        F: Fn(&[Instance]) -> anyhow::Result<Instance> + Send + Sync + 'static,
    {
        self.service(name, BuildType::Transient, dependencies, factory)
    }

    /// Register an already-built descriptor
    pub fn descriptor(&mut self, descriptor: ServiceDescriptor) -> DiResult<&mut Self> {
        self.engine.declare_service(&self.name, descriptor)?;
        Ok(self)
    }
}
