//! Declarative module manifests
//!
//! A manifest describes modules and the shape of their services. Factories
//! cannot be expressed in TOML or JSON, so each service names a factory key
//! looked up in a [`FactoryCatalog`] when the manifest is applied.
//!
//! ```toml
//! [[modules]]
//! name = "storage"
//!
//! [[modules.services]]
//! name = "db"
//! build = "singleton"
//!
//! [[modules]]
//! name = "web"
//! depends_on = ["storage"]
//!
//! [[modules.services]]
//! name = "api"
//! build = "transient"
//! depends_on = ["db"]
//! factory = "api_v2"
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::engine::Engine;
use crate::error::{DiError, DiResult};
use crate::registry::{validate_dependencies, validate_name};
use crate::service::{BuildType, Factory, Instance, ServiceDescriptor};

/// Set of modules to register
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub modules: Vec<ModuleManifest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleManifest {
    pub name: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub services: Vec<ServiceManifest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceManifest {
    pub name: String,
    #[serde(default = "default_build")]
    pub build: BuildType,
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Catalog key of the factory; defaults to the service name
    #[serde(default)]
    pub factory: Option<String>,
}

fn default_build() -> BuildType {
    BuildType::Singleton
}

impl ServiceManifest {
    fn factory_key(&self) -> &str {
        self.factory.as_deref().unwrap_or(&self.name)
    }
}

/// Factories available to manifests, by key
#[derive(Default)]
pub struct FactoryCatalog {
    factories: FxHashMap<String, Factory>,
}

impl FactoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `key`, replacing any previous one
    pub fn register<F>(&mut self, key: &str, factory: F) -> &mut Self
    where
        F: Fn(&[Instance]) -> anyhow::Result<Instance> + Send + Sync + 'static,
    {
        self.factories.insert(key.to_string(), Arc::new(factory));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Factory> {
        self.factories.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }
}

impl Manifest {
    /// Load a manifest from TOML string
    pub fn from_toml(toml_str: &str) -> DiResult<Self> {
        toml::from_str(toml_str)
            .map_err(|e| DiError::ConfigError(format!("Failed to parse TOML: {}", e)))
    }

    /// Load a manifest from JSON string
    pub fn from_json(json_str: &str) -> DiResult<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| DiError::ConfigError(format!("Failed to parse JSON: {}", e)))
    }

    /// Register every module and service with `engine`.
    ///
    /// Names and factory keys are all checked before anything is registered.
    pub fn apply(&self, engine: &mut Engine, catalog: &FactoryCatalog) -> DiResult<()> {
        for module in &self.modules {
            validate_name(&module.name, &module.name)?;
            validate_dependencies(&module.name, &module.depends_on)?;
            for service in &module.services {
                validate_name(&module.name, &service.name)?;
                validate_dependencies(&service.name, &service.depends_on)?;
            }
            if let Some(service) = module
                .services
                .iter()
                .find(|s| !catalog.contains(s.factory_key()))
            {
                return Err(DiError::ConfigError(format!(
                    "Unknown factory {} for service {} in module {}",
                    service.factory_key(),
                    service.name,
                    module.name
                )));
            }
        }

        for module in &self.modules {
            let depends_on: Vec<&str> = module.depends_on.iter().map(String::as_str).collect();
            let mut handle = engine.module(&module.name, &depends_on)?;
            for service in &module.services {
                let Some(factory) = catalog.get(service.factory_key()) else {
                    continue;
                };
                handle.descriptor(ServiceDescriptor {
                    name: service.name.clone(),
                    build_type: service.build,
                    dependencies: service.depends_on.clone(),
                    factory: Arc::clone(factory),
                })?;
            }
            debug!(
                "Applied manifest module {} with {} service(s)",
                module.name,
                module.services.len()
            );
        }
        Ok(())
    }
}
