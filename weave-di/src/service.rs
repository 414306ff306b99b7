//! Service definitions and descriptors

use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::DiError;

/// Opaque handle to a service instance
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Factory receiving the resolved dependencies in declaration order
pub type Factory = Arc<dyn Fn(&[Instance]) -> anyhow::Result<Instance> + Send + Sync>;

/// Build type determines how service instances are created and cached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum BuildType {
    /// One instance, created lazily and cached for the engine lifetime
    Singleton,
    /// A new instance for every resolution
    Transient,
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildType::Singleton => write!(f, "singleton"),
            BuildType::Transient => write!(f, "transient"),
        }
    }
}

impl FromStr for BuildType {
    type Err = DiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "singleton" => Ok(BuildType::Singleton),
            "transient" => Ok(BuildType::Transient),
            other => Err(DiError::ConfigError(format!("unknown build type: {}", other))),
        }
    }
}

/// Describes a service registration
#[derive(Clone)]
pub struct ServiceDescriptor {
    pub name: String,
    pub build_type: BuildType,
    /// Dependency service names, in the order the factory receives them
    pub dependencies: Vec<String>,
    pub factory: Factory,
}

impl ServiceDescriptor {
    /// Create a new service descriptor
    pub fn new<F>(
        name: impl Into<String>,
        build_type: BuildType,
        dependencies: Vec<String>,
        factory: F,
    ) -> Self
    where
        F: Fn(&[Instance]) -> anyhow::Result<Instance> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            build_type,
            dependencies,
            factory: Arc::new(factory),
        }
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("name", &self.name)
            .field("build_type", &self.build_type)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// Public view of a registered service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    pub name: String,
    pub build_type: BuildType,
    pub dependencies: Vec<String>,
    /// Module that declared the service
    pub module: String,
}

/// Empty instance for services that exist only for their side effects
pub fn unit() -> Instance {
    Arc::new(())
}

/// Wrap a value as an instance
pub fn instance<T: Any + Send + Sync>(value: T) -> Instance {
    Arc::new(value)
}

/// Try to view an instance as a concrete type
pub fn downcast<T: Any + Send + Sync>(instance: &Instance) -> Option<Arc<T>> {
    Arc::clone(instance).downcast::<T>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_type_parsing() {
        assert_eq!("singleton".parse::<BuildType>().unwrap(), BuildType::Singleton);
        assert_eq!("transient".parse::<BuildType>().unwrap(), BuildType::Transient);
        assert!("scoped".parse::<BuildType>().is_err());
        assert_eq!(BuildType::Transient.to_string(), "transient");
    }

    #[test]
    fn test_downcast() {
        let value = instance(42u32);
        assert_eq!(*downcast::<u32>(&value).unwrap(), 42);
        assert!(downcast::<String>(&value).is_none());
        assert!(downcast::<()>(&unit()).is_some());
    }
}
