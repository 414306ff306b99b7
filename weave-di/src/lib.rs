//! Module-based dependency injection for Weave
//!
//! Callers define modules (named groups of services with dependencies on
//! other modules) and services (named factories with dependencies on other
//! services and a build type). The [`Engine`] loads modules in dependency
//! order, detects cycles before any factory runs and builds services on
//! demand, caching singletons.
//!
//! ```
//! use weave_di::{instance, downcast, Engine};
//!
//! let mut engine = Engine::new();
//! engine
//!     .module("storage", &[])?
//!     .singleton("db", &[], |_| Ok(instance("postgres".to_string())))?;
//! engine
//!     .module("web", &["storage"])?
//!     .transient("api", &["db"], |args| {
//!         let db = downcast::<String>(&args[0]).ok_or_else(|| anyhow::anyhow!("db"))?;
//!         Ok(instance(format!("api on {}", db)))
//!     })?;
//!
//! engine.load_module("web")?;
//! assert_eq!(*engine.inject_as::<String>("api")?, "api on postgres");
//! # Ok::<(), weave_di::DiError>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod service;
pub mod shared;

#[cfg(feature = "config")]
pub mod manifest;

pub use config::EngineConfig;
pub use engine::{Engine, ModuleHandle};
pub use error::{DiError, DiResult, ResourceKind};
pub use registry::{ModuleRegistry, ServiceRegistry};
pub use service::{downcast, instance, unit, BuildType, Factory, Instance, ServiceDescriptor, ServiceInfo};
pub use shared::SharedEngine;

#[cfg(feature = "config")]
pub use manifest::{FactoryCatalog, Manifest};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::{
        downcast, instance, unit, BuildType, DiError, DiResult, Engine, Instance, SharedEngine,
    };
}
