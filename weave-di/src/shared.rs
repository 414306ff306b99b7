//! Thread-safe engine handle
//!
//! Resolution mutates traversal state and the singleton cache, so every
//! operation holds one coarse lock for its whole duration. Factories run
//! under that lock and must not call back into the same handle.

use parking_lot::Mutex;
use std::any::Any;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::error::DiResult;
use crate::service::{BuildType, Instance};

/// Cloneable handle to an engine shared between threads
#[derive(Debug, Clone, Default)]
pub struct SharedEngine {
    inner: Arc<Mutex<Engine>>,
}

impl SharedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::from_engine(Engine::with_config(config))
    }

    pub fn from_engine(engine: Engine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(engine)),
        }
    }

    /// Run `f` with exclusive access to the engine
    pub fn with<R>(&self, f: impl FnOnce(&mut Engine) -> R) -> R {
        f(&mut *self.inner.lock())
    }

    pub fn load_module(&self, id: &str) -> DiResult<()> {
        self.inner.lock().load_module(id)
    }

    pub fn execute(&self) -> DiResult<()> {
        self.inner.lock().execute()
    }

    pub fn inject(&self, id: &str) -> DiResult<Instance> {
        self.inner.lock().inject(id)
    }

    pub fn inject_as<T: Any + Send + Sync>(&self, id: &str) -> DiResult<Arc<T>> {
        self.inner.lock().inject_as::<T>(id)
    }

    pub fn invoke(&self, id: &str) -> DiResult<()> {
        self.inner.lock().invoke(id)
    }

    pub fn is_service(&self, name: &str) -> bool {
        self.inner.lock().is_service(name)
    }

    pub fn service_build_type(&self, name: &str) -> Option<BuildType> {
        self.inner.lock().service_build_type(name)
    }

    pub fn destroy(&self) {
        self.inner.lock().destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::instance;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn test_singleton_shared_across_threads() {
        let calls = Arc::new(AtomicUsize::new(0));
        let engine = SharedEngine::new();
        {
            let calls = Arc::clone(&calls);
            engine.with(|engine| {
                engine
                    .module("core", &[])?
                    .singleton("clock", &[], move |_| {
                        Ok(instance(calls.fetch_add(1, Ordering::SeqCst)))
                    })?;
                engine.load_module("core")
            })
            .unwrap();
        }

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                thread::spawn(move || engine.inject("clock").unwrap())
            })
            .collect();
        let instances: Vec<Instance> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(engine.service_build_type("clock"), Some(BuildType::Singleton));
    }

    #[test]
    fn test_destroy_through_handle() {
        let engine = SharedEngine::new();
        engine
            .with(|engine| {
                engine.module("m", &[])?.transient("t", &[], |_| Ok(instance(0u8)))?;
                engine.load_module("m")
            })
            .unwrap();
        assert!(engine.is_service("t"));

        engine.destroy();
        assert!(!engine.is_service("t"));
        assert!(engine.inject("t").unwrap_err().is_not_found());
    }
}
