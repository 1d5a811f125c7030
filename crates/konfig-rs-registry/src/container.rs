//! Named service container with lazily memoized factories.

use konfig_rs_core::ConfigError;
use log::debug;
use parking_lot::ReentrantMutex;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

type Service = Arc<dyn Any + Send + Sync>;
type ServiceFactory = Arc<dyn Fn() -> Service + Send + Sync>;

#[derive(Default)]
struct ContainerState {
    singletons: HashMap<String, Service>,
    factories: HashMap<String, ServiceFactory>,
}

/// Holds singletons and factories by name.
///
/// A factory runs at most once: its result is stored as the singleton on
/// first resolution. The lock is reentrant, so a factory may resolve other
/// services from the same container.
#[derive(Default)]
pub struct ServiceContainer {
    state: ReentrantMutex<RefCell<ContainerState>>,
}

impl ServiceContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a ready-made instance. Replaces any earlier registration.
    pub fn register_singleton<T>(&self, name: impl Into<String>, instance: T)
    where
        T: Any + Send + Sync,
    {
        let name = name.into();
        debug!("registered singleton service (name={})", name);
        let guard = self.state.lock();
        guard.borrow_mut().singletons.insert(name, Arc::new(instance));
    }

    /// Register a constructor resolved on first `get`.
    pub fn register_factory<T, F>(&self, name: impl Into<String>, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let name = name.into();
        debug!("registered service factory (name={})", name);
        let factory: ServiceFactory = Arc::new(move || Arc::new(factory()) as Service);
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        state.singletons.remove(&name);
        state.factories.insert(name, factory);
    }

    /// Resolve a service, running its factory on first access.
    pub fn get<T>(&self, name: &str) -> Result<Arc<T>, ConfigError>
    where
        T: Any + Send + Sync,
    {
        let guard = self.state.lock();
        let existing = guard.borrow().singletons.get(name).cloned();
        let service = match existing {
            Some(service) => service,
            None => {
                let factory = guard
                    .borrow()
                    .factories
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ConfigError::NotFound(format!("service '{name}' not found")))?;
                let service = factory();
                debug!("resolved service from factory (name={})", name);
                guard
                    .borrow_mut()
                    .singletons
                    .insert(name.to_string(), Arc::clone(&service));
                service
            }
        };
        service.downcast::<T>().map_err(|_| {
            ConfigError::NotFound(format!("service '{name}' is not of the requested type"))
        })
    }

    pub fn has(&self, name: &str) -> bool {
        let guard = self.state.lock();
        let state = guard.borrow();
        state.singletons.contains_key(name) || state.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let guard = self.state.lock();
        let state = guard.borrow();
        let mut names: Vec<String> = state
            .singletons
            .keys()
            .chain(state.factories.keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

impl std::fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("services", &self.names())
            .finish()
    }
}
