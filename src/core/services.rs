//! Typed service registry
//!
//! `ServiceCollection` is filled during startup; `ServiceProvider` resolves
//! services from it. Services are keyed by their concrete Rust type, so trait
//! objects are registered as `Arc<dyn Trait>`.

use super::error::{DatabaseError, Result};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

type Factory = Arc<dyn Fn(&ServiceProvider) -> Result<Box<dyn Any + Send + Sync>> + Send + Sync>;

#[derive(Clone)]
enum Lifetime {
    /// One shared value cloned out on every resolution
    Singleton(Arc<dyn Any + Send + Sync>),
    /// Factory invoked on every resolution
    Transient(Factory),
}

#[derive(Clone)]
struct Registration {
    type_name: &'static str,
    lifetime: Lifetime,
}

/// Mutable set of service registrations
#[derive(Clone, Default)]
pub struct ServiceCollection {
    registrations: HashMap<TypeId, Registration>,
}

impl ServiceCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shared value, replacing any earlier registration of `T`
    pub fn add_singleton<T>(&mut self, value: T) -> &mut Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.registrations.insert(
            TypeId::of::<T>(),
            Registration {
                type_name: std::any::type_name::<T>(),
                lifetime: Lifetime::Singleton(Arc::new(value)),
            },
        );
        self
    }

    /// Register a shared value only if `T` is not registered yet
    pub fn try_add_singleton<T>(&mut self, value: T) -> &mut Self
    where
        T: Clone + Send + Sync + 'static,
    {
        if !self.contains::<T>() {
            self.add_singleton(value);
        }
        self
    }

    /// Register a factory that builds a new `T` on every resolution
    ///
    /// Nothing is constructed at registration time.
    pub fn add_transient<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> Result<T> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |provider| {
            factory(provider).map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
        });
        self.registrations.insert(
            TypeId::of::<T>(),
            Registration {
                type_name: std::any::type_name::<T>(),
                lifetime: Lifetime::Transient(factory),
            },
        );
        self
    }

    /// Check if `T` has a registration
    pub fn contains<T: 'static>(&self) -> bool {
        self.registrations.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered services
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Snapshot the registrations into a resolver
    pub fn build_service_provider(&self) -> ServiceProvider {
        ServiceProvider {
            registrations: Arc::new(self.registrations.clone()),
        }
    }
}

impl std::fmt::Debug for ServiceCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.registrations.values().map(|r| r.type_name).collect();
        names.sort_unstable();
        f.debug_struct("ServiceCollection")
            .field("services", &names)
            .finish()
    }
}

/// Resolves services registered in a [`ServiceCollection`]
#[derive(Clone)]
pub struct ServiceProvider {
    registrations: Arc<HashMap<TypeId, Registration>>,
}

impl ServiceProvider {
    /// Resolve a `T`
    ///
    /// Singletons are cloned, transient factories are invoked.
    ///
    /// # Errors
    ///
    /// `ServiceNotRegistered` if nothing is registered for `T`; factory errors
    /// are returned unchanged.
    pub fn get<T>(&self) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let type_name = std::any::type_name::<T>();
        let registration = self
            .registrations
            .get(&TypeId::of::<T>())
            .ok_or(DatabaseError::ServiceNotRegistered(type_name))?;

        match &registration.lifetime {
            Lifetime::Singleton(value) => value
                .downcast_ref::<T>()
                .cloned()
                .ok_or_else(|| DatabaseError::other(format!("Service type mismatch for {}", type_name))),
            Lifetime::Transient(factory) => factory(self)?
                .downcast::<T>()
                .map(|value| *value)
                .map_err(|_| DatabaseError::other(format!("Service type mismatch for {}", type_name))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[test]
    fn test_singleton_resolution() {
        let mut services = ServiceCollection::new();
        services.add_singleton(Arc::new(English) as Arc<dyn Greeter>);

        let provider = services.build_service_provider();
        let greeter = provider.get::<Arc<dyn Greeter>>().unwrap();
        assert_eq!(greeter.greet(), "hello");
    }

    #[test]
    fn test_try_add_keeps_first() {
        let mut services = ServiceCollection::new();
        services.try_add_singleton(1u32).try_add_singleton(2u32);

        let provider = services.build_service_provider();
        assert_eq!(provider.get::<u32>().unwrap(), 1);
        assert_eq!(services.len(), 1);
    }

    #[test]
    fn test_transient_is_lazy_and_fresh() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let mut services = ServiceCollection::new();
        services.add_transient(move |_| Ok(counter.fetch_add(1, Ordering::SeqCst)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let provider = services.build_service_provider();
        assert_eq!(provider.get::<usize>().unwrap(), 0);
        assert_eq!(provider.get::<usize>().unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_transient_resolves_dependencies() {
        let mut services = ServiceCollection::new();
        services
            .add_singleton("korm".to_string())
            .add_transient(|provider| Ok(provider.get::<String>()?.len()));

        let provider = services.build_service_provider();
        assert_eq!(provider.get::<usize>().unwrap(), 4);
    }

    #[test]
    fn test_missing_service() {
        let provider = ServiceCollection::new().build_service_provider();
        let err = provider.get::<u64>().unwrap_err();
        assert!(matches!(err, DatabaseError::ServiceNotRegistered("u64")));
    }
}
