//! Lazy renderer registry keyed by component key.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

pub type LocalBoxFuture<T> = Pin<Box<dyn Future<Output = T>>>;

type Factory<R> = Arc<dyn Fn() -> LocalBoxFuture<R> + Send + Sync>;

/// Outcome of looking up a component key
pub enum Resolution<R> {
    /// Loaded before, served from the cache
    Ready(R),
    /// First use; the future fills the cache when it completes
    Pending(LocalBoxFuture<R>),
    NotFound,
}

impl<R> Resolution<R> {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// Static mapping from key to an async factory. A renderer is produced at
/// most once per successful load and reused afterwards.
pub struct RendererRegistry<R> {
    factories: HashMap<String, Factory<R>>,
    cache: Mutex<HashMap<String, R>>,
}

impl<R> Default for RendererRegistry<R> {
    fn default() -> Self {
        Self {
            factories: HashMap::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }
}

impl<R: Clone + Send + 'static> RendererRegistry<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an async factory under `key`, replacing any previous one
    pub fn register<F, Fut>(mut self, key: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + 'static,
    {
        let factory: Factory<R> = Arc::new(move || Box::pin(factory()) as LocalBoxFuture<R>);
        self.factories.insert(key.into(), factory);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn cached(&self, key: &str) -> Option<R> {
        self.cache.lock().ok().and_then(|cache| cache.get(key).cloned())
    }

    pub fn resolve(self: &Arc<Self>, key: &str) -> Resolution<R> {
        if let Some(renderer) = self.cached(key) {
            return Resolution::Ready(renderer);
        }

        let Some(factory) = self.factories.get(key).cloned() else {
            log::warn!("modal renderer not registered: {key}");
            return Resolution::NotFound;
        };

        let registry = Arc::clone(self);
        let key = key.to_string();
        Resolution::Pending(Box::pin(async move {
            let renderer = factory().await;
            if let Ok(mut cache) = registry.cache.lock() {
                cache.insert(key, renderer.clone());
            }
            renderer
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_registry(counter: Arc<AtomicUsize>) -> Arc<RendererRegistry<String>> {
        Arc::new(RendererRegistry::new().register("alert", move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                "alert-renderer".to_string()
            }
        }))
    }

    #[test]
    fn test_unknown_key_is_not_found() {
        let registry = counting_registry(Arc::new(AtomicUsize::new(0)));
        assert!(registry.resolve("does-not-exist").is_not_found());
        assert!(registry.contains("alert"));
        assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["alert"]);
    }

    #[tokio::test]
    async fn test_first_resolve_loads_then_caches() {
        let counter = Arc::new(AtomicUsize::new(0));
        let registry = counting_registry(counter.clone());

        let loaded = match registry.resolve("alert") {
            Resolution::Pending(future) => future.await,
            _ => panic!("expected a pending load on first use"),
        };
        assert_eq!(loaded, "alert-renderer");
        assert_eq!(registry.cached("alert").as_deref(), Some("alert-renderer"));

        match registry.resolve("alert") {
            Resolution::Ready(renderer) => assert_eq!(renderer, "alert-renderer"),
            _ => panic!("expected the cached renderer"),
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_load_leaves_cache_empty() {
        let counter = Arc::new(AtomicUsize::new(0));
        let registry = counting_registry(counter.clone());

        drop(registry.resolve("alert"));
        assert!(registry.cached("alert").is_none());
        assert!(matches!(registry.resolve("alert"), Resolution::Pending(_)));
    }
}
