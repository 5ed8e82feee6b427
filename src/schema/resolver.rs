use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::types::Schema;

/// External collaborator resolving a schema uid to its [`Schema`].
///
/// Supplied by the host application. Must be a pure, side-effect-free
/// lookup, safe to call repeatedly and to memoize. The engine never asks a
/// resolver to mutate a schema.
pub trait ModelResolver: Send + Sync {
    /// Returns the schema registered under `uid`, if any.
    fn get_model(&self, uid: &str) -> Option<Arc<Schema>>;
}

/// Simple in-memory [`ModelResolver`] backed by a map.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<Schema>>,
}

impl ModelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema under its own uid, replacing any previous entry.
    pub fn register(&mut self, schema: Schema) {
        self.models.insert(schema.uid.clone(), Arc::new(schema));
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, schema: Schema) -> Self {
        self.register(schema);
        self
    }
}

impl ModelResolver for ModelRegistry {
    fn get_model(&self, uid: &str) -> Option<Arc<Schema>> {
        self.models.get(uid).cloned()
    }
}

/// Memoizing wrapper around another resolver.
///
/// Successful lookups are cached by uid; the cache is invalidated
/// wholesale. Misses are not cached so late registrations become visible.
pub struct CachedResolver<R> {
    inner: R,
    cache: RwLock<HashMap<String, Arc<Schema>>>,
}

impl<R: ModelResolver> CachedResolver<R> {
    #[must_use]
    pub fn new(inner: R) -> Self {
        Self { inner, cache: RwLock::new(HashMap::new()) }
    }

    /// Drops every cached entry.
    pub fn invalidate(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }
}

impl<R: ModelResolver> ModelResolver for CachedResolver<R> {
    fn get_model(&self, uid: &str) -> Option<Arc<Schema>> {
        if let Ok(cache) = self.cache.read() {
            if let Some(hit) = cache.get(uid) {
                return Some(hit.clone());
            }
        }
        let resolved = self.inner.get_model(uid)?;
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(uid.to_string(), resolved.clone());
        }
        Some(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::SchemaKind;

    #[test]
    fn registry_resolves_registered_schemas() {
        let registry =
            ModelRegistry::new().with(Schema::new("api.article", SchemaKind::CollectionType));

        assert!(registry.get_model("api.article").is_some());
        assert!(registry.get_model("api.missing").is_none());
    }

    #[test]
    fn cached_resolver_memoizes_and_invalidates() {
        let registry =
            ModelRegistry::new().with(Schema::new("api.article", SchemaKind::CollectionType));
        let cached = CachedResolver::new(registry);

        let first = cached.get_model("api.article").unwrap();
        let second = cached.get_model("api.article").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        cached.invalidate();
        assert!(cached.get_model("api.article").is_some());
    }
}
