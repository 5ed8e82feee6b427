//! Configurable recursive-descent engine for query fragments.
//!
//! A [`Traverser`] is assembled by a small fluent builder. Interceptors and
//! parsers are tried in registration order with first-match-wins;
//! registration order is an explicit contract, not an implementation
//! accident. Every `on` handler whose predicate passes runs, so orthogonal
//! recursion strategies can apply to the same key without interference.

use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;

use super::{Parent, Path, TraverseError, TraverseOptions, Visitor, VisitorApi, VisitorContext};
use crate::schema::types::{Attribute, Schema};
use crate::schema::ModelResolver;

/// Uniform key/value interface over one concrete node shape.
///
/// `transform` produces the working copy the engine mutates; `keys`, `get`,
/// `set` and `remove` interpret the node as a container. The first parser
/// whose predicate matches wins; nodes no parser matches pass through
/// untouched and are never visited.
pub trait NodeParser: Send + Sync {
    fn transform(&self, data: Value) -> Value {
        data
    }
    fn keys(&self, data: &Value) -> Vec<String>;
    fn get(&self, key: &str, data: &Value) -> Option<Value>;
    fn set(&self, key: &str, value: Value, data: &mut Value);
    fn remove(&self, key: &str, data: &mut Value);
}

/// What `ignore` and `on` predicates can inspect about the current key.
pub struct KeyCtx<'a> {
    pub key: &'a str,
    pub value: &'a Value,
    pub attribute: Option<&'a Attribute>,
    pub schema: &'a Arc<Schema>,
    pub path: &'a Path,
    pub parent: Option<&'a Parent>,
}

/// Re-entry point handed to interceptors.
#[derive(Clone, Copy)]
pub struct Recurse<'a> {
    engine: &'a Traverser,
    visitor: &'a dyn Visitor,
}

impl Recurse<'_> {
    /// Re-enters the engine on a sub-piece of the intercepted node.
    pub async fn recurse(
        &self,
        options: TraverseOptions,
        data: Value,
    ) -> Result<Value, TraverseError> {
        self.engine.traverse_value(self.visitor, options, data).await
    }
}

/// Context handed to `on` handlers once a key's attribute kind is known.
pub struct HandlerCtx<'a> {
    pub key: &'a str,
    /// Current value of the key, owned by the handler
    pub value: Value,
    pub attribute: Option<&'a Attribute>,
    pub schema: &'a Arc<Schema>,
    pub path: &'a Path,
    pub parent: Option<&'a Parent>,
    pub resolver: &'a Arc<dyn ModelResolver>,
    recurse: Recurse<'a>,
}

impl HandlerCtx<'_> {
    /// Re-enters the engine with explicit options.
    pub async fn recurse(
        &self,
        options: TraverseOptions,
        data: Value,
    ) -> Result<Value, TraverseError> {
        self.recurse.recurse(options, data).await
    }

    /// Options for recursing into a child node under `schema`, recording
    /// the current frame as the child's parent.
    #[must_use]
    pub fn child_options(&self, schema: Arc<Schema>) -> TraverseOptions {
        TraverseOptions {
            schema,
            path: self.path.clone(),
            parent: Some(Arc::new(Parent {
                schema: self.schema.clone(),
                key: self.key.to_string(),
                path: self.path.clone(),
                attribute: self.attribute.cloned(),
            })),
            resolver: self.resolver.clone(),
        }
    }

    /// Options for recursing without switching schema context.
    #[must_use]
    pub fn same_options(&self) -> TraverseOptions {
        self.child_options(self.schema.clone())
    }

    /// Resolves a schema uid through the model resolver.
    pub fn resolve(&self, uid: &str) -> Result<Arc<Schema>, TraverseError> {
        self.resolver.get_model(uid).ok_or_else(|| {
            TraverseError::Schema(crate::schema::types::SchemaError::NotFound(uid.to_string()))
        })
    }
}

type Predicate = Box<dyn Fn(&Value) -> bool + Send + Sync>;
type KeyPredicate = Box<dyn Fn(&KeyCtx<'_>) -> bool + Send + Sync>;
type Interceptor = Box<
    dyn for<'a> Fn(
            Recurse<'a>,
            TraverseOptions,
            Value,
        ) -> BoxFuture<'a, Result<Value, TraverseError>>
        + Send
        + Sync,
>;
type Handler = Box<
    dyn for<'a> Fn(HandlerCtx<'a>) -> BoxFuture<'a, Result<Option<Value>, TraverseError>>
        + Send
        + Sync,
>;

/// Generic traversal engine specialized per query sub-language.
#[derive(Default)]
pub struct Traverser {
    interceptors: Vec<(Predicate, Interceptor)>,
    parsers: Vec<(Predicate, Arc<dyn NodeParser>)>,
    ignores: Vec<KeyPredicate>,
    handlers: Vec<(KeyPredicate, Handler)>,
}

impl Traverser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Short-circuits traversal for node shapes needing bespoke handling
    /// before generic parsing. First registered match wins.
    #[must_use]
    pub fn intercept<P, F>(mut self, predicate: P, interceptor: F) -> Self
    where
        P: Fn(&Value) -> bool + Send + Sync + 'static,
        F: for<'a> Fn(
                Recurse<'a>,
                TraverseOptions,
                Value,
            ) -> BoxFuture<'a, Result<Value, TraverseError>>
            + Send
            + Sync
            + 'static,
    {
        self.interceptors.push((Box::new(predicate), Box::new(interceptor)));
        self
    }

    /// Registers how to treat a concrete node shape as a container. First
    /// registered match wins.
    #[must_use]
    pub fn parse_with<P>(mut self, predicate: P, parser: Arc<dyn NodeParser>) -> Self
    where
        P: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.parsers.push((Box::new(predicate), parser));
        self
    }

    /// Keys matching the predicate are visited but never recursed into.
    #[must_use]
    pub fn ignore<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&KeyCtx<'_>) -> bool + Send + Sync + 'static,
    {
        self.ignores.push(Box::new(predicate));
        self
    }

    /// Post-visit handler deciding whether/how to recurse into a key's
    /// value. Every handler whose predicate passes runs, in registration
    /// order; returning `None` removes the key.
    #[must_use]
    pub fn on<P, F>(mut self, predicate: P, handler: F) -> Self
    where
        P: Fn(&KeyCtx<'_>) -> bool + Send + Sync + 'static,
        F: for<'a> Fn(HandlerCtx<'a>) -> BoxFuture<'a, Result<Option<Value>, TraverseError>>
            + Send
            + Sync
            + 'static,
    {
        self.handlers.push((Box::new(predicate), Box::new(handler)));
        self
    }

    /// [`on`](Self::on) restricted to relation attributes.
    #[must_use]
    pub fn on_relation<F>(self, handler: F) -> Self
    where
        F: for<'a> Fn(HandlerCtx<'a>) -> BoxFuture<'a, Result<Option<Value>, TraverseError>>
            + Send
            + Sync
            + 'static,
    {
        self.on(
            |ctx: &KeyCtx<'_>| ctx.attribute.is_some_and(Attribute::is_relation),
            handler,
        )
    }

    /// [`on`](Self::on) restricted to component attributes.
    #[must_use]
    pub fn on_component<F>(self, handler: F) -> Self
    where
        F: for<'a> Fn(HandlerCtx<'a>) -> BoxFuture<'a, Result<Option<Value>, TraverseError>>
            + Send
            + Sync
            + 'static,
    {
        self.on(
            |ctx: &KeyCtx<'_>| ctx.attribute.is_some_and(Attribute::is_component),
            handler,
        )
    }

    /// [`on`](Self::on) restricted to media attributes.
    #[must_use]
    pub fn on_media<F>(self, handler: F) -> Self
    where
        F: for<'a> Fn(HandlerCtx<'a>) -> BoxFuture<'a, Result<Option<Value>, TraverseError>>
            + Send
            + Sync
            + 'static,
    {
        self.on(
            |ctx: &KeyCtx<'_>| ctx.attribute.is_some_and(Attribute::is_media),
            handler,
        )
    }

    /// [`on`](Self::on) restricted to dynamic-zone attributes.
    #[must_use]
    pub fn on_dynamic_zone<F>(self, handler: F) -> Self
    where
        F: for<'a> Fn(HandlerCtx<'a>) -> BoxFuture<'a, Result<Option<Value>, TraverseError>>
            + Send
            + Sync
            + 'static,
    {
        self.on(
            |ctx: &KeyCtx<'_>| ctx.attribute.is_some_and(Attribute::is_dynamic_zone),
            handler,
        )
    }

    /// Traverses `data`, invoking `visitor` once per parsed key and
    /// returning the transformed value.
    pub async fn traverse(
        &self,
        visitor: &dyn Visitor,
        options: TraverseOptions,
        data: Value,
    ) -> Result<Value, TraverseError> {
        self.traverse_value(visitor, options, data).await
    }

    pub(crate) fn traverse_value<'a>(
        &'a self,
        visitor: &'a dyn Visitor,
        options: TraverseOptions,
        data: Value,
    ) -> BoxFuture<'a, Result<Value, TraverseError>> {
        Box::pin(async move {
            for (predicate, interceptor) in &self.interceptors {
                if predicate(&data) {
                    let recurse = Recurse { engine: self, visitor };
                    return interceptor(recurse, options, data).await;
                }
            }

            let Some(parser) =
                self.parsers.iter().find(|(predicate, _)| predicate(&data)).map(|(_, p)| p.clone())
            else {
                // Unhandled shape: passes through, the visitor never sees it.
                return Ok(data);
            };

            let mut out = parser.transform(data);

            for key in parser.keys(&out) {
                let attribute = options.schema.attributes.get(&key).cloned();
                let path = options.path.descend(&key, attribute.is_some());

                let value = parser.get(&key, &out).unwrap_or(Value::Null);
                let mut api = VisitorApi::default();
                visitor
                    .visit(
                        VisitorContext {
                            data: &out,
                            key: &key,
                            value: &value,
                            attribute: attribute.as_ref(),
                            schema: &options.schema,
                            path: &path,
                            parent: options.parent.as_deref(),
                            resolver: &options.resolver,
                        },
                        &mut api,
                    )
                    .await?;
                if !api.is_empty() {
                    api.apply_with(parser.as_ref(), &mut out);
                }

                // Re-read: the visitor may have removed or rewritten the key.
                let Some(mut value) = parser.get(&key, &out) else {
                    continue;
                };

                let ignored = self.ignores.iter().any(|predicate| {
                    predicate(&KeyCtx {
                        key: &key,
                        value: &value,
                        attribute: attribute.as_ref(),
                        schema: &options.schema,
                        path: &path,
                        parent: options.parent.as_deref(),
                    })
                });
                if ignored {
                    continue;
                }

                let mut removed = false;
                let mut handled = false;
                for (predicate, handler) in &self.handlers {
                    let matches = predicate(&KeyCtx {
                        key: &key,
                        value: &value,
                        attribute: attribute.as_ref(),
                        schema: &options.schema,
                        path: &path,
                        parent: options.parent.as_deref(),
                    });
                    if !matches {
                        continue;
                    }
                    handled = true;
                    let ctx = HandlerCtx {
                        key: &key,
                        value: value.clone(),
                        attribute: attribute.as_ref(),
                        schema: &options.schema,
                        path: &path,
                        parent: options.parent.as_deref(),
                        resolver: &options.resolver,
                        recurse: Recurse { engine: self, visitor },
                    };
                    match handler(ctx).await? {
                        Some(next) => value = next,
                        None => {
                            removed = true;
                            break;
                        }
                    }
                }

                if removed {
                    parser.remove(&key, &mut out);
                } else if handled {
                    parser.set(&key, value, &mut out);
                }
            }

            Ok(out)
        })
    }
}

/// Plain JSON object container.
pub struct MapParser;

impl NodeParser for MapParser {
    fn keys(&self, data: &Value) -> Vec<String> {
        data.as_object().map(|map| map.keys().cloned().collect()).unwrap_or_default()
    }

    fn get(&self, key: &str, data: &Value) -> Option<Value> {
        data.as_object().and_then(|map| map.get(key)).cloned()
    }

    fn set(&self, key: &str, value: Value, data: &mut Value) {
        if let Some(map) = data.as_object_mut() {
            map.insert(key.to_string(), value);
        }
    }

    fn remove(&self, key: &str, data: &mut Value) {
        if let Some(map) = data.as_object_mut() {
            map.remove(key);
        }
    }
}

/// Array of strings whose keys are the string values themselves, as used
/// by the `fields` clause.
pub struct StringListParser;

impl NodeParser for StringListParser {
    fn keys(&self, data: &Value) -> Vec<String> {
        data.as_array()
            .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn get(&self, key: &str, data: &Value) -> Option<Value> {
        data.as_array()?.iter().find(|item| item.as_str() == Some(key)).cloned()
    }

    fn set(&self, key: &str, value: Value, data: &mut Value) {
        if let Some(items) = data.as_array_mut() {
            if let Some(slot) = items.iter_mut().find(|item| item.as_str() == Some(key)) {
                *slot = value;
            }
        }
    }

    fn remove(&self, key: &str, data: &mut Value) {
        if let Some(items) = data.as_array_mut() {
            items.retain(|item| item.as_str() != Some(key));
        }
    }
}

/// Shape predicates shared by the query drivers.
pub(crate) fn is_object(data: &Value) -> bool {
    data.is_object()
}

pub(crate) fn is_array(data: &Value) -> bool {
    data.is_array()
}

pub(crate) fn is_string(data: &Value) -> bool {
    data.is_string()
}

pub(crate) fn is_wildcard(data: &Value) -> bool {
    data.as_str() == Some("*")
}

pub(crate) fn is_empty_container(data: &Value) -> bool {
    match data {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Null => true,
        _ => false,
    }
}
