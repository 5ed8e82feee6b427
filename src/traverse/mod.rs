//! Schema-driven recursive traversal.
//!
//! Two entry families share the same visitor contract: [`entity`] walks
//! fully materialized data trees, while the `query_*` drivers walk REST
//! query fragments (`filters`, `sort`, `fields`, `populate`), each built on
//! the generic [`factory::Traverser`] engine.
//!
//! All traversal is await-sequenced: each key, and each array element
//! within a key, is fully processed (including nested recursion) before the
//! next begins. Visitors mutate the working container through a
//! [`VisitorApi`] scoped to the current frame.

pub mod entity;
pub mod factory;
pub mod query_fields;
pub mod query_filters;
pub mod query_populate;
pub mod query_sort;

pub use entity::traverse_entity;
pub use factory::Traverser;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::error::ValidationError;
use crate::schema::types::{Attribute, Schema, SchemaError};
use crate::schema::ModelResolver;

/// Errors a traversal run can propagate.
///
/// Visitor and handler errors abort the remaining traversal immediately;
/// no partial rollback is attempted.
#[derive(Error, Debug)]
pub enum TraverseError {
    /// A schema uid could not be resolved through the model resolver.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A validation visitor rejected the data.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Accumulated location of the attribute currently visited.
///
/// Three independently useful projections: `raw` is the dotted logical
/// path, `attribute` is restricted to keys that resolved to a real
/// attribute, and `raw_with_indices` preserves numeric array indices so
/// errors can pinpoint the exact array slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    pub raw: Option<String>,
    pub attribute: Option<String>,
    pub raw_with_indices: Option<String>,
}

fn join(base: &Option<String>, segment: &str) -> String {
    match base {
        Some(base) => format!("{base}.{segment}"),
        None => segment.to_string(),
    }
}

impl Path {
    /// Derives the path for a child key. `attribute` advances only when the
    /// key resolved to a real schema attribute.
    #[must_use]
    pub fn descend(&self, key: &str, is_attribute: bool) -> Self {
        Self {
            raw: Some(join(&self.raw, key)),
            attribute: if is_attribute {
                Some(join(&self.attribute, key))
            } else {
                self.attribute.clone()
            },
            raw_with_indices: Some(join(&self.raw_with_indices, key)),
        }
    }

    /// Derives the path for an array element. The index folds only into
    /// `raw_with_indices`, keeping `raw`/`attribute` index-agnostic.
    #[must_use]
    pub fn descend_index(&self, index: usize) -> Self {
        Self {
            raw: self.raw.clone(),
            attribute: self.attribute.clone(),
            raw_with_indices: Some(join(&self.raw_with_indices, &index.to_string())),
        }
    }

    /// The most precise display form available, for error messages.
    #[must_use]
    pub fn display(&self) -> String {
        self.raw_with_indices
            .clone()
            .or_else(|| self.raw.clone())
            .unwrap_or_default()
    }
}

/// Snapshot of the traversal frame one level up, used by fragment (`on`)
/// handling to know which concrete branch is active.
#[derive(Debug, Clone)]
pub struct Parent {
    /// Schema active in the parent frame
    pub schema: Arc<Schema>,
    /// Key whose value is being recursed into
    pub key: String,
    /// Path of the parent key
    pub path: Path,
    /// Attribute the parent key resolved to, if any
    pub attribute: Option<Attribute>,
}

/// Per-call traversal configuration. Cloned at every recursion step.
#[derive(Clone)]
pub struct TraverseOptions {
    /// Schema describing the node currently traversed
    pub schema: Arc<Schema>,
    /// Path accumulated so far
    pub path: Path,
    /// The frame one level up, if any
    pub parent: Option<Arc<Parent>>,
    /// Model lookup, threaded explicitly through every frame
    pub resolver: Arc<dyn ModelResolver>,
}

impl TraverseOptions {
    /// Root options for a traversal starting at `schema`.
    #[must_use]
    pub fn new(schema: Arc<Schema>, resolver: Arc<dyn ModelResolver>) -> Self {
        Self { schema, path: Path::default(), parent: None, resolver }
    }

    /// Resolves `uid` through the resolver, raising
    /// [`SchemaError::NotFound`] when absent.
    pub fn resolve(&self, uid: &str) -> Result<Arc<Schema>, TraverseError> {
        self.resolver
            .get_model(uid)
            .ok_or_else(|| TraverseError::Schema(SchemaError::NotFound(uid.to_string())))
    }
}

/// Everything a visitor can read about the key currently visited.
pub struct VisitorContext<'a> {
    /// The sibling container holding the key (read access to other keys)
    pub data: &'a Value,
    /// Key currently visited
    pub key: &'a str,
    /// Current value of the key
    pub value: &'a Value,
    /// Attribute the key resolved to, or `None` for non-schema keys
    pub attribute: Option<&'a Attribute>,
    /// Schema active for the container
    pub schema: &'a Arc<Schema>,
    /// Path of the visited key
    pub path: &'a Path,
    /// The frame one level up, if any
    pub parent: Option<&'a Parent>,
    /// Model lookup
    pub resolver: &'a Arc<dyn ModelResolver>,
}

/// Mutation handle scoped to the container currently visited.
///
/// Operations are recorded during the visit and applied by the engine after
/// the visitor returns, before the engine decides whether to recurse — so a
/// visitor can veto or rewrite a value ahead of recursion, and later keys
/// observe earlier removals.
#[derive(Debug, Default)]
pub struct VisitorApi {
    ops: Vec<VisitorOp>,
}

#[derive(Debug)]
enum VisitorOp {
    Remove(String),
    Set(String, Value),
}

impl VisitorApi {
    /// Removes `key` from the current container.
    pub fn remove(&mut self, key: impl Into<String>) {
        self.ops.push(VisitorOp::Remove(key.into()));
    }

    /// Replaces the value of `key` in the current container.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.ops.push(VisitorOp::Set(key.into(), value));
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Applies the recorded operations to a plain JSON object container.
    pub(crate) fn apply_to_object(self, data: &mut Value) {
        let Some(map) = data.as_object_mut() else { return };
        for op in self.ops {
            match op {
                VisitorOp::Remove(key) => {
                    map.remove(&key);
                }
                VisitorOp::Set(key, value) => {
                    map.insert(key, value);
                }
            }
        }
    }

    /// Applies the recorded operations through a node parser, for
    /// containers that are not plain objects.
    pub(crate) fn apply_with(self, parser: &dyn factory::NodeParser, data: &mut Value) {
        for op in self.ops {
            match op {
                VisitorOp::Remove(key) => parser.remove(&key, data),
                VisitorOp::Set(key, value) => parser.set(&key, value, data),
            }
        }
    }
}

/// A function invoked once per traversed key with context and a mutation
/// handle. Visitors may be asynchronous; the engine awaits each invocation
/// fully before moving to the next key.
#[async_trait]
pub trait Visitor: Send + Sync {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        api: &mut VisitorApi,
    ) -> Result<(), TraverseError>;
}

/// Visitor that does nothing. Traversal with it reduces to a deep copy.
pub struct Noop;

#[async_trait]
impl Visitor for Noop {
    async fn visit(
        &self,
        _ctx: VisitorContext<'_>,
        _api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        Ok(())
    }
}

/// Adapter turning a synchronous closure into a [`Visitor`].
pub struct FnVisitor<F>(pub F);

#[async_trait]
impl<F> Visitor for FnVisitor<F>
where
    F: Fn(VisitorContext<'_>, &mut VisitorApi) -> Result<(), TraverseError> + Send + Sync,
{
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        (self.0)(ctx, api)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_descend_tracks_attribute_projection_separately() {
        let root = Path::default();
        let a = root.descend("a", true);
        let b = a.descend("b", false);
        let c = b.descend("c", true);

        assert_eq!(c.raw.as_deref(), Some("a.b.c"));
        assert_eq!(c.attribute.as_deref(), Some("a.c"));
        assert_eq!(c.raw_with_indices.as_deref(), Some("a.b.c"));
    }

    #[test]
    fn path_indices_fold_only_into_raw_with_indices() {
        let path = Path::default().descend("items", true).descend_index(2).descend("name", true);

        assert_eq!(path.raw.as_deref(), Some("items.name"));
        assert_eq!(path.attribute.as_deref(), Some("items.name"));
        assert_eq!(path.raw_with_indices.as_deref(), Some("items.2.name"));
    }
}
