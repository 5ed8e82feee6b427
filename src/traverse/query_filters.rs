//! Traversal driver for the `filters` query clause.
//!
//! Filters are operator trees (`$and`, `$eq`, …) intermixed with attribute
//! names. Recursion happens for logical operators (same schema) and once an
//! attribute is confirmed to be a relation, component or media (switching
//! schema context). Containers emptied by removals are pruned.

use futures::future::{BoxFuture, FutureExt};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::sync::Arc;

use super::factory::{
    is_array, is_empty_container, is_object, HandlerCtx, KeyCtx, MapParser, Recurse,
};
use super::{TraverseError, TraverseOptions, Traverser, Visitor};
use crate::query::operators::is_logical_operator;
use crate::schema::FILE_MODEL_UID;

fn recurse_elements<'a>(
    recurse: Recurse<'a>,
    options: TraverseOptions,
    data: Value,
) -> BoxFuture<'a, Result<Value, TraverseError>> {
    async move {
        let items = match data {
            Value::Array(items) => items,
            other => return Ok(other),
        };
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let transformed = recurse.recurse(options.clone(), item).await?;
            if !is_empty_container(&transformed) {
                out.push(transformed);
            }
        }
        Ok(Value::Array(out))
    }
    .boxed()
}

fn logical_operator_guard(ctx: &KeyCtx<'_>) -> bool {
    ctx.attribute.is_none() && is_logical_operator(ctx.key)
}

/// Logical operators keep the current schema context.
fn recurse_same_schema(ctx: HandlerCtx<'_>) -> BoxFuture<'_, Result<Option<Value>, TraverseError>> {
    async move {
        let transformed = ctx.recurse(ctx.same_options(), ctx.value.clone()).await?;
        if is_empty_container(&transformed) {
            Ok(None)
        } else {
            Ok(Some(transformed))
        }
    }
    .boxed()
}

fn filterable_target_guard(ctx: &KeyCtx<'_>) -> bool {
    ctx.attribute.is_some_and(|attribute| {
        attribute.is_media()
            || ((attribute.is_relation() || attribute.is_component())
                && attribute.target_uid().is_some())
    })
}

/// Relation/component/media conditions recurse with the target schema.
fn recurse_target(ctx: HandlerCtx<'_>) -> BoxFuture<'_, Result<Option<Value>, TraverseError>> {
    async move {
        let Some(attribute) = ctx.attribute else {
            return Ok(Some(ctx.value));
        };
        let uid = if attribute.is_media() {
            FILE_MODEL_UID
        } else {
            match attribute.target_uid() {
                Some(uid) => uid,
                None => return Ok(Some(ctx.value)),
            }
        };
        let target = ctx.resolve(uid)?;
        let options = ctx.child_options(target);
        let transformed = ctx.recurse(options, ctx.value.clone()).await?;
        if is_empty_container(&transformed) {
            Ok(None)
        } else {
            Ok(Some(transformed))
        }
    }
    .boxed()
}

static FILTERS: Lazy<Traverser> = Lazy::new(|| {
    Traverser::new()
        .intercept(is_array, recurse_elements)
        .parse_with(is_object, Arc::new(MapParser))
        .on(logical_operator_guard, recurse_same_schema)
        .on(filterable_target_guard, recurse_target)
});

/// Traverses a `filters` clause, returning the transformed clause.
pub async fn traverse_query_filters(
    visitor: &dyn Visitor,
    options: TraverseOptions,
    filters: &Value,
) -> Result<Value, TraverseError> {
    FILTERS.traverse(visitor, options, filters.clone()).await
}
