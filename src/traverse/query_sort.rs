//! Traversal driver for the `sort` query clause.
//!
//! Accepts `"a,b:desc"` strings, arrays of strings, and single or arrays of
//! `{field: "asc"|"desc"}` objects, possibly nested across relations.
//! Order tokens are validated case-insensitively against `asc`/`desc` in
//! both sanitize and validate modes; the token is structural, not policy.

use futures::future::{BoxFuture, FutureExt};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::sync::Arc;

use super::factory::{
    is_array, is_empty_container, is_object, is_string, HandlerCtx, MapParser, NodeParser, Recurse,
};
use super::{TraverseError, TraverseOptions, Traverser, Visitor};
use crate::error::ValidationError;
use crate::schema::types::Attribute;
use crate::schema::FILE_MODEL_UID;

fn is_valid_order(order: &str) -> bool {
    order.eq_ignore_ascii_case("asc") || order.eq_ignore_ascii_case("desc")
}

/// Splits a sort token into its field path and optional order.
fn split_token(token: &str) -> (&str, Option<&str>) {
    match token.split_once(':') {
        Some((field, order)) => (field, Some(order)),
        None => (token, None),
    }
}

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

fn is_comma_string(data: &Value) -> bool {
    data.as_str().is_some_and(|s| s.contains(','))
}

fn split_comma_list<'a>(
    recurse: Recurse<'a>,
    options: TraverseOptions,
    data: Value,
) -> BoxFuture<'a, Result<Value, TraverseError>> {
    async move {
        let parts: Vec<Value> = data
            .as_str()
            .unwrap_or_default()
            .split(',')
            .map(|part| Value::String(part.trim().to_string()))
            .collect();
        recurse.recurse(options, Value::Array(parts)).await
    }
    .boxed()
}

/// Treats `"a.b:desc"` as a container with the single key `a` and nested
/// remainder `"b:desc"`; `set` stitches the pieces back, so sanitized
/// string clauses keep their string shape.
struct SortStringParser;

impl NodeParser for SortStringParser {
    fn keys(&self, data: &Value) -> Vec<String> {
        let Some(token) = data.as_str() else { return Vec::new() };
        let (field, _) = split_token(token);
        match field.split('.').next() {
            Some(root) if !root.is_empty() => vec![root.to_string()],
            _ => Vec::new(),
        }
    }

    fn get(&self, key: &str, data: &Value) -> Option<Value> {
        let token = data.as_str()?;
        let (field, order) = split_token(token);
        let (root, rest) = match field.split_once('.') {
            Some((root, rest)) => (root, Some(rest)),
            None => (field, None),
        };
        if root != key {
            return None;
        }
        match (rest, order) {
            (Some(rest), Some(order)) => Some(Value::String(format!("{rest}:{order}"))),
            (Some(rest), None) => Some(Value::String(rest.to_string())),
            (None, Some(order)) => Some(Value::String(order.to_string())),
            (None, None) => None,
        }
    }

    fn set(&self, key: &str, value: Value, data: &mut Value) {
        let nested = match data.as_str() {
            Some(token) => split_token(token).0.contains('.'),
            None => return,
        };
        let Some(rest) = value.as_str() else { return };
        *data = if nested {
            Value::String(format!("{key}.{rest}"))
        } else {
            Value::String(format!("{key}:{rest}"))
        };
    }

    fn remove(&self, key: &str, data: &mut Value) {
        let Some(token) = data.as_str() else { return };
        let (field, _) = split_token(token);
        let root = field.split('.').next().unwrap_or(field);
        if root == key {
            *data = Value::Null;
        }
    }
}

fn has_sortable_target(ctx: &super::factory::KeyCtx<'_>) -> bool {
    ctx.attribute.is_some_and(|attribute| {
        attribute.is_media()
            || ((attribute.is_relation() || attribute.is_component())
                && attribute.target_uid().is_some())
    })
}

/// Recurses `a.b:desc` (or nested object) sorts through the target schema
/// so the clause can sort by a related record's field.
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

fn order_token_guard(ctx: &super::factory::KeyCtx<'_>) -> bool {
    ctx.attribute.is_some_and(Attribute::is_scalar) && ctx.value.is_string()
}

fn check_order_token(ctx: HandlerCtx<'_>) -> BoxFuture<'_, Result<Option<Value>, TraverseError>> {
    async move {
        let order = ctx.value.as_str().unwrap_or_default().to_string();
        if is_valid_order(&order) {
            Ok(Some(ctx.value))
        } else {
            Err(ValidationError::InvalidOrder { order }.into())
        }
    }
    .boxed()
}

static SORT: Lazy<Traverser> = Lazy::new(|| {
    Traverser::new()
        .intercept(is_array, recurse_elements)
        .intercept(is_comma_string, split_comma_list)
        .parse_with(is_string, Arc::new(SortStringParser))
        .parse_with(is_object, Arc::new(MapParser))
        .on(has_sortable_target, recurse_target)
        .on(order_token_guard, check_order_token)
});

/// Traverses a `sort` clause, returning the transformed clause.
pub async fn traverse_query_sort(
    visitor: &dyn Visitor,
    options: TraverseOptions,
    sort: &Value,
) -> Result<Value, TraverseError> {
    SORT.traverse(visitor, options, sort.clone()).await
}
