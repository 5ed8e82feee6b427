//! Traversal driver for the `fields` query clause.
//!
//! Accepts a comma-separated string, an array of strings, or the `'*'`
//! wildcard, normalized to a flat list. Visitors may remove disallowed
//! field names; there is nothing to recurse into.

use futures::future::{BoxFuture, FutureExt};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::sync::Arc;

use super::factory::{is_array, is_string, is_wildcard, Recurse, StringListParser};
use super::{TraverseError, TraverseOptions, Traverser, Visitor};

fn pass_wildcard<'a>(
    _recurse: Recurse<'a>,
    _options: TraverseOptions,
    data: Value,
) -> BoxFuture<'a, Result<Value, TraverseError>> {
    // '*' selects every field; there is no list to visit.
    async move { Ok(data) }.boxed()
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

static FIELDS: Lazy<Traverser> = Lazy::new(|| {
    Traverser::new()
        .intercept(is_wildcard, pass_wildcard)
        .intercept(is_string, split_comma_list)
        .parse_with(is_array, Arc::new(StringListParser))
});

/// Traverses a `fields` clause, returning the transformed clause.
pub async fn traverse_query_fields(
    visitor: &dyn Visitor,
    options: TraverseOptions,
    fields: &Value,
) -> Result<Value, TraverseError> {
    FIELDS.traverse(visitor, options, fields.clone()).await
}
