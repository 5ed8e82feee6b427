//! Traversal driver for the `populate` query clause.
//!
//! The most involved driver: string/array/object forms, the `'*'` wildcard
//! (expanded to one `true` entry per populatable attribute, excluding
//! polymorphic relations), polymorphic fragments (`{on: {...}}`), and
//! nested `sort`/`filters`/`fields` sub-clauses which are ignored here and
//! re-dispatched to their own drivers by the composition layer.

use futures::future::{BoxFuture, FutureExt};
use once_cell::sync::Lazy;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::factory::{
    is_array, is_empty_container, is_object, is_string, is_wildcard, HandlerCtx, KeyCtx,
    MapParser, NodeParser, Recurse,
};
use super::{TraverseError, TraverseOptions, Traverser, Visitor};
use crate::schema::types::Attribute;
use crate::schema::FILE_MODEL_UID;

/// Clause keys that may appear inside a populate entry without naming an
/// attribute.
pub const POPULATE_OPERATION_KEYS: &[&str] = &["sort", "filters", "fields", "populate", "on", "count"];

/// Sub-clauses owned by other drivers; never recursed generically here.
pub const NESTED_CLAUSE_KEYS: &[&str] = &["sort", "filters", "fields"];

/// Expands `'*'` to one boolean-true entry per populatable attribute.
///
/// Polymorphic (`MorphTo*`) relations are excluded — they require an
/// explicit fragment — while dynamic zones are included, since their
/// entries self-describe their concrete component.
fn expand_wildcard<'a>(
    recurse: Recurse<'a>,
    options: TraverseOptions,
    _data: Value,
) -> BoxFuture<'a, Result<Value, TraverseError>> {
    async move {
        let mut names: Vec<&String> = options
            .schema
            .attributes
            .iter()
            .filter(|(_, attribute)| {
                attribute.is_populatable() && !attribute.is_morph_to_relation()
            })
            .map(|(name, _)| name)
            .collect();
        names.sort();

        let mut expanded = Map::new();
        for name in names {
            expanded.insert(name.clone(), Value::Bool(true));
        }
        recurse.recurse(options, Value::Object(expanded)).await
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

/// Treats `"a.b.c"` as a container with the single key `a` and nested
/// remainder `"b.c"`. `set` stitches the pieces back, which makes the
/// string↔object canonicalization lossless by construction.
struct PopulateStringParser;

impl NodeParser for PopulateStringParser {
    fn keys(&self, data: &Value) -> Vec<String> {
        let Some(path) = data.as_str() else { return Vec::new() };
        match path.split('.').next() {
            Some(root) if !root.is_empty() => vec![root.to_string()],
            _ => Vec::new(),
        }
    }

    fn get(&self, key: &str, data: &Value) -> Option<Value> {
        let path = data.as_str()?;
        let (root, rest) = match path.split_once('.') {
            Some((root, rest)) => (root, Some(rest)),
            None => (path, None),
        };
        if root != key {
            return None;
        }
        rest.filter(|rest| !rest.is_empty()).map(|rest| Value::String(rest.to_string()))
    }

    fn set(&self, key: &str, value: Value, data: &mut Value) {
        *data = match value {
            Value::String(rest) => Value::String(format!("{key}.{rest}")),
            Value::Bool(true) => Value::String(key.to_string()),
            other => {
                // A nested shape that no longer fits the string form gets
                // promoted to the canonical object form.
                let mut nested = Map::new();
                nested.insert("populate".to_string(), other);
                let mut wrapper = Map::new();
                wrapper.insert(key.to_string(), Value::Object(nested));
                Value::Object(wrapper)
            }
        };
    }

    fn remove(&self, key: &str, data: &mut Value) {
        let Some(path) = data.as_str() else { return };
        let root = path.split('.').next().unwrap_or(path);
        if root == key {
            *data = Value::Null;
        }
    }
}

fn nested_clause_guard(ctx: &KeyCtx<'_>) -> bool {
    ctx.attribute.is_none() && NESTED_CLAUSE_KEYS.contains(&ctx.key)
}

fn populate_key_guard(ctx: &KeyCtx<'_>) -> bool {
    ctx.attribute.is_none() && ctx.key == "populate"
}

/// A nested `populate` key keeps the schema context of its surrounding
/// entry.
fn recurse_nested_populate(
    ctx: HandlerCtx<'_>,
) -> BoxFuture<'_, Result<Option<Value>, TraverseError>> {
    async move {
        let transformed = ctx.recurse(ctx.same_options(), ctx.value.clone()).await?;
        Ok(Some(transformed))
    }
    .boxed()
}

fn fragment_guard(ctx: &KeyCtx<'_>) -> bool {
    ctx.attribute.is_none() && ctx.key == "on"
}

/// Recurses each fragment branch with its concrete schema. Malformed
/// (non-object) fragment values are removed.
fn recurse_fragments(ctx: HandlerCtx<'_>) -> BoxFuture<'_, Result<Option<Value>, TraverseError>> {
    async move {
        let Value::Object(branches) = ctx.value.clone() else {
            return Ok(None);
        };
        let mut out = Map::new();
        for (uid, branch) in branches {
            let schema = ctx.resolve(&uid)?;
            let options = ctx.child_options(schema);
            out.insert(uid, ctx.recurse(options, branch).await?);
        }
        Ok(Some(Value::Object(out)))
    }
    .boxed()
}

fn relation_guard(ctx: &KeyCtx<'_>) -> bool {
    ctx.attribute.is_some_and(|attribute| {
        attribute.is_relation() || attribute.is_component() || attribute.is_media()
    })
}

/// Switches schema context to the populate target. Polymorphic relations
/// keep the current context — only the schema-independent `on`/`count`
/// keys are meaningful inside, and the `on` handler resolves each concrete
/// branch itself.
fn recurse_populate_target(
    ctx: HandlerCtx<'_>,
) -> BoxFuture<'_, Result<Option<Value>, TraverseError>> {
    async move {
        let Some(attribute) = ctx.attribute else {
            return Ok(Some(ctx.value));
        };
        if attribute.is_morph_to_relation() {
            let transformed = ctx.recurse(ctx.same_options(), ctx.value.clone()).await?;
            return Ok(Some(transformed));
        }
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
        Ok(Some(transformed))
    }
    .boxed()
}

fn dynamic_zone_guard(ctx: &KeyCtx<'_>) -> bool {
    ctx.attribute.is_some_and(Attribute::is_dynamic_zone)
}

/// Dynamic zones have no single schema; their entries are reached through
/// fragments, so recursion keeps the current context for the `on` handler.
fn recurse_dynamic_zone(
    ctx: HandlerCtx<'_>,
) -> BoxFuture<'_, Result<Option<Value>, TraverseError>> {
    async move {
        let transformed = ctx.recurse(ctx.same_options(), ctx.value.clone()).await?;
        Ok(Some(transformed))
    }
    .boxed()
}

static POPULATE: Lazy<Traverser> = Lazy::new(|| {
    Traverser::new()
        .intercept(is_wildcard, expand_wildcard)
        .intercept(is_comma_string, split_comma_list)
        .intercept(is_array, recurse_elements)
        .parse_with(is_string, Arc::new(PopulateStringParser))
        .parse_with(is_object, Arc::new(MapParser))
        .ignore(nested_clause_guard)
        .on(populate_key_guard, recurse_nested_populate)
        .on(fragment_guard, recurse_fragments)
        .on(relation_guard, recurse_populate_target)
        .on(dynamic_zone_guard, recurse_dynamic_zone)
});

/// Traverses a `populate` clause, returning the transformed clause.
pub async fn traverse_query_populate(
    visitor: &dyn Visitor,
    options: TraverseOptions,
    populate: &Value,
) -> Result<Value, TraverseError> {
    POPULATE.traverse(visitor, options, populate.clone()).await
}
