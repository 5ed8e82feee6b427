//! Traversal of fully materialized data entities.
//!
//! Unlike the query drivers, recursion targets are resolved per concrete
//! attribute kind, including per-element discriminator dispatch for
//! polymorphic relations and dynamic zones. The input is never mutated;
//! callers receive a deep, structurally independent copy.

use futures::future::BoxFuture;
use serde_json::Value;
use std::sync::Arc;

use super::{Parent, TraverseError, TraverseOptions, Visitor, VisitorApi, VisitorContext};
use crate::schema::types::{Attribute, Schema};
use crate::schema::{COMPONENT_DISCRIMINATOR, FILE_MODEL_UID, MORPH_DISCRIMINATOR};

/// Walks every attribute of an object/array tree, invoking `visitor` once
/// per key, strictly in key order, and returns the transformed copy.
///
/// Values whose schema cannot be determined (a dynamic-zone entry without a
/// discriminator, an unregistered uid) are carried over unvisited rather
/// than dropped.
pub async fn traverse_entity(
    visitor: &dyn Visitor,
    options: TraverseOptions,
    entity: &Value,
) -> Result<Value, TraverseError> {
    traverse_value(visitor, options, entity.clone()).await
}

fn traverse_value(
    visitor: &dyn Visitor,
    options: TraverseOptions,
    entity: Value,
) -> BoxFuture<'_, Result<Value, TraverseError>> {
    Box::pin(async move {
        match entity {
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    let element_options = TraverseOptions {
                        path: options.path.descend_index(index),
                        ..options.clone()
                    };
                    out.push(traverse_value(visitor, element_options, item).await?);
                }
                Ok(Value::Array(out))
            }
            Value::Object(map) => {
                if options.schema.attributes.is_empty() {
                    return Ok(Value::Object(map));
                }
                traverse_object(visitor, options, Value::Object(map)).await
            }
            other => Ok(other),
        }
    })
}

async fn traverse_object(
    visitor: &dyn Visitor,
    options: TraverseOptions,
    mut copy: Value,
) -> Result<Value, TraverseError> {
    let keys: Vec<String> = match copy.as_object() {
        Some(map) => map.keys().cloned().collect(),
        None => return Ok(copy),
    };

    for key in keys {
        let attribute = options.schema.attributes.get(&key).cloned();
        let path = options.path.descend(&key, attribute.is_some());

        let value = copy.get(&key).cloned().unwrap_or(Value::Null);
        let mut api = VisitorApi::default();
        visitor
            .visit(
                VisitorContext {
                    data: &copy,
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
            api.apply_to_object(&mut copy);
        }

        // Re-read: the visitor may have removed or rewritten the key.
        let Some(value) = copy.get(&key).cloned() else {
            continue;
        };
        // Null attribute values are visited but never recursed into.
        if value.is_null() {
            continue;
        }
        let Some(attribute) = attribute else {
            continue;
        };

        let child_options = |schema: Arc<Schema>| TraverseOptions {
            schema,
            path: path.clone(),
            parent: Some(Arc::new(Parent {
                schema: options.schema.clone(),
                key: key.clone(),
                path: path.clone(),
                attribute: Some(attribute.clone()),
            })),
            resolver: options.resolver.clone(),
        };

        let next = match &attribute {
            Attribute::Relation(relation) => {
                if relation.kind.is_morph_to() {
                    traverse_morph_value(visitor, &options, &child_options, &path, value).await?
                } else {
                    match relation.target.as_deref().and_then(|uid| options.resolver.get_model(uid))
                    {
                        Some(target) => {
                            traverse_value(visitor, child_options(target), value).await?
                        }
                        None => value,
                    }
                }
            }
            Attribute::Media(_) => match options.resolver.get_model(FILE_MODEL_UID) {
                Some(file) => traverse_value(visitor, child_options(file), value).await?,
                None => value,
            },
            Attribute::Component(component) => {
                match options.resolver.get_model(&component.component) {
                    Some(target) => traverse_value(visitor, child_options(target), value).await?,
                    None => value,
                }
            }
            Attribute::DynamicZone(_) => {
                traverse_zone_entries(visitor, &options, &child_options, &path, value).await?
            }
            Attribute::Scalar(_) => value,
        };

        if let Some(map) = copy.as_object_mut() {
            map.insert(key.clone(), next);
        }
    }

    Ok(copy)
}

/// Recurses a polymorphic relation value, resolving the actual target from
/// each related record's discriminator field.
async fn traverse_morph_value(
    visitor: &dyn Visitor,
    options: &TraverseOptions,
    child_options: &(dyn Fn(Arc<Schema>) -> TraverseOptions + Sync),
    path: &super::Path,
    value: Value,
) -> Result<Value, TraverseError> {
    match value {
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                match morph_target(options, &item) {
                    Some(target) => {
                        let mut element_options = child_options(target);
                        element_options.path = path.descend_index(index);
                        out.push(traverse_value(visitor, element_options, item).await?);
                    }
                    None => out.push(item),
                }
            }
            Ok(Value::Array(out))
        }
        item => match morph_target(options, &item) {
            Some(target) => traverse_value(visitor, child_options(target), item).await,
            None => Ok(item),
        },
    }
}

fn morph_target(options: &TraverseOptions, record: &Value) -> Option<Arc<Schema>> {
    let uid = record.get(MORPH_DISCRIMINATOR)?.as_str()?;
    options.resolver.get_model(uid)
}

/// Recurses dynamic-zone entries, each picking its schema from its own
/// discriminator, independently per element.
async fn traverse_zone_entries(
    visitor: &dyn Visitor,
    options: &TraverseOptions,
    child_options: &(dyn Fn(Arc<Schema>) -> TraverseOptions + Sync),
    path: &super::Path,
    value: Value,
) -> Result<Value, TraverseError> {
    let items = match value {
        Value::Array(items) => items,
        other => return Ok(other),
    };
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let target = item
            .get(COMPONENT_DISCRIMINATOR)
            .and_then(Value::as_str)
            .and_then(|uid| options.resolver.get_model(uid));
        match target {
            Some(schema) => {
                let mut element_options = child_options(schema);
                element_options.path = path.descend_index(index);
                out.push(traverse_value(visitor, element_options, item).await?);
            }
            None => out.push(item),
        }
    }
    Ok(Value::Array(out))
}
