//! Conversion of public `filters` params into the internal filter tree.
//!
//! The input is deep-cloned, then recursively stripped of keys that are
//! neither recognized operators nor valid attributes of the schema in
//! context, of dynamic-zone and password attributes, and of containers
//! emptied by those removals. Relation, component and media conditions
//! recurse with their target schema.

use log::debug;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::operators::is_operator;
use crate::error::ValidationError;
use crate::schema::types::{Attribute, Schema};
use crate::schema::{ModelResolver, FILE_MODEL_UID, ID_ATTRIBUTE};

/// Converts a public `filters` param against `schema`.
pub fn convert_filters_query_params(
    value: &Value,
    schema: &Arc<Schema>,
    resolver: &Arc<dyn ModelResolver>,
) -> Result<Value, ValidationError> {
    if !value.is_object() {
        return Err(ValidationError::InvalidInput("filters must be an object".to_string()));
    }
    Ok(clean_value(value.clone(), schema, resolver))
}

fn prunable(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn clean_value(value: Value, schema: &Arc<Schema>, resolver: &Arc<dyn ModelResolver>) -> Value {
    match value {
        Value::Object(map) => clean_object(map, schema, resolver),
        Value::Array(items) => {
            let cleaned: Vec<Value> = items
                .into_iter()
                .map(|item| clean_value(item, schema, resolver))
                .filter(|item| !prunable(item))
                .collect();
            Value::Array(cleaned)
        }
        scalar => scalar,
    }
}

fn clean_object(
    map: Map<String, Value>,
    schema: &Arc<Schema>,
    resolver: &Arc<dyn ModelResolver>,
) -> Value {
    let mut out = Map::new();
    for (key, entry) in map {
        if is_operator(&key) || key == ID_ATTRIBUTE {
            let cleaned = clean_value(entry, schema, resolver);
            if !prunable(&cleaned) {
                out.insert(key, cleaned);
            }
            continue;
        }

        let Some(attribute) = schema.attributes.get(&key) else {
            debug!("dropping unknown filter key {key} on schema {}", schema.uid);
            continue;
        };

        match attribute {
            Attribute::Scalar(scalar) if scalar.kind == crate::schema::types::ScalarKind::Password => {
                debug!("dropping password filter {key} on schema {}", schema.uid);
            }
            Attribute::DynamicZone(_) => {
                debug!("dropping dynamic zone filter {key} on schema {}", schema.uid);
            }
            Attribute::Relation(relation) if relation.kind.is_morph_to() => {
                debug!("dropping polymorphic relation filter {key} on schema {}", schema.uid);
            }
            Attribute::Relation(_) | Attribute::Component(_) | Attribute::Media(_) => {
                let target_uid = match attribute {
                    Attribute::Media(_) => Some(FILE_MODEL_UID),
                    other => other.target_uid(),
                };
                let Some(target) = target_uid.and_then(|uid| resolver.get_model(uid)) else {
                    continue;
                };
                let cleaned = clean_value(entry, &target, resolver);
                if !prunable(&cleaned) {
                    out.insert(key, cleaned);
                }
            }
            Attribute::Scalar(_) => {
                let cleaned = clean_value(entry, schema, resolver);
                if !prunable(&cleaned) {
                    out.insert(key, cleaned);
                }
            }
        }
    }
    Value::Object(out)
}
