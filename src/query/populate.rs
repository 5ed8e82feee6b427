//! Conversion of public `populate` params into the internal populate tree.
//!
//! String and array forms convert through the canonical object form
//! (`"a.b.c"` ↔ `{a: {populate: {b: {populate: {c: true}}}}}`); the
//! round-trip is lossless for non-wildcard paths. Object forms are
//! validated per key against the schema in context, resolving target
//! schemas before converting nested sub-clauses, and dynamic zones and
//! polymorphic relations accept only fragments or a count request.

use serde_json::{Map, Value};
use std::sync::Arc;

use super::fields::convert_fields_query_params;
use super::filters::convert_filters_query_params;
use super::sort::convert_sort_query_params;
use crate::error::{FoldApiError, ValidationError};
use crate::schema::types::{Schema, SchemaError};
use crate::schema::{ModelResolver, FILE_MODEL_UID};

/// Converts a public `populate` param against `schema`.
///
/// `'*'` at the top level converts to the literal `true`, meaning "fully
/// expand", resolved later by the traversal layer.
pub fn convert_populate_query_params(
    value: &Value,
    schema: &Arc<Schema>,
    resolver: &Arc<dyn ModelResolver>,
) -> Result<Value, FoldApiError> {
    convert_at(value, schema, resolver, "")
}

/// Merges a list of dotted paths into the canonical object form.
#[must_use]
pub fn paths_to_object_populate(paths: &[String]) -> Value {
    let mut root = Map::new();
    for path in paths {
        let segments: Vec<&str> =
            path.split('.').map(str::trim).filter(|segment| !segment.is_empty()).collect();
        insert_path(&mut root, &segments);
    }
    Value::Object(root)
}

fn insert_path(map: &mut Map<String, Value>, segments: &[&str]) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        map.entry((*head).to_string()).or_insert(Value::Bool(true));
        return;
    }
    let entry = map.entry((*head).to_string()).or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }
    if let Some(entry_map) = entry.as_object_mut() {
        let populate =
            entry_map.entry("populate".to_string()).or_insert_with(|| Value::Object(Map::new()));
        if !populate.is_object() {
            *populate = Value::Object(Map::new());
        }
        if let Some(populate_map) = populate.as_object_mut() {
            insert_path(populate_map, rest);
        }
    }
}

/// Inverse of [`paths_to_object_populate`] for trees made of boolean-true
/// leaves and `populate` wrappers.
pub fn object_populate_to_paths(populate: &Value) -> Result<Vec<String>, ValidationError> {
    let Some(map) = populate.as_object() else {
        return Err(ValidationError::InvalidInput("populate must be an object".to_string()));
    };
    let mut paths = Vec::new();
    for (key, entry) in map {
        match entry {
            Value::Bool(true) => paths.push(key.clone()),
            Value::Object(sub) => {
                let Some(nested) = sub.get("populate") else {
                    return Err(ValidationError::InvalidInput(format!(
                        "cannot express populate entry {key} as a path"
                    )));
                };
                for sub_path in object_populate_to_paths(nested)? {
                    paths.push(format!("{key}.{sub_path}"));
                }
            }
            _ => {
                return Err(ValidationError::InvalidInput(format!(
                    "cannot express populate entry {key} as a path"
                )))
            }
        }
    }
    Ok(paths)
}

fn join_path(base: &str, key: &str) -> String {
    if base.is_empty() {
        key.to_string()
    } else {
        format!("{base}.{key}")
    }
}

fn convert_at(
    value: &Value,
    schema: &Arc<Schema>,
    resolver: &Arc<dyn ModelResolver>,
    path: &str,
) -> Result<Value, FoldApiError> {
    match value {
        Value::Bool(flag) => Ok(Value::Bool(*flag)),
        Value::String(input) if input.trim() == "*" => Ok(Value::Bool(true)),
        Value::String(input) => {
            let paths: Vec<String> = input
                .split(',')
                .map(|entry| entry.trim().to_string())
                .filter(|entry| !entry.is_empty())
                .collect();
            let object = paths_to_object_populate(&paths);
            convert_at(&object, schema, resolver, path)
        }
        Value::Array(items) => {
            let mut paths = Vec::with_capacity(items.len());
            for item in items {
                let Some(entry) = item.as_str() else {
                    return Err(ValidationError::InvalidInput(
                        "populate entries must be strings".to_string(),
                    )
                    .into());
                };
                let entry = entry.trim().to_string();
                if !entry.is_empty() && !paths.contains(&entry) {
                    paths.push(entry);
                }
            }
            let object = paths_to_object_populate(&paths);
            convert_at(&object, schema, resolver, path)
        }
        Value::Object(map) => convert_object(map, schema, resolver, path),
        _ => Err(ValidationError::InvalidInput(
            "populate must be a string, an array, an object or a boolean".to_string(),
        )
        .into()),
    }
}

fn convert_object(
    map: &Map<String, Value>,
    schema: &Arc<Schema>,
    resolver: &Arc<dyn ModelResolver>,
    path: &str,
) -> Result<Value, FoldApiError> {
    let mut out = Map::new();
    for (key, entry) in map {
        let attribute_path = join_path(path, key);
        let Some(attribute) = schema.attributes.get(key) else {
            return Err(ValidationError::UnknownAttribute {
                key: key.clone(),
                schema: schema.uid.clone(),
            }
            .into());
        };

        if attribute.is_dynamic_zone() || attribute.is_morph_to_relation() {
            out.insert(
                key.clone(),
                convert_fragment_holder(entry, resolver, &attribute_path)?,
            );
            continue;
        }

        let target_uid = if attribute.is_media() {
            Some(FILE_MODEL_UID)
        } else {
            attribute.target_uid()
        };
        let Some(target_uid) = target_uid else {
            return Err(ValidationError::InvalidInput(format!(
                "attribute {attribute_path} cannot be populated"
            ))
            .into());
        };
        let target = resolver
            .get_model(target_uid)
            .ok_or_else(|| SchemaError::NotFound(target_uid.to_string()))?;

        let converted = match entry {
            Value::Bool(flag) => Value::Bool(*flag),
            Value::String(input) if input.trim() == "*" => Value::Bool(true),
            Value::Object(sub) => convert_nested(sub, &target, resolver, &attribute_path)?,
            _ => {
                return Err(ValidationError::InvalidInput(format!(
                    "invalid populate value for {attribute_path}"
                ))
                .into())
            }
        };
        out.insert(key.clone(), converted);
    }
    Ok(Value::Object(out))
}

/// Dynamic zones and polymorphic relations accept only `{on: …}` fragments
/// or `{count: …}`; anything else names the offending attribute path.
fn convert_fragment_holder(
    entry: &Value,
    resolver: &Arc<dyn ModelResolver>,
    path: &str,
) -> Result<Value, FoldApiError> {
    match entry {
        Value::Bool(flag) => Ok(Value::Bool(*flag)),
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, sub) in map {
                match key.as_str() {
                    "count" => {
                        if !sub.is_boolean() {
                            return Err(ValidationError::InvalidInput(format!(
                                "count must be a boolean at {path}"
                            ))
                            .into());
                        }
                        out.insert(key.clone(), sub.clone());
                    }
                    "on" => {
                        let Some(branches) = sub.as_object() else {
                            return Err(ValidationError::MissingFragment {
                                path: path.to_string(),
                            }
                            .into());
                        };
                        let mut converted = Map::new();
                        for (uid, branch) in branches {
                            let target = resolver
                                .get_model(uid)
                                .ok_or_else(|| SchemaError::NotFound(uid.clone()))?;
                            let converted_branch = match branch {
                                Value::Bool(flag) => Value::Bool(*flag),
                                Value::Object(sub_map) => {
                                    convert_nested(sub_map, &target, resolver, path)?
                                }
                                _ => {
                                    return Err(ValidationError::InvalidInput(format!(
                                        "invalid fragment for {uid} at {path}"
                                    ))
                                    .into())
                                }
                            };
                            converted.insert(uid.clone(), converted_branch);
                        }
                        out.insert(key.clone(), Value::Object(converted));
                    }
                    _ => {
                        return Err(ValidationError::MissingFragment { path: path.to_string() }
                            .into())
                    }
                }
            }
            Ok(Value::Object(out))
        }
        _ => Err(ValidationError::MissingFragment { path: path.to_string() }.into()),
    }
}

/// Sub-clauses of one populated entry, each converted by its own
/// converter with the target schema in context.
fn convert_nested(
    map: &Map<String, Value>,
    schema: &Arc<Schema>,
    resolver: &Arc<dyn ModelResolver>,
    path: &str,
) -> Result<Value, FoldApiError> {
    let mut out = Map::new();
    for (key, entry) in map {
        match key.as_str() {
            "sort" => {
                out.insert(key.clone(), convert_sort_query_params(entry)?);
            }
            "filters" => {
                out.insert(key.clone(), convert_filters_query_params(entry, schema, resolver)?);
            }
            "fields" => {
                if let Some(fields) = convert_fields_query_params(entry)? {
                    out.insert(
                        key.clone(),
                        Value::Array(fields.into_iter().map(Value::String).collect()),
                    );
                }
            }
            "populate" => {
                out.insert(key.clone(), convert_at(entry, schema, resolver, path)?);
            }
            "count" => {
                if !entry.is_boolean() {
                    return Err(ValidationError::InvalidInput(format!(
                        "count must be a boolean at {path}"
                    ))
                    .into());
                }
                out.insert(key.clone(), entry.clone());
            }
            _ => {
                return Err(ValidationError::InvalidInput(format!(
                    "invalid nested populate key {key} at {path}"
                ))
                .into())
            }
        }
    }
    Ok(Value::Object(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn paths_round_trip_through_the_object_form() {
        let paths = vec!["a".to_string(), "b.c".to_string(), "b.d.e".to_string()];
        let object = paths_to_object_populate(&paths);
        assert_eq!(
            object,
            json!({
                "a": true,
                "b": { "populate": { "c": true, "d": { "populate": { "e": true } } } }
            })
        );
        assert_eq!(object_populate_to_paths(&object).unwrap(), paths);
    }
}
