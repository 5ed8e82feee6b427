//! Conversion of public `sort` params into the internal clause form.

use serde_json::{Map, Value};

use crate::error::ValidationError;

fn is_valid_order(order: &str) -> bool {
    order.eq_ignore_ascii_case("asc") || order.eq_ignore_ascii_case("desc")
}

/// Converts a public `sort` param into an array of order objects.
///
/// Accepts `"field"`/`"field:order"` tokens (comma- or array-chainable,
/// dot-paths nesting across relations) and pre-built order objects. Order
/// defaults to `asc`; empty field names and unknown orders are rejected.
pub fn convert_sort_query_params(value: &Value) -> Result<Value, ValidationError> {
    let mut clauses = Vec::new();
    match value {
        Value::String(tokens) => {
            for token in tokens.split(',') {
                clauses.push(token_to_clause(token)?);
            }
        }
        Value::Array(items) => {
            for item in items {
                match item {
                    Value::String(token) => clauses.push(token_to_clause(token)?),
                    Value::Object(_) => {
                        validate_clause_object(item)?;
                        clauses.push(item.clone());
                    }
                    _ => {
                        return Err(ValidationError::InvalidInput(
                            "sort entries must be strings or objects".to_string(),
                        ))
                    }
                }
            }
        }
        Value::Object(_) => {
            validate_clause_object(value)?;
            clauses.push(value.clone());
        }
        _ => {
            return Err(ValidationError::InvalidInput(
                "sort must be a string, an array or an object".to_string(),
            ))
        }
    }
    Ok(Value::Array(clauses))
}

/// `"a.b:desc"` → `{"a": {"b": "desc"}}`, defaulting the order to `asc`.
fn token_to_clause(token: &str) -> Result<Value, ValidationError> {
    let token = token.trim();
    let (field, order) = match token.split_once(':') {
        Some((field, order)) => (field.trim(), order.trim()),
        None => (token, "asc"),
    };
    if field.is_empty() {
        return Err(ValidationError::EmptySortField);
    }
    if !is_valid_order(order) {
        return Err(ValidationError::InvalidOrder { order: order.to_string() });
    }

    let mut clause = Value::String(order.to_string());
    for segment in field.rsplit('.') {
        if segment.is_empty() {
            return Err(ValidationError::EmptySortField);
        }
        let mut wrapper = Map::new();
        wrapper.insert(segment.to_string(), clause);
        clause = Value::Object(wrapper);
    }
    Ok(clause)
}

/// Order objects may nest across relations; the leaves must be orders.
fn validate_clause_object(clause: &Value) -> Result<(), ValidationError> {
    match clause {
        Value::Object(map) => {
            for (field, entry) in map {
                if field.is_empty() {
                    return Err(ValidationError::EmptySortField);
                }
                validate_clause_object(entry)?;
            }
            Ok(())
        }
        Value::String(order) => {
            if is_valid_order(order) {
                Ok(())
            } else {
                Err(ValidationError::InvalidOrder { order: order.clone() })
            }
        }
        _ => Err(ValidationError::InvalidInput(
            "sort orders must be 'asc' or 'desc'".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn converts_comma_chained_tokens() {
        let converted = convert_sort_query_params(&json!("a,b:desc")).unwrap();
        assert_eq!(converted, json!([{ "a": "asc" }, { "b": "desc" }]));
    }

    #[test]
    fn converts_dotted_paths_to_nested_clauses() {
        let converted = convert_sort_query_params(&json!("author.name:desc")).unwrap();
        assert_eq!(converted, json!([{ "author": { "name": "desc" } }]));
    }

    #[test]
    fn rejects_unknown_orders() {
        let err = convert_sort_query_params(&json!("a:sideways")).unwrap_err();
        assert_eq!(err, ValidationError::InvalidOrder { order: "sideways".to_string() });
    }

    #[test]
    fn rejects_empty_field_names() {
        assert_eq!(
            convert_sort_query_params(&json!(":desc")).unwrap_err(),
            ValidationError::EmptySortField
        );
    }
}
