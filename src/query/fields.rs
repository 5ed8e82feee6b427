//! Conversion of public `fields` params into the internal selection list.

use serde_json::Value;

use crate::error::ValidationError;
use crate::schema::ID_ATTRIBUTE;

/// Converts a public `fields` param into a deduplicated selection list.
///
/// `'*'` (alone or as an entry) means "all fields" and converts to `None`,
/// i.e. no restriction. Any other input normalizes to a trimmed list that
/// always includes the identity field.
pub fn convert_fields_query_params(
    value: &Value,
) -> Result<Option<Vec<String>>, ValidationError> {
    let entries: Vec<String> = match value {
        Value::String(list) => list.split(',').map(|entry| entry.trim().to_string()).collect(),
        Value::Array(items) => {
            let mut entries = Vec::with_capacity(items.len());
            for item in items {
                let Some(entry) = item.as_str() else {
                    return Err(ValidationError::InvalidInput(
                        "fields entries must be strings".to_string(),
                    ));
                };
                entries.push(entry.trim().to_string());
            }
            entries
        }
        _ => {
            return Err(ValidationError::InvalidInput(
                "fields must be a string or an array of strings".to_string(),
            ))
        }
    };

    if entries.iter().any(|entry| entry == "*") {
        return Ok(None);
    }

    let mut fields: Vec<String> = Vec::with_capacity(entries.len() + 1);
    for entry in entries {
        if !entry.is_empty() && !fields.contains(&entry) {
            fields.push(entry);
        }
    }
    if !fields.iter().any(|field| field == ID_ATTRIBUTE) {
        fields.push(ID_ATTRIBUTE.to_string());
    }
    Ok(Some(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wildcard_means_no_restriction() {
        assert_eq!(convert_fields_query_params(&json!("*")).unwrap(), None);
        assert_eq!(convert_fields_query_params(&json!(["title", "*"])).unwrap(), None);
    }

    #[test]
    fn normalizes_and_keeps_the_identity_field() {
        let fields = convert_fields_query_params(&json!(" title , body ,title")).unwrap();
        assert_eq!(
            fields,
            Some(vec!["title".to_string(), "body".to_string(), "id".to_string()])
        );
    }
}
