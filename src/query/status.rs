//! Draft/publish status filtering.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::schema::types::Schema;

/// Public `status` query values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Draft,
    Published,
}

/// The filter predicate a status resolves to against a concrete schema.
///
/// Evaluated lazily at query-execution time so it can no-op (`None`) for
/// schemas that do not enable draft/publish.
#[must_use]
pub fn status_filter(status: Status, schema: &Schema) -> Option<Value> {
    if !schema.options.draft_and_publish {
        return None;
    }
    Some(match status {
        Status::Draft => json!({ "publishedAt": { "$null": true } }),
        Status::Published => json!({ "publishedAt": { "$notNull": true } }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{SchemaKind, SchemaOptions};

    #[test]
    fn status_noops_without_draft_and_publish() {
        let schema = Schema::new("api.article", SchemaKind::CollectionType);
        assert_eq!(status_filter(Status::Draft, &schema), None);
    }

    #[test]
    fn status_resolves_against_published_at() {
        let schema = Schema::new("api.article", SchemaKind::CollectionType).with_options(
            SchemaOptions { draft_and_publish: true, ..Default::default() },
        );
        assert_eq!(
            status_filter(Status::Published, &schema),
            Some(json!({ "publishedAt": { "$notNull": true } }))
        );
    }
}
