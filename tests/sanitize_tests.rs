use serde_json::{json, Value};
use std::sync::Arc;

use fold_api::permissions::ScopeVerifier;
use fold_api::testing::{create_test_options, DenyAll, ScopeList};
use fold_api::{sanitize, validate};

fn sample_article() -> Value {
    json!({
        "id": 1,
        "title": "Hello",
        "viewCounter": 42,
        "password": "hunter2",
        "author": { "id": 7, "name": "Ada", "email": "ada@example.com" },
        "cover": { "id": 3, "url": "/a.png", "providerKey": "s3://secret" },
        "meta": { "keywords": "k", "internalNote": "n" }
    })
}

#[tokio::test]
async fn output_removes_private_and_password_attributes_recursively() {
    let sanitized =
        sanitize::output(create_test_options("api.article"), None, &sample_article())
            .await
            .unwrap();

    assert_eq!(
        sanitized,
        json!({
            "id": 1,
            "title": "Hello",
            "author": { "id": 7, "name": "Ada" },
            "cover": { "id": 3, "url": "/a.png" },
            "meta": { "keywords": "k" }
        })
    );
}

#[tokio::test]
async fn output_removes_relations_the_caller_may_not_find() {
    let auth: Arc<dyn ScopeVerifier> = Arc::new(ScopeList::new(["api.author.find"]));
    let sanitized =
        sanitize::output(create_test_options("api.article"), Some(auth), &sample_article())
            .await
            .unwrap();

    assert!(sanitized.get("author").is_some());
    assert!(sanitized.get("cover").is_none());
    assert_eq!(sanitized["title"], json!("Hello"));
}

#[tokio::test]
async fn input_filters_unauthorized_polymorphic_elements() {
    let body = json!({
        "title": "Hello",
        "related": {
            "connect": [
                { "__type": "api.author", "id": 1 },
                { "__type": "api.tag", "id": 2 }
            ],
            "options": { "strict": true, "bogus": 1 }
        }
    });
    let auth: Arc<dyn ScopeVerifier> = Arc::new(ScopeList::new(["api.tag.find"]));
    let sanitized =
        sanitize::input(create_test_options("api.article"), Some(auth), &body).await.unwrap();

    assert_eq!(
        sanitized["related"],
        json!({
            "connect": [ { "__type": "api.tag", "id": 2 } ],
            "options": { "strict": true }
        })
    );
}

#[tokio::test]
async fn input_removes_the_relation_when_nothing_survives() {
    let body = json!({
        "related": { "connect": [ { "__type": "api.author", "id": 1 } ] }
    });
    let auth: Arc<dyn ScopeVerifier> = Arc::new(DenyAll);
    let sanitized =
        sanitize::input(create_test_options("api.article"), Some(auth), &body).await.unwrap();

    assert!(sanitized.get("related").is_none());
}

#[tokio::test]
async fn filters_drop_unknown_keys() {
    let sanitized = sanitize::query::filters(
        create_test_options("api.article"),
        None,
        &json!({ "invAttribute": "test" }),
    )
    .await
    .unwrap();
    assert_eq!(sanitized, json!({}));
}

#[tokio::test]
async fn filters_keep_operator_trees_on_valid_attributes() {
    let filters = json!({
        "$and": [
            { "title": { "$eq": "Hello" } },
            { "author": { "name": { "$contains": "Ada" } } }
        ]
    });
    let sanitized =
        sanitize::query::filters(create_test_options("api.article"), None, &filters)
            .await
            .unwrap();
    assert_eq!(sanitized, filters);
}

#[tokio::test]
async fn sanitized_filters_always_pass_validation() {
    let filters = json!({
        "invAttribute": "test",
        "password": { "$eq": "hunter2" },
        "viewCounter": { "$gt": 1 },
        "blocks": { "text": { "$eq": "quoted" } },
        "related": { "label": { "$eq": "rust" } },
        "title": { "$eq": "Hello" },
        "author": { "email": { "$eq": "x" }, "name": { "$eq": "Ada" } }
    });
    let auth: Arc<dyn ScopeVerifier> = Arc::new(DenyAll);

    let sanitized = sanitize::query::filters(
        create_test_options("api.article"),
        Some(auth.clone()),
        &filters,
    )
    .await
    .unwrap();

    validate::query::filters(create_test_options("api.article"), Some(auth), &sanitized)
        .await
        .unwrap();
}

#[tokio::test]
async fn sort_drops_unknown_fields_and_keeps_valid_tokens() {
    let sanitized = sanitize::query::sort(
        create_test_options("api.article"),
        &json!("title,bogus:desc"),
    )
    .await
    .unwrap();
    assert_eq!(sanitized, json!(["title"]));
}

#[tokio::test]
async fn sort_recurses_across_relations() {
    let sanitized = sanitize::query::sort(
        create_test_options("api.article"),
        &json!({ "author": { "name": "desc", "email": "asc" } }),
    )
    .await
    .unwrap();
    assert_eq!(sanitized, json!({ "author": { "name": "desc" } }));
}

#[tokio::test]
async fn fields_drop_unknown_and_private_selections() {
    let sanitized = sanitize::query::fields(
        create_test_options("api.article"),
        &json!(["title", "viewCounter", "bogus", "id"]),
    )
    .await
    .unwrap();
    assert_eq!(sanitized, json!(["title", "id"]));
}

#[tokio::test]
async fn populate_wildcard_expands_without_polymorphic_relations() {
    let sanitized =
        sanitize::query::populate(create_test_options("api.article"), None, &json!("*"))
            .await
            .unwrap();
    assert_eq!(
        sanitized,
        json!({ "author": true, "blocks": true, "cover": true, "meta": true, "tags": true })
    );
}

#[tokio::test]
async fn populate_keeps_string_clauses_as_strings() {
    let sanitized = sanitize::query::populate(
        create_test_options("api.article"),
        None,
        &json!("author.articles"),
    )
    .await
    .unwrap();
    assert_eq!(sanitized, json!("author.articles"));
}

#[tokio::test]
async fn populate_sanitizes_nested_clauses_with_the_target_schema() {
    let populate = json!({
        "author": {
            "fields": ["name", "bogus"],
            "sort": "email",
            "populate": { "articles": true }
        }
    });
    let sanitized =
        sanitize::query::populate(create_test_options("api.article"), None, &populate)
            .await
            .unwrap();

    // The sort clause named only a private field and sanitized away whole.
    assert_eq!(
        sanitized,
        json!({
            "author": {
                "fields": ["name"],
                "populate": { "articles": true }
            }
        })
    );
}

#[tokio::test]
async fn populate_drops_unauthorized_relations() {
    let auth: Arc<dyn ScopeVerifier> = Arc::new(ScopeList::new(["api.author.find"]));
    let sanitized = sanitize::query::populate(
        create_test_options("api.article"),
        Some(auth),
        &json!({ "author": true, "tags": true }),
    )
    .await
    .unwrap();
    assert_eq!(sanitized, json!({ "author": true }));
}

#[tokio::test]
async fn restrict_fields_keeps_ids_under_allowed_parents() {
    let entity = json!({
        "id": 1,
        "title": "Hello",
        "body": "text",
        "author": { "id": 7, "name": "Ada" }
    });
    let allowed = Some(vec!["title".to_string(), "author.name".to_string()]);
    let restricted =
        sanitize::restrict_fields(create_test_options("api.article"), allowed, &entity)
            .await
            .unwrap();

    assert_eq!(
        restricted,
        json!({ "id": 1, "title": "Hello", "author": { "id": 7, "name": "Ada" } })
    );
}

#[tokio::test]
async fn creator_fields_bypass_authorization_when_opted_in() {
    use fold_api::testing::{
        create_author_schema, create_file_schema, create_tag_schema, ModelRegistry, SchemaKind,
        SchemaOptions, TraverseOptions,
    };
    use fold_api::testing::{Attribute, RelationKind, ScalarKind, Schema};

    let mut article = Schema::new("api.article", SchemaKind::CollectionType).with_options(
        SchemaOptions { populate_creator_fields: true, ..Default::default() },
    );
    article.add_attribute("title", Attribute::scalar(ScalarKind::String));
    article.add_attribute("createdBy", Attribute::relation(RelationKind::ManyToOne, "api.author"));
    article.add_attribute("editedBy", Attribute::relation(RelationKind::ManyToOne, "api.author"));

    let resolver = Arc::new(
        ModelRegistry::new()
            .with(article.clone())
            .with(create_author_schema())
            .with(create_tag_schema())
            .with(create_file_schema()),
    );
    let options = TraverseOptions::new(Arc::new(article), resolver);

    let auth: Arc<dyn ScopeVerifier> = Arc::new(DenyAll);
    let entity = json!({
        "title": "Hello",
        "createdBy": { "name": "Ada" },
        "editedBy": { "name": "Eve" }
    });
    let sanitized = sanitize::output(options, Some(auth), &entity).await.unwrap();

    // createdBy survives the denied scope check, the ordinary relation not.
    assert_eq!(sanitized["createdBy"], json!({ "name": "Ada" }));
    assert!(sanitized.get("editedBy").is_none());
}
