use serde_json::json;
use std::sync::Arc;

use fold_api::error::{FoldApiError, PaginationError, ValidationError};
use fold_api::query::{
    convert_filters_query_params, convert_populate_query_params, transform_params_to_query,
    PaginationConfig, QueryParams, Status,
};
use fold_api::testing::{create_test_registry, ModelResolver};

fn article_context() -> (Arc<fold_api::Schema>, Arc<dyn ModelResolver>) {
    let resolver = create_test_registry();
    let schema = resolver.get_model("api.article").unwrap();
    (schema, resolver)
}

#[test]
fn populate_paths_resolve_through_target_schemas() {
    let (schema, resolver) = article_context();
    let converted =
        convert_populate_query_params(&json!("cover,author.articles"), &schema, &resolver)
            .unwrap();
    assert_eq!(
        converted,
        json!({ "cover": true, "author": { "populate": { "articles": true } } })
    );
}

#[test]
fn populate_wildcard_converts_to_full_expansion() {
    let (schema, resolver) = article_context();
    let converted = convert_populate_query_params(&json!("*"), &schema, &resolver).unwrap();
    assert_eq!(converted, json!(true));
}

#[test]
fn populate_rejects_bare_configs_on_dynamic_zones() {
    let (schema, resolver) = article_context();
    let err = convert_populate_query_params(
        &json!({ "blocks": { "filters": { "text": { "$eq": "x" } } } }),
        &schema,
        &resolver,
    )
    .unwrap_err();
    match err {
        FoldApiError::Validation(ValidationError::MissingFragment { path }) => {
            assert_eq!(path, "blocks");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn populate_accepts_fragments_and_counts_on_dynamic_zones() {
    let (schema, resolver) = article_context();
    let converted = convert_populate_query_params(
        &json!({
            "blocks": { "on": { "comp.quote": { "fields": ["text"] } } },
            "tags": { "count": true }
        }),
        &schema,
        &resolver,
    )
    .unwrap();
    assert_eq!(
        converted,
        json!({
            "blocks": { "on": { "comp.quote": { "fields": ["text", "id"] } } },
            "tags": { "count": true }
        })
    );
}

#[test]
fn populate_rejects_unknown_attributes() {
    let (schema, resolver) = article_context();
    let err =
        convert_populate_query_params(&json!({ "bogus": true }), &schema, &resolver).unwrap_err();
    match err {
        FoldApiError::Validation(ValidationError::UnknownAttribute { key, schema }) => {
            assert_eq!(key, "bogus");
            assert_eq!(schema, "api.article");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn filters_drop_unknown_keys_passwords_and_zones() {
    let (schema, resolver) = article_context();
    let converted = convert_filters_query_params(
        &json!({
            "invAttribute": "test",
            "password": { "$eq": "hunter2" },
            "blocks": { "text": { "$eq": "x" } },
            "title": { "$eq": "Hello" },
            "author": { "name": { "$eq": "Ada" }, "bogus": 1 }
        }),
        &schema,
        &resolver,
    )
    .unwrap();
    assert_eq!(
        converted,
        json!({
            "title": { "$eq": "Hello" },
            "author": { "name": { "$eq": "Ada" } }
        })
    );
}

#[test]
fn filters_prune_containers_emptied_by_removal() {
    let (schema, resolver) = article_context();
    let converted = convert_filters_query_params(
        &json!({ "$and": [ { "invAttribute": 1 } ] }),
        &schema,
        &resolver,
    )
    .unwrap();
    assert_eq!(converted, json!({}));
}

#[test]
fn mixing_pagination_families_raises() {
    let (schema, resolver) = article_context();
    let params = QueryParams { page: Some(1), start: Some(0), ..Default::default() };
    let err = transform_params_to_query(&params, &schema, &resolver, &PaginationConfig::default())
        .unwrap_err();
    assert!(matches!(err, FoldApiError::Pagination(PaginationError::MixedPagination)));
}

#[test]
fn transform_applies_documented_defaults() {
    let (schema, resolver) = article_context();
    let query = transform_params_to_query(
        &QueryParams::default(),
        &schema,
        &resolver,
        &PaginationConfig::default(),
    )
    .unwrap();
    assert_eq!(query.start, Some(0));
    assert_eq!(query.limit, Some(10));
    assert_eq!(query.sort, None);
    assert_eq!(query.status, None);
}

#[test]
fn transform_converts_every_clause() {
    let (schema, resolver) = article_context();
    let params = QueryParams {
        sort: Some(json!("title:desc")),
        filters: Some(json!({ "title": { "$eq": "Hello" } })),
        fields: Some(json!("title,body")),
        populate: Some(json!("author")),
        page_size: Some(999),
        status: Some(Status::Published),
        ..Default::default()
    };
    let config = PaginationConfig { max_limit: Some(50), ..Default::default() };
    let query = transform_params_to_query(&params, &schema, &resolver, &config).unwrap();

    assert_eq!(query.sort, Some(json!([{ "title": "desc" }])));
    assert_eq!(query.filters, Some(json!({ "title": { "$eq": "Hello" } })));
    assert_eq!(
        query.fields,
        Some(vec!["title".to_string(), "body".to_string(), "id".to_string()])
    );
    assert_eq!(query.populate, Some(json!({ "author": true })));
    assert_eq!(query.start, Some(0));
    assert_eq!(query.limit, Some(50));
    assert_eq!(query.status, Some(Status::Published));
}
