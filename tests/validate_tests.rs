use serde_json::json;
use std::sync::Arc;

use fold_api::error::ValidationError;
use fold_api::permissions::ScopeVerifier;
use fold_api::testing::{create_test_options, AllowAll, DenyAll};
use fold_api::traverse::TraverseError;
use fold_api::validate;

fn invalid_parameter_key(err: &TraverseError) -> Option<&str> {
    match err {
        TraverseError::Validation(ValidationError::InvalidParameter { key, .. }) => Some(key),
        _ => None,
    }
}

#[tokio::test]
async fn filters_reject_unknown_keys() {
    let err = validate::query::filters(
        create_test_options("api.article"),
        None,
        &json!({ "invAttribute": "test" }),
    )
    .await
    .unwrap_err();
    assert_eq!(invalid_parameter_key(&err), Some("invAttribute"));
}

#[tokio::test]
async fn filters_reject_dynamic_zones_and_passwords() {
    let err = validate::query::filters(
        create_test_options("api.article"),
        None,
        &json!({ "blocks": { "text": { "$eq": "x" } } }),
    )
    .await
    .unwrap_err();
    assert_eq!(invalid_parameter_key(&err), Some("blocks"));

    let err = validate::query::filters(
        create_test_options("api.article"),
        None,
        &json!({ "password": { "$eq": "hunter2" } }),
    )
    .await
    .unwrap_err();
    assert_eq!(invalid_parameter_key(&err), Some("password"));
}

#[tokio::test]
async fn filters_accept_valid_operator_trees() {
    validate::query::filters(
        create_test_options("api.article"),
        None,
        &json!({ "$or": [ { "title": { "$eq": "Hello" } }, { "id": { "$in": [1, 2] } } ] }),
    )
    .await
    .unwrap();
}

#[tokio::test]
async fn validation_errors_name_the_nested_path() {
    let err = validate::query::filters(
        create_test_options("api.article"),
        None,
        &json!({ "author": { "bogus": { "$eq": 1 } } }),
    )
    .await
    .unwrap_err();
    match err {
        TraverseError::Validation(ValidationError::InvalidParameter { key, path }) => {
            assert_eq!(key, "bogus");
            assert_eq!(path, "author.bogus");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn sort_rejects_invalid_orders_and_unknown_fields() {
    let err =
        validate::query::sort(create_test_options("api.article"), &json!("title:sideways"))
            .await
            .unwrap_err();
    assert!(matches!(
        err,
        TraverseError::Validation(ValidationError::InvalidOrder { ref order }) if order == "sideways"
    ));

    let err = validate::query::sort(create_test_options("api.article"), &json!("bogus:desc"))
        .await
        .unwrap_err();
    assert_eq!(invalid_parameter_key(&err), Some("bogus"));
}

#[tokio::test]
async fn fields_reject_unknown_and_private_selections() {
    let err = validate::query::fields(create_test_options("api.article"), &json!(["bogus"]))
        .await
        .unwrap_err();
    assert_eq!(invalid_parameter_key(&err), Some("bogus"));

    let err =
        validate::query::fields(create_test_options("api.article"), &json!(["viewCounter"]))
            .await
            .unwrap_err();
    assert_eq!(invalid_parameter_key(&err), Some("viewCounter"));
}

#[tokio::test]
async fn populate_rejects_scalar_attributes_and_unknown_keys() {
    let err = validate::query::populate(
        create_test_options("api.article"),
        None,
        &json!({ "title": true }),
    )
    .await
    .unwrap_err();
    assert_eq!(invalid_parameter_key(&err), Some("title"));

    let err = validate::query::populate(
        create_test_options("api.article"),
        None,
        &json!({ "bogus": true }),
    )
    .await
    .unwrap_err();
    assert_eq!(invalid_parameter_key(&err), Some("bogus"));
}

#[tokio::test]
async fn populate_rejects_unauthorized_relations() {
    let auth: Arc<dyn ScopeVerifier> = Arc::new(DenyAll);
    let err = validate::query::populate(
        create_test_options("api.article"),
        Some(auth),
        &json!({ "author": true }),
    )
    .await
    .unwrap_err();
    assert_eq!(invalid_parameter_key(&err), Some("author"));
}

#[tokio::test]
async fn morph_relation_options_outside_the_allow_list_are_rejected() {
    let body = json!({
        "related": {
            "connect": [ { "__type": "api.tag", "id": 2 } ],
            "options": { "strict": true, "bogus": 1 }
        }
    });
    let auth: Arc<dyn ScopeVerifier> = Arc::new(AllowAll);
    let err = validate::input(create_test_options("api.article"), Some(auth), &body)
        .await
        .unwrap_err();
    assert_eq!(invalid_parameter_key(&err), Some("bogus"));
}

#[tokio::test]
async fn input_accepts_recognized_attributes_and_structural_keys() {
    let body = json!({
        "id": 1,
        "title": "Hello",
        "blocks": [ { "__component": "comp.quote", "text": "quoted" } ]
    });
    validate::input(create_test_options("api.article"), None, &body).await.unwrap();
}

#[tokio::test]
async fn input_rejects_unrecognized_attributes() {
    let body = json!({ "title": "Hello", "invAttribute": 1 });
    let err = validate::input(create_test_options("api.article"), None, &body)
        .await
        .unwrap_err();
    assert_eq!(invalid_parameter_key(&err), Some("invAttribute"));
}
