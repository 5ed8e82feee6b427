use serde_json::json;

use fold_api::query::{object_populate_to_paths, paths_to_object_populate};
use fold_api::testing::create_test_options;
use fold_api::traverse::query_populate::traverse_query_populate;
use fold_api::traverse::Noop;

#[test]
fn single_dotted_path_round_trips_exactly() {
    let paths = vec!["a.b.c".to_string()];
    let object = paths_to_object_populate(&paths);
    assert_eq!(
        object,
        json!({ "a": { "populate": { "b": { "populate": { "c": true } } } } })
    );
    assert_eq!(object_populate_to_paths(&object).unwrap(), paths);
}

#[test]
fn non_overlapping_path_lists_round_trip() {
    let paths = vec![
        "author".to_string(),
        "cover.name".to_string(),
        "tags.label".to_string(),
    ];
    let object = paths_to_object_populate(&paths);
    assert_eq!(object_populate_to_paths(&object).unwrap(), paths);
}

#[test]
fn overlapping_paths_merge_in_the_object_form() {
    let paths = vec!["b".to_string(), "b.c".to_string()];
    let object = paths_to_object_populate(&paths);
    assert_eq!(object, json!({ "b": { "populate": { "c": true } } }));
}

#[tokio::test]
async fn traversal_preserves_string_populate_shapes() {
    let traversed = traverse_query_populate(
        &Noop,
        create_test_options("api.article"),
        &json!("author.articles"),
    )
    .await
    .unwrap();
    assert_eq!(traversed, json!("author.articles"));
}

#[tokio::test]
async fn traversal_preserves_object_populate_shapes() {
    let populate = json!({ "author": { "populate": { "articles": true } } });
    let traversed =
        traverse_query_populate(&Noop, create_test_options("api.article"), &populate)
            .await
            .unwrap();
    assert_eq!(traversed, populate);
}
