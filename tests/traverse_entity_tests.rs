use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Mutex;

use fold_api::testing::{create_test_options, traverse_entity};
use fold_api::traverse::{Noop, TraverseError, Visitor, VisitorApi, VisitorContext};

struct RecordPaths {
    seen: Mutex<Vec<(String, String)>>,
}

impl RecordPaths {
    fn new() -> Self {
        Self { seen: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl Visitor for RecordPaths {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        _api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        self.seen.lock().unwrap().push((
            ctx.path.raw.clone().unwrap_or_default(),
            ctx.path.raw_with_indices.clone().unwrap_or_default(),
        ));
        Ok(())
    }
}

fn sample_article() -> Value {
    json!({
        "id": 1,
        "title": "Hello",
        "password": "hunter2",
        "author": { "id": 7, "name": "Ada", "email": "ada@example.com" },
        "tags": [
            { "id": 1, "label": "rust" },
            { "id": 2, "label": "schemas" }
        ],
        "blocks": [
            { "__component": "comp.quote", "text": "quoted" },
            { "__component": "comp.meta", "keywords": "k", "internalNote": "n" }
        ]
    })
}

#[tokio::test]
async fn noop_traversal_returns_an_equal_copy() {
    let entity = sample_article();
    let copy = traverse_entity(&Noop, create_test_options("api.article"), &entity).await.unwrap();
    assert_eq!(copy, entity);
}

#[tokio::test]
async fn array_indices_appear_only_in_the_index_aware_path() {
    let entity = sample_article();
    let recorder = RecordPaths::new();
    traverse_entity(&recorder, create_test_options("api.article"), &entity).await.unwrap();

    let seen = recorder.seen.lock().unwrap();
    assert!(seen.contains(&("tags.label".to_string(), "tags.0.label".to_string())));
    assert!(seen.contains(&("tags.label".to_string(), "tags.1.label".to_string())));
    assert!(seen.contains(&("blocks.text".to_string(), "blocks.0.text".to_string())));
}

#[tokio::test]
async fn null_relations_are_visited_but_not_recursed() {
    let entity = json!({ "title": "Hello", "author": null });
    let recorder = RecordPaths::new();
    let copy =
        traverse_entity(&recorder, create_test_options("api.article"), &entity).await.unwrap();

    assert_eq!(copy, entity);
    let seen = recorder.seen.lock().unwrap();
    assert!(seen.iter().any(|(raw, _)| raw == "author"));
    assert!(!seen.iter().any(|(raw, _)| raw.starts_with("author.")));
}

#[tokio::test]
async fn dynamic_zone_entries_dispatch_on_their_discriminator() {
    let entity = json!({
        "blocks": [
            { "__component": "comp.meta", "keywords": "k", "internalNote": "secret" },
            { "__component": "comp.unknown", "whatever": true }
        ]
    });
    let visitor = fold_api::sanitize::visitors::RemovePrivate;
    let copy =
        traverse_entity(&visitor, create_test_options("api.article"), &entity).await.unwrap();

    assert_eq!(copy["blocks"][0], json!({ "__component": "comp.meta", "keywords": "k" }));
    // Entries whose schema cannot be determined are carried over unvisited.
    assert_eq!(copy["blocks"][1], entity["blocks"][1]);
}

#[tokio::test]
async fn polymorphic_relations_resolve_their_target_per_record() {
    let entity = json!({
        "related": [
            { "__type": "api.author", "name": "Ada", "email": "ada@example.com" },
            { "__type": "api.tag", "label": "rust" }
        ]
    });
    let visitor = fold_api::sanitize::visitors::RemovePrivate;
    let copy =
        traverse_entity(&visitor, create_test_options("api.article"), &entity).await.unwrap();

    assert_eq!(copy["related"][0], json!({ "__type": "api.author", "name": "Ada" }));
    assert_eq!(copy["related"][1], json!({ "__type": "api.tag", "label": "rust" }));
}

#[tokio::test]
async fn visitor_mutations_are_observed_before_recursion() {
    struct RewriteAuthor;

    #[async_trait]
    impl Visitor for RewriteAuthor {
        async fn visit(
            &self,
            ctx: VisitorContext<'_>,
            api: &mut VisitorApi,
        ) -> Result<(), TraverseError> {
            if ctx.key == "author" && ctx.path.raw.as_deref() == Some("author") {
                api.set("author", json!({ "name": "Grace", "email": "grace@example.com" }));
            }
            if ctx.key == "email" {
                api.remove("email");
            }
            Ok(())
        }
    }

    let entity = json!({ "author": { "name": "Ada" } });
    let copy =
        traverse_entity(&RewriteAuthor, create_test_options("api.article"), &entity).await.unwrap();

    // The rewritten value was recursed into, and its email visited and removed.
    assert_eq!(copy, json!({ "author": { "name": "Grace" } }));
}

#[tokio::test]
async fn removal_during_visit_drops_the_key() {
    struct DropPassword;

    #[async_trait]
    impl Visitor for DropPassword {
        async fn visit(
            &self,
            ctx: VisitorContext<'_>,
            api: &mut VisitorApi,
        ) -> Result<(), TraverseError> {
            if ctx.attribute.is_some_and(|attribute| attribute.is_password()) {
                api.remove(ctx.key);
            }
            Ok(())
        }
    }

    let copy = traverse_entity(&DropPassword, create_test_options("api.article"), &sample_article())
        .await
        .unwrap();
    assert!(copy.get("password").is_none());
    assert_eq!(copy["title"], json!("Hello"));
}
