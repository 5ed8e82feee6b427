//! Re-exports and fixtures for tests and external code.

pub use crate::error::{FoldApiError, FoldApiResult, PaginationError, ValidationError};
pub use crate::permissions::{PermissionDenied, ScopeVerifier};
pub use crate::schema::types::{
    Attribute, RelationKind, ScalarAttribute, ScalarKind, Schema, SchemaError, SchemaKind,
    SchemaOptions,
};
pub use crate::schema::{CachedResolver, ModelRegistry, ModelResolver, FILE_MODEL_UID};
pub use crate::traverse::{
    traverse_entity, Path, TraverseError, TraverseOptions, Traverser, Visitor,
};

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// Grants every scope.
pub struct AllowAll;

#[async_trait]
impl ScopeVerifier for AllowAll {
    async fn verify(&self, _scope: &str) -> Result<(), PermissionDenied> {
        Ok(())
    }
}

/// Denies every scope.
pub struct DenyAll;

#[async_trait]
impl ScopeVerifier for DenyAll {
    async fn verify(&self, scope: &str) -> Result<(), PermissionDenied> {
        Err(PermissionDenied { scope: scope.to_string() })
    }
}

/// Grants exactly the listed scopes.
pub struct ScopeList {
    allowed: HashSet<String>,
}

impl ScopeList {
    #[must_use]
    pub fn new(allowed: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { allowed: allowed.into_iter().map(Into::into).collect() }
    }
}

#[async_trait]
impl ScopeVerifier for ScopeList {
    async fn verify(&self, scope: &str) -> Result<(), PermissionDenied> {
        if self.allowed.contains(scope) {
            Ok(())
        } else {
            Err(PermissionDenied { scope: scope.to_string() })
        }
    }
}

/// Article schema exercising every attribute kind.
pub fn create_article_schema() -> Schema {
    let mut schema = Schema::new("api.article", SchemaKind::CollectionType);
    schema.add_attribute("title", Attribute::scalar(ScalarKind::String));
    schema.add_attribute("body", Attribute::scalar(ScalarKind::Text));
    schema.add_attribute(
        "viewCounter",
        Attribute::Scalar(ScalarAttribute { kind: ScalarKind::Integer, private: true }),
    );
    schema.add_attribute(
        "password",
        Attribute::Scalar(ScalarAttribute { kind: ScalarKind::Password, private: false }),
    );
    schema.add_attribute("author", Attribute::relation(RelationKind::ManyToOne, "api.author"));
    schema.add_attribute("tags", Attribute::relation(RelationKind::ManyToMany, "api.tag"));
    schema.add_attribute("cover", Attribute::Media(crate::schema::types::MediaAttribute {
        multiple: false,
        private: false,
    }));
    schema.add_attribute("meta", Attribute::Component(crate::schema::types::ComponentAttribute {
        component: "comp.meta".to_string(),
        repeatable: false,
        private: false,
    }));
    schema.add_attribute(
        "blocks",
        Attribute::DynamicZone(crate::schema::types::DynamicZoneAttribute {
            components: vec!["comp.quote".to_string(), "comp.meta".to_string()],
            private: false,
        }),
    );
    schema.add_attribute("related", Attribute::morph_to(RelationKind::MorphToMany));
    schema
}

/// Author schema with a private scalar.
pub fn create_author_schema() -> Schema {
    let mut schema = Schema::new("api.author", SchemaKind::CollectionType);
    schema.add_attribute("name", Attribute::scalar(ScalarKind::String));
    schema.add_attribute(
        "email",
        Attribute::Scalar(ScalarAttribute { kind: ScalarKind::Email, private: true }),
    );
    schema.add_attribute("articles", Attribute::relation(RelationKind::OneToMany, "api.article"));
    schema
}

pub fn create_tag_schema() -> Schema {
    let mut schema = Schema::new("api.tag", SchemaKind::CollectionType);
    schema.add_attribute("label", Attribute::scalar(ScalarKind::String));
    schema
}

/// The well-known file schema media attributes resolve through.
pub fn create_file_schema() -> Schema {
    let mut schema = Schema::new(FILE_MODEL_UID, SchemaKind::CollectionType);
    schema.add_attribute("name", Attribute::scalar(ScalarKind::String));
    schema.add_attribute("url", Attribute::scalar(ScalarKind::String));
    schema.add_attribute(
        "providerKey",
        Attribute::Scalar(ScalarAttribute { kind: ScalarKind::String, private: true }),
    );
    schema
}

pub fn create_meta_component_schema() -> Schema {
    let mut schema = Schema::new("comp.meta", SchemaKind::Component);
    schema.add_attribute("keywords", Attribute::scalar(ScalarKind::String));
    schema.add_attribute(
        "internalNote",
        Attribute::Scalar(ScalarAttribute { kind: ScalarKind::Text, private: true }),
    );
    schema
}

pub fn create_quote_component_schema() -> Schema {
    let mut schema = Schema::new("comp.quote", SchemaKind::Component);
    schema.add_attribute("text", Attribute::scalar(ScalarKind::Text));
    schema
}

/// Registry with every fixture schema registered.
pub fn create_test_registry() -> Arc<dyn ModelResolver> {
    Arc::new(
        ModelRegistry::new()
            .with(create_article_schema())
            .with(create_author_schema())
            .with(create_tag_schema())
            .with(create_file_schema())
            .with(create_meta_component_schema())
            .with(create_quote_component_schema()),
    )
}

/// Root traversal options for a fixture schema.
pub fn create_test_options(uid: &str) -> TraverseOptions {
    let resolver = create_test_registry();
    let schema = resolver.get_model(uid).unwrap_or_else(|| panic!("unknown fixture schema {uid}"));
    TraverseOptions::new(schema, resolver)
}
