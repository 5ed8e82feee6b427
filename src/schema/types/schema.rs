use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::attribute::Attribute;

/// Whether a schema describes a collection, a single entry, or a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SchemaKind {
    CollectionType,
    SingleType,
    Component,
}

/// Behavioral toggles a schema may opt into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaOptions {
    /// Entries carry a `publishedAt` timestamp and support draft/published
    /// status filtering.
    #[serde(default)]
    pub draft_and_publish: bool,
    /// The `createdBy`/`updatedBy` creator relations are exposed through
    /// populate regardless of authorization scopes.
    #[serde(default)]
    pub populate_creator_fields: bool,
}

/// Defines the structure of a content type or component.
///
/// A Schema is pure data consumed by every traversal driver: a unique uid,
/// a kind, and a mapping from attribute name to [`Attribute`]. Attribute
/// names are unique within a schema and lookups are O(1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Unique uid identifying this schema
    pub uid: String,
    /// Collection type, single type, or component
    pub kind: SchemaKind,
    /// Attribute definitions keyed by name
    pub attributes: HashMap<String, Attribute>,
    /// Behavioral toggles
    #[serde(default)]
    pub options: SchemaOptions,
}

impl Schema {
    /// Creates an empty schema with the given uid and kind.
    #[must_use]
    pub fn new(uid: impl Into<String>, kind: SchemaKind) -> Self {
        Self {
            uid: uid.into(),
            kind,
            attributes: HashMap::new(),
            options: SchemaOptions::default(),
        }
    }

    /// Sets all attributes at once.
    #[must_use]
    pub fn with_attributes(mut self, attributes: HashMap<String, Attribute>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Sets the schema options.
    #[must_use]
    pub fn with_options(mut self, options: SchemaOptions) -> Self {
        self.options = options;
        self
    }

    /// Adds a single attribute definition.
    pub fn add_attribute(&mut self, name: impl Into<String>, attribute: Attribute) {
        self.attributes.insert(name.into(), attribute);
    }

    /// Looks up an attribute by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Whether the schema defines an attribute with this name.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }
}
