//! Policy enforcement by throwing.
//!
//! Validators consume the exact same visitor context shape as the
//! sanitizers and reject over identical conditions, raising a typed
//! [`ValidationError`](crate::error::ValidationError) naming the key and
//! dotted path. The first violation aborts the traversal.

pub mod query;
pub mod visitors;

use serde_json::Value;
use std::sync::Arc;

use crate::permissions::ScopeVerifier;
use crate::traverse::{traverse_entity, TraverseError, TraverseOptions};
use visitors::{ThrowRestrictedFields, ThrowRestrictedRelations, ThrowUnrecognizedAttributes};

/// Validates an inbound request body: every key must name a schema
/// attribute (identifiers and discriminators aside), and relation targets
/// must be findable by the caller.
pub async fn input(
    options: TraverseOptions,
    auth: Option<Arc<dyn ScopeVerifier>>,
    entity: &Value,
) -> Result<(), TraverseError> {
    traverse_entity(&ThrowUnrecognizedAttributes, options.clone(), entity).await?;
    if let Some(auth) = auth {
        traverse_entity(&ThrowRestrictedRelations::new(auth), options, entity).await?;
    }
    Ok(())
}

/// Rejects any attribute path outside the explicit allow-list (`None`
/// means no restriction). Mirror of
/// [`sanitize::restrict_fields`](crate::sanitize::restrict_fields).
pub async fn restrict_fields(
    options: TraverseOptions,
    allowed: Option<Vec<String>>,
    entity: &Value,
) -> Result<(), TraverseError> {
    traverse_entity(&ThrowRestrictedFields::new(allowed), options, entity).await?;
    Ok(())
}
