//! Policy enforcement by silent removal.
//!
//! Sanitizers never raise for a policy violation — the offending fragment
//! of data is dropped and traversal continues. The throwing counterparts
//! live in [`validate`](crate::validate), defined over the same
//! conditions.

pub mod query;
pub mod visitors;

use serde_json::Value;
use std::sync::Arc;

use crate::permissions::ScopeVerifier;
use crate::traverse::{traverse_entity, TraverseError, TraverseOptions};
use visitors::{
    RemovePassword, RemovePrivate, RemoveRestrictedFields, RemoveRestrictedRelations,
};

/// Sanitizes an outbound entity before serialization: unauthorized
/// relations (when an auth capability is supplied), private attributes,
/// then passwords.
pub async fn output(
    options: TraverseOptions,
    auth: Option<Arc<dyn ScopeVerifier>>,
    entity: &Value,
) -> Result<Value, TraverseError> {
    let mut current = entity.clone();
    if let Some(auth) = auth {
        current =
            traverse_entity(&RemoveRestrictedRelations::new(auth), options.clone(), &current)
                .await?;
    }
    current = traverse_entity(&RemovePrivate, options.clone(), &current).await?;
    current = traverse_entity(&RemovePassword, options, &current).await?;
    Ok(current)
}

/// Sanitizes an inbound request body: relations whose target the caller
/// may not find are dropped.
pub async fn input(
    options: TraverseOptions,
    auth: Option<Arc<dyn ScopeVerifier>>,
    entity: &Value,
) -> Result<Value, TraverseError> {
    match auth {
        Some(auth) => {
            traverse_entity(&RemoveRestrictedRelations::new(auth), options, entity).await
        }
        None => Ok(entity.clone()),
    }
}

/// Restricts an entity to an explicit allow-list of attribute paths
/// (`None` means no restriction).
pub async fn restrict_fields(
    options: TraverseOptions,
    allowed: Option<Vec<String>>,
    entity: &Value,
) -> Result<Value, TraverseError> {
    traverse_entity(&RemoveRestrictedFields::new(allowed), options, entity).await
}
