//! Sanitization passes for the REST query clauses.
//!
//! Each function runs a sequence of independent policy passes over one
//! clause; removal is the only recovery action, nothing here raises for a
//! policy violation.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::visitors::{
    RemoveDynamicZones, RemoveInvalidFilterKeys, RemoveInvalidFields, RemoveInvalidPopulateKeys,
    RemoveInvalidSortKeys, RemoveMorphToRelations, RemoveNonPopulatableAttributes, RemovePassword,
    RemovePrivate, RemoveRestrictedRelations,
};
use crate::permissions::ScopeVerifier;
use crate::traverse::query_fields::traverse_query_fields;
use crate::traverse::query_filters::traverse_query_filters;
use crate::traverse::query_populate::{traverse_query_populate, NESTED_CLAUSE_KEYS};
use crate::traverse::query_sort::traverse_query_sort;
use crate::traverse::{TraverseError, TraverseOptions, Visitor, VisitorApi, VisitorContext};

/// Sanitizes a `filters` clause.
pub async fn filters(
    options: TraverseOptions,
    auth: Option<Arc<dyn ScopeVerifier>>,
    value: &Value,
) -> Result<Value, TraverseError> {
    let mut current = traverse_query_filters(&RemoveInvalidFilterKeys, options.clone(), value).await?;
    current = traverse_query_filters(&RemoveDynamicZones, options.clone(), &current).await?;
    current = traverse_query_filters(&RemoveMorphToRelations, options.clone(), &current).await?;
    current = traverse_query_filters(&RemovePassword, options.clone(), &current).await?;
    current = traverse_query_filters(&RemovePrivate, options.clone(), &current).await?;
    if let Some(auth) = auth {
        current =
            traverse_query_filters(&RemoveRestrictedRelations::new(auth), options, &current)
                .await?;
    }
    Ok(current)
}

/// Sanitizes a `sort` clause.
pub async fn sort(options: TraverseOptions, value: &Value) -> Result<Value, TraverseError> {
    let mut current = traverse_query_sort(&RemoveInvalidSortKeys, options.clone(), value).await?;
    current = traverse_query_sort(&RemovePassword, options.clone(), &current).await?;
    current = traverse_query_sort(&RemovePrivate, options, &current).await?;
    Ok(current)
}

/// Sanitizes a `fields` clause.
pub async fn fields(options: TraverseOptions, value: &Value) -> Result<Value, TraverseError> {
    let mut current = traverse_query_fields(&RemoveInvalidFields, options.clone(), value).await?;
    current = traverse_query_fields(&RemovePassword, options.clone(), &current).await?;
    current = traverse_query_fields(&RemovePrivate, options, &current).await?;
    Ok(current)
}

/// Sanitizes a `populate` clause, re-dispatching nested
/// `sort`/`filters`/`fields` sub-clauses to their own sanitizers.
pub async fn populate(
    options: TraverseOptions,
    auth: Option<Arc<dyn ScopeVerifier>>,
    value: &Value,
) -> Result<Value, TraverseError> {
    let mut current =
        traverse_query_populate(&RemoveInvalidPopulateKeys, options.clone(), value).await?;
    current =
        traverse_query_populate(&RemoveNonPopulatableAttributes, options.clone(), &current).await?;
    current = traverse_query_populate(&RemovePrivate, options.clone(), &current).await?;
    current = traverse_query_populate(
        &SanitizeNestedClauses { auth: auth.clone() },
        options.clone(),
        &current,
    )
    .await?;
    if let Some(auth) = auth {
        current =
            traverse_query_populate(&RemoveRestrictedRelations::new(auth), options, &current)
                .await?;
    }
    Ok(current)
}

/// Re-dispatches nested clause keys to the matching specialized sanitizer;
/// the populate driver ignores them for generic recursion.
struct SanitizeNestedClauses {
    auth: Option<Arc<dyn ScopeVerifier>>,
}

#[async_trait]
impl Visitor for SanitizeNestedClauses {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        if ctx.attribute.is_some() || !NESTED_CLAUSE_KEYS.contains(&ctx.key) {
            return Ok(());
        }
        let options = TraverseOptions {
            schema: ctx.schema.clone(),
            path: ctx.path.clone(),
            parent: None,
            resolver: ctx.resolver.clone(),
        };
        let sanitized = match ctx.key {
            "sort" => sort(options, ctx.value).await?,
            "filters" => filters(options, self.auth.clone(), ctx.value).await?,
            "fields" => fields(options, ctx.value).await?,
            _ => return Ok(()),
        };
        // A clause sanitized down to nothing is dropped, not set to null.
        if sanitized.is_null() {
            api.remove(ctx.key);
        } else {
            api.set(ctx.key, sanitized);
        }
        Ok(())
    }
}
