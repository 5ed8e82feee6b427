//! Validation passes for the REST query clauses.
//!
//! Mirrors [`sanitize::query`](crate::sanitize::query) with throwing
//! visitors: the first violation raises a
//! [`ValidationError`](crate::error::ValidationError) and aborts.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use super::visitors::{
    ThrowDynamicZones, ThrowInvalidFields, ThrowInvalidFilterKeys, ThrowInvalidPopulateKeys,
    ThrowInvalidSortKeys, ThrowMorphToRelations, ThrowNonPopulatableAttributes, ThrowPassword,
    ThrowPrivate, ThrowRestrictedRelations,
};
use crate::permissions::ScopeVerifier;
use crate::traverse::query_fields::traverse_query_fields;
use crate::traverse::query_filters::traverse_query_filters;
use crate::traverse::query_populate::{traverse_query_populate, NESTED_CLAUSE_KEYS};
use crate::traverse::query_sort::traverse_query_sort;
use crate::traverse::{TraverseError, TraverseOptions, Visitor, VisitorApi, VisitorContext};

/// Validates a `filters` clause.
pub async fn filters(
    options: TraverseOptions,
    auth: Option<Arc<dyn ScopeVerifier>>,
    value: &Value,
) -> Result<(), TraverseError> {
    traverse_query_filters(&ThrowInvalidFilterKeys, options.clone(), value).await?;
    traverse_query_filters(&ThrowDynamicZones, options.clone(), value).await?;
    traverse_query_filters(&ThrowMorphToRelations, options.clone(), value).await?;
    traverse_query_filters(&ThrowPassword, options.clone(), value).await?;
    traverse_query_filters(&ThrowPrivate, options.clone(), value).await?;
    if let Some(auth) = auth {
        traverse_query_filters(&ThrowRestrictedRelations::new(auth), options, value).await?;
    }
    Ok(())
}

/// Validates a `sort` clause.
pub async fn sort(options: TraverseOptions, value: &Value) -> Result<(), TraverseError> {
    traverse_query_sort(&ThrowInvalidSortKeys, options.clone(), value).await?;
    traverse_query_sort(&ThrowPassword, options.clone(), value).await?;
    traverse_query_sort(&ThrowPrivate, options, value).await?;
    Ok(())
}

/// Validates a `fields` clause.
pub async fn fields(options: TraverseOptions, value: &Value) -> Result<(), TraverseError> {
    traverse_query_fields(&ThrowInvalidFields, options.clone(), value).await?;
    traverse_query_fields(&ThrowPassword, options.clone(), value).await?;
    traverse_query_fields(&ThrowPrivate, options, value).await?;
    Ok(())
}

/// Validates a `populate` clause, re-dispatching nested sub-clauses to
/// their own validators.
pub async fn populate(
    options: TraverseOptions,
    auth: Option<Arc<dyn ScopeVerifier>>,
    value: &Value,
) -> Result<(), TraverseError> {
    traverse_query_populate(&ThrowInvalidPopulateKeys, options.clone(), value).await?;
    traverse_query_populate(&ThrowNonPopulatableAttributes, options.clone(), value).await?;
    traverse_query_populate(&ThrowPrivate, options.clone(), value).await?;
    traverse_query_populate(&ValidateNestedClauses { auth: auth.clone() }, options.clone(), value)
        .await?;
    if let Some(auth) = auth {
        traverse_query_populate(&ThrowRestrictedRelations::new(auth), options, value).await?;
    }
    Ok(())
}

/// Validates nested clause keys with the matching specialized validator;
/// the populate driver ignores them for generic recursion.
struct ValidateNestedClauses {
    auth: Option<Arc<dyn ScopeVerifier>>,
}

#[async_trait]
impl Visitor for ValidateNestedClauses {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        _api: &mut VisitorApi,
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
        match ctx.key {
            "sort" => sort(options, ctx.value).await,
            "filters" => filters(options, self.auth.clone(), ctx.value).await,
            "fields" => fields(options, ctx.value).await,
            _ => Ok(()),
        }
    }
}
