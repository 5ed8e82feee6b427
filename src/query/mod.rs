//! Conversion of the public REST query vocabulary into the internal
//! structured query consumed by a persistence layer.
//!
//! Unlike the traversal drivers this module recurses directly, validating
//! shapes along the way (operators, pagination bounds, populate
//! fragments). Every sub-converter is re-entrant for nested populate
//! fragments, reusing the same rules at every depth.

pub mod fields;
pub mod filters;
pub mod operators;
pub mod pagination;
pub mod populate;
pub mod sort;
pub mod status;

pub use fields::convert_fields_query_params;
pub use filters::convert_filters_query_params;
pub use pagination::{
    validate_pagination, with_default_pagination, OffsetPagination, PaginationConfig,
    PaginationParams,
};
pub use populate::{
    convert_populate_query_params, object_populate_to_paths, paths_to_object_populate,
};
pub use sort::convert_sort_query_params;
pub use status::{status_filter, Status};

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::FoldApiResult;
use crate::schema::types::Schema;
use crate::schema::ModelResolver;

/// Public REST query vocabulary, as deserialized from a request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryParams {
    pub sort: Option<Value>,
    pub filters: Option<Value>,
    pub fields: Option<Value>,
    pub populate: Option<Value>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub start: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<Status>,
}

/// Internal structured query handed to a persistence layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Query {
    pub sort: Option<Value>,
    pub filters: Option<Value>,
    pub populate: Option<Value>,
    pub fields: Option<Vec<String>>,
    pub start: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<Status>,
}

/// Runs every sub-converter plus pagination defaulting over one set of
/// query params.
pub fn transform_params_to_query(
    params: &QueryParams,
    schema: &Arc<Schema>,
    resolver: &Arc<dyn ModelResolver>,
    config: &PaginationConfig,
) -> FoldApiResult<Query> {
    debug!("converting query params for schema {}", schema.uid);

    let sort = params.sort.as_ref().map(convert_sort_query_params).transpose()?;
    let filters = params
        .filters
        .as_ref()
        .map(|filters| convert_filters_query_params(filters, schema, resolver))
        .transpose()?;
    let fields = params.fields.as_ref().map(convert_fields_query_params).transpose()?.flatten();
    let populate = params
        .populate
        .as_ref()
        .map(|populate| convert_populate_query_params(populate, schema, resolver))
        .transpose()?;

    let pagination = with_default_pagination(
        &PaginationParams {
            start: params.start,
            limit: params.limit,
            page: params.page,
            page_size: params.page_size,
        },
        config,
    )?;

    Ok(Query {
        sort,
        filters,
        populate,
        fields,
        start: Some(pagination.start),
        limit: pagination.limit,
        status: params.status,
    })
}
