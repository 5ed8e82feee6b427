//! Pagination parameter validation and defaulting.
//!
//! Page-based (`page`/`pageSize`) and offset-based (`start`/`limit`)
//! pagination are mutually exclusive; mixing them in one query is a hard
//! error. `limit: -1` is the "unbounded" sentinel.

use serde::{Deserialize, Serialize};

use crate::error::PaginationError;

/// Public pagination vocabulary as it arrives on the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaginationParams {
    pub start: Option<i64>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Host-supplied defaults and bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationConfig {
    /// Offset applied when none is requested
    pub default_start: u64,
    /// Limit applied when none is requested (`-1` for unbounded)
    pub default_limit: i64,
    /// Hard cap on the effective limit, when set
    pub max_limit: Option<i64>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self { default_start: 0, default_limit: 10, max_limit: None }
    }
}

/// Offset-form pagination after defaulting; `limit: None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetPagination {
    pub start: u64,
    pub limit: Option<u64>,
}

/// Checks pagination parameters independently and rejects mixing
/// page-based with offset-based keys.
pub fn validate_pagination(params: &PaginationParams) -> Result<(), PaginationError> {
    let page_based = params.page.is_some() || params.page_size.is_some();
    let offset_based = params.start.is_some() || params.limit.is_some();
    if page_based && offset_based {
        return Err(PaginationError::MixedPagination);
    }

    if params.start.is_some_and(|start| start < 0) {
        return Err(PaginationError::InvalidParameter {
            name: "start".to_string(),
            reason: "must be a non-negative integer".to_string(),
        });
    }
    if params.limit.is_some_and(|limit| limit < -1) {
        return Err(PaginationError::InvalidParameter {
            name: "limit".to_string(),
            reason: "must be a non-negative integer or -1".to_string(),
        });
    }
    if params.page.is_some_and(|page| page < 1) {
        return Err(PaginationError::InvalidParameter {
            name: "page".to_string(),
            reason: "must be a positive integer".to_string(),
        });
    }
    if params.page_size.is_some_and(|size| size < 0) {
        return Err(PaginationError::InvalidParameter {
            name: "pageSize".to_string(),
            reason: "must be a non-negative integer".to_string(),
        });
    }
    Ok(())
}

/// Validates, resolves page-based parameters to offset form, applies the
/// configured defaults and caps the limit.
pub fn with_default_pagination(
    params: &PaginationParams,
    config: &PaginationConfig,
) -> Result<OffsetPagination, PaginationError> {
    validate_pagination(params)?;

    let page_based = params.page.is_some() || params.page_size.is_some();
    let (start, limit) = if page_based {
        let page = params.page.unwrap_or(1);
        let size = params.page_size.unwrap_or(config.default_limit);
        ((page - 1) * size.max(0), size)
    } else {
        (
            params.start.unwrap_or_else(|| i64::try_from(config.default_start).unwrap_or(0)),
            params.limit.unwrap_or(config.default_limit),
        )
    };

    // -1 means unbounded, capped only by the configured maximum.
    let limit = if limit == -1 { None } else { Some(limit) };
    let limit = match (limit, config.max_limit) {
        (Some(limit), Some(max)) if limit > max => Some(max),
        (None, Some(max)) => Some(max),
        (limit, _) => limit,
    };

    Ok(OffsetPagination {
        start: u64::try_from(start).unwrap_or(0),
        limit: limit.and_then(|limit| u64::try_from(limit).ok()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixing_pagination_families_is_rejected() {
        let params = PaginationParams { page: Some(1), limit: Some(10), ..Default::default() };
        assert_eq!(validate_pagination(&params), Err(PaginationError::MixedPagination));
    }

    #[test]
    fn defaults_apply_when_nothing_is_requested() {
        let resolved =
            with_default_pagination(&PaginationParams::default(), &PaginationConfig::default())
                .unwrap();
        assert_eq!(resolved, OffsetPagination { start: 0, limit: Some(10) });
    }

    #[test]
    fn page_size_is_capped_by_max_limit() {
        let params = PaginationParams { page_size: Some(999), ..Default::default() };
        let config = PaginationConfig { max_limit: Some(50), ..Default::default() };
        let resolved = with_default_pagination(&params, &config).unwrap();
        assert_eq!(resolved, OffsetPagination { start: 0, limit: Some(50) });
    }

    #[test]
    fn unbounded_limit_resolves_to_none_without_max() {
        let params = PaginationParams { limit: Some(-1), ..Default::default() };
        let resolved = with_default_pagination(&params, &PaginationConfig::default()).unwrap();
        assert_eq!(resolved, OffsetPagination { start: 0, limit: None });
    }

    #[test]
    fn page_based_parameters_resolve_to_offsets() {
        let params =
            PaginationParams { page: Some(3), page_size: Some(20), ..Default::default() };
        let resolved = with_default_pagination(&params, &PaginationConfig::default()).unwrap();
        assert_eq!(resolved, OffsetPagination { start: 40, limit: Some(20) });
    }
}
