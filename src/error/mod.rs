//! Unified error types for the fold_api crate.
//!
//! Policy violations surface as [`ValidationError`] (only ever raised by the
//! validate family — sanitizers recover by removal instead). Pagination
//! contract violations surface as [`PaginationError`]. Both are wrapped,
//! together with schema lookup failures, by [`FoldApiError`].

use crate::schema::types::SchemaError;
use thiserror::Error;

/// Errors raised when request data fails validation.
///
/// Every variant names the offending key and, where available, the dotted
/// path to it, so the message can be surfaced to API callers verbatim.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A key was rejected by a validation visitor.
    #[error("Invalid parameter {key} at {path}")]
    InvalidParameter {
        /// Key that failed validation
        key: String,
        /// Dotted path to the key, with array indices where applicable
        path: String,
    },

    /// A sort order token was not `asc`/`desc`.
    #[error("Invalid sort order '{order}': order must be 'asc' or 'desc'")]
    InvalidOrder {
        /// The rejected order token
        order: String,
    },

    /// A sort token had an empty field name (e.g. `":desc"`).
    #[error("Sort field name cannot be empty")]
    EmptySortField,

    /// A dynamic zone or polymorphic relation was populated without a
    /// fragment or count request.
    #[error("Invalid nested population query for {path}: dynamic zones and polymorphic relations accept only fragments ('on') or a count")]
    MissingFragment {
        /// Dotted path to the offending attribute
        path: String,
    },

    /// A populate key does not name an attribute of the schema in context.
    #[error("Unknown attribute {key} on schema {schema}")]
    UnknownAttribute {
        /// The rejected key
        key: String,
        /// Uid of the schema that was searched
        schema: String,
    },

    /// A query clause had the wrong overall shape (e.g. non-object filters).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Errors raised by pagination parameter handling.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    /// `page`/`pageSize` and `start`/`limit` were supplied together.
    #[error("Cannot use both page-based and offset-based pagination in the same query")]
    MixedPagination,

    /// A pagination parameter was out of bounds or not an integer.
    #[error("Invalid pagination parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name as it appears in the query string
        name: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Unified error type for the crate.
///
/// Mirrors the per-concern split: schema lookup and caller contract
/// violations, data-policy validation failures, and pagination failures.
#[derive(Error, Debug)]
pub enum FoldApiError {
    /// Errors related to schema lookup or definition
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Errors raised while validating request data
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Errors raised by pagination parameter handling
    #[error(transparent)]
    Pagination(#[from] PaginationError),
}

impl From<crate::traverse::TraverseError> for FoldApiError {
    fn from(err: crate::traverse::TraverseError) -> Self {
        match err {
            crate::traverse::TraverseError::Schema(inner) => Self::Schema(inner),
            crate::traverse::TraverseError::Validation(inner) => Self::Validation(inner),
        }
    }
}

/// Result type alias using [`FoldApiError`].
pub type FoldApiResult<T> = Result<T, FoldApiError>;
