//! # fold_api
//!
//! Schema-driven traversal, sanitization, validation and query
//! normalization for content APIs.
//!
//! ## Core Components
//!
//! * `schema` - Schema model, attribute kinds, and model resolution
//! * `traverse` - Generic traversal factory, entity traversal, and the
//!   per-clause query drivers
//! * `sanitize` - Policy enforcement by silent removal
//! * `validate` - Policy enforcement by throwing typed errors
//! * `query` - Conversion of the public REST query vocabulary into the
//!   internal structured query
//! * `permissions` - Authorization capability consumed by the
//!   restricted-relations visitors
//! * `error` - Error types and handling
//!
//! ## Architecture
//!
//! A runtime content schema describes attribute kinds (scalar, relation,
//! polymorphic relation, media, component, dynamic zone). The traversal
//! engine walks heterogeneous tree-shaped data — materialized entities and
//! REST query fragments — dispatching on those kinds, tracking dotted and
//! index-aware paths, and composing independent policy passes into
//! side-effect-scoped pipelines. Inbound query params flow through the
//! converter into a structured query; request bodies and outbound entities
//! flow through the sanitize/validate pipelines.

pub mod error;
pub mod permissions;
pub mod query;
pub mod sanitize;
pub mod schema;
pub mod testing;
pub mod traverse;
pub mod validate;

// Re-export main types for convenience
pub use error::{FoldApiError, FoldApiResult, PaginationError, ValidationError};
pub use query::{transform_params_to_query, Query, QueryParams};
pub use schema::{CachedResolver, ModelRegistry, ModelResolver, Schema};
pub use traverse::{traverse_entity, Path, TraverseError, TraverseOptions, Traverser, Visitor};
