//! Schema model and resolution.
//!
//! Schemas are static, process-wide, read-only descriptions of content
//! types and components. Everything else in the crate consumes them through
//! a [`ModelResolver`] threaded explicitly via traversal options.

pub mod resolver;
pub mod types;

pub use resolver::{CachedResolver, ModelRegistry, ModelResolver};
pub use types::{Attribute, Schema, SchemaError, SchemaKind, SchemaOptions};

/// Uid of the well-known file schema that media attributes implicitly
/// target. Hosts register their file schema under this uid.
pub const FILE_MODEL_UID: &str = "media.file";

/// The identifier key carried by every entry. Identifiers are not modeled
/// as ordinary attributes, which is why several visitors special-case this
/// key.
pub const ID_ATTRIBUTE: &str = "id";

/// Discriminator key carried by each related record of a polymorphic
/// relation, naming its concrete schema uid.
pub const MORPH_DISCRIMINATOR: &str = "__type";

/// Discriminator key carried by each dynamic-zone entry, naming its
/// concrete component schema uid.
pub const COMPONENT_DISCRIMINATOR: &str = "__component";
