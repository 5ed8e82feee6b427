pub mod attribute;
pub mod errors;
pub mod schema;

pub use attribute::{
    Attribute, ComponentAttribute, DynamicZoneAttribute, MediaAttribute, RelationAttribute,
    RelationKind, ScalarAttribute, ScalarKind,
};
pub use errors::SchemaError;
pub use schema::{Schema, SchemaKind, SchemaOptions};
