use serde::{Deserialize, Serialize};

/// Terminal value kinds carried by a [`ScalarAttribute`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScalarKind {
    String,
    Text,
    RichText,
    Email,
    Password,
    Uid,
    Integer,
    BigInteger,
    Float,
    Decimal,
    Date,
    DateTime,
    Time,
    Timestamp,
    Boolean,
    Json,
    Enumeration,
}

/// Relation cardinalities, including the polymorphic (`MorphTo*`) kinds
/// whose target is fixed per related record rather than by the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    OneToOne,
    OneToMany,
    ManyToOne,
    ManyToMany,
    MorphOne,
    MorphMany,
    MorphToOne,
    MorphToMany,
}

impl RelationKind {
    /// Whether the relation resolves its target per record via a
    /// discriminator instead of a schema-level `target`.
    #[must_use]
    pub fn is_morph_to(self) -> bool {
        matches!(self, Self::MorphToOne | Self::MorphToMany)
    }
}

/// A terminal attribute. Never triggers recursion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarAttribute {
    /// Concrete value kind
    pub kind: ScalarKind,
    /// Excluded from all API output when set
    #[serde(default)]
    pub private: bool,
}

/// A link to records of another schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationAttribute {
    /// Relation cardinality
    pub kind: RelationKind,
    /// Target schema uid. `None` for `MorphTo*` kinds, whose target is
    /// carried by each related record.
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub private: bool,
}

/// An embedded component instance (or list of instances when repeatable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentAttribute {
    /// Component schema uid
    pub component: String,
    /// Whether the value is a list of instances
    #[serde(default)]
    pub repeatable: bool,
    #[serde(default)]
    pub private: bool,
}

/// A heterogeneous list of component instances, each self-describing its
/// concrete component schema via the `__component` discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicZoneAttribute {
    /// Component schema uids allowed in this zone
    pub components: Vec<String>,
    #[serde(default)]
    pub private: bool,
}

/// An uploaded file reference, implicitly targeting the fixed file schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttribute {
    /// Whether the value is a list of files
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub private: bool,
}

/// One named field definition inside a [`Schema`](super::Schema), tagged by
/// kind. Only relation, component, dynamic-zone and media attributes
/// trigger recursive traversal; scalars are leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Attribute {
    Scalar(ScalarAttribute),
    Relation(RelationAttribute),
    Component(ComponentAttribute),
    DynamicZone(DynamicZoneAttribute),
    Media(MediaAttribute),
}

impl Attribute {
    /// Shorthand for a non-private scalar attribute.
    #[must_use]
    pub fn scalar(kind: ScalarKind) -> Self {
        Self::Scalar(ScalarAttribute { kind, private: false })
    }

    /// Shorthand for a non-private relation with a fixed target.
    #[must_use]
    pub fn relation(kind: RelationKind, target: impl Into<String>) -> Self {
        Self::Relation(RelationAttribute {
            kind,
            target: Some(target.into()),
            private: false,
        })
    }

    /// Shorthand for a polymorphic relation (no fixed target).
    #[must_use]
    pub fn morph_to(kind: RelationKind) -> Self {
        Self::Relation(RelationAttribute { kind, target: None, private: false })
    }

    /// Whether the attribute is excluded from all API output.
    #[must_use]
    pub fn is_private(&self) -> bool {
        match self {
            Self::Scalar(a) => a.private,
            Self::Relation(a) => a.private,
            Self::Component(a) => a.private,
            Self::DynamicZone(a) => a.private,
            Self::Media(a) => a.private,
        }
    }

    /// Whether the attribute is a password scalar.
    #[must_use]
    pub fn is_password(&self) -> bool {
        matches!(self, Self::Scalar(a) if a.kind == ScalarKind::Password)
    }

    #[must_use]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    #[must_use]
    pub fn is_relation(&self) -> bool {
        matches!(self, Self::Relation(_))
    }

    /// Whether the attribute is a polymorphic (`MorphTo*`) relation.
    #[must_use]
    pub fn is_morph_to_relation(&self) -> bool {
        matches!(self, Self::Relation(a) if a.kind.is_morph_to())
    }

    #[must_use]
    pub fn is_component(&self) -> bool {
        matches!(self, Self::Component(_))
    }

    #[must_use]
    pub fn is_dynamic_zone(&self) -> bool {
        matches!(self, Self::DynamicZone(_))
    }

    #[must_use]
    pub fn is_media(&self) -> bool {
        matches!(self, Self::Media(_))
    }

    /// Whether a populate clause may name this attribute.
    #[must_use]
    pub fn is_populatable(&self) -> bool {
        !self.is_scalar()
    }

    /// Target schema uid for attributes with a fixed target: non-morph
    /// relations and components. Media resolves through
    /// [`FILE_MODEL_UID`](crate::schema::FILE_MODEL_UID) instead, and
    /// `MorphTo*` relations and dynamic zones have no single target.
    #[must_use]
    pub fn target_uid(&self) -> Option<&str> {
        match self {
            Self::Relation(a) => a.target.as_deref(),
            Self::Component(a) => Some(a.component.as_str()),
            _ => None,
        }
    }
}
