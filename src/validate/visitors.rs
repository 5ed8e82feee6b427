//! Visitors enforcing policy by raising typed errors.
//!
//! Every visitor here mirrors a sanitizer from
//! [`sanitize::visitors`](crate::sanitize::visitors) over the same
//! condition, with throwing as the reaction. The first violation aborts
//! the remainder of the traversal; there are no partial results.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

use crate::error::ValidationError;
use crate::permissions::{
    find_scope, has_access_to_some_scopes, ScopeVerifier, CREATOR_FIELDS,
    MORPH_RELATION_OPTION_KEYS,
};
use crate::query::operators::is_operator;
use crate::sanitize::visitors::{
    morph_record_uid, parent_leads_to_allowed, path_is_allowed, path_is_restricted,
    MORPH_LONGHAND_KEYS,
};
use crate::schema::types::Attribute;
use crate::schema::{COMPONENT_DISCRIMINATOR, FILE_MODEL_UID, ID_ATTRIBUTE, MORPH_DISCRIMINATOR};
use crate::traverse::query_populate::POPULATE_OPERATION_KEYS;
use crate::traverse::{Path, TraverseError, Visitor, VisitorApi, VisitorContext};

/// Uniform rejection for a key at a path.
pub(crate) fn invalid_parameter(key: &str, path: &Path) -> TraverseError {
    ValidationError::InvalidParameter { key: key.to_string(), path: path.display() }.into()
}

/// Rejects password scalars.
pub struct ThrowPassword;

#[async_trait]
impl Visitor for ThrowPassword {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        _api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        if ctx.attribute.is_some_and(Attribute::is_password) {
            return Err(invalid_parameter(ctx.key, ctx.path));
        }
        Ok(())
    }
}

/// Rejects attributes flagged private.
pub struct ThrowPrivate;

#[async_trait]
impl Visitor for ThrowPrivate {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        _api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        if ctx.attribute.is_some_and(Attribute::is_private) {
            return Err(invalid_parameter(ctx.key, ctx.path));
        }
        Ok(())
    }
}

/// Rejects dynamic-zone attributes.
pub struct ThrowDynamicZones;

#[async_trait]
impl Visitor for ThrowDynamicZones {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        _api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        if ctx.attribute.is_some_and(Attribute::is_dynamic_zone) {
            return Err(invalid_parameter(ctx.key, ctx.path));
        }
        Ok(())
    }
}

/// Rejects polymorphic (`MorphTo*`) relation attributes.
pub struct ThrowMorphToRelations;

#[async_trait]
impl Visitor for ThrowMorphToRelations {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        _api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        if ctx.attribute.is_some_and(Attribute::is_morph_to_relation) {
            return Err(invalid_parameter(ctx.key, ctx.path));
        }
        Ok(())
    }
}

/// Rejects filter keys that are neither attributes nor operators.
pub struct ThrowInvalidFilterKeys;

#[async_trait]
impl Visitor for ThrowInvalidFilterKeys {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        _api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        if ctx.attribute.is_none() && !is_operator(ctx.key) && ctx.key != ID_ATTRIBUTE {
            return Err(invalid_parameter(ctx.key, ctx.path));
        }
        Ok(())
    }
}

/// Rejects sort keys that do not name an attribute.
pub struct ThrowInvalidSortKeys;

#[async_trait]
impl Visitor for ThrowInvalidSortKeys {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        _api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        if ctx.attribute.is_none() && ctx.key != ID_ATTRIBUTE {
            return Err(invalid_parameter(ctx.key, ctx.path));
        }
        Ok(())
    }
}

/// Rejects selected field names that do not name an attribute.
pub struct ThrowInvalidFields;

#[async_trait]
impl Visitor for ThrowInvalidFields {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        _api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        if ctx.attribute.is_none() && ctx.key != ID_ATTRIBUTE {
            return Err(invalid_parameter(ctx.key, ctx.path));
        }
        Ok(())
    }
}

/// Rejects populate keys outside the attribute set and clause vocabulary.
pub struct ThrowInvalidPopulateKeys;

#[async_trait]
impl Visitor for ThrowInvalidPopulateKeys {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        _api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        if ctx.attribute.is_none() && !POPULATE_OPERATION_KEYS.contains(&ctx.key) {
            return Err(invalid_parameter(ctx.key, ctx.path));
        }
        Ok(())
    }
}

/// Rejects populate keys naming attributes that cannot be populated.
pub struct ThrowNonPopulatableAttributes;

#[async_trait]
impl Visitor for ThrowNonPopulatableAttributes {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        _api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        if ctx.attribute.is_some_and(|attribute| !attribute.is_populatable()) {
            return Err(invalid_parameter(ctx.key, ctx.path));
        }
        Ok(())
    }
}

/// Rejects body keys that do not name an attribute. Identifier and
/// discriminator keys are structural, not attributes, and pass.
pub struct ThrowUnrecognizedAttributes;

#[async_trait]
impl Visitor for ThrowUnrecognizedAttributes {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        _api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        if ctx.attribute.is_some()
            || ctx.key == ID_ATTRIBUTE
            || ctx.key == MORPH_DISCRIMINATOR
            || ctx.key == COMPONENT_DISCRIMINATOR
        {
            return Ok(());
        }
        Err(invalid_parameter(ctx.key, ctx.path))
    }
}

/// Rejects attribute paths outside the allow-list (`None` = no
/// restriction), with the same `id` exemption the sanitizer applies.
pub struct ThrowRestrictedFields {
    allowed: Option<Vec<String>>,
}

impl ThrowRestrictedFields {
    #[must_use]
    pub fn new(allowed: Option<Vec<String>>) -> Self {
        Self { allowed }
    }
}

#[async_trait]
impl Visitor for ThrowRestrictedFields {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        _api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        let Some(allowed) = &self.allowed else {
            return Ok(());
        };

        if ctx.attribute.is_some() {
            let path = ctx.path.attribute.clone().unwrap_or_else(|| ctx.key.to_string());
            if !path_is_allowed(allowed, &path) {
                return Err(invalid_parameter(ctx.key, ctx.path));
            }
            return Ok(());
        }

        if ctx.key == ID_ATTRIBUTE
            && parent_leads_to_allowed(allowed, ctx.path.attribute.as_deref())
        {
            return Ok(());
        }
        Err(invalid_parameter(ctx.key, ctx.path))
    }
}

/// Rejects attribute paths inside the deny-list (`None` = restrict
/// everything).
pub struct ThrowDisallowedFields {
    restricted: Option<Vec<String>>,
}

impl ThrowDisallowedFields {
    #[must_use]
    pub fn new(restricted: Option<Vec<String>>) -> Self {
        Self { restricted }
    }
}

#[async_trait]
impl Visitor for ThrowDisallowedFields {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        _api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        match &self.restricted {
            None => Err(invalid_parameter(ctx.key, ctx.path)),
            Some(restricted) => {
                if ctx.attribute.is_none() {
                    return Ok(());
                }
                let path = ctx.path.attribute.clone().unwrap_or_else(|| ctx.key.to_string());
                if path_is_restricted(restricted, &path) {
                    return Err(invalid_parameter(ctx.key, ctx.path));
                }
                Ok(())
            }
        }
    }
}

/// Rejects relation attributes (or the first unauthorized element of a
/// polymorphic relation value) whose target the caller may not find.
///
/// Same creator-field exemption and morph option allow-list as the
/// sanitizing counterpart; here the authorization failure is surfaced as
/// an invalid key.
pub struct ThrowRestrictedRelations {
    auth: Arc<dyn ScopeVerifier>,
}

impl ThrowRestrictedRelations {
    #[must_use]
    pub fn new(auth: Arc<dyn ScopeVerifier>) -> Self {
        Self { auth }
    }

    async fn can_find(&self, uid: &str) -> bool {
        has_access_to_some_scopes(self.auth.as_ref(), &[find_scope(uid)]).await
    }

    async fn check_morph_value(
        &self,
        ctx: &VisitorContext<'_>,
        value: &Value,
    ) -> Result<(), TraverseError> {
        match value {
            Value::Array(items) => {
                for item in items {
                    self.check_morph_record(ctx, item).await?;
                }
                Ok(())
            }
            Value::Object(map) if MORPH_LONGHAND_KEYS.iter().any(|key| map.contains_key(*key)) => {
                for (key, entry) in map {
                    if MORPH_LONGHAND_KEYS.contains(&key.as_str()) {
                        if let Some(items) = entry.as_array() {
                            for item in items {
                                self.check_morph_record(ctx, item).await?;
                            }
                        }
                    } else if key == "options" {
                        check_morph_options(ctx, entry)?;
                    }
                }
                Ok(())
            }
            Value::Object(_) if morph_record_uid(value).is_some() => {
                self.check_morph_record(ctx, value).await
            }
            _ => Ok(()),
        }
    }

    async fn check_morph_record(
        &self,
        ctx: &VisitorContext<'_>,
        record: &Value,
    ) -> Result<(), TraverseError> {
        if let Some(uid) = morph_record_uid(record) {
            if !self.can_find(uid).await {
                return Err(invalid_parameter(ctx.key, ctx.path));
            }
        }
        Ok(())
    }
}

fn check_morph_options(ctx: &VisitorContext<'_>, options: &Value) -> Result<(), TraverseError> {
    if let Some(map) = options.as_object() {
        for key in map.keys() {
            if !MORPH_RELATION_OPTION_KEYS.contains(&key.as_str()) {
                return Err(invalid_parameter(key, ctx.path));
            }
        }
    }
    Ok(())
}

#[async_trait]
impl Visitor for ThrowRestrictedRelations {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        _api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        let Some(attribute) = ctx.attribute else {
            return Ok(());
        };
        if CREATOR_FIELDS.contains(&ctx.key) && ctx.schema.options.populate_creator_fields {
            return Ok(());
        }

        match attribute {
            Attribute::Media(_) => {
                if !self.can_find(FILE_MODEL_UID).await {
                    return Err(invalid_parameter(ctx.key, ctx.path));
                }
                Ok(())
            }
            Attribute::Relation(relation) if !relation.kind.is_morph_to() => {
                if let Some(target) = relation.target.as_deref() {
                    if !self.can_find(target).await {
                        return Err(invalid_parameter(ctx.key, ctx.path));
                    }
                }
                Ok(())
            }
            Attribute::Relation(_) => self.check_morph_value(&ctx, ctx.value).await,
            _ => Ok(()),
        }
    }
}
