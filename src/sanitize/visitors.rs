//! Visitors enforcing policy by silent removal.
//!
//! Each visitor here has a throwing counterpart in
//! [`validate::visitors`](crate::validate::visitors) defined over the same
//! conditions, so "what gets removed" and "what gets rejected" never drift
//! apart.

use async_trait::async_trait;
use log::debug;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::permissions::{
    find_scope, has_access_to_some_scopes, ScopeVerifier, CREATOR_FIELDS,
    MORPH_RELATION_OPTION_KEYS,
};
use crate::query::operators::is_operator;
use crate::schema::types::Attribute;
use crate::schema::{FILE_MODEL_UID, ID_ATTRIBUTE, MORPH_DISCRIMINATOR};
use crate::traverse::query_populate::POPULATE_OPERATION_KEYS;
use crate::traverse::{TraverseError, Visitor, VisitorApi, VisitorContext};

/// Whether `prefix` is the path itself or a dotted ancestor of it.
pub(crate) fn is_prefix_or_equal(prefix: &str, path: &str) -> bool {
    prefix == path || path.starts_with(&format!("{prefix}."))
}

/// Whether `path` is contained by, or leads to, one of the allowed paths.
pub(crate) fn path_is_allowed(allowed: &[String], path: &str) -> bool {
    allowed
        .iter()
        .any(|entry| is_prefix_or_equal(entry, path) || is_prefix_or_equal(path, entry))
}

/// Whether some allowed path sits at or below `parent`. With no parent
/// (top level), any non-empty allow-list qualifies.
pub(crate) fn parent_leads_to_allowed(allowed: &[String], parent: Option<&str>) -> bool {
    match parent {
        Some(parent) => allowed.iter().any(|entry| is_prefix_or_equal(parent, entry)),
        None => !allowed.is_empty(),
    }
}

/// Whether `path` equals or descends from one of the restricted paths.
pub(crate) fn path_is_restricted(restricted: &[String], path: &str) -> bool {
    restricted.iter().any(|entry| is_prefix_or_equal(entry, path))
}

pub(crate) const MORPH_LONGHAND_KEYS: &[&str] = &["connect", "set", "disconnect"];

pub(crate) fn morph_record_uid(record: &Value) -> Option<&str> {
    record.get(MORPH_DISCRIMINATOR).and_then(Value::as_str)
}

/// Removes password scalars.
pub struct RemovePassword;

#[async_trait]
impl Visitor for RemovePassword {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        if ctx.attribute.is_some_and(Attribute::is_password) {
            api.remove(ctx.key);
        }
        Ok(())
    }
}

/// Removes attributes flagged private.
pub struct RemovePrivate;

#[async_trait]
impl Visitor for RemovePrivate {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        if ctx.attribute.is_some_and(Attribute::is_private) {
            api.remove(ctx.key);
        }
        Ok(())
    }
}

/// Removes dynamic-zone attributes (used where zones are not queryable,
/// e.g. filters).
pub struct RemoveDynamicZones;

#[async_trait]
impl Visitor for RemoveDynamicZones {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        if ctx.attribute.is_some_and(Attribute::is_dynamic_zone) {
            api.remove(ctx.key);
        }
        Ok(())
    }
}

/// Removes polymorphic (`MorphTo*`) relation attributes.
pub struct RemoveMorphToRelations;

#[async_trait]
impl Visitor for RemoveMorphToRelations {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        if ctx.attribute.is_some_and(Attribute::is_morph_to_relation) {
            api.remove(ctx.key);
        }
        Ok(())
    }
}

/// Removes filter keys that are neither attributes nor recognized
/// operators.
pub struct RemoveInvalidFilterKeys;

#[async_trait]
impl Visitor for RemoveInvalidFilterKeys {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        if ctx.attribute.is_none() && !is_operator(ctx.key) && ctx.key != ID_ATTRIBUTE {
            debug!("dropping invalid filter key {} at {}", ctx.key, ctx.path.display());
            api.remove(ctx.key);
        }
        Ok(())
    }
}

/// Removes sort keys that do not name an attribute.
pub struct RemoveInvalidSortKeys;

#[async_trait]
impl Visitor for RemoveInvalidSortKeys {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        if ctx.attribute.is_none() && ctx.key != ID_ATTRIBUTE {
            api.remove(ctx.key);
        }
        Ok(())
    }
}

/// Removes selected field names that do not name an attribute.
pub struct RemoveInvalidFields;

#[async_trait]
impl Visitor for RemoveInvalidFields {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        if ctx.attribute.is_none() && ctx.key != ID_ATTRIBUTE {
            api.remove(ctx.key);
        }
        Ok(())
    }
}

/// Removes populate keys that neither name an attribute nor belong to the
/// populate clause vocabulary.
pub struct RemoveInvalidPopulateKeys;

#[async_trait]
impl Visitor for RemoveInvalidPopulateKeys {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        if ctx.attribute.is_none() && !POPULATE_OPERATION_KEYS.contains(&ctx.key) {
            debug!("dropping invalid populate key {} at {}", ctx.key, ctx.path.display());
            api.remove(ctx.key);
        }
        Ok(())
    }
}

/// Removes populate keys naming attributes that cannot be populated.
pub struct RemoveNonPopulatableAttributes;

#[async_trait]
impl Visitor for RemoveNonPopulatableAttributes {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        if ctx.attribute.is_some_and(|attribute| !attribute.is_populatable()) {
            api.remove(ctx.key);
        }
        Ok(())
    }
}

/// Removes every attribute path not contained by the allow-list.
///
/// `None` means no restriction. An `id` key survives without being listed
/// when its parent leads to an allowed path — identifiers are not modeled
/// as ordinary attributes.
pub struct RemoveRestrictedFields {
    allowed: Option<Vec<String>>,
}

impl RemoveRestrictedFields {
    #[must_use]
    pub fn new(allowed: Option<Vec<String>>) -> Self {
        Self { allowed }
    }
}

#[async_trait]
impl Visitor for RemoveRestrictedFields {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        let Some(allowed) = &self.allowed else {
            return Ok(());
        };

        if ctx.attribute.is_some() {
            let path = ctx.path.attribute.clone().unwrap_or_else(|| ctx.key.to_string());
            if !path_is_allowed(allowed, &path) {
                api.remove(ctx.key);
            }
            return Ok(());
        }

        // Non-attribute key: for these the attribute projection still holds
        // the parent path.
        if ctx.key == ID_ATTRIBUTE
            && parent_leads_to_allowed(allowed, ctx.path.attribute.as_deref())
        {
            return Ok(());
        }
        api.remove(ctx.key);
        Ok(())
    }
}

/// Removes every attribute path contained by the deny-list.
///
/// `None` means restrict everything.
pub struct RemoveDisallowedFields {
    restricted: Option<Vec<String>>,
}

impl RemoveDisallowedFields {
    #[must_use]
    pub fn new(restricted: Option<Vec<String>>) -> Self {
        Self { restricted }
    }
}

#[async_trait]
impl Visitor for RemoveDisallowedFields {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        api: &mut VisitorApi,
    ) -> Result<(), TraverseError> {
        match &self.restricted {
            None => {
                api.remove(ctx.key);
                Ok(())
            }
            Some(restricted) => {
                if ctx.attribute.is_none() {
                    return Ok(());
                }
                let path = ctx.path.attribute.clone().unwrap_or_else(|| ctx.key.to_string());
                if path_is_restricted(restricted, &path) {
                    api.remove(ctx.key);
                }
                Ok(())
            }
        }
    }
}

/// Removes relation attributes (and unauthorized elements of polymorphic
/// relation values) whose target the caller may not find.
///
/// Creator-relation attributes are always permitted when the schema opts
/// into populating creator fields. Authorization denials are treated as
/// "not allowed", never rethrown.
pub struct RemoveRestrictedRelations {
    auth: Arc<dyn ScopeVerifier>,
}

impl RemoveRestrictedRelations {
    #[must_use]
    pub fn new(auth: Arc<dyn ScopeVerifier>) -> Self {
        Self { auth }
    }

    async fn can_find(&self, uid: &str) -> bool {
        has_access_to_some_scopes(self.auth.as_ref(), &[find_scope(uid)]).await
    }

    /// Filters a polymorphic relation value, keeping only elements whose
    /// concrete target is permitted. Returns `None` when nothing remains.
    async fn sanitize_morph_value(&self, value: &Value) -> Option<Option<Value>> {
        match value {
            Value::Array(items) => {
                let mut kept = Vec::with_capacity(items.len());
                for item in items {
                    if self.morph_record_allowed(item).await {
                        kept.push(item.clone());
                    }
                }
                if kept.len() == items.len() {
                    None
                } else if kept.is_empty() {
                    Some(None)
                } else {
                    Some(Some(Value::Array(kept)))
                }
            }
            Value::Object(map) if MORPH_LONGHAND_KEYS.iter().any(|key| map.contains_key(*key)) => {
                let mut out = Map::new();
                let mut filtered = false;
                let mut remaining = 0usize;
                for (key, entry) in map {
                    if MORPH_LONGHAND_KEYS.contains(&key.as_str()) {
                        let Some(items) = entry.as_array() else {
                            out.insert(key.clone(), entry.clone());
                            continue;
                        };
                        let mut kept = Vec::with_capacity(items.len());
                        for item in items {
                            if self.morph_record_allowed(item).await {
                                kept.push(item.clone());
                            }
                        }
                        filtered |= kept.len() != items.len();
                        remaining += kept.len();
                        out.insert(key.clone(), Value::Array(kept));
                    } else if key == "options" {
                        out.insert(key.clone(), retain_morph_options(entry));
                        filtered |= out.get(key) != map.get(key);
                    } else {
                        out.insert(key.clone(), entry.clone());
                    }
                }
                if filtered && remaining == 0 {
                    Some(None)
                } else if filtered {
                    Some(Some(Value::Object(out)))
                } else {
                    None
                }
            }
            Value::Object(_) if morph_record_uid(value).is_some() => {
                if self.morph_record_allowed(value).await {
                    None
                } else {
                    Some(None)
                }
            }
            _ => None,
        }
    }

    async fn morph_record_allowed(&self, record: &Value) -> bool {
        match morph_record_uid(record) {
            Some(uid) => self.can_find(uid).await,
            // Without a discriminator there is no target to check.
            None => true,
        }
    }
}

/// Keeps only the allow-listed option keys of a polymorphic relation's
/// ordering options.
pub(crate) fn retain_morph_options(options: &Value) -> Value {
    match options.as_object() {
        Some(map) => {
            let mut out = Map::new();
            for (key, entry) in map {
                if MORPH_RELATION_OPTION_KEYS.contains(&key.as_str()) {
                    out.insert(key.clone(), entry.clone());
                }
            }
            Value::Object(out)
        }
        None => options.clone(),
    }
}

#[async_trait]
impl Visitor for RemoveRestrictedRelations {
    async fn visit(
        &self,
        ctx: VisitorContext<'_>,
        api: &mut VisitorApi,
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
                    debug!("removing restricted media {} at {}", ctx.key, ctx.path.display());
                    api.remove(ctx.key);
                }
            }
            Attribute::Relation(relation) if !relation.kind.is_morph_to() => {
                if let Some(target) = relation.target.as_deref() {
                    if !self.can_find(target).await {
                        debug!(
                            "removing restricted relation {} at {}",
                            ctx.key,
                            ctx.path.display()
                        );
                        api.remove(ctx.key);
                    }
                }
            }
            Attribute::Relation(_) => match self.sanitize_morph_value(ctx.value).await {
                Some(None) => api.remove(ctx.key),
                Some(Some(filtered)) => api.set(ctx.key, filtered),
                None => {}
            },
            _ => {}
        }
        Ok(())
    }
}
