//! Authorization capability consumed by the restricted-relations visitors.
//!
//! The engine never interprets scopes itself; it only ever asks whether at
//! least one of N scopes is granted, sequentially and short-circuiting on
//! the first success.

use async_trait::async_trait;
use log::debug;
use thiserror::Error;

/// Raised by a [`ScopeVerifier`] to deny a scope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Access denied for scope {scope}")]
pub struct PermissionDenied {
    /// The denied scope
    pub scope: String,
}

/// External authorization capability supplied by the host application.
#[async_trait]
pub trait ScopeVerifier: Send + Sync {
    /// Returns `Ok(())` when the caller holds `scope`; errors to deny.
    async fn verify(&self, scope: &str) -> Result<(), PermissionDenied>;
}

/// Creator-relation attribute names exempted from authorization checks
/// when the schema opts into populating creator fields.
pub const CREATOR_FIELDS: &[&str] = &["createdBy", "updatedBy"];

/// Option keys allowed on polymorphic relation ordering options.
pub const MORPH_RELATION_OPTION_KEYS: &[&str] = &["strict"];

/// The scope guarding read access to a schema's entries.
#[must_use]
pub fn find_scope(uid: &str) -> String {
    format!("{uid}.find")
}

/// Whether at least one of `scopes` is granted.
///
/// Checks are awaited in sequence and short-circuit on the first success;
/// denials are treated as "not allowed", never rethrown.
pub async fn has_access_to_some_scopes(verifier: &dyn ScopeVerifier, scopes: &[String]) -> bool {
    for scope in scopes {
        match verifier.verify(scope).await {
            Ok(()) => return true,
            Err(denied) => debug!("scope check failed: {denied}"),
        }
    }
    false
}
