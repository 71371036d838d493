use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

use crate::identity::{AuthState, Identity};
use crate::permissions::PermissionSlug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: role '{0}' may not use the operator console")]
    PatientRole(String),

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Deny-by-default membership check.
///
/// `None` means "no permission required". Otherwise the slug must be granted.
pub fn has_permission_for(required: Option<&PermissionSlug>, granted: &BTreeSet<PermissionSlug>) -> bool {
    match required {
        None => true,
        Some(slug) => granted.contains(slug),
    }
}

/// Guard contract for console content: may the current identity see it?
///
/// - No identity (signed out or still resolving): denied.
/// - Patient role: denied, whatever its grants.
/// - Otherwise: [`has_permission_for`].
pub fn can_access(required: Option<&PermissionSlug>, state: &AuthState) -> bool {
    explain_access(required, state).granted
}

/// Authorize an identity for an operation (API boundary).
///
/// - No IO
/// - No panics
pub fn authorize(identity: &Identity, required: &PermissionSlug) -> Result<(), AuthzError> {
    if identity.is_patient() {
        return Err(AuthzError::PatientRole(identity.role().name.clone()));
    }

    if identity.has_permission(required.as_str()) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Access Explanation
// ─────────────────────────────────────────────────────────────────────────────

/// Why an access decision came out the way it did.
///
/// Rendered by the "Access Denied" state and returned by the guard endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessExplanation {
    /// The slug being checked (`None` for requirement-free content).
    pub required_permission: Option<String>,
    pub granted: bool,
    /// Human-readable reason for the decision.
    pub reason: String,
    pub denial: Option<DenialKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    NotAuthenticated,
    Resolving,
    PatientRole,
    MissingPermission,
}

pub fn explain_access(required: Option<&PermissionSlug>, state: &AuthState) -> AccessExplanation {
    let required_permission = required.map(|s| s.as_str().to_string());
    let denied = |kind: DenialKind, reason: String| AccessExplanation {
        required_permission: required_permission.clone(),
        granted: false,
        reason,
        denial: Some(kind),
    };

    let identity = match state {
        AuthState::SignedOut => {
            return denied(DenialKind::NotAuthenticated, "sign-in required".to_string());
        }
        AuthState::Resolving => {
            return denied(
                DenialKind::Resolving,
                "permissions are still being resolved".to_string(),
            );
        }
        AuthState::SignedIn(identity) => identity,
    };

    if identity.is_patient() {
        return denied(
            DenialKind::PatientRole,
            format!("role '{}' may not use the operator console", identity.role().name),
        );
    }

    if !has_permission_for(required, identity.permission_slugs()) {
        let slug = required.map(|s| s.as_str()).unwrap_or_default();
        return denied(
            DenialKind::MissingPermission,
            format!("role '{}' lacks permission '{}'", identity.role().name, slug),
        );
    }

    let reason = match required {
        None => "no permission required".to_string(),
        Some(slug) => format!("role '{}' grants '{}'", identity.role().name, slug),
    };
    AccessExplanation {
        required_permission: required.map(|s| s.as_str().to_string()),
        granted: true,
        reason,
        denial: None,
    }
}
