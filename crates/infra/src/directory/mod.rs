//! Permission catalog / role registry contracts.
//!
//! The traits mirror the registry's network endpoints; [`in_memory`] is the
//! storage-backed implementation the API serves, [`crate::http`] the client
//! the console talks through. Every handle is scoped to one tenant.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use medgate_auth::{Permission, Role};
use medgate_core::{DomainError, IdentityId, PermissionId, RoleId};

pub mod in_memory;

pub use in_memory::{InMemoryRegistry, TenantDirectory};

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

/// Registry/catalog call failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Network or storage failure. Never retried automatically.
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

impl From<DomainError> for DirectoryError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::NotFound(what) => DirectoryError::NotFound(what),
            DomainError::Conflict(msg) => DirectoryError::Conflict(msg),
            DomainError::Unauthorized => DirectoryError::Forbidden("unauthorized".to_string()),
            DomainError::Validation(msg)
            | DomainError::InvariantViolation(msg)
            | DomainError::InvalidId(msg) => DirectoryError::Validation(msg),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Queries / pagination
// ─────────────────────────────────────────────────────────────────────────────

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

/// Filter for `list_permissions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionQuery {
    /// Module label, matched case-insensitively ("" and absent mean "General").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    /// Matched against name, slug and description, case-insensitively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

/// Filter for `list_roles`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

/// One page of a listing (1-based).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Number of matching items across all pages.
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
}

impl<T> Page<T> {
    /// Cut one page out of the full, already filtered result.
    pub fn paginate(all: Vec<T>, page: Option<u32>, per_page: Option<u32>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE);
        let total = all.len();
        let skip = (page as usize - 1).saturating_mul(per_page as usize);
        let items = all.into_iter().skip(skip).take(per_page as usize).collect();

        Self {
            items,
            total,
            page,
            per_page,
        }
    }

    pub fn has_next(&self) -> bool {
        (self.page as usize).saturating_mul(self.per_page as usize) < self.total
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request payloads
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPermission {
    pub name: String,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Display-field update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRole {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of a permission-set replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignPermissions {
    pub permission_ids: BTreeSet<PermissionId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignRole {
    pub role_id: RoleId,
}

// ─────────────────────────────────────────────────────────────────────────────
// Contracts
// ─────────────────────────────────────────────────────────────────────────────

/// Permission catalog endpoints.
#[async_trait]
pub trait PermissionsApi: Send + Sync {
    async fn list_permissions(&self, query: &PermissionQuery) -> Result<Page<Permission>, DirectoryError>;

    /// The slug is derived from the name and must be unique.
    async fn create_permission(&self, new: NewPermission) -> Result<Permission, DirectoryError>;

    /// Changes display fields; the slug never changes. The module only moves
    /// while no role references the permission.
    async fn update_permission(
        &self,
        id: PermissionId,
        update: PermissionUpdate,
    ) -> Result<Permission, DirectoryError>;

    /// Fails with `Conflict` while any role references the permission.
    async fn delete_permission(&self, id: PermissionId) -> Result<(), DirectoryError>;
}

/// Role registry endpoints.
#[async_trait]
pub trait RolesApi: Send + Sync {
    async fn list_roles(&self, query: &RoleQuery) -> Result<Page<Role>, DirectoryError>;

    async fn get_role(&self, id: RoleId) -> Result<Role, DirectoryError>;

    /// Role names are unique (case-insensitive). Created roles are never system roles.
    async fn create_role(&self, new: NewRole) -> Result<Role, DirectoryError>;

    async fn update_role(&self, id: RoleId, update: RoleUpdate) -> Result<Role, DirectoryError>;

    /// Fails with `Conflict` for system roles and for roles any identity holds.
    async fn delete_role(&self, id: RoleId) -> Result<(), DirectoryError>;

    /// Replace the role's permission set with exactly `permission_ids`.
    ///
    /// All-or-nothing: an unknown id fails the call and leaves the stored set
    /// untouched.
    async fn assign_permissions(
        &self,
        role_id: RoleId,
        permission_ids: BTreeSet<PermissionId>,
    ) -> Result<Role, DirectoryError>;
}

/// Identity → role assignments.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// The role (with its current permissions) the identity holds.
    async fn role_of(&self, identity_id: IdentityId) -> Result<Role, DirectoryError>;

    async fn assign_role(&self, identity_id: IdentityId, role_id: RoleId) -> Result<(), DirectoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_and_reports_next_page() {
        let page = Page::paginate((1..=45).collect::<Vec<_>>(), Some(2), Some(20));
        assert_eq!(page.items, (21..=40).collect::<Vec<_>>());
        assert_eq!(page.total, 45);
        assert!(page.has_next());

        let last = Page::paginate((1..=45).collect::<Vec<_>>(), Some(3), Some(20));
        assert_eq!(last.items.len(), 5);
        assert!(!last.has_next());

        let clamped = Page::paginate((1..=5).collect::<Vec<_>>(), Some(0), Some(0));
        assert_eq!(clamped.page, 1);
        assert_eq!(clamped.per_page, 1);
        assert_eq!(clamped.items, vec![1]);

        let capped = Page::paginate(Vec::<u8>::new(), None, Some(10_000));
        assert_eq!(capped.per_page, MAX_PER_PAGE);
        assert!(!capped.has_next());
    }

    #[test]
    fn domain_errors_map_onto_directory_errors() {
        assert_eq!(
            DirectoryError::from(DomainError::conflict("taken")),
            DirectoryError::Conflict("taken".to_string())
        );
        assert!(matches!(
            DirectoryError::from(DomainError::validation("bad")),
            DirectoryError::Validation(_)
        ));
    }
}
