use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use medgate_core::{DomainError, DomainResult, Entity, PermissionId, RoleId, entity::dedup_by_id};

use crate::permissions::{Permission, PermissionSlug, normalize_description};

/// Role name that is locked out of the operator console regardless of grants.
pub const PATIENT_ROLE: &str = "patient";

/// A role's permissions: a set keyed by permission id, kept in first-seen order.
///
/// Duplicates are collapsed on construction and on deserialization, so a
/// `PermissionSet` never holds the same permission twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Permission>", into = "Vec<Permission>")]
pub struct PermissionSet(Vec<Permission>);

impl PermissionSet {
    pub fn new(permissions: impl IntoIterator<Item = Permission>) -> Self {
        let mut permissions: Vec<Permission> = permissions.into_iter().collect();
        dedup_by_id(&mut permissions);
        Self(permissions)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: &PermissionId) -> bool {
        self.0.iter().any(|p| &p.id == id)
    }

    pub fn ids(&self) -> BTreeSet<PermissionId> {
        self.0.iter().map(|p| p.id).collect()
    }

    pub fn slugs(&self) -> BTreeSet<PermissionSlug> {
        self.0.iter().map(|p| p.slug.clone()).collect()
    }
}

impl From<Vec<Permission>> for PermissionSet {
    fn from(value: Vec<Permission>) -> Self {
        Self::new(value)
    }
}

impl From<PermissionSet> for Vec<Permission> {
    fn from(value: PermissionSet) -> Self {
        value.0
    }
}

/// Named bundle of permissions assigned to identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// System roles cannot be deleted or renamed.
    #[serde(default)]
    pub is_system: bool,
    #[serde(default)]
    pub permissions: PermissionSet,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn new(
        id: RoleId,
        name: &str,
        description: Option<String>,
        is_system: bool,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            name: validate_role_name(name)?,
            description: normalize_description(description),
            is_system,
            permissions: PermissionSet::default(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace (never merge) the permission set.
    pub fn with_permissions(mut self, permissions: PermissionSet, now: DateTime<Utc>) -> Self {
        self.permissions = permissions;
        self.updated_at = now;
        self
    }

    pub fn renamed(mut self, name: &str, now: DateTime<Utc>) -> DomainResult<Self> {
        self.name = validate_role_name(name)?;
        self.updated_at = now;
        Ok(self)
    }

    pub fn described(mut self, description: Option<String>, now: DateTime<Utc>) -> Self {
        self.description = normalize_description(description);
        self.updated_at = now;
        self
    }

    /// Same name, ignoring ASCII case and surrounding whitespace.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.trim())
    }

    pub fn is_patient(&self) -> bool {
        self.has_name(PATIENT_ROLE)
    }

    pub fn permission_ids(&self) -> BTreeSet<PermissionId> {
        self.permissions.ids()
    }

    pub fn permission_slugs(&self) -> BTreeSet<PermissionSlug> {
        self.permissions.slugs()
    }
}

impl Entity for Role {
    type Id = RoleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn validate_role_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("role name cannot be empty"));
    }
    Ok(name.to_string())
}
