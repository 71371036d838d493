//! In-memory view of the permission catalog.

use std::collections::HashMap;

use medgate_core::{PermissionId, entity::dedup_by_id};

use crate::permissions::{ModuleName, Permission, PermissionSlug};
use crate::slugs::KnownSlug;

/// Snapshot of every permission known to a tenant, indexed by id and slug.
///
/// Iteration order is the order the directory returned the permissions in.
#[derive(Debug, Clone, Default)]
pub struct PermissionCatalog {
    permissions: Vec<Permission>,
    by_id: HashMap<PermissionId, usize>,
    by_slug: HashMap<PermissionSlug, usize>,
}

impl PermissionCatalog {
    pub fn new(permissions: impl IntoIterator<Item = Permission>) -> Self {
        let mut permissions: Vec<Permission> = permissions.into_iter().collect();
        dedup_by_id(&mut permissions);

        let by_id = permissions
            .iter()
            .enumerate()
            .map(|(idx, p)| (p.id, idx))
            .collect();
        let by_slug = permissions
            .iter()
            .enumerate()
            .map(|(idx, p)| (p.slug.clone(), idx))
            .collect();

        Self {
            permissions,
            by_id,
            by_slug,
        }
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    pub fn get(&self, id: &PermissionId) -> Option<&Permission> {
        self.by_id.get(id).map(|&idx| &self.permissions[idx])
    }

    pub fn by_slug(&self, slug: &str) -> Option<&Permission> {
        self.by_slug.get(slug).map(|&idx| &self.permissions[idx])
    }

    pub fn contains_slug(&self, slug: &str) -> bool {
        self.by_slug.contains_key(slug)
    }

    /// Module labels in first-seen order.
    pub fn modules(&self) -> Vec<&ModuleName> {
        let mut modules: Vec<&ModuleName> = Vec::new();
        for p in &self.permissions {
            if !modules.contains(&&p.module) {
                modules.push(&p.module);
            }
        }
        modules
    }

    /// Permissions grouped by module, modules in first-seen order.
    pub fn grouped(&self) -> Vec<(&ModuleName, Vec<&Permission>)> {
        self.modules()
            .into_iter()
            .map(|module| {
                let members = self.permissions.iter().filter(|p| &p.module == module).collect();
                (module, members)
            })
            .collect()
    }

    /// Ids of every permission in `module` (empty for an unknown module).
    pub fn ids_in_module(&self, module: &ModuleName) -> Vec<PermissionId> {
        self.permissions
            .iter()
            .filter(|p| &p.module == module)
            .map(|p| p.id)
            .collect()
    }

    /// Application slugs that have no catalog entry (configuration drift).
    pub fn missing_known_slugs(&self) -> Vec<KnownSlug> {
        KnownSlug::ALL
            .iter()
            .copied()
            .filter(|k| !self.contains_slug(k.as_str()))
            .collect()
    }
}
