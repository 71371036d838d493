//! In-memory, tenant-isolated registry for the API service, tests and dev.
//!
//! Each tenant's catalog, roles and identity assignments live behind one
//! lock, so every mutation (including a permission-set replacement) is
//! validated and applied as a single step.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;

use medgate_auth::{ModuleName, Permission, PermissionSet, Role};
use medgate_core::{IdentityId, PermissionId, RoleId, TenantId};

use super::{
    DirectoryError, IdentityDirectory, NewPermission, NewRole, Page, PermissionQuery, PermissionUpdate,
    PermissionsApi, RoleQuery, RoleUpdate, RolesApi,
};

/// A role as stored: references permissions by id, hydrated on read so
/// display-field edits show up in every role.
#[derive(Debug, Clone)]
struct StoredRole {
    role: Role,
    permission_ids: Vec<PermissionId>,
}

#[derive(Debug, Default)]
struct TenantRegistry {
    permissions: Vec<Permission>,
    roles: Vec<StoredRole>,
    identity_roles: HashMap<IdentityId, RoleId>,
}

impl TenantRegistry {
    fn permission_index(&self, id: PermissionId) -> Result<usize, DirectoryError> {
        self.permissions
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| DirectoryError::NotFound(format!("permission {id}")))
    }

    fn role_index(&self, id: RoleId) -> Result<usize, DirectoryError> {
        self.roles
            .iter()
            .position(|r| r.role.id == id)
            .ok_or_else(|| DirectoryError::NotFound(format!("role {id}")))
    }

    fn hydrate(&self, stored: &StoredRole) -> Role {
        let permissions = stored
            .permission_ids
            .iter()
            .filter_map(|id| self.permissions.iter().find(|p| p.id == *id).cloned());
        stored
            .role
            .clone()
            .with_permissions(PermissionSet::new(permissions), stored.role.updated_at)
    }

    fn is_referenced(&self, id: PermissionId) -> bool {
        self.roles.iter().any(|r| r.permission_ids.contains(&id))
    }

    /// The spelling already in use for `module`, so one module keeps one label.
    fn module_label(&self, module: ModuleName) -> ModuleName {
        self.permissions
            .iter()
            .find(|p| p.module == module)
            .map(|p| p.module.clone())
            .unwrap_or(module)
    }

    fn ensure_role_name_free(&self, name: &str, except: Option<RoleId>) -> Result<(), DirectoryError> {
        let taken = self
            .roles
            .iter()
            .any(|r| Some(r.role.id) != except && r.role.has_name(name));
        if taken {
            return Err(DirectoryError::Conflict(format!("role '{}' already exists", name.trim())));
        }
        Ok(())
    }

    fn insert_role(&mut self, role: Role) -> Role {
        self.roles.push(StoredRole {
            role: role.clone(),
            permission_ids: Vec::new(),
        });
        role
    }
}

/// Multi-tenant registry storage.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    tenants: RwLock<HashMap<TenantId, TenantRegistry>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// A directory handle scoped to one tenant.
    pub fn tenant(self: &Arc<Self>, tenant_id: TenantId) -> TenantDirectory {
        TenantDirectory {
            registry: Arc::clone(self),
            tenant_id,
        }
    }

    fn read<T>(
        &self,
        tenant_id: TenantId,
        f: impl FnOnce(&TenantRegistry) -> Result<T, DirectoryError>,
    ) -> Result<T, DirectoryError> {
        let tenants = self
            .tenants
            .read()
            .map_err(|_| DirectoryError::Unavailable("registry lock poisoned".to_string()))?;
        match tenants.get(&tenant_id) {
            Some(registry) => f(registry),
            None => f(&TenantRegistry::default()),
        }
    }

    fn write<T>(
        &self,
        tenant_id: TenantId,
        f: impl FnOnce(&mut TenantRegistry) -> Result<T, DirectoryError>,
    ) -> Result<T, DirectoryError> {
        let mut tenants = self
            .tenants
            .write()
            .map_err(|_| DirectoryError::Unavailable("registry lock poisoned".to_string()))?;
        f(tenants.entry(tenant_id).or_default())
    }
}

/// Tenant-scoped handle onto an [`InMemoryRegistry`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TenantDirectory {
    registry: Arc<InMemoryRegistry>,
    tenant_id: TenantId,
}

impl TenantDirectory {
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Create a protected (undeletable) role. Only seeding creates these.
    pub fn create_system_role(&self, name: &str, description: Option<String>) -> Result<Role, DirectoryError> {
        let role = Role::new(RoleId::new(), name, description, true, Utc::now())?;
        let role = self.registry.write(self.tenant_id, |reg| {
            reg.ensure_role_name_free(&role.name, None)?;
            Ok(reg.insert_role(role))
        })?;
        tracing::info!(tenant_id = %self.tenant_id, role_id = %role.id, name = %role.name, "system role created");
        Ok(role)
    }

    /// Identities currently holding `role_id`.
    pub fn holders_of(&self, role_id: RoleId) -> Result<Vec<IdentityId>, DirectoryError> {
        self.registry.read(self.tenant_id, |reg| {
            let mut holders: Vec<IdentityId> = reg
                .identity_roles
                .iter()
                .filter(|(_, r)| **r == role_id)
                .map(|(i, _)| *i)
                .collect();
            holders.sort();
            Ok(holders)
        })
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn keyword(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
}

#[async_trait]
impl PermissionsApi for TenantDirectory {
    async fn list_permissions(&self, query: &PermissionQuery) -> Result<Page<Permission>, DirectoryError> {
        let keyword = keyword(&query.keyword);
        let matching = self.registry.read(self.tenant_id, |reg| {
            Ok(reg
                .permissions
                .iter()
                .filter(|p| query.module.as_deref().is_none_or(|m| p.module.matches(m)))
                .filter(|p| {
                    keyword.as_deref().is_none_or(|k| {
                        contains_ci(&p.name, k)
                            || contains_ci(p.slug.as_str(), k)
                            || p.description.as_deref().is_some_and(|d| contains_ci(d, k))
                    })
                })
                .cloned()
                .collect::<Vec<_>>())
        })?;
        Ok(Page::paginate(matching, query.page, query.per_page))
    }

    async fn create_permission(&self, new: NewPermission) -> Result<Permission, DirectoryError> {
        let permission = Permission::from_name(
            PermissionId::new(),
            &new.name,
            new.module.as_deref(),
            new.description,
            Utc::now(),
        )?;

        let permission = self.registry.write(self.tenant_id, |reg| {
            if reg.permissions.iter().any(|p| p.slug == permission.slug) {
                return Err(DirectoryError::Conflict(format!(
                    "permission '{}' already exists",
                    permission.slug
                )));
            }
            let mut permission = permission;
            permission.module = reg.module_label(permission.module);
            reg.permissions.push(permission.clone());
            Ok(permission)
        })?;

        tracing::info!(
            tenant_id = %self.tenant_id,
            permission_id = %permission.id,
            slug = %permission.slug,
            module = %permission.module,
            "permission created"
        );
        Ok(permission)
    }

    async fn update_permission(
        &self,
        id: PermissionId,
        update: PermissionUpdate,
    ) -> Result<Permission, DirectoryError> {
        let now = Utc::now();
        let updated = self.registry.write(self.tenant_id, |reg| {
            let idx = reg.permission_index(id)?;
            let mut permission = reg.permissions[idx].clone();

            if let Some(name) = update.name.as_deref() {
                let name = name.trim();
                if name.is_empty() {
                    return Err(DirectoryError::Validation("permission name cannot be empty".to_string()));
                }
                permission.name = name.to_string();
            }
            if let Some(description) = update.description {
                permission.description = Some(description.trim().to_string()).filter(|d| !d.is_empty());
            }
            if let Some(module) = update.module.as_deref() {
                let module = ModuleName::new(Some(module));
                if module != permission.module {
                    if reg.is_referenced(id) {
                        return Err(DirectoryError::Conflict(format!(
                            "permission '{}' is assigned to a role; its module cannot change",
                            permission.slug
                        )));
                    }
                    permission.module = reg.module_label(module);
                }
            }

            permission.updated_at = now;
            reg.permissions[idx] = permission.clone();
            Ok(permission)
        })?;

        tracing::info!(tenant_id = %self.tenant_id, permission_id = %id, "permission updated");
        Ok(updated)
    }

    async fn delete_permission(&self, id: PermissionId) -> Result<(), DirectoryError> {
        self.registry.write(self.tenant_id, |reg| {
            let idx = reg.permission_index(id)?;
            if reg.is_referenced(id) {
                return Err(DirectoryError::Conflict(format!(
                    "permission '{}' is assigned to a role",
                    reg.permissions[idx].slug
                )));
            }
            reg.permissions.remove(idx);
            Ok(())
        })?;

        tracing::info!(tenant_id = %self.tenant_id, permission_id = %id, "permission deleted");
        Ok(())
    }
}

#[async_trait]
impl RolesApi for TenantDirectory {
    async fn list_roles(&self, query: &RoleQuery) -> Result<Page<Role>, DirectoryError> {
        let keyword = keyword(&query.keyword);
        let matching = self.registry.read(self.tenant_id, |reg| {
            Ok(reg
                .roles
                .iter()
                .filter(|r| {
                    keyword.as_deref().is_none_or(|k| {
                        contains_ci(&r.role.name, k)
                            || r.role.description.as_deref().is_some_and(|d| contains_ci(d, k))
                    })
                })
                .map(|r| reg.hydrate(r))
                .collect::<Vec<_>>())
        })?;
        Ok(Page::paginate(matching, query.page, query.per_page))
    }

    async fn get_role(&self, id: RoleId) -> Result<Role, DirectoryError> {
        self.registry.read(self.tenant_id, |reg| {
            let idx = reg.role_index(id)?;
            Ok(reg.hydrate(&reg.roles[idx]))
        })
    }

    async fn create_role(&self, new: NewRole) -> Result<Role, DirectoryError> {
        let role = Role::new(RoleId::new(), &new.name, new.description, false, Utc::now())?;
        let role = self.registry.write(self.tenant_id, |reg| {
            reg.ensure_role_name_free(&role.name, None)?;
            Ok(reg.insert_role(role))
        })?;

        tracing::info!(tenant_id = %self.tenant_id, role_id = %role.id, name = %role.name, "role created");
        Ok(role)
    }

    async fn update_role(&self, id: RoleId, update: RoleUpdate) -> Result<Role, DirectoryError> {
        let now = Utc::now();
        let role = self.registry.write(self.tenant_id, |reg| {
            let idx = reg.role_index(id)?;
            let mut role = reg.roles[idx].role.clone();

            if let Some(name) = update.name.as_deref() {
                if role.is_system && !role.has_name(name) {
                    return Err(DirectoryError::Conflict(format!(
                        "role '{}' is a system role and cannot be renamed",
                        role.name
                    )));
                }
                reg.ensure_role_name_free(name, Some(id))?;
                role = role.renamed(name, now)?;
            }
            if let Some(description) = update.description {
                role = role.described(Some(description), now);
            }

            reg.roles[idx].role = role;
            Ok(reg.hydrate(&reg.roles[idx]))
        })?;

        tracing::info!(tenant_id = %self.tenant_id, role_id = %id, "role updated");
        Ok(role)
    }

    async fn delete_role(&self, id: RoleId) -> Result<(), DirectoryError> {
        self.registry.write(self.tenant_id, |reg| {
            let idx = reg.role_index(id)?;
            let role = &reg.roles[idx].role;
            if role.is_system {
                return Err(DirectoryError::Conflict(format!(
                    "role '{}' is a system role",
                    role.name
                )));
            }
            let holders = reg.identity_roles.values().filter(|r| **r == id).count();
            if holders > 0 {
                return Err(DirectoryError::Conflict(format!(
                    "role '{}' is held by {holders} identities",
                    role.name
                )));
            }
            reg.roles.remove(idx);
            Ok(())
        })?;

        tracing::info!(tenant_id = %self.tenant_id, role_id = %id, "role deleted");
        Ok(())
    }

    async fn assign_permissions(
        &self,
        role_id: RoleId,
        permission_ids: BTreeSet<PermissionId>,
    ) -> Result<Role, DirectoryError> {
        let now = Utc::now();
        let role = self.registry.write(self.tenant_id, |reg| {
            let idx = reg.role_index(role_id)?;
            // Validate the whole set before touching the stored one.
            for id in &permission_ids {
                reg.permission_index(*id)?;
            }

            // Keep catalog order so hydrated roles list permissions predictably.
            let ordered: Vec<PermissionId> = reg
                .permissions
                .iter()
                .map(|p| p.id)
                .filter(|id| permission_ids.contains(id))
                .collect();

            let stored = &mut reg.roles[idx];
            stored.permission_ids = ordered;
            stored.role.updated_at = now;
            Ok(reg.hydrate(&reg.roles[idx]))
        })?;

        tracing::info!(
            tenant_id = %self.tenant_id,
            role_id = %role_id,
            permissions = role.permissions.len(),
            "role permissions replaced"
        );
        Ok(role)
    }
}

#[async_trait]
impl IdentityDirectory for TenantDirectory {
    async fn role_of(&self, identity_id: IdentityId) -> Result<Role, DirectoryError> {
        self.registry.read(self.tenant_id, |reg| {
            let role_id = reg
                .identity_roles
                .get(&identity_id)
                .copied()
                .ok_or_else(|| DirectoryError::NotFound(format!("identity {identity_id}")))?;
            let idx = reg.role_index(role_id)?;
            Ok(reg.hydrate(&reg.roles[idx]))
        })
    }

    async fn assign_role(&self, identity_id: IdentityId, role_id: RoleId) -> Result<(), DirectoryError> {
        self.registry.write(self.tenant_id, |reg| {
            reg.role_index(role_id)?;
            reg.identity_roles.insert(identity_id, role_id);
            Ok(())
        })?;

        tracing::info!(tenant_id = %self.tenant_id, identity_id = %identity_id, role_id = %role_id, "role assigned");
        Ok(())
    }
}
