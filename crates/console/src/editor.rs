//! Role ↔ permission editor.
//!
//! Keeps a working copy of the selected role's permission ids, lets the
//! operator toggle single permissions or whole modules, and persists the
//! working set with one `assign_permissions` call. Network work is split
//! into `begin_*` / `finish_*` pairs so a result that arrives after the
//! editor moved on (role switched, reload started, editor dropped) is
//! recognised by its ticket and thrown away.

use std::collections::BTreeSet;

use medgate_auth::{ModuleName, PermissionCatalog, Role};
use medgate_core::{PermissionId, RoleId};
use medgate_infra::{DirectoryError, PermissionsApi, RolesApi, load_catalog, load_roles};

use crate::error::EditorError;

/// Where the editor is in its load / edit / save cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorState {
    Loading,
    /// Roles or permissions could not be fetched; `load` again to retry.
    LoadFailed(EditorError),
    Idle,
    Saving,
}

/// Proof that a load was started; stale once anything newer started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct LoadTicket(u64);

/// A started save: the role and the exact set being written.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct SaveTicket {
    generation: u64,
    pub role_id: RoleId,
    pub permission_ids: BTreeSet<PermissionId>,
}

type Loaded = (Vec<Role>, PermissionCatalog);

pub struct RolePermissionEditor<D> {
    directory: D,
    state: EditorState,
    roles: Vec<Role>,
    catalog: PermissionCatalog,
    selected: Option<RoleId>,
    working: BTreeSet<PermissionId>,
    last_error: Option<EditorError>,
    generation: u64,
}

impl<D> RolePermissionEditor<D>
where
    D: PermissionsApi + RolesApi,
{
    pub fn new(directory: D) -> Self {
        Self {
            directory,
            state: EditorState::Loading,
            roles: Vec::new(),
            catalog: PermissionCatalog::default(),
            selected: None,
            working: BTreeSet::new(),
            last_error: None,
            generation: 0,
        }
    }

    // ── accessors ───────────────────────────────────────────────────────────

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn catalog(&self) -> &PermissionCatalog {
        &self.catalog
    }

    pub fn selected_role(&self) -> Option<&Role> {
        let id = self.selected?;
        self.roles.iter().find(|r| r.id == id)
    }

    /// The working copy of the selected role's permission ids.
    pub fn working_set(&self) -> &BTreeSet<PermissionId> {
        &self.working
    }

    /// The last save failure, kept until the next successful save.
    pub fn last_error(&self) -> Option<&EditorError> {
        self.last_error.as_ref()
    }

    /// Whether the working set differs from what the registry last returned.
    pub fn is_dirty(&self) -> bool {
        self.selected_role()
            .is_some_and(|role| role.permission_ids() != self.working)
    }

    pub fn can_save(&self) -> bool {
        self.state == EditorState::Idle && self.selected.is_some()
    }

    // ── loading ─────────────────────────────────────────────────────────────

    /// Fetch roles and the catalog concurrently.
    pub async fn fetch(directory: &D) -> Result<Loaded, DirectoryError> {
        tokio::try_join!(load_roles(directory), load_catalog(directory))
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.state = EditorState::Loading;
        LoadTicket(self.generation)
    }

    /// Apply a load result. Stale tickets are ignored.
    ///
    /// Keeps the previous selection when that role still exists, otherwise
    /// selects the first role; the working set is reset from the registry.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<Loaded, DirectoryError>) -> Result<(), EditorError> {
        if ticket.0 != self.generation {
            tracing::debug!("stale load result discarded");
            return Ok(());
        }

        match result {
            Ok((roles, catalog)) => {
                self.roles = roles;
                self.catalog = catalog;
                let keep = self.selected.filter(|id| self.roles.iter().any(|r| r.id == *id));
                self.selected = keep.or_else(|| self.roles.first().map(|r| r.id));
                self.reset_working_set();
                self.state = EditorState::Idle;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "role editor load failed");
                let err = EditorError::Directory(err);
                self.state = EditorState::LoadFailed(err.clone());
                Err(err)
            }
        }
    }

    pub async fn load(&mut self) -> Result<(), EditorError> {
        let ticket = self.begin_load();
        let result = Self::fetch(&self.directory).await;
        self.finish_load(ticket, result)
    }

    // ── editing ─────────────────────────────────────────────────────────────

    /// Switch roles. Unsaved toggles of the previous role are dropped.
    pub fn select_role(&mut self, role_id: RoleId) -> Result<(), EditorError> {
        if self.state != EditorState::Idle {
            return Err(EditorError::NotReady);
        }
        if !self.roles.iter().any(|r| r.id == role_id) {
            return Err(EditorError::UnknownRole(role_id));
        }
        self.selected = Some(role_id);
        self.reset_working_set();
        Ok(())
    }

    /// Flip one permission in the working set. No-op unless idle with a role selected.
    pub fn toggle_permission(&mut self, id: PermissionId) {
        if !self.can_save() {
            return;
        }
        if !self.working.remove(&id) {
            self.working.insert(id);
        }
    }

    /// Every permission of the module is in the working set.
    ///
    /// A module with no permissions is never "selected".
    pub fn is_module_selected(&self, module: &ModuleName) -> bool {
        let ids = self.catalog.ids_in_module(module);
        !ids.is_empty() && ids.iter().all(|id| self.working.contains(id))
    }

    /// All selected: clear the module. Otherwise: fill it.
    pub fn toggle_module(&mut self, module: &ModuleName) {
        if !self.can_save() {
            return;
        }
        let ids = self.catalog.ids_in_module(module);
        if self.is_module_selected(module) {
            for id in &ids {
                self.working.remove(id);
            }
        } else {
            self.working.extend(ids);
        }
    }

    // ── saving ──────────────────────────────────────────────────────────────

    pub fn begin_save(&mut self) -> Result<SaveTicket, EditorError> {
        match self.state {
            EditorState::Saving => return Err(EditorError::SaveInFlight),
            EditorState::Idle => {}
            _ => return Err(EditorError::NotReady),
        }
        let role_id = self.selected.ok_or(EditorError::NoRoleSelected)?;

        self.generation += 1;
        self.state = EditorState::Saving;
        Ok(SaveTicket {
            generation: self.generation,
            role_id,
            permission_ids: self.working.clone(),
        })
    }

    /// Apply a save result. Stale tickets are ignored.
    ///
    /// On failure the working set is left exactly as the operator had it.
    pub fn finish_save(&mut self, ticket: SaveTicket, result: Result<Role, DirectoryError>) -> Result<(), EditorError> {
        if ticket.generation != self.generation {
            tracing::debug!(role_id = %ticket.role_id, "stale save result discarded");
            return Ok(());
        }
        self.state = EditorState::Idle;

        match result {
            Ok(role) => {
                tracing::info!(
                    role_id = %role.id,
                    permissions = role.permissions.len(),
                    "role permissions saved"
                );
                if let Some(slot) = self.roles.iter_mut().find(|r| r.id == role.id) {
                    *slot = role;
                }
                self.last_error = None;
                self.reset_working_set();
                Ok(())
            }
            Err(err) => {
                tracing::warn!(role_id = %ticket.role_id, error = %err, "role permission save failed");
                let err = EditorError::Directory(err);
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Persist the working set, then reload roles and permissions.
    pub async fn save(&mut self) -> Result<(), EditorError> {
        let ticket = self.begin_save()?;
        let result = self
            .directory
            .assign_permissions(ticket.role_id, ticket.permission_ids.clone())
            .await;
        self.finish_save(ticket, result)?;
        self.load().await
    }

    /// Abandon whatever is in flight. Late results will be discarded.
    pub fn cancel_pending(&mut self) {
        self.generation += 1;
        if self.state == EditorState::Saving {
            self.state = EditorState::Idle;
        }
    }

    fn reset_working_set(&mut self) {
        self.working = self
            .selected_role()
            .map(Role::permission_ids)
            .unwrap_or_default();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use medgate_auth::Permission;
    use medgate_core::TenantId;
    use medgate_infra::directory::{NewPermission, NewRole, PermissionUpdate, RoleUpdate};
    use medgate_infra::{InMemoryRegistry, Page, PermissionQuery, RoleQuery, TenantDirectory};

    use super::*;

    /// Registry whose permission assignment can be switched to fail.
    struct Flaky {
        inner: TenantDirectory,
        fail_assign: AtomicBool,
    }

    #[async_trait]
    impl PermissionsApi for Flaky {
        async fn list_permissions(&self, query: &PermissionQuery) -> Result<Page<Permission>, DirectoryError> {
            self.inner.list_permissions(query).await
        }

        async fn create_permission(&self, new: NewPermission) -> Result<Permission, DirectoryError> {
            self.inner.create_permission(new).await
        }

        async fn update_permission(
            &self,
            id: PermissionId,
            update: PermissionUpdate,
        ) -> Result<Permission, DirectoryError> {
            self.inner.update_permission(id, update).await
        }

        async fn delete_permission(&self, id: PermissionId) -> Result<(), DirectoryError> {
            self.inner.delete_permission(id).await
        }
    }

    #[async_trait]
    impl RolesApi for Flaky {
        async fn list_roles(&self, query: &RoleQuery) -> Result<Page<Role>, DirectoryError> {
            self.inner.list_roles(query).await
        }

        async fn get_role(&self, id: RoleId) -> Result<Role, DirectoryError> {
            self.inner.get_role(id).await
        }

        async fn create_role(&self, new: NewRole) -> Result<Role, DirectoryError> {
            self.inner.create_role(new).await
        }

        async fn update_role(&self, id: RoleId, update: RoleUpdate) -> Result<Role, DirectoryError> {
            self.inner.update_role(id, update).await
        }

        async fn delete_role(&self, id: RoleId) -> Result<(), DirectoryError> {
            self.inner.delete_role(id).await
        }

        async fn assign_permissions(
            &self,
            role_id: RoleId,
            permission_ids: BTreeSet<PermissionId>,
        ) -> Result<Role, DirectoryError> {
            if self.fail_assign.load(Ordering::SeqCst) {
                return Err(DirectoryError::Unavailable("connection reset".to_string()));
            }
            self.inner.assign_permissions(role_id, permission_ids).await
        }
    }

    struct Fixture {
        editor: RolePermissionEditor<Flaky>,
        a: PermissionId,
        b: PermissionId,
        c: PermissionId,
        cashier: RoleId,
        nurse: RoleId,
    }

    async fn fixture() -> Fixture {
        let dir = InMemoryRegistry::arc().tenant(TenantId::new());
        let mut ids = Vec::new();
        for (name, module) in [("View Billing", "Billing"), ("Manage Billing", "Billing"), ("View Reports", "Reports")] {
            let p = dir
                .create_permission(NewPermission {
                    name: name.to_string(),
                    module: Some(module.to_string()),
                    description: None,
                })
                .await
                .unwrap();
            ids.push(p.id);
        }
        let cashier = dir
            .create_role(NewRole {
                name: "Cashier".to_string(),
                description: None,
            })
            .await
            .unwrap()
            .id;
        let nurse = dir
            .create_role(NewRole {
                name: "Nurse".to_string(),
                description: None,
            })
            .await
            .unwrap()
            .id;

        let mut editor = RolePermissionEditor::new(Flaky {
            inner: dir,
            fail_assign: AtomicBool::new(false),
        });
        editor.load().await.unwrap();

        Fixture {
            editor,
            a: ids[0],
            b: ids[1],
            c: ids[2],
            cashier,
            nurse,
        }
    }

    fn set(ids: &[PermissionId]) -> BTreeSet<PermissionId> {
        ids.iter().copied().collect()
    }

    #[tokio::test]
    async fn load_selects_first_role_with_empty_working_set() {
        let f = fixture().await;
        assert_eq!(f.editor.state(), &EditorState::Idle);
        assert_eq!(f.editor.roles().len(), 2);
        assert_eq!(f.editor.catalog().len(), 3);
        assert_eq!(f.editor.selected_role().map(|r| r.id), Some(f.cashier));
        assert!(f.editor.working_set().is_empty());
        assert!(!f.editor.is_dirty());
    }

    #[tokio::test]
    async fn module_toggle_fills_then_clears() {
        let mut f = fixture().await;
        let billing = ModuleName::from("Billing");

        f.editor.toggle_permission(f.a);
        assert!(!f.editor.is_module_selected(&billing));

        f.editor.toggle_module(&billing);
        assert_eq!(f.editor.working_set(), &set(&[f.a, f.b]));
        assert!(f.editor.is_module_selected(&billing));

        f.editor.toggle_module(&billing);
        assert!(f.editor.working_set().is_empty());

        f.editor.toggle_permission(f.c);
        f.editor.toggle_module(&billing);
        assert_eq!(f.editor.working_set(), &set(&[f.a, f.b, f.c]));
        assert!(f.editor.is_dirty());
    }

    #[tokio::test]
    async fn module_toggle_covers_every_spelling_of_the_module() {
        let mut f = fixture().await;
        let refunds = f
            .editor
            .directory
            .inner
            .create_permission(NewPermission {
                name: "Issue Refunds".to_string(),
                module: Some("billing".to_string()),
                description: None,
            })
            .await
            .unwrap();
        f.editor.load().await.unwrap();

        let billing = ModuleName::from("Billing");
        f.editor.toggle_module(&billing);
        assert_eq!(f.editor.working_set(), &set(&[f.a, f.b, refunds.id]));
        assert!(f.editor.is_module_selected(&ModuleName::from("BILLING")));

        f.editor.toggle_permission(refunds.id);
        assert!(!f.editor.is_module_selected(&billing));
    }

    #[tokio::test]
    async fn empty_module_is_never_selected() {
        let f = fixture().await;
        assert!(!f.editor.is_module_selected(&ModuleName::from("Pharmacy")));
    }

    #[tokio::test]
    async fn save_persists_and_reloads() {
        let mut f = fixture().await;
        f.editor.toggle_permission(f.a);
        f.editor.toggle_permission(f.c);

        f.editor.save().await.unwrap();

        assert_eq!(f.editor.state(), &EditorState::Idle);
        assert_eq!(f.editor.selected_role().map(|r| r.id), Some(f.cashier));
        assert_eq!(f.editor.selected_role().unwrap().permission_ids(), set(&[f.a, f.c]));
        assert!(!f.editor.is_dirty());
        assert!(f.editor.last_error().is_none());
    }

    #[tokio::test]
    async fn failed_save_keeps_the_working_set() {
        let mut f = fixture().await;
        f.editor.toggle_permission(f.a);
        f.editor.toggle_permission(f.c);
        f.editor.directory.fail_assign.store(true, Ordering::SeqCst);

        let err = f.editor.save().await.unwrap_err();

        assert!(matches!(err, EditorError::Directory(DirectoryError::Unavailable(_))));
        assert_eq!(f.editor.state(), &EditorState::Idle);
        assert_eq!(f.editor.working_set(), &set(&[f.a, f.c]));
        assert!(f.editor.selected_role().unwrap().permissions.is_empty());
        assert!(f.editor.last_error().is_some());

        // Retry once the registry recovers.
        f.editor.directory.fail_assign.store(false, Ordering::SeqCst);
        f.editor.save().await.unwrap();
        assert!(f.editor.last_error().is_none());
        assert_eq!(f.editor.selected_role().unwrap().permission_ids(), set(&[f.a, f.c]));
    }

    #[tokio::test]
    async fn switching_roles_discards_unsaved_toggles() {
        let mut f = fixture().await;
        f.editor.toggle_permission(f.b);

        f.editor.select_role(f.nurse).unwrap();
        assert!(f.editor.working_set().is_empty());

        f.editor.select_role(f.cashier).unwrap();
        assert!(f.editor.working_set().is_empty());
        assert!(matches!(
            f.editor.select_role(RoleId::new()),
            Err(EditorError::UnknownRole(_))
        ));
    }

    #[tokio::test]
    async fn second_save_while_saving_is_rejected() {
        let mut f = fixture().await;
        f.editor.toggle_permission(f.a);

        let ticket = f.editor.begin_save().unwrap();
        assert_eq!(ticket.permission_ids, set(&[f.a]));
        assert_eq!(f.editor.begin_save(), Err(EditorError::SaveInFlight));

        // Toggles are frozen while the save is in flight.
        f.editor.toggle_permission(f.b);
        assert_eq!(f.editor.working_set(), &set(&[f.a]));

        let result = f
            .editor
            .directory
            .assign_permissions(ticket.role_id, ticket.permission_ids.clone())
            .await;
        f.editor.finish_save(ticket, result).unwrap();
        assert_eq!(f.editor.state(), &EditorState::Idle);
        assert!(!f.editor.is_dirty());
    }

    #[tokio::test]
    async fn late_results_after_cancel_are_discarded() {
        let mut f = fixture().await;
        f.editor.toggle_permission(f.a);
        let ticket = f.editor.begin_save().unwrap();

        f.editor.cancel_pending();
        f.editor.select_role(f.nurse).unwrap();

        let stale = f.editor.selected_role().cloned();
        f.editor
            .finish_save(ticket, Err(DirectoryError::Unavailable("late".into())))
            .unwrap();
        assert!(f.editor.last_error().is_none());
        assert_eq!(f.editor.selected_role().cloned(), stale);

        let load = f.editor.begin_load();
        let newer = f.editor.begin_load();
        f.editor
            .finish_load(load, Err(DirectoryError::Unavailable("late".into())))
            .unwrap();
        assert_eq!(f.editor.state(), &EditorState::Loading);

        let fresh = RolePermissionEditor::fetch(&f.editor.directory).await;
        f.editor.finish_load(newer, fresh).unwrap();
        assert_eq!(f.editor.selected_role().map(|r| r.id), Some(f.nurse));
    }

    #[tokio::test]
    async fn load_failure_is_reported_in_state() {
        let mut f = fixture().await;
        let ticket = f.editor.begin_load();
        let err = f
            .editor
            .finish_load(ticket, Err(DirectoryError::Unavailable("down".into())))
            .unwrap_err();

        assert_eq!(f.editor.state(), &EditorState::LoadFailed(err));
        assert_eq!(f.editor.begin_save(), Err(EditorError::NotReady));
        f.editor.load().await.unwrap();
        assert_eq!(f.editor.state(), &EditorState::Idle);
    }
}
