//! The signed-in identity and the shared context it lives in.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;

use medgate_core::{IdentityId, TenantId};

use crate::permissions::PermissionSlug;
use crate::roles::Role;

/// A fully resolved identity for authorization decisions.
///
/// The permission slugs are derived from the role once, at construction. An
/// identity is never mutated afterwards; a refresh builds a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    id: IdentityId,
    tenant_id: TenantId,
    role: Role,
    permission_slugs: BTreeSet<PermissionSlug>,
}

impl Identity {
    pub fn new(id: IdentityId, tenant_id: TenantId, role: Role) -> Self {
        let permission_slugs = role.permission_slugs();
        Self {
            id,
            tenant_id,
            role,
            permission_slugs,
        }
    }

    pub fn id(&self) -> IdentityId {
        self.id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn permission_slugs(&self) -> &BTreeSet<PermissionSlug> {
        &self.permission_slugs
    }

    pub fn has_permission(&self, slug: &str) -> bool {
        self.permission_slugs.contains(slug)
    }

    pub fn is_patient(&self) -> bool {
        self.role.is_patient()
    }
}

/// Authentication status as seen by every reader of the identity context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    /// Nobody is signed in.
    #[default]
    SignedOut,
    /// Sign-in or refresh in flight; permissions are not known yet.
    Resolving,
    SignedIn(Identity),
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::SignedIn(_))
    }

    pub fn is_resolving(&self) -> bool {
        matches!(self, AuthState::Resolving)
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            AuthState::SignedIn(identity) => Some(identity),
            _ => None,
        }
    }

    /// `false` whenever no identity is signed in.
    pub fn has_permission(&self, slug: &str) -> bool {
        self.identity().is_some_and(|i| i.has_permission(slug))
    }
}

type Shared = Arc<RwLock<Arc<AuthState>>>;

/// Create an identity context: exactly one writer, any number of readers.
pub fn identity_context() -> (IdentityWriter, IdentityReader) {
    let shared: Shared = Arc::new(RwLock::new(Arc::new(AuthState::SignedOut)));
    (
        IdentityWriter {
            shared: Arc::clone(&shared),
        },
        IdentityReader { shared },
    )
}

/// The single writer of the identity context (login / refresh / logout).
///
/// Not `Clone`: ownership of this handle is ownership of the write side.
/// Every write replaces the whole state; readers never observe a partial update.
#[derive(Debug)]
pub struct IdentityWriter {
    shared: Shared,
}

impl IdentityWriter {
    pub fn set_identity(&self, identity: Identity) {
        tracing::debug!(
            identity_id = %identity.id(),
            role = %identity.role().name,
            permissions = identity.permission_slugs().len(),
            "identity context replaced"
        );
        self.replace(AuthState::SignedIn(identity));
    }

    pub fn begin_resolution(&self) {
        self.replace(AuthState::Resolving);
    }

    pub fn sign_out(&self) {
        self.replace(AuthState::SignedOut);
    }

    pub fn reader(&self) -> IdentityReader {
        IdentityReader {
            shared: Arc::clone(&self.shared),
        }
    }

    fn replace(&self, state: AuthState) {
        let mut guard = self.shared.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(state);
    }
}

/// Read side of the identity context.
#[derive(Debug, Clone)]
pub struct IdentityReader {
    shared: Shared,
}

impl IdentityReader {
    /// The current state; stays valid (and unchanged) after later writes.
    pub fn snapshot(&self) -> Arc<AuthState> {
        match self.shared.read() {
            Ok(guard) => Arc::clone(&guard),
            // A poisoned lock means a writer panicked mid-update: fail closed.
            Err(_) => Arc::new(AuthState::SignedOut),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }

    pub fn has_permission(&self, slug: &str) -> bool {
        self.snapshot().has_permission(slug)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use medgate_core::{PermissionId, RoleId};

    use super::*;
    use crate::permissions::Permission;
    use crate::roles::PermissionSet;

    fn role_with(names: &[&str]) -> Role {
        let now = Utc::now();
        let permissions = names
            .iter()
            .map(|n| Permission::from_name(PermissionId::new(), n, None, None, now).unwrap());
        Role::new(RoleId::new(), "Receptionist", None, false, now)
            .unwrap()
            .with_permissions(PermissionSet::new(permissions), now)
    }

    #[test]
    fn identity_flattens_role_permissions_to_slugs() {
        let identity = Identity::new(IdentityId::new(), TenantId::new(), role_with(&["View Appointments"]));
        assert!(identity.has_permission("view-appointments"));
        assert!(!identity.has_permission("manage-billing"));
    }

    #[test]
    fn readers_see_whole_replacements() {
        let (writer, reader) = identity_context();
        assert!(!reader.is_authenticated());

        writer.begin_resolution();
        assert!(reader.snapshot().is_resolving());
        assert!(!reader.has_permission("view-appointments"));

        let before = reader.snapshot();
        writer.set_identity(Identity::new(
            IdentityId::new(),
            TenantId::new(),
            role_with(&["View Appointments"]),
        ));
        assert!(reader.has_permission("view-appointments"));
        // Earlier snapshots are untouched by later writes.
        assert!(before.is_resolving());

        writer.sign_out();
        assert_eq!(*writer.reader().snapshot(), AuthState::SignedOut);
    }
}
