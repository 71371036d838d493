//! Console session: the one place that writes the identity context.

use medgate_auth::{AuthState, Identity, IdentityReader, IdentityWriter, identity_context};
use medgate_core::{IdentityId, TenantId};
use medgate_infra::IdentityDirectory;
use medgate_navigation::{PageAccess, RouteSection, RouteTable, filter_routes, guard_page, resolve_landing_page};

use crate::error::SessionError;

/// Where the shell should go for a requested path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Render(String),
    Redirect(String),
}

pub struct Session<I> {
    directory: I,
    writer: IdentityWriter,
    table: RouteTable,
    tenant_id: TenantId,
    default_landing: String,
}

impl<I: IdentityDirectory> Session<I> {
    pub fn new(directory: I, table: RouteTable, tenant_id: TenantId, default_landing: impl Into<String>) -> Self {
        let (writer, _) = identity_context();
        Self {
            directory,
            writer,
            table,
            tenant_id,
            default_landing: default_landing.into(),
        }
    }

    /// Read handle for everything that renders.
    pub fn reader(&self) -> IdentityReader {
        self.writer.reader()
    }

    pub fn route_table(&self) -> &RouteTable {
        &self.table
    }

    /// Resolve the identity's role and publish it. Returns the landing path.
    ///
    /// While the role is being fetched the context reads as resolving, so
    /// the shell renders no console content. A failed lookup signs out.
    pub async fn login(&self, identity_id: IdentityId) -> Result<String, SessionError> {
        self.writer.begin_resolution();

        let role = match self.directory.role_of(identity_id).await {
            Ok(role) => role,
            Err(err) => {
                tracing::warn!(identity_id = %identity_id, error = %err, "identity resolution failed");
                self.writer.sign_out();
                return Err(err.into());
            }
        };

        let identity = Identity::new(identity_id, self.tenant_id, role);
        let landing = self.landing_for(&identity);
        tracing::info!(identity_id = %identity_id, role = %identity.role().name, landing = %landing, "signed in");
        self.writer.set_identity(identity);
        Ok(landing)
    }

    /// Re-fetch the current identity's role after an administrator edited it.
    ///
    /// On failure the previous identity stays published.
    pub async fn refresh(&self) -> Result<(), SessionError> {
        let identity_id = self
            .reader()
            .snapshot()
            .identity()
            .map(Identity::id)
            .ok_or(SessionError::NotSignedIn)?;

        let role = self.directory.role_of(identity_id).await?;
        self.writer.set_identity(Identity::new(identity_id, self.tenant_id, role));
        Ok(())
    }

    pub fn logout(&self) {
        if let Some(identity) = self.reader().snapshot().identity() {
            tracing::info!(identity_id = %identity.id(), "signed out");
        }
        self.writer.sign_out();
    }

    /// The sections the current identity may see.
    pub fn menu(&self) -> Vec<RouteSection> {
        filter_routes(&self.table, &self.reader().snapshot())
    }

    /// Page-level check for a routed render.
    pub fn guard(&self, path: &str) -> PageAccess<'_> {
        guard_page(&self.table, path, &self.reader().snapshot())
    }

    /// Layout-level redirects: signed-in identities never see the
    /// pre-auth pages, signed-out visitors never see console pages.
    pub fn navigate(&self, path: &str) -> Navigation {
        let state = self.reader().snapshot();
        let pre_auth = self.table.is_pre_auth_path(path);

        match state.as_ref() {
            AuthState::SignedIn(identity) if pre_auth => Navigation::Redirect(self.landing_for(identity)),
            AuthState::SignedOut if !pre_auth && self.table.find_page(path).is_some() => {
                let sign_in = self.table.sign_in_path().unwrap_or(path);
                Navigation::Redirect(sign_in.to_string())
            }
            _ => Navigation::Render(path.to_string()),
        }
    }

    /// Patients never land on a console page, whatever their role grants.
    fn landing_for(&self, identity: &Identity) -> String {
        let landing = if identity.is_patient() {
            None
        } else {
            resolve_landing_page(&self.table, identity.permission_slugs())
        };
        landing.unwrap_or(self.default_landing.as_str()).to_string()
    }
}
