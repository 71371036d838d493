//! HTTP client for the registry service.
//!
//! Implements the directory contracts against `medgate-api`. Requests carry
//! the tenant and the acting identity as headers; authenticating those is the
//! gateway's business.

use std::collections::BTreeSet;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use medgate_auth::{Permission, Role};
use medgate_core::{IdentityId, PermissionId, RoleId, TenantId};

use crate::directory::{
    AssignPermissions, AssignRole, DirectoryError, IdentityDirectory, NewPermission, NewRole, Page,
    PermissionQuery, PermissionUpdate, PermissionsApi, RoleQuery, RoleUpdate, RolesApi,
};

pub const TENANT_HEADER: &str = "x-tenant-id";
pub const IDENTITY_HEADER: &str = "x-identity-id";

/// Error body returned by the registry service.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Tenant-scoped registry client.
#[derive(Debug, Clone)]
pub struct HttpDirectory {
    client: reqwest::Client,
    base_url: String,
    tenant_id: TenantId,
    acting_identity: IdentityId,
}

impl HttpDirectory {
    pub fn new(base_url: impl Into<String>, tenant_id: TenantId, acting_identity: IdentityId) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, tenant_id, acting_identity)
    }

    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        tenant_id: TenantId,
        acting_identity: IdentityId,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            tenant_id,
            acting_identity,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .header(TENANT_HEADER, self.tenant_id.to_string())
            .header(IDENTITY_HEADER, self.acting_identity.to_string())
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, DirectoryError> {
        let response = self.execute(request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| DirectoryError::Unavailable(format!("invalid response body: {e}")))
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), DirectoryError> {
        self.execute(request).await.map(|_| ())
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, DirectoryError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "registry request failed");
            DirectoryError::Unavailable(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .map(|b| b.message)
            .unwrap_or_else(|_| status.to_string());
        Err(error_for_status(status, message))
    }
}

fn error_for_status(status: StatusCode, message: String) -> DirectoryError {
    match status {
        StatusCode::NOT_FOUND => DirectoryError::NotFound(message),
        StatusCode::CONFLICT => DirectoryError::Conflict(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => DirectoryError::Validation(message),
        StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => DirectoryError::Forbidden(message),
        _ => DirectoryError::Unavailable(format!("{status}: {message}")),
    }
}

#[async_trait]
impl PermissionsApi for HttpDirectory {
    async fn list_permissions(&self, query: &PermissionQuery) -> Result<Page<Permission>, DirectoryError> {
        self.send(self.request(Method::GET, "/permissions").query(query)).await
    }

    async fn create_permission(&self, new: NewPermission) -> Result<Permission, DirectoryError> {
        self.send(self.request(Method::POST, "/permissions").json(&new)).await
    }

    async fn update_permission(
        &self,
        id: PermissionId,
        update: PermissionUpdate,
    ) -> Result<Permission, DirectoryError> {
        self.send(self.request(Method::PATCH, &format!("/permissions/{id}")).json(&update))
            .await
    }

    async fn delete_permission(&self, id: PermissionId) -> Result<(), DirectoryError> {
        self.send_empty(self.request(Method::DELETE, &format!("/permissions/{id}")))
            .await
    }
}

#[async_trait]
impl RolesApi for HttpDirectory {
    async fn list_roles(&self, query: &RoleQuery) -> Result<Page<Role>, DirectoryError> {
        self.send(self.request(Method::GET, "/roles").query(query)).await
    }

    async fn get_role(&self, id: RoleId) -> Result<Role, DirectoryError> {
        self.send(self.request(Method::GET, &format!("/roles/{id}"))).await
    }

    async fn create_role(&self, new: NewRole) -> Result<Role, DirectoryError> {
        self.send(self.request(Method::POST, "/roles").json(&new)).await
    }

    async fn update_role(&self, id: RoleId, update: RoleUpdate) -> Result<Role, DirectoryError> {
        self.send(self.request(Method::PATCH, &format!("/roles/{id}")).json(&update))
            .await
    }

    async fn delete_role(&self, id: RoleId) -> Result<(), DirectoryError> {
        self.send_empty(self.request(Method::DELETE, &format!("/roles/{id}")))
            .await
    }

    async fn assign_permissions(
        &self,
        role_id: RoleId,
        permission_ids: BTreeSet<PermissionId>,
    ) -> Result<Role, DirectoryError> {
        let body = AssignPermissions { permission_ids };
        self.send(
            self.request(Method::PUT, &format!("/roles/{role_id}/permissions"))
                .json(&body),
        )
        .await
    }
}

#[async_trait]
impl IdentityDirectory for HttpDirectory {
    async fn role_of(&self, identity_id: IdentityId) -> Result<Role, DirectoryError> {
        self.send(self.request(Method::GET, &format!("/identities/{identity_id}/role")))
            .await
    }

    async fn assign_role(&self, identity_id: IdentityId, role_id: RoleId) -> Result<(), DirectoryError> {
        let body = AssignRole { role_id };
        self.send_empty(
            self.request(Method::PUT, &format!("/identities/{identity_id}/role"))
                .json(&body),
        )
        .await
    }
}
