//! Catalog loader: pull every page of the registry into memory.

use medgate_auth::{PermissionCatalog, Role};

use crate::directory::{DirectoryError, PermissionQuery, PermissionsApi, RoleQuery, RolesApi, MAX_PER_PAGE};

/// Load the tenant's whole permission catalog.
pub async fn load_catalog<P>(api: &P) -> Result<PermissionCatalog, DirectoryError>
where
    P: PermissionsApi + ?Sized,
{
    let mut permissions = Vec::new();
    let mut page = 1;
    loop {
        let query = PermissionQuery {
            page: Some(page),
            per_page: Some(MAX_PER_PAGE),
            ..Default::default()
        };
        let batch = api.list_permissions(&query).await?;
        let more = batch.has_next() && !batch.items.is_empty();
        permissions.extend(batch.items);
        if !more {
            break;
        }
        page += 1;
    }

    tracing::debug!(permissions = permissions.len(), "permission catalog loaded");
    Ok(PermissionCatalog::new(permissions))
}

/// Load every role of the tenant, in registry order.
pub async fn load_roles<R>(api: &R) -> Result<Vec<Role>, DirectoryError>
where
    R: RolesApi + ?Sized,
{
    let mut roles = Vec::new();
    let mut page = 1;
    loop {
        let query = RoleQuery {
            page: Some(page),
            per_page: Some(MAX_PER_PAGE),
            ..Default::default()
        };
        let batch = api.list_roles(&query).await?;
        let more = batch.has_next() && !batch.items.is_empty();
        roles.extend(batch.items);
        if !more {
            break;
        }
        page += 1;
    }
    Ok(roles)
}
