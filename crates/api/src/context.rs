use medgate_core::{IdentityId, TenantId};

/// Tenant context for a request.
///
/// This is immutable and must be present for all registry routes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TenantContext {
    tenant_id: TenantId,
}

impl TenantContext {
    pub fn new(tenant_id: TenantId) -> Self {
        Self { tenant_id }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }
}

/// The identity the gateway authenticated for this request.
///
/// Only the id travels with the request; its role and permissions are
/// looked up in the tenant's registry when a handler needs them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CallerContext {
    identity_id: IdentityId,
}

impl CallerContext {
    pub fn new(identity_id: IdentityId) -> Self {
        Self { identity_id }
    }

    pub fn identity_id(&self) -> IdentityId {
        self.identity_id
    }
}
