//! Shared state behind every handler.

use std::sync::Arc;

use medgate_core::TenantId;
use medgate_infra::{InMemoryRegistry, TenantDirectory};
use medgate_navigation::RouteTable;

#[derive(Debug)]
pub struct AppServices {
    registry: Arc<InMemoryRegistry>,
    routes: RouteTable,
}

impl AppServices {
    pub fn new(registry: Arc<InMemoryRegistry>, routes: RouteTable) -> Self {
        Self { registry, routes }
    }

    /// Registry handle scoped to one tenant.
    pub fn directory(&self, tenant_id: TenantId) -> TenantDirectory {
        self.registry.tenant(tenant_id)
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }
}
