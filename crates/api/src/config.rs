//! Service configuration from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

use medgate_core::{IdentityId, TenantId};
use medgate_navigation::{RouteTable, application_table};

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind: SocketAddr,
    /// JSON route table served by `/navigation`; the built-in one when unset.
    pub route_table_path: Option<PathBuf>,
    /// Tenant to seed with the default catalog and roles at start-up.
    pub seed_tenant: Option<TenantId>,
    /// Identity that receives the Administrator role in the seeded tenant.
    pub seed_admin: Option<IdentityId>,
}

impl ApiConfig {
    /// `MEDGATE_BIND`, `MEDGATE_ROUTE_TABLE`, `MEDGATE_SEED_TENANT`, `MEDGATE_SEED_ADMIN`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bind = non_empty("MEDGATE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind
            .parse()
            .with_context(|| format!("MEDGATE_BIND is not a socket address: {bind}"))?;

        let seed_tenant = non_empty("MEDGATE_SEED_TENANT")
            .map(|v| v.parse::<TenantId>())
            .transpose()
            .context("MEDGATE_SEED_TENANT")?;
        let seed_admin = non_empty("MEDGATE_SEED_ADMIN")
            .map(|v| v.parse::<IdentityId>())
            .transpose()
            .context("MEDGATE_SEED_ADMIN")?;
        if seed_admin.is_some() && seed_tenant.is_none() {
            anyhow::bail!("MEDGATE_SEED_ADMIN requires MEDGATE_SEED_TENANT");
        }

        Ok(Self {
            bind,
            route_table_path: non_empty("MEDGATE_ROUTE_TABLE").map(PathBuf::from),
            seed_tenant,
            seed_admin,
        })
    }

    /// Load and validate the route table.
    pub fn route_table(&self) -> anyhow::Result<RouteTable> {
        let table = match &self.route_table_path {
            Some(path) => RouteTable::load(path)
                .with_context(|| format!("failed to load route table {}", path.display()))?,
            None => application_table(),
        };
        table.validate_known().context("route table references unknown permissions")?;
        Ok(table)
    }
}
