//! Console configuration from the environment.

use std::path::PathBuf;

use medgate_core::{IdentityId, TenantId};
use medgate_infra::HttpDirectory;
use medgate_navigation::{NavigationError, RouteTable, application_table};

pub const DEFAULT_LANDING_PATH: &str = "/home";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Where identities land when no declared page is permitted.
    pub default_landing_path: String,
    /// Registry service the console's directory client talks to.
    pub api_base_url: String,
    /// JSON route table; the built-in declarations when unset.
    pub route_table_path: Option<PathBuf>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            default_landing_path: DEFAULT_LANDING_PATH.to_string(),
            api_base_url: DEFAULT_API_URL.to_string(),
            route_table_path: None,
        }
    }
}

impl ConsoleConfig {
    /// `MEDGATE_DEFAULT_LANDING`, `MEDGATE_API_URL`, `MEDGATE_ROUTE_TABLE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Self {
            default_landing_path: non_empty("MEDGATE_DEFAULT_LANDING").unwrap_or(defaults.default_landing_path),
            api_base_url: non_empty("MEDGATE_API_URL").unwrap_or(defaults.api_base_url),
            route_table_path: non_empty("MEDGATE_ROUTE_TABLE").map(PathBuf::from),
        }
    }

    /// Load the route table and check every required slug is a known one.
    pub fn route_table(&self) -> Result<RouteTable, NavigationError> {
        let table = match &self.route_table_path {
            Some(path) => RouteTable::load(path)?,
            None => application_table(),
        };
        table.validate_known()?;
        Ok(table)
    }

    /// Registry client acting as `identity` within `tenant_id`.
    pub fn directory(&self, tenant_id: TenantId, identity: IdentityId) -> HttpDirectory {
        HttpDirectory::new(self.api_base_url.as_str(), tenant_id, identity)
    }
}
