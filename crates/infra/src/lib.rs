//! Infrastructure layer: registry storage and clients.

pub mod catalog;
pub mod directory;
pub mod http;
pub mod seed;

pub use catalog::{load_catalog, load_roles};
pub use directory::{
    DirectoryError, IdentityDirectory, InMemoryRegistry, Page, PermissionQuery, PermissionsApi, RoleQuery,
    RolesApi, TenantDirectory,
};
pub use http::HttpDirectory;
pub use seed::{seed_defaults, SeedReport};
