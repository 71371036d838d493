//! `medgate-core` — shared identifiers and the domain error model.
//!
//! Everything here is pure data: no IO, no async, no logging.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{IdentityId, PermissionId, RoleId, TenantId};
pub use value_object::ValueObject;
