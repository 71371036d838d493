//! `medgate-auth` — permission model, roles and the identity context.
//!
//! This crate is intentionally decoupled from HTTP, storage and rendering: it
//! answers "what may this identity do?" and nothing else.

pub mod authorize;
pub mod catalog;
pub mod identity;
pub mod permissions;
pub mod roles;
pub mod slugs;

pub use authorize::{
    authorize, can_access, explain_access, has_permission_for, AccessExplanation, AuthzError,
    DenialKind,
};
pub use catalog::PermissionCatalog;
pub use identity::{identity_context, AuthState, Identity, IdentityReader, IdentityWriter};
pub use permissions::{ModuleName, Permission, PermissionSlug};
pub use roles::{PermissionSet, Role, PATIENT_ROLE};
pub use slugs::KnownSlug;
