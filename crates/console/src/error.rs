use thiserror::Error;

use medgate_core::RoleId;
use medgate_infra::DirectoryError;

/// Role-permission editor failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditorError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("no role selected")]
    NoRoleSelected,

    #[error("unknown role {0}")]
    UnknownRole(RoleId),

    #[error("a save is already in flight")]
    SaveInFlight,

    /// Still loading, or the last load failed.
    #[error("editor is not ready")]
    NotReady,
}

/// Login / refresh failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("no identity is signed in")]
    NotSignedIn,
}
