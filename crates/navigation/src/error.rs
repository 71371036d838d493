use thiserror::Error;

/// Route table configuration errors.
///
/// These are raised while loading or validating a table, never while
/// filtering: at render time an unknown slug is simply never satisfied.
#[derive(Debug, Error)]
pub enum NavigationError {
    #[error("page '{path}' requires unknown permission '{slug}'")]
    UnknownPermission { path: String, slug: String },

    #[error("path '{path}' is declared twice in the same section")]
    DuplicatePath { path: String },

    #[error("page '{name}' has an empty path")]
    EmptyPath { name: String },

    #[error("invalid route table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("cannot read route table: {0}")]
    Io(#[from] std::io::Error),
}
