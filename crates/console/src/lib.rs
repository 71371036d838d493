//! `medgate-console` — operator console workflows.
//!
//! [`Session`] owns the identity context's write side (login, refresh,
//! logout) and answers menu/guard/redirect questions for the shell.
//! [`RolePermissionEditor`] is the role ↔ permission assignment screen.

pub mod config;
pub mod editor;
pub mod error;
pub mod session;

pub use config::ConsoleConfig;
pub use editor::{EditorState, LoadTicket, RolePermissionEditor, SaveTicket};
pub use error::{EditorError, SessionError};
pub use session::{Navigation, Session};
