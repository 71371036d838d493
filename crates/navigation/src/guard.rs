//! Per-page guard for routed content.
//!
//! The menu only lists what [`crate::filter_routes`] keeps, but any declared
//! path can be typed into the address bar. Every page render goes through
//! [`guard_page`] again.

use medgate_auth::{AccessExplanation, AuthState, DenialKind, explain_access};

use crate::routes::{RoutePage, RouteTable};

/// Outcome of guarding a page render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAccess<'a> {
    /// Render the page.
    Granted(&'a RoutePage),
    /// Render the "Access Denied" state in place of the page.
    Denied {
        page: &'a RoutePage,
        explanation: AccessExplanation,
    },
    /// Signed out on a console page: send to sign-in.
    SignInRequired,
    /// The path is not declared at all.
    NotFound,
}

impl PageAccess<'_> {
    pub fn is_granted(&self) -> bool {
        matches!(self, PageAccess::Granted(_))
    }
}

/// Re-check access for the page mounted at `path`.
///
/// Pre-authentication pages are always rendered; redirecting signed-in
/// identities away from them is the session's job.
pub fn guard_page<'a>(table: &'a RouteTable, path: &str, state: &AuthState) -> PageAccess<'a> {
    let Some((section, page)) = table.find_page(path) else {
        return PageAccess::NotFound;
    };

    if section.is_pre_auth() {
        return PageAccess::Granted(page);
    }

    let explanation = explain_access(page.required_permission.as_ref(), state);
    match explanation.denial {
        None => PageAccess::Granted(page),
        Some(DenialKind::NotAuthenticated) => PageAccess::SignInRequired,
        Some(kind) => {
            if kind != DenialKind::Resolving {
                tracing::warn!(path = %page.path, reason = %explanation.reason, "page access denied");
            }
            PageAccess::Denied { page, explanation }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{receptionist_table, signed_in};

    #[test]
    fn direct_navigation_to_hidden_page_is_denied() {
        let table = receptionist_table();
        let state = signed_in("Receptionist", &["View Appointments"]);

        match guard_page(&table, "/billing", &state) {
            PageAccess::Denied { page, explanation } => {
                assert_eq!(page.path, "/billing");
                assert_eq!(explanation.denial, Some(DenialKind::MissingPermission));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(guard_page(&table, "/appointments", &state).is_granted());
        assert!(guard_page(&table, "/home", &state).is_granted());
    }

    #[test]
    fn signed_out_console_access_requires_sign_in() {
        let table = receptionist_table();
        assert_eq!(guard_page(&table, "/home", &AuthState::SignedOut), PageAccess::SignInRequired);
        assert!(guard_page(&table, "/sign-in", &AuthState::SignedOut).is_granted());
    }

    #[test]
    fn resolving_state_renders_nothing() {
        let table = receptionist_table();
        assert!(matches!(
            guard_page(&table, "/home", &AuthState::Resolving),
            PageAccess::Denied { .. }
        ));
    }

    #[test]
    fn patients_are_denied_requirement_free_pages_too() {
        let table = receptionist_table();
        match guard_page(&table, "/home", &signed_in("patient", &["View Appointments"])) {
            PageAccess::Denied { explanation, .. } => {
                assert_eq!(explanation.denial, Some(DenialKind::PatientRole));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn undeclared_paths_are_not_found() {
        let table = receptionist_table();
        assert_eq!(
            guard_page(&table, "/nowhere", &signed_in("Receptionist", &[])),
            PageAccess::NotFound
        );
    }
}
