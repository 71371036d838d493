//! Route filter: the visible subset of the route table for an identity.

use std::collections::BTreeSet;

use medgate_auth::{AuthState, PermissionSlug, has_permission_for};

use crate::routes::{RoutePage, RouteSection, RouteTable};

/// Deny-by-default page check: no requirement, or the slug is granted.
pub fn has_page_permission(page: &RoutePage, granted: &BTreeSet<PermissionSlug>) -> bool {
    has_permission_for(page.required_permission.as_ref(), granted)
}

/// Compute the navigation tree an identity may see.
///
/// - Nothing while signed out or while permissions are resolving.
/// - Nothing for the patient role, whatever its grants.
/// - Pre-authentication sections are dropped.
/// - Pages without the required permission are dropped, then empty sections.
/// - Relative order of sections and pages is preserved.
///
/// Pure: same inputs, same output.
pub fn filter_routes(table: &RouteTable, state: &AuthState) -> Vec<RouteSection> {
    let Some(identity) = state.identity() else {
        return Vec::new();
    };

    if identity.is_patient() {
        tracing::debug!(identity_id = %identity.id(), "patient role: console hidden");
        return Vec::new();
    }

    let granted = identity.permission_slugs();
    table
        .sections()
        .iter()
        .filter(|section| !section.is_pre_auth())
        .filter_map(|section| {
            let pages: Vec<RoutePage> = section
                .pages
                .iter()
                .filter(|page| has_page_permission(page, granted))
                .cloned()
                .collect();

            (!pages.is_empty()).then(|| RouteSection {
                title: section.title.clone(),
                layout: section.layout,
                pages,
            })
        })
        .collect()
}
