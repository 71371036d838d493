//! Landing page resolution after authentication.

use std::collections::BTreeSet;

use medgate_auth::PermissionSlug;

use crate::filter::has_page_permission;
use crate::routes::RouteTable;

/// First page (in declaration order) of an app section the permission set
/// may open.
///
/// An empty permission set resolves to `None` without walking the table; the
/// caller then falls back to its configured default path. Requirement-free
/// pages qualify for any non-empty set.
pub fn resolve_landing_page<'a>(table: &'a RouteTable, granted: &BTreeSet<PermissionSlug>) -> Option<&'a str> {
    if granted.is_empty() {
        return None;
    }

    let landing = table
        .sections()
        .iter()
        .filter(|section| !section.is_pre_auth())
        .flat_map(|section| section.pages.iter())
        .find(|page| has_page_permission(page, granted))
        .map(|page| page.path.as_str());

    tracing::debug!(landing = ?landing, permissions = granted.len(), "landing page resolved");
    landing
}
