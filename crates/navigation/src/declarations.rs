//! The application's own route declaration table.

use medgate_auth::KnownSlug;

use crate::routes::{RoutePage, RouteSection, RouteTable};

/// Route table of the hospital operator console.
pub fn application_table() -> RouteTable {
    RouteTable::new(vec![
        RouteSection::pre_auth(vec![
            RoutePage::new("/sign-in", "Sign in"),
            RoutePage::new("/sign-up", "Sign up"),
            RoutePage::new("/forgot-password", "Forgot password"),
        ]),
        RouteSection::app("Overview", vec![RoutePage::new("/dashboard", "Dashboard")]),
        RouteSection::app(
            "Patients",
            vec![
                RoutePage::new("/patients", "Patients").requires(KnownSlug::ViewPatients),
                RoutePage::new("/patients/new", "Register patient").requires(KnownSlug::ManagePatients),
            ],
        ),
        RouteSection::app(
            "Doctors",
            vec![
                RoutePage::new("/doctors", "Doctors").requires(KnownSlug::ViewDoctors),
                RoutePage::new("/doctors/new", "Add doctor").requires(KnownSlug::ManageDoctors),
            ],
        ),
        RouteSection::app(
            "Appointments",
            vec![
                RoutePage::new("/appointments", "Appointments").requires(KnownSlug::ViewAppointments),
                RoutePage::new("/appointments/new", "Book appointment")
                    .requires(KnownSlug::ManageAppointments),
            ],
        ),
        RouteSection::app(
            "Billing",
            vec![
                RoutePage::new("/bills", "Bills").requires(KnownSlug::ViewBilling),
                RoutePage::new("/bills/new", "New bill").requires(KnownSlug::ManageBilling),
            ],
        ),
        RouteSection::app(
            "Pharmacy",
            vec![
                RoutePage::new("/pharmacy", "Medicines").requires(KnownSlug::ViewPharmacy),
                RoutePage::new("/pharmacy/stock", "Stock").requires(KnownSlug::ManagePharmacy),
            ],
        ),
        RouteSection::app(
            "Reports",
            vec![RoutePage::new("/reports", "Reports").requires(KnownSlug::ViewReports)],
        ),
        RouteSection::app(
            "Administration",
            vec![
                RoutePage::new("/roles", "Roles").requires(KnownSlug::ViewRoles),
                RoutePage::new("/roles/permissions", "Role permissions").requires(KnownSlug::ManageRoles),
                RoutePage::new("/permissions", "Permissions").requires(KnownSlug::ManagePermissions),
            ],
        ),
        RouteSection {
            title: None,
            layout: crate::routes::Layout::App,
            pages: vec![
                RoutePage::new("/profile", "Profile"),
                RoutePage::new("/notifications", "Notifications"),
            ],
        },
    ])
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use medgate_auth::{Permission, PermissionCatalog};
    use medgate_core::PermissionId;

    use super::*;
    use crate::filter_routes;
    use crate::fixtures::signed_in;
    use crate::resolve_landing_page;

    #[test]
    fn application_table_only_uses_known_slugs() {
        application_table().validate_known().unwrap();
    }

    #[test]
    fn application_table_validates_against_a_full_catalog() {
        let now = Utc::now();
        let catalog = PermissionCatalog::new(KnownSlug::ALL.iter().map(|k| {
            Permission::from_name(PermissionId::new(), k.display_name(), Some(k.module_label()), None, now)
                .unwrap()
        }));
        application_table().validate_against(&catalog).unwrap();

        let partial = PermissionCatalog::new(catalog.iter().filter(|p| p.slug.as_str() != "view-reports").cloned());
        assert!(application_table().validate_against(&partial).is_err());
    }

    #[test]
    fn doctor_menu_and_landing() {
        let table = application_table();
        let state = signed_in("Doctor", &["View Patients", "View Appointments"]);

        let titles: Vec<_> = filter_routes(&table, &state)
            .into_iter()
            .map(|s| s.title.unwrap_or_default())
            .collect();
        assert_eq!(titles, vec!["Overview", "Patients", "Appointments", ""]);

        let granted = state.identity().unwrap().permission_slugs();
        assert_eq!(resolve_landing_page(&table, granted), Some("/dashboard"));
    }
}
