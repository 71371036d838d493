//! The closed set of permission slugs the application declares routes against.
//!
//! Route declarations reference [`KnownSlug`] variants instead of free-form
//! strings, so a typo is a compile error and a slug missing from the catalog
//! is caught by configuration validation instead of silently denying access.

use core::str::FromStr;

use medgate_core::DomainError;

use crate::permissions::{ModuleName, PermissionSlug};

macro_rules! known_slugs {
    ($( $variant:ident => ($slug:literal, $module:literal, $name:literal) ),+ $(,)?) => {
        /// Permission slugs known to the application.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum KnownSlug {
            $( $variant ),+
        }

        impl KnownSlug {
            /// Every known slug, in declaration order.
            pub const ALL: &'static [KnownSlug] = &[$( KnownSlug::$variant ),+];

            pub const fn as_str(self) -> &'static str {
                match self {
                    $( KnownSlug::$variant => $slug ),+
                }
            }

            /// Module the permission is grouped under in the catalog.
            pub const fn module_label(self) -> &'static str {
                match self {
                    $( KnownSlug::$variant => $module ),+
                }
            }

            /// Display name; deriving a slug from it yields [`KnownSlug::as_str`].
            pub const fn display_name(self) -> &'static str {
                match self {
                    $( KnownSlug::$variant => $name ),+
                }
            }
        }
    };
}

known_slugs! {
    ViewPatients => ("view-patients", "Patients", "View Patients"),
    ManagePatients => ("manage-patients", "Patients", "Manage Patients"),
    ViewDoctors => ("view-doctors", "Doctors", "View Doctors"),
    ManageDoctors => ("manage-doctors", "Doctors", "Manage Doctors"),
    ViewAppointments => ("view-appointments", "Appointments", "View Appointments"),
    ManageAppointments => ("manage-appointments", "Appointments", "Manage Appointments"),
    ViewBilling => ("view-billing", "Billing", "View Billing"),
    ManageBilling => ("manage-billing", "Billing", "Manage Billing"),
    ViewPharmacy => ("view-pharmacy", "Pharmacy", "View Pharmacy"),
    ManagePharmacy => ("manage-pharmacy", "Pharmacy", "Manage Pharmacy"),
    ViewReports => ("view-reports", "Reports", "View Reports"),
    ViewRoles => ("view-roles", "Administration", "View Roles"),
    ManageRoles => ("manage-roles", "Administration", "Manage Roles"),
    ManagePermissions => ("manage-permissions", "Administration", "Manage Permissions"),
}

impl KnownSlug {
    pub fn slug(self) -> PermissionSlug {
        PermissionSlug::new(self.as_str())
    }

    pub fn module(self) -> ModuleName {
        ModuleName::new(Some(self.module_label()))
    }
}

impl From<KnownSlug> for PermissionSlug {
    fn from(value: KnownSlug) -> Self {
        value.slug()
    }
}

impl FromStr for KnownSlug {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KnownSlug::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown permission slug '{s}'")))
    }
}

impl core::fmt::Display for KnownSlug {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
