//! Default catalog and roles for a fresh tenant.

use std::collections::BTreeSet;

use medgate_auth::KnownSlug;

use crate::catalog::{load_catalog, load_roles};
use crate::directory::{DirectoryError, NewPermission, NewRole, PermissionsApi, RolesApi, TenantDirectory};

struct DefaultRole {
    name: &'static str,
    description: &'static str,
    is_system: bool,
    grants: &'static [KnownSlug],
}

const DEFAULT_ROLES: &[DefaultRole] = &[
    DefaultRole {
        name: "Administrator",
        description: "Full access to the operator console",
        is_system: true,
        grants: KnownSlug::ALL,
    },
    DefaultRole {
        name: "Receptionist",
        description: "Front desk: patients, appointments and bill lookup",
        is_system: false,
        grants: &[
            KnownSlug::ViewPatients,
            KnownSlug::ManagePatients,
            KnownSlug::ViewAppointments,
            KnownSlug::ManageAppointments,
            KnownSlug::ViewBilling,
        ],
    },
    DefaultRole {
        name: "Doctor",
        description: "Clinical staff",
        is_system: false,
        grants: &[
            KnownSlug::ViewPatients,
            KnownSlug::ViewDoctors,
            KnownSlug::ViewAppointments,
            KnownSlug::ViewPharmacy,
        ],
    },
    DefaultRole {
        name: "Accountant",
        description: "Billing and financial reports",
        is_system: false,
        grants: &[KnownSlug::ViewBilling, KnownSlug::ManageBilling, KnownSlug::ViewReports],
    },
    DefaultRole {
        name: "Patient",
        description: "Patient portal accounts; never admitted to the console",
        is_system: true,
        grants: &[],
    },
];

/// What a seeding run created.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub permissions_created: usize,
    pub roles_created: usize,
}

/// Create the known permissions and default roles that are missing.
///
/// Idempotent. Roles that already exist keep their (possibly edited)
/// permission sets.
pub async fn seed_defaults(dir: &TenantDirectory) -> Result<SeedReport, DirectoryError> {
    let mut report = SeedReport::default();

    let catalog = load_catalog(dir).await?;
    for known in catalog.missing_known_slugs() {
        dir.create_permission(NewPermission {
            name: known.display_name().to_string(),
            module: Some(known.module_label().to_string()),
            description: None,
        })
        .await?;
        report.permissions_created += 1;
    }

    let catalog = load_catalog(dir).await?;
    let existing = load_roles(dir).await?;
    for default in DEFAULT_ROLES {
        if existing.iter().any(|r| r.has_name(default.name)) {
            continue;
        }

        let description = Some(default.description.to_string());
        let role = if default.is_system {
            dir.create_system_role(default.name, description)?
        } else {
            dir.create_role(NewRole {
                name: default.name.to_string(),
                description,
            })
            .await?
        };

        let ids: BTreeSet<_> = default
            .grants
            .iter()
            .filter_map(|k| catalog.by_slug(k.as_str()).map(|p| p.id))
            .collect();
        if !ids.is_empty() {
            dir.assign_permissions(role.id, ids).await?;
        }
        report.roles_created += 1;
    }

    tracing::info!(
        tenant_id = %dir.tenant_id(),
        permissions_created = report.permissions_created,
        roles_created = report.roles_created,
        "tenant seeded"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use medgate_core::TenantId;

    use super::*;
    use crate::directory::{InMemoryRegistry, RoleQuery};

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let dir = InMemoryRegistry::arc().tenant(TenantId::new());

        let first = seed_defaults(&dir).await.unwrap();
        assert_eq!(first.permissions_created, KnownSlug::ALL.len());
        assert_eq!(first.roles_created, DEFAULT_ROLES.len());

        let second = seed_defaults(&dir).await.unwrap();
        assert_eq!(second, SeedReport::default());

        let catalog = load_catalog(&dir).await.unwrap();
        assert!(catalog.missing_known_slugs().is_empty());
    }

    #[tokio::test]
    async fn administrator_holds_everything_and_patient_nothing() {
        let dir = InMemoryRegistry::arc().tenant(TenantId::new());
        seed_defaults(&dir).await.unwrap();

        let roles = dir.list_roles(&RoleQuery::default()).await.unwrap().items;
        let admin = roles.iter().find(|r| r.name == "Administrator").unwrap();
        assert!(admin.is_system);
        assert_eq!(admin.permissions.len(), KnownSlug::ALL.len());

        let patient = roles.iter().find(|r| r.is_patient()).unwrap();
        assert!(patient.is_system);
        assert!(patient.permissions.is_empty());
    }
}
