use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use medgate_api::app::{build_app, AppServices};
use medgate_auth::KnownSlug;
use medgate_core::{IdentityId, TenantId};
use medgate_infra::http::{IDENTITY_HEADER, TENANT_HEADER};
use medgate_infra::{load_catalog, load_roles, seed_defaults, IdentityDirectory, InMemoryRegistry, TenantDirectory};
use medgate_navigation::application_table;

struct Fixture {
    app: Router,
    tenant: TenantId,
    directory: TenantDirectory,
    admin: IdentityId,
}

impl Fixture {
    async fn new() -> Self {
        let registry = InMemoryRegistry::arc();
        let tenant = TenantId::new();
        let directory = registry.tenant(tenant);
        seed_defaults(&directory).await.unwrap();

        let app = build_app(Arc::new(AppServices::new(registry, application_table())));
        let mut fixture = Self {
            app,
            tenant,
            directory,
            admin: IdentityId::new(),
        };
        fixture.admin = fixture.holder_of("Administrator").await;
        fixture
    }

    async fn holder_of(&self, role_name: &str) -> IdentityId {
        let role = load_roles(&self.directory)
            .await
            .unwrap()
            .into_iter()
            .find(|r| r.has_name(role_name))
            .unwrap();
        let identity = IdentityId::new();
        self.directory.assign_role(identity, role.id).await.unwrap();
        identity
    }

    async fn call(&self, method: Method, uri: &str, caller: IdentityId, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(TENANT_HEADER, self.tenant.to_string())
            .header(IDENTITY_HEADER, caller.to_string());
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        send(&self.app, request).await
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn health_needs_no_context() {
    let f = Fixture::new().await;
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    assert_eq!(send(&f.app, request).await.0, StatusCode::OK);
}

#[tokio::test]
async fn missing_or_malformed_context_is_rejected() {
    let f = Fixture::new().await;

    let request = Request::builder().uri("/permissions").body(Body::empty()).unwrap();
    let (status, body) = send(&f.app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "missing_context");

    let request = Request::builder()
        .uri("/permissions")
        .header(TENANT_HEADER, "not-a-uuid")
        .header(IDENTITY_HEADER, f.admin.to_string())
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&f.app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn administrator_lists_the_seeded_catalog() {
    let f = Fixture::new().await;
    let (status, body) = f.call(Method::GET, "/permissions", f.admin, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], KnownSlug::ALL.len());
    assert_eq!(body["page"], 1);
    assert_eq!(body["items"].as_array().unwrap().len(), KnownSlug::ALL.len());

    let (_, billing) = f.call(Method::GET, "/permissions?module=billing", f.admin, None).await;
    assert_eq!(billing["total"], 2);
}

#[tokio::test]
async fn permission_lifecycle() {
    let f = Fixture::new().await;

    let (status, created) = f
        .call(
            Method::POST,
            "/permissions",
            f.admin,
            Some(json!({ "name": "Export Reports", "module": "Reports" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "export-reports");

    let (status, dup) = f
        .call(Method::POST, "/permissions", f.admin, Some(json!({ "name": "export reports" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(dup["error"], "conflict");

    let id = created["id"].as_str().unwrap();
    let (status, updated) = f
        .call(
            Method::PATCH,
            &format!("/permissions/{id}"),
            f.admin,
            Some(json!({ "description": "CSV export" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["slug"], "export-reports");

    let (status, _) = f.call(Method::DELETE, &format!("/permissions/{id}"), f.admin, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = f.call(Method::DELETE, "/permissions/oops", f.admin, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn mutations_require_manage_permissions() {
    let f = Fixture::new().await;
    let receptionist = f.holder_of("Receptionist").await;

    let (status, body) = f
        .call(Method::POST, "/permissions", receptionist, Some(json!({ "name": "Sneaky" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = f.call(Method::GET, "/roles", receptionist, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = f.call(Method::GET, "/roles", IdentityId::new(), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn system_roles_cannot_be_deleted() {
    let f = Fixture::new().await;
    let roles = load_roles(&f.directory).await.unwrap();
    let admin_role = roles.iter().find(|r| r.has_name("Administrator")).unwrap();

    let (status, body) = f
        .call(Method::DELETE, &format!("/roles/{}", admin_role.id), f.admin, None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn assigning_unknown_permission_leaves_role_untouched() {
    let f = Fixture::new().await;
    let (_, created) = f
        .call(Method::POST, "/roles", f.admin, Some(json!({ "name": "Nurse" })))
        .await;
    let role_id = created["id"].as_str().unwrap().to_string();

    let catalog = load_catalog(&f.directory).await.unwrap();
    let known = catalog.by_slug("view-patients").unwrap().id;

    let (status, _) = f
        .call(
            Method::PUT,
            &format!("/roles/{role_id}/permissions"),
            f.admin,
            Some(json!({ "permission_ids": [known, IdentityId::new()] })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, role) = f.call(Method::GET, &format!("/roles/{role_id}"), f.admin, None).await;
    assert_eq!(role["permissions"].as_array().unwrap().len(), 0);

    let (status, role) = f
        .call(
            Method::PUT,
            &format!("/roles/{role_id}/permissions"),
            f.admin,
            Some(json!({ "permission_ids": [known, known] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(role["permissions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn identities_read_their_own_role_only() {
    let f = Fixture::new().await;
    let receptionist = f.holder_of("Receptionist").await;

    let (status, role) = f
        .call(Method::GET, &format!("/identities/{receptionist}/role"), receptionist, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(role["name"], "Receptionist");

    let (status, _) = f
        .call(Method::GET, &format!("/identities/{}/role", f.admin), receptionist, None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let doctor_role = load_roles(&f.directory)
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.has_name("Doctor"))
        .unwrap();
    let (status, _) = f
        .call(
            Method::PUT,
            &format!("/identities/{receptionist}/role"),
            f.admin,
            Some(json!({ "role_id": doctor_role.id })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(f.directory.role_of(receptionist).await.unwrap().has_name("Doctor"));
}

#[tokio::test]
async fn navigation_is_filtered_for_the_caller() {
    let f = Fixture::new().await;
    let doctor = f.holder_of("Doctor").await;

    let (status, nav) = f.call(Method::GET, "/navigation", doctor, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(nav["landing"], "/dashboard");
    let titles: Vec<_> = nav["sections"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|s| s["title"].as_str())
        .collect();
    assert!(titles.contains(&"Patients"));
    assert!(!titles.contains(&"Billing"));

    let patient = f.holder_of("Patient").await;
    let (_, nav) = f.call(Method::GET, "/navigation", patient, None).await;
    assert_eq!(nav["sections"], json!([]));
    assert_eq!(nav["landing"], Value::Null);
}

#[tokio::test]
async fn guard_explains_denials() {
    let f = Fixture::new().await;
    let doctor = f.holder_of("Doctor").await;

    let (status, decision) = f.call(Method::GET, "/navigation/guard?path=/bills", doctor, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decision["granted"], false);
    assert_eq!(decision["explanation"]["denial"], "missing_permission");

    let (_, decision) = f.call(Method::GET, "/navigation/guard?path=/patients", doctor, None).await;
    assert_eq!(decision["granted"], true);

    let (status, _) = f.call(Method::GET, "/navigation/guard?path=/nowhere", doctor, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
