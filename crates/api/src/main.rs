use std::sync::Arc;

use anyhow::Context;

use medgate_api::app::{build_app, AppServices};
use medgate_api::config::ApiConfig;
use medgate_infra::{load_roles, seed_defaults, IdentityDirectory, InMemoryRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    medgate_observability::init();

    let config = ApiConfig::from_env()?;
    let routes = config.route_table()?;
    let registry = InMemoryRegistry::arc();

    if let Some(tenant_id) = config.seed_tenant {
        let directory = registry.tenant(tenant_id);
        seed_defaults(&directory).await.context("failed to seed tenant")?;

        if let Some(admin) = config.seed_admin {
            let roles = load_roles(&directory).await?;
            let role = roles
                .iter()
                .find(|r| r.has_name("Administrator"))
                .map(|r| r.id)
                .context("seeded tenant has no Administrator role")?;
            directory.assign_role(admin, role).await?;
        }
    } else {
        tracing::warn!("MEDGATE_SEED_TENANT not set; every tenant starts empty");
    }

    let app = build_app(Arc::new(AppServices::new(registry, routes)));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
