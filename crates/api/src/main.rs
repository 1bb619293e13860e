use anyhow::Context;

use grantgate_infra::GrantGateConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    grantgate_observability::init();

    let config = GrantGateConfig::from_env()?;
    let app = grantgate_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
