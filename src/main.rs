//! repograph server entry point.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repograph::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "repograph=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        database = %config.database_url,
        complexity_limit = config.complexity_limit,
        "Starting repograph"
    );

    repograph::server::serve(config).await
}
