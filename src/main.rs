use anyhow::Context;
use sigap_health::api::{create_routes, AppState};
use sigap_health::auth::JwtService;
use sigap_health::config::app::DEFAULT_JWT_SECRET;
use sigap_health::config::{run_migrations, AppConfig, DatabaseConfig, OracleConfig, StorageBackend};
use sigap_health::oracle;
use sigap_health::repository::Repositories;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("Invalid log level")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if config.is_production() && config.jwt_secret == DEFAULT_JWT_SECRET {
        warn!("JWT_SECRET is not set; tokens are signed with the default secret");
    }

    let repos = match config.storage {
        StorageBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            info!("Connecting to {}", db_config.redacted_url());
            let pool = db_config.create_pool().await?;
            run_migrations(&pool).await?;
            Repositories::postgres(pool)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on restart");
            Repositories::in_memory()
        }
    };

    let oracle = oracle::from_config(&OracleConfig::from_env()?)?;
    let state = AppState::new(repos, oracle, JwtService::new(&config.jwt_secret));
    let app = create_routes(state);

    let address = config.server_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("SIGAP health server starting on http://{} ({})", address, config.environment);
    info!("Health check available at http://{}/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}
