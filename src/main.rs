// main.rs
use poem::listener::TcpListener;
use sea_orm::Database;
use tracing_subscriber::EnvFilter;
use yatube::migration::{Migrator, MigratorTrait};
use yatube::{AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let db = Database::connect(config.database_url.as_str()).await?;
    Migrator::up(&db, None).await?;

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(db, config)?;

    tracing::info!(%bind_addr, "yatube listening");
    poem::Server::new(TcpListener::bind(bind_addr))
        .run(yatube::app(state))
        .await?;
    Ok(())
}
