use std::time::Duration;

use migration::{Migrator, MigratorTrait};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "monedero={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let mut tasks = tokio::task::JoinSet::new();
    if let Some(config) = settings.server {
        tasks.spawn(async move {
            if let Err(err) = serve(config).await {
                tracing::error!("server task failed: {err}");
            }
        });
    }

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

/// Connects the database, applies pending migrations and serves the ledger
/// API until the listener dies.
async fn serve(config: settings::Server) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let db = sea_orm::Database::connect(config.database.url()).await?;
    Migrator::up(&db, None).await?;

    let mut builder = engine::Engine::builder().database(db.clone());
    if let Some(wait_ms) = config.lock_wait_ms {
        builder = builder.lock_wait(Duration::from_millis(wait_ms));
    }
    let engine = builder.build().await?;

    let addr = format!(
        "{}:{}",
        config.bind.as_deref().unwrap_or("127.0.0.1"),
        config.port
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    server::run_with_listener(engine, db, listener).await?;

    Ok(())
}
