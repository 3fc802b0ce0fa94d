use std::sync::Arc;

use migration::{Migrator, MigratorTrait};

use engine::{PaymentGateway, SandboxGateway};
use settings::Database;

mod mpesa;
mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "afrionex={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.server.database).await?;

    let gateway: Arc<dyn PaymentGateway> = match settings.mpesa {
        Some(config) => {
            tracing::info!("Found mpesa settings...");
            Arc::new(mpesa::MpesaHttpGateway::new(config))
        }
        None => {
            tracing::info!("No mpesa settings, using the sandbox gateway");
            Arc::new(SandboxGateway)
        }
    };

    let engine = engine::Engine::builder()
        .database(db.clone())
        .gateway(gateway)
        .build()
        .await?;

    let bind = settings
        .server
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    server::run_with_listener(engine, db, listener).await?;
    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
