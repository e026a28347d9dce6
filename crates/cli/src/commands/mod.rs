//! Subcommand implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

use secrecy::SecretString;
use sqlx::PgPool;

/// Missing connection settings.
#[derive(Debug, thiserror::Error)]
#[error("Missing environment variable: DATABASE_URL")]
pub struct MissingDatabaseUrl;

/// Read `DATABASE_URL`, loading `.env` first.
fn database_url() -> Result<SecretString, MissingDatabaseUrl> {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| MissingDatabaseUrl)
}

/// Connect to the shared database.
async fn connect() -> Result<PgPool, Box<dyn std::error::Error>> {
    let url = database_url()?;
    tracing::info!("Connecting to database...");
    Ok(trattoria_admin::db::create_pool(&url).await?)
}
