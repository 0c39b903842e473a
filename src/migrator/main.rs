use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

/// Apply or revert the user directory schema
#[derive(Parser)]
#[command(name = "migrator")]
#[command(about = "Apply or revert the user directory schema")]
struct Cli {
    /// Database URL (falls back to DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply all pending migrations
    Up,
    /// Revert every applied migration
    Down,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let database_url = match cli.database_url {
        Some(url) => url,
        None => std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?,
    };

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    let migrator = sqlx::migrate!("./migrations");

    match cli.command {
        Command::Up => {
            tracing::info!("Applying migrations");
            migrator
                .run(&pool)
                .await
                .context("Failed to apply migrations")?;
        }
        Command::Down => {
            tracing::info!("Reverting migrations");
            migrator
                .undo(&pool, 0)
                .await
                .context("Failed to revert migrations")?;
        }
    }

    pool.close().await;
    tracing::info!("Migrations done");

    Ok(())
}
