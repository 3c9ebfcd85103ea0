use anyhow::Result;
use bookvault::backup::BackupService;
use bookvault::db::SqliteCatalog;
use bookvault::store::ArtifactStore;
use bookvault::{config, db};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| format!("sqlite://{}/bookvault.db", cfg.app.data_dir));

    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    let catalog = Arc::new(SqliteCatalog::new(pool));
    let store = ArtifactStore::open(&cfg.backup.dir)?;
    let service = BackupService::new(catalog.clone(), store);
    service.schedule_recurring(cfg.backup.period());

    info!("bookvault ready; type 'help' for commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("backup"), _) => match service.perform_backup().wait().await {
                Ok(artifact) => println!("backup written: {artifact}"),
                Err(err) => error!(?err, "backup failed"),
            },
            (Some("restore"), Some(name)) => match service.restore(name).wait().await {
                Ok(count) => println!("restored {count} records"),
                Err(err) => error!(?err, "restore failed"),
            },
            (Some("list"), _) => match service.list_artifacts().await {
                Ok(names) => {
                    println!("{} artifact(s)", names.len());
                    for name in names {
                        println!("  {name}");
                    }
                }
                Err(err) => error!(?err, "failed to list artifacts"),
            },
            (Some("delete"), Some(name)) => match service.delete_artifact(name).await {
                Ok(()) => println!("deleted {name}"),
                Err(err) => error!(?err, "failed to delete artifact"),
            },
            (Some("books"), _) => match catalog.find_all().await {
                Ok(books) => {
                    println!("{} record(s)", books.len());
                    for book in books {
                        println!(
                            "  [{}] {} by {} ({}, stock {})",
                            book.isbn,
                            book.title,
                            book.author,
                            book.details.category(),
                            book.stock
                        );
                    }
                }
                Err(err) => error!(?err, "failed to list records"),
            },
            (Some("restore"), None) | (Some("delete"), None) => {
                println!("usage: restore|delete <artifact>");
            }
            (Some("quit"), _) | (Some("exit"), _) => break,
            (Some("help"), _) | (None, _) => {
                println!("commands: backup | restore <name> | list | delete <name> | books | quit");
            }
            (Some(other), _) => println!("unknown command: {other} (try 'help')"),
        }
    }

    info!("shutting down");
    service.shutdown(SHUTDOWN_TIMEOUT).await;
    Ok(())
}
