use std::path::PathBuf;

use clap::Parser;
use lifelog_api::{db, migrate};

/// Copy the legacy food diary into the lifelog database.
#[derive(Debug, Parser)]
#[command(name = "migrate-legacy", version)]
struct Args {
    /// Legacy SQLite file, opened read-only.
    #[arg(long, default_value = "LFDB.db")]
    legacy: PathBuf,

    /// Target database URL.
    #[arg(long, default_value = "sqlite:db.sqlite")]
    target: String,

    /// Owner of the imported rows.
    #[arg(long, default_value_t = 1)]
    user_id: i64,

    /// Run everything, then roll back.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lifelog_api=info,migrate_legacy=info".into()),
        )
        .init();

    let args = Args::parse();

    let legacy = migrate::open_legacy(&args.legacy).await?;
    tracing::info!(path = %args.legacy.display(), "Connected to legacy database");

    let target = db::create_pool(&args.target).await?;
    db::migrate(&target).await?;
    tracing::info!(url = %args.target, "Connected to target database");

    let names = migrate::legacy_meal_names(&legacy).await?;
    tracing::info!(count = names.len(), "Collected legacy meal names");

    let report = migrate::import_meals(&target, args.user_id, &names, args.dry_run).await?;
    tracing::info!(
        user_id = args.user_id,
        activity_type_id = report.activity_type_id,
        created_type = report.created_type,
        inserted = report.inserted,
        skipped = report.skipped,
        dry_run = args.dry_run,
        "Legacy import finished"
    );

    legacy.close().await;
    target.close().await;
    Ok(())
}
