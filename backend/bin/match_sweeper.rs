use anyhow::Result;
use chrono::Utc;
use clap::{Arg, Command};
use kindred::constants::MATCH_CLEANUP_INTERVAL_MINUTES;
use kindred::db::{DatabaseConfig, get_db_pool, matches, migrations};
use kindred::utils::init_logging;
use std::time::Duration;
use tokio::time;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let args = Command::new("match-sweeper")
        .about("Expires pending match requests past their acceptance deadline")
        .arg(
            Arg::new("once")
                .long("once")
                .help("Run a single sweep and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("interval-mins")
                .long("interval-mins")
                .help("Minutes between sweeps")
                .value_parser(clap::value_parser!(u64)),
        )
        .get_matches();

    let db_config = DatabaseConfig::from_env()?;
    let pool = get_db_pool(&db_config).await?;
    migrations::run_migrations(&pool).await?;

    if args.get_flag("once") {
        let swept = matches::cleanup_expired(&pool, Utc::now()).await?;
        info!("Expired {} pending matches", swept);
        return Ok(());
    }

    let interval_mins = args
        .get_one::<u64>("interval-mins")
        .copied()
        .unwrap_or(MATCH_CLEANUP_INTERVAL_MINUTES);

    info!("🧹 Starting match sweeper (every {} minutes)...", interval_mins);

    let mut interval = time::interval(Duration::from_secs(interval_mins * 60));
    let mut iter_count: usize = 0;

    loop {
        interval.tick().await;
        iter_count += 1;

        match matches::cleanup_expired(&pool, Utc::now()).await {
            Ok(0) => info!("Sweep {}: nothing to expire", iter_count),
            Ok(swept) => info!("✅ Sweep {}: expired {} pending matches", iter_count, swept),
            Err(e) => error!("❌ Sweep {} failed: {}", iter_count, e),
        }
    }
}
