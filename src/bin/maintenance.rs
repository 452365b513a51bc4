use std::env;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use govtrack::{backup::BackupService, config::AppConfig, db, squads, submissions};

const USAGE: &str = "Usage: maintenance <backup|recompute-sla|seed-squads>";

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("backup") => backup()?,
        Some("recompute-sla") => recompute_sla()?,
        Some("seed-squads") => seed_squads()?,
        Some(cmd) => {
            eprintln!("Unknown command: {cmd}\n{USAGE}");
            std::process::exit(1);
        }
        None => {
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn load_config() -> Result<AppConfig> {
    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "maintenance",
        database_path = %config.database_path().display(),
        pool_size = config.database_max_pool_size,
        backup_dir = %config.backup_dir.display(),
        "loaded tracker configuration"
    );
    Ok(config)
}

fn backup() -> Result<()> {
    let config = load_config()?;
    let service = BackupService::from_config(&config);
    let path = service
        .create("manual")
        .context("failed to write database backup")?;
    println!("Backup written to {}", path.display());
    Ok(())
}

fn recompute_sla() -> Result<()> {
    let config = load_config()?;
    let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
    db::run_migrations(&pool)?;
    let mut conn = pool.get().context("failed to get database connection")?;

    let corrected = submissions::recompute_sla_targets(&mut conn)
        .context("failed to recompute SLA targets")?;
    println!("Recomputed SLA targets, {corrected} submission(s) corrected.");
    Ok(())
}

fn seed_squads() -> Result<()> {
    let config = load_config()?;
    let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
    db::run_migrations(&pool)?;
    let mut conn = pool.get().context("failed to get database connection")?;

    let added = squads::seed_squads(&mut conn, squads::DEFAULT_SQUADS)
        .context("failed to seed squads")?;
    println!("Seeded {added} squad(s).");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
