use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::db::DEFAULT_MAX_POOL_SIZE;
use crate::sla::{SlaPolicy, DEFAULT_SLA_WORKDAYS, DEFAULT_WARNING_DAYS, MAX_SLA_WORKDAYS};

pub const DEFAULT_CHANGE_LOG_ACTOR: &str = "System/User";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_pool_size: u32,
    pub server_host: String,
    pub server_port: u16,
    pub backup_dir: PathBuf,
    pub sla: SlaPolicy,
    pub change_log_actor: String,
    pub cors_allowed_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let database_max_pool_size = env::var("DATABASE_MAX_POOL_SIZE")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_MAX_POOL_SIZE);
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("SERVER_PORT must be a valid u16")?;
        let backup_dir = env::var("BACKUP_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("backups"));
        let max_workdays = env::var("SLA_MAX_WORKDAYS")
            .ok()
            .map(|value| parse_workdays(&value, "SLA_MAX_WORKDAYS", MAX_SLA_WORKDAYS))
            .transpose()?
            .unwrap_or(MAX_SLA_WORKDAYS);
        let default_workdays = env::var("SLA_DEFAULT_WORKDAYS")
            .ok()
            .map(|value| parse_workdays(&value, "SLA_DEFAULT_WORKDAYS", max_workdays))
            .transpose()?
            .unwrap_or(DEFAULT_SLA_WORKDAYS.min(max_workdays));
        let warning_days = env::var("SLA_WARNING_DAYS")
            .ok()
            .map(|value| {
                value
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .filter(|days| *days >= 0)
                    .context("SLA_WARNING_DAYS must be a non-negative integer")
            })
            .transpose()?
            .unwrap_or(DEFAULT_WARNING_DAYS);
        let change_log_actor = env::var("CHANGE_LOG_ACTOR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CHANGE_LOG_ACTOR.to_string());
        let cors_allowed_origin = env::var("CORS_ALLOWED_ORIGIN").ok();

        Ok(Self {
            database_url,
            database_max_pool_size,
            server_host,
            server_port,
            backup_dir,
            sla: SlaPolicy {
                default_workdays,
                warning_days,
                max_workdays,
            },
            change_log_actor,
            cors_allowed_origin,
        })
    }

    /// Configuration rooted in `dir`: database and backups both live there.
    pub fn for_directory(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            database_url: dir.join("tracker.db").to_string_lossy().into_owned(),
            database_max_pool_size: DEFAULT_MAX_POOL_SIZE,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            backup_dir: dir.join("backups"),
            sla: SlaPolicy::default(),
            change_log_actor: DEFAULT_CHANGE_LOG_ACTOR.to_string(),
            cors_allowed_origin: None,
        }
    }

    /// Filesystem path of the SQLite database, without any `sqlite://` prefix.
    pub fn database_path(&self) -> PathBuf {
        database_path_from_url(&self.database_url)
    }
}

/// Business-day counts are bounded so target computation stays in range.
fn parse_workdays(raw: &str, name: &str, max: i32) -> Result<i32> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|value| (1..=max).contains(value))
        .with_context(|| format!("{name} must be an integer between 1 and {max}"))
}

fn database_path_from_url(raw: &str) -> PathBuf {
    let trimmed = raw
        .strip_prefix("sqlite://")
        .or_else(|| raw.strip_prefix("sqlite:"))
        .or_else(|| raw.strip_prefix("file:"))
        .unwrap_or(raw);
    let without_query = trimmed.split('?').next().unwrap_or(trimmed);
    PathBuf::from(without_query)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_sqlite_prefixes() {
        assert_eq!(
            database_path_from_url("sqlite:///var/lib/tracker.db"),
            PathBuf::from("/var/lib/tracker.db")
        );
        assert_eq!(
            database_path_from_url("sqlite:data/dev.db"),
            PathBuf::from("data/dev.db")
        );
        assert_eq!(
            database_path_from_url("file:dev.db?mode=rwc"),
            PathBuf::from("dev.db")
        );
        assert_eq!(database_path_from_url("dev.db"), PathBuf::from("dev.db"));
    }

    #[test]
    fn workdays_must_be_positive_and_capped() {
        assert_eq!(parse_workdays(" 7 ", "X", MAX_SLA_WORKDAYS).unwrap(), 7);
        assert!(parse_workdays("0", "X", MAX_SLA_WORKDAYS).is_err());
        assert!(parse_workdays("five", "X", MAX_SLA_WORKDAYS).is_err());
        assert_eq!(parse_workdays("520", "X", MAX_SLA_WORKDAYS).unwrap(), 520);
        assert!(parse_workdays("521", "X", MAX_SLA_WORKDAYS).is_err());
        assert!(parse_workdays("200000000", "X", MAX_SLA_WORKDAYS).is_err());
    }

    #[test]
    fn directory_config_keeps_everything_together() {
        let config = AppConfig::for_directory("/tmp/tracker");
        assert_eq!(config.database_path(), PathBuf::from("/tmp/tracker/tracker.db"));
        assert_eq!(config.backup_dir, PathBuf::from("/tmp/tracker/backups"));
        assert_eq!(config.sla, SlaPolicy::default());
    }
}
