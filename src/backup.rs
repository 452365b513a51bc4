use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("database file {0} does not exist")]
    SourceMissing(PathBuf),

    #[error("failed to create backup directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to copy database to {path}: {source}")]
    Copy { path: PathBuf, source: io::Error },
}

/// Copies the SQLite database file into a backup directory.
#[derive(Debug, Clone)]
pub struct BackupService {
    database_path: PathBuf,
    backup_dir: PathBuf,
}

impl BackupService {
    pub fn new(database_path: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            backup_dir: backup_dir.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.database_path(), config.backup_dir.clone())
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Writes `<stem>-<label>-<timestamp>-<suffix>.db`. The random suffix keeps
    /// concurrent backups from overwriting each other.
    pub fn create(&self, label: &str) -> Result<PathBuf, BackupError> {
        if !self.database_path.is_file() {
            return Err(BackupError::SourceMissing(self.database_path.clone()));
        }

        fs::create_dir_all(&self.backup_dir).map_err(|source| BackupError::CreateDir {
            path: self.backup_dir.clone(),
            source,
        })?;

        let target = self.backup_dir.join(self.file_name(label));
        fs::copy(&self.database_path, &target).map_err(|source| BackupError::Copy {
            path: target.clone(),
            source,
        })?;

        info!(path = %target.display(), label, "database backup written");
        Ok(target)
    }

    /// Backup taken ahead of a destructive operation. Failures are logged and
    /// swallowed so the caller can carry on.
    pub fn create_best_effort(&self, label: &str) -> Option<PathBuf> {
        match self.create(label) {
            Ok(path) => Some(path),
            Err(err) => {
                error!(error = %err, label, "database backup failed, continuing without it");
                None
            }
        }
    }

    fn file_name(&self, label: &str) -> String {
        let stem = self
            .database_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("database");
        let label: String = label
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        let timestamp = Utc::now().format("%Y%m%dT%H%M%S%3f");
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{stem}-{label}-{timestamp}-{}.db", &suffix[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_database_into_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("tracker.db");
        fs::write(&db_path, b"sqlite bytes").unwrap();

        let service = BackupService::new(&db_path, dir.path().join("nested/backups"));
        let written = service.create("archive submission").unwrap();

        assert!(written.starts_with(dir.path().join("nested/backups")));
        let name = written.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("tracker-archive-submission-"));
        assert!(name.ends_with(".db"));
        assert_eq!(fs::read(&written).unwrap(), b"sqlite bytes");
    }

    #[test]
    fn back_to_back_backups_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("tracker.db");
        fs::write(&db_path, b"x").unwrap();

        let service = BackupService::new(&db_path, dir.path().join("backups"));
        let first = service.create("archive").unwrap();
        let second = service.create("archive").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn missing_source_is_reported_not_panicked() {
        let dir = tempfile::tempdir().unwrap();
        let service = BackupService::new(dir.path().join("absent.db"), dir.path().join("b"));
        assert!(matches!(
            service.create("archive"),
            Err(BackupError::SourceMissing(_))
        ));
        assert!(service.create_best_effort("archive").is_none());
    }
}
