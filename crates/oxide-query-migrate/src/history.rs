//! Migration history on disk.
//!
//! The history is the sorted list of migration files in the migrations
//! directory. Listing only reads file names; a migration's content is parsed
//! when it is read.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{MigrateError, Result};
use crate::writer::{MigrationFile, MIGRATION_EXTENSION};

/// Pattern every migration name must match.
pub const MIGRATION_NAME_PATTERN: &str = r"^\d{4}_[0-9a-zA-Z]+$";

/// A migration file found in the migrations directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationEntry {
    /// Migration name (file stem).
    pub name: String,
    /// Full path of the file.
    pub path: PathBuf,
}

impl MigrationEntry {
    /// Reads and parses the migration file.
    ///
    /// # Errors
    ///
    /// [`MigrateError::Io`] if the file cannot be read and
    /// [`MigrateError::Parse`] if it is not a valid migration.
    pub fn read(&self) -> Result<MigrationFile> {
        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| MigrateError::Parse {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }
}

/// The ordered list of migrations in a directory.
#[derive(Debug, Clone, Default)]
pub struct MigrationHistory {
    entries: Vec<MigrationEntry>,
}

impl MigrationHistory {
    /// Lists the migrations in `dir`, sorted by name.
    ///
    /// Files without the migration extension or whose stem is not a valid
    /// migration name are ignored.
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(MigrateError::MigrationsDirNotFound(dir.to_path_buf()));
        }

        let pattern = Regex::new(MIGRATION_NAME_PATTERN)?;
        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(MIGRATION_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if pattern.is_match(name) {
                entries.push(MigrationEntry {
                    name: name.to_string(),
                    path: path.clone(),
                });
            }
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self { entries })
    }

    /// Like [`load`](Self::load), but a missing directory is an empty history.
    pub fn load_or_empty(dir: &Path) -> Result<Self> {
        match Self::load(dir) {
            Err(MigrateError::MigrationsDirNotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[MigrationEntry] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The most recent migration.
    #[must_use]
    pub fn last(&self) -> Option<&MigrationEntry> {
        self.entries.last()
    }

    /// Number of migrations up to and including `marker` (0 for `None`).
    ///
    /// # Errors
    ///
    /// [`MigrateError::MigrationNotFound`] if `marker` is not in the history.
    pub fn applied_count(&self, marker: Option<&str>) -> Result<usize> {
        match marker {
            None => Ok(0),
            Some(name) => self
                .entries
                .iter()
                .position(|e| e.name == name)
                .map(|i| i + 1)
                .ok_or_else(|| MigrateError::MigrationNotFound(name.to_string())),
        }
    }

    /// Migrations up to and including `marker`.
    pub fn applied(&self, marker: Option<&str>) -> Result<&[MigrationEntry]> {
        Ok(&self.entries[..self.applied_count(marker)?])
    }

    /// Migrations after `marker`; all of them for `None`.
    pub fn pending(&self, marker: Option<&str>) -> Result<&[MigrationEntry]> {
        Ok(&self.entries[self.applied_count(marker)?..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(dir: &Path, file: &str) {
        fs::write(dir.join(file), "{}").unwrap();
    }

    #[test]
    fn test_load_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "0001_bbbb.json");
        touch(dir.path(), "0000_aaaa.json");
        touch(dir.path(), "README.md");
        touch(dir.path(), "notes.json");
        touch(dir.path(), "0002_cc-dd.json");
        touch(dir.path(), "0003_eeee.json.bak");

        let history = MigrationHistory::load(dir.path()).unwrap();
        let names: Vec<&str> = history.names().collect();
        assert_eq!(names, vec!["0000_aaaa", "0001_bbbb"]);
        assert_eq!(history.last().unwrap().name, "0001_bbbb");
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            MigrationHistory::load(&missing),
            Err(MigrateError::MigrationsDirNotFound(_))
        ));
        assert!(MigrationHistory::load_or_empty(&missing).unwrap().is_empty());
    }

    #[test]
    fn test_applied_and_pending() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["0000_a", "0001_b", "0002_c"] {
            touch(dir.path(), &format!("{name}.json"));
        }
        let history = MigrationHistory::load(dir.path()).unwrap();

        assert_eq!(history.applied(None).unwrap().len(), 0);
        assert_eq!(history.pending(None).unwrap().len(), 3);
        assert_eq!(history.applied(Some("0001_b")).unwrap().len(), 2);
        let pending: Vec<&str> = history
            .pending(Some("0001_b"))
            .unwrap()
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(pending, vec!["0002_c"]);
        assert!(matches!(
            history.pending(Some("0009_z")),
            Err(MigrateError::MigrationNotFound(name)) if name == "0009_z"
        ));
    }

    #[test]
    fn test_read_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "0000_a.json");
        let history = MigrationHistory::load(dir.path()).unwrap();
        let err = history.entries()[0].read().unwrap_err();
        assert!(matches!(err, MigrateError::Parse { .. }));
    }
}
