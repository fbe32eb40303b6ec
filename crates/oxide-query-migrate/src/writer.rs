//! Migration file generation.
//!
//! A migration file is a JSON document holding the migration's name, the
//! time it was generated and its operations. File names are
//! `<index>_<suffix>.json` where the index is zero-padded to four digits and
//! the suffix is eight random hex characters.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{MigrateError, Result};
use crate::operations::Operation;

/// Extension of migration files.
pub const MIGRATION_EXTENSION: &str = "json";

/// The content of one migration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationFile {
    /// Migration name (file stem).
    pub name: String,
    /// When the file was generated.
    pub generated_at: DateTime<Utc>,
    /// Operations in application order.
    pub operations: Vec<Operation>,
}

impl MigrationFile {
    /// Creates a migration generated now.
    #[must_use]
    pub fn new(name: impl Into<String>, operations: Vec<Operation>) -> Self {
        Self {
            name: name.into(),
            generated_at: Utc::now(),
            operations,
        }
    }

    /// Serializes the migration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Returns the numeric index at the start of a migration name.
#[must_use]
pub fn migration_index(name: &str) -> Option<u32> {
    name.split('_').next()?.parse().ok()
}

/// Generates the name of the migration that follows `previous`.
///
/// The first migration gets index 0.
#[must_use]
pub fn generate_migration_name(previous: Option<&str>) -> String {
    let index = previous
        .and_then(migration_index)
        .map_or(0, |i| i.saturating_add(1));
    format!("{index:04}_{:08x}", rand::random::<u32>())
}

/// Writes migration files into a directory.
#[derive(Debug, Clone)]
pub struct MigrationWriter {
    dir: PathBuf,
}

impl MigrationWriter {
    /// Creates a writer for `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file for a migration name.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{MIGRATION_EXTENSION}"))
    }

    /// Writes a new migration following `previous` and returns its path.
    ///
    /// The directory is created if needed. An existing file is never
    /// overwritten.
    pub fn write(&self, previous: Option<&str>, operations: Vec<Operation>) -> Result<PathBuf> {
        let migration = MigrationFile::new(generate_migration_name(previous), operations);
        let path = self.path_for(&migration.name);
        if path.exists() {
            return Err(MigrateError::MigrationExists(path));
        }

        fs::create_dir_all(&self.dir)?;
        fs::write(&path, migration.to_json()?)?;

        info!(
            name = %migration.name,
            operations = migration.operations.len(),
            "wrote migration"
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnSpec, TableStructure};

    #[test]
    fn test_first_migration_name() {
        let name = generate_migration_name(None);
        assert_eq!(name.len(), 13);
        assert!(name.starts_with("0000_"));
        assert!(name[5..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_next_migration_name() {
        assert!(generate_migration_name(Some("0007_deadbeef")).starts_with("0008_"));
        assert!(generate_migration_name(Some("0999_a")).starts_with("1000_"));
    }

    #[test]
    fn test_migration_index() {
        assert_eq!(migration_index("0012_abcd1234"), Some(12));
        assert_eq!(migration_index("initial"), None);
    }

    #[test]
    fn test_write_creates_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = MigrationWriter::new(dir.path().join("migrations"));
        let ops = vec![Operation::create_table(
            &TableStructure::new("users").column("id", ColumnSpec::new("serial").primary()),
        )];

        let path = writer.write(None, ops.clone()).unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));

        let content = fs::read_to_string(&path).unwrap();
        let parsed: MigrationFile = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.operations, ops);
        assert_eq!(
            Some(parsed.name.as_str()),
            path.file_stem().and_then(|s| s.to_str())
        );
        assert!(content.contains("\"op\": \"CreateTable\""));
    }
}
