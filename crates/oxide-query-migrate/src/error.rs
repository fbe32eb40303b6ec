//! Error types for the migration system.

use std::path::PathBuf;

/// Errors that can occur during migration operations.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// IO error (reading/writing migration files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a migration or model file.
    #[error("Failed to parse '{path}': {message}")]
    Parse {
        /// Path to the offending file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Migration file already exists.
    #[error("Migration file already exists: {0}")]
    MigrationExists(PathBuf),

    /// No migrations directory found.
    #[error("Migrations directory not found: {0}")]
    MigrationsDirNotFound(PathBuf),

    /// The named migration is not in the history.
    #[error("Migration not found: {0}")]
    MigrationNotFound(String),

    /// Replaying an operation found the structure in an unexpected state.
    #[error("Invalid migration state: {0}")]
    InvalidState(String),

    /// The same table was declared more than once.
    #[error("Table '{0}' is declared more than once")]
    DuplicateTable(String),

    /// An aliased copy was passed where a table declaration was expected.
    #[error("Table '{table}' is declared through alias '{alias}'")]
    AliasedTable {
        /// Table name.
        table: String,
        /// Alias of the copy.
        alias: String,
    },

    /// Two fields of a table resolve to the same column.
    #[error("Column '{column}' is declared more than once in table '{table}'")]
    DuplicateColumn {
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// Migrations exist after the last applied one.
    #[error(
        "Apply pending migrations before creating a new one: {}",
        .pending.join(", ")
    )]
    UnappliedMigrations {
        /// Names of the migrations after the last applied one.
        pending: Vec<String>,
    },

    /// Invalid migration name pattern.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
