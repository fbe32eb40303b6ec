//! Schema migrations for oxide-query tables.
//!
//! `oxide-query-migrate` derives migrations from table declarations instead
//! of having them written by hand:
//! - The migration history is a directory of JSON files, each holding an
//!   ordered list of operations
//! - Replaying the history yields the expected structure of every table
//! - The autodetector diffs declared tables against that structure and
//!   emits the operations for a new migration
//! - Operations render as PostgreSQL DDL
//!
//! # Example
//!
//! ```rust,no_run
//! use oxide_query::{Field, Table};
//! use oxide_query_migrate::prelude::*;
//!
//! let users = Table::builder("users")
//!     .field("email", Field::text().not_null().unique())
//!     .build();
//!
//! let migrator = Migrator::new("migrations");
//! if let Some(path) = migrator.create_migrations(None, &[users])? {
//!     println!("Created {}", path.display());
//! }
//!
//! for step in migrator.migrate(None)? {
//!     let (name, operations) = step?;
//!     println!("-- {name}");
//!     for sql in Migrator::sql_for(&operations) {
//!         println!("{sql};");
//!     }
//! }
//! # Ok::<(), MigrateError>(())
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Write a migration for the tables declared in models.json
//! oxide-query-migrate make --models models.json --last 0003_1a2b3c4d
//!
//! # Show migration status
//! oxide-query-migrate show --last 0003_1a2b3c4d
//!
//! # Print the DDL of pending migrations
//! oxide-query-migrate sql --last 0003_1a2b3c4d --statement-timeout 5000
//! ```

pub mod autodetector;
pub mod error;
pub mod history;
pub mod migrator;
pub mod models;
pub mod operations;
pub mod schema;
pub mod state;
pub mod writer;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::autodetector::{Autodetector, AutodetectorOptions};
    pub use crate::error::{MigrateError, Result};
    pub use crate::history::{MigrationEntry, MigrationHistory};
    pub use crate::migrator::{MigrationStep, Migrator};
    pub use crate::models::{load_models, parse_models};
    pub use crate::operations::{AddColumn, AlterColumn, CreateTable, DeleteColumn, Operation};
    pub use crate::schema::{Column, ColumnAttribute, ColumnSpec, TableStructure};
    pub use crate::state::StructureRegistry;
    pub use crate::writer::{generate_migration_name, MigrationFile, MigrationWriter};
}
