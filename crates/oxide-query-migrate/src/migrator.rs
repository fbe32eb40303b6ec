//! Migration driver.
//!
//! [`Migrator`] ties the pieces together: it reads the history, replays it
//! into a [`StructureRegistry`], diffs declared tables against the result
//! and writes new migration files.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use oxide_query::Table;
use tracing::{debug, info};

use crate::autodetector::{Autodetector, AutodetectorOptions};
use crate::error::{MigrateError, Result};
use crate::history::MigrationHistory;
use crate::operations::Operation;
use crate::schema::TableStructure;
use crate::state::StructureRegistry;
use crate::writer::MigrationWriter;

/// A migration's name and operations, as yielded by [`Migrator::migrate`].
pub type MigrationStep = (String, Vec<Operation>);

/// Drives migrations stored in one directory.
#[derive(Debug, Clone)]
pub struct Migrator {
    dir: PathBuf,
    options: AutodetectorOptions,
}

impl Migrator {
    /// Creates a migrator for `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            options: AutodetectorOptions::default(),
        }
    }

    /// Sets the autodetector options used by [`plan`](Self::plan).
    #[must_use]
    pub const fn with_options(mut self, options: AutodetectorOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lists the migration history.
    pub fn history(&self) -> Result<MigrationHistory> {
        MigrationHistory::load(&self.dir)
    }

    /// Yields every migration after `last_applied` (all for `None`).
    ///
    /// The list is taken up front; each file is read when its step is
    /// reached.
    ///
    /// # Errors
    ///
    /// [`MigrateError::MigrationNotFound`] if `last_applied` is not in the
    /// history. Read failures are reported per step.
    pub fn migrate(
        &self,
        last_applied: Option<&str>,
    ) -> Result<impl Iterator<Item = Result<MigrationStep>>> {
        let history = self.history()?;
        let pending = history.pending(last_applied)?.to_vec();
        debug!(count = pending.len(), "pending migrations");

        Ok(pending.into_iter().map(|entry| {
            let migration = entry.read()?;
            Ok((entry.name, migration.operations))
        }))
    }

    /// Replays the history up to and including `last_applied`.
    ///
    /// # Errors
    ///
    /// [`MigrateError::UnappliedMigrations`] if any migration exists after
    /// `last_applied`, which with `None` means any migration at all.
    pub fn replay(&self, last_applied: Option<&str>) -> Result<StructureRegistry> {
        let history = MigrationHistory::load_or_empty(&self.dir)?;

        let pending = history.pending(last_applied)?;
        if !pending.is_empty() {
            return Err(MigrateError::UnappliedMigrations {
                pending: pending.iter().map(|e| e.name.clone()).collect(),
            });
        }

        let mut registry = StructureRegistry::new();
        for entry in history.applied(last_applied)? {
            let migration = entry.read()?;
            debug!(name = %entry.name, operations = migration.operations.len(), "replaying");
            registry.apply_all(&migration.operations)?;
        }
        Ok(registry)
    }

    /// Computes the operations a new migration would contain.
    ///
    /// # Errors
    ///
    /// Besides replay errors, [`MigrateError::AliasedTable`],
    /// [`MigrateError::DuplicateTable`] and [`MigrateError::DuplicateColumn`]
    /// reject declarations that would produce a migration which cannot be
    /// replayed.
    pub fn plan(&self, last_applied: Option<&str>, models: &[Table]) -> Result<Vec<Operation>> {
        let declared = declared_structures(models)?;
        let registry = self.replay(last_applied)?;
        Ok(Autodetector::with_options(self.options.clone()).diff(&registry, &declared))
    }

    /// Writes a migration bringing the history in line with `models`.
    ///
    /// Returns the new file's path, or `None` when nothing changed. Nothing
    /// is written when an error is returned.
    pub fn create_migrations(
        &self,
        last_applied: Option<&str>,
        models: &[Table],
    ) -> Result<Option<PathBuf>> {
        let operations = self.plan(last_applied, models)?;
        if operations.is_empty() {
            info!("No changes detected");
            return Ok(None);
        }

        for operation in &operations {
            info!("  {}", operation.summary());
        }

        let path = MigrationWriter::new(&self.dir).write(last_applied, operations)?;
        Ok(Some(path))
    }

    /// Renders DDL for a list of operations.
    #[must_use]
    pub fn sql_for(operations: &[Operation]) -> Vec<String> {
        operations.iter().map(Operation::compile).collect()
    }

    /// Every migration with whether it is applied, given the last applied one.
    pub fn status(&self, last_applied: Option<&str>) -> Result<Vec<(String, bool)>> {
        let history = self.history()?;
        let applied = history.applied_count(last_applied)?;
        Ok(history
            .names()
            .enumerate()
            .map(|(i, name)| (name.to_string(), i < applied))
            .collect())
    }
}

/// Converts declared tables into structures, one per table name.
fn declared_structures(models: &[Table]) -> Result<Vec<TableStructure>> {
    let mut seen = HashSet::new();
    let mut declared = Vec::with_capacity(models.len());
    for table in models {
        if table.alias() != table.table_name() {
            return Err(MigrateError::AliasedTable {
                table: table.table_name().to_string(),
                alias: table.alias().to_string(),
            });
        }
        if !seen.insert(table.table_name()) {
            return Err(MigrateError::DuplicateTable(table.table_name().to_string()));
        }
        declared.push(TableStructure::from_table(table)?);
    }
    Ok(declared)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxide_query::Field;

    fn users() -> Table {
        Table::builder("users")
            .field("name", Field::text().not_null())
            .build()
    }

    #[test]
    fn test_plan_on_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let migrator = Migrator::new(dir.path().join("migrations"));
        let ops = migrator.plan(None, &[users()]).unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].summary(), "Create table users (2 columns)");
    }

    #[test]
    fn test_plan_rejects_aliased_and_repeated_tables() {
        let dir = tempfile::tempdir().unwrap();
        let migrator = Migrator::new(dir.path());

        let err = migrator
            .plan(None, &[users(), users().aliased("author")])
            .unwrap_err();
        assert!(matches!(
            err,
            MigrateError::AliasedTable { ref table, ref alias } if table == "users" && alias == "author"
        ));

        let err = migrator.plan(None, &[users(), users()]).unwrap_err();
        assert!(matches!(err, MigrateError::DuplicateTable(ref name) if name == "users"));
    }

    #[test]
    fn test_sql_for() {
        let ops = vec![Operation::delete_column("users", "bio")];
        assert_eq!(
            Migrator::sql_for(&ops),
            vec![r#"ALTER TABLE "users" DROP COLUMN "bio""#.to_string()]
        );
    }

    #[test]
    fn test_status_marks_applied() {
        let dir = tempfile::tempdir().unwrap();
        let migrator = Migrator::new(dir.path());
        let first = migrator.create_migrations(None, &[users()]).unwrap().unwrap();
        let first_name = first.file_stem().unwrap().to_str().unwrap().to_string();

        let status = migrator.status(None).unwrap();
        assert_eq!(status, vec![(first_name.clone(), false)]);
        let status = migrator.status(Some(&first_name)).unwrap();
        assert_eq!(status, vec![(first_name, true)]);
    }
}
