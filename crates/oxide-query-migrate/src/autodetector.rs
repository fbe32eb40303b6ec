//! Autodetector for generating migrations from table declarations.
//!
//! Compares declared tables against the structure replayed from the
//! migration history and produces the operations that bring the latter in
//! line with the former.

use std::collections::HashSet;

use tracing::debug;

use crate::operations::Operation;
use crate::schema::TableStructure;
use crate::state::StructureRegistry;

/// Options for the autodetector.
#[derive(Debug, Clone)]
pub struct AutodetectorOptions {
    /// Whether columns missing from the declaration are dropped.
    pub drop_columns: bool,
}

impl Default for AutodetectorOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl AutodetectorOptions {
    /// Creates default options.
    #[must_use]
    pub const fn new() -> Self {
        Self { drop_columns: true }
    }

    /// Leaves columns that are no longer declared in place.
    #[must_use]
    pub const fn keep_columns(mut self) -> Self {
        self.drop_columns = false;
        self
    }
}

/// Detects structure changes and generates migration operations.
#[derive(Debug, Default)]
pub struct Autodetector {
    options: AutodetectorOptions,
}

impl Autodetector {
    /// Creates a new autodetector with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new autodetector with custom options.
    #[must_use]
    pub const fn with_options(options: AutodetectorOptions) -> Self {
        Self { options }
    }

    /// Returns the operations that turn `registry` into `declared`.
    ///
    /// Tables are handled in declaration order. An unknown table yields one
    /// `CreateTable`; a known one yields its deletions, then additions, then
    /// alterations.
    #[must_use]
    pub fn diff(&self, registry: &StructureRegistry, declared: &[TableStructure]) -> Vec<Operation> {
        let mut operations = Vec::new();

        for table in declared {
            match registry.get(&table.name) {
                Some(current) => operations.extend(self.diff_table(current, table)),
                None => {
                    debug!(table = %table.name, "new table");
                    operations.push(Operation::create_table(table));
                }
            }
        }

        operations
    }

    fn diff_table(&self, current: &TableStructure, declared: &TableStructure) -> Vec<Operation> {
        let mut operations = Vec::new();
        let table_name = &declared.name;

        let current_names: HashSet<&str> = current.column_names().collect();
        let declared_names: HashSet<&str> = declared.column_names().collect();

        // Removed columns
        for name in current.column_names() {
            if declared_names.contains(name) {
                continue;
            }
            if self.options.drop_columns {
                operations.push(Operation::delete_column(table_name, name));
            } else {
                debug!(table = %table_name, column = name, "keeping undeclared column");
            }
        }

        // New columns
        for column in &declared.columns {
            if !current_names.contains(column.name.as_str()) {
                operations.push(Operation::add_column(
                    table_name,
                    &column.name,
                    column.spec.clone(),
                ));
            }
        }

        // Changed columns
        for column in &declared.columns {
            let Some(existing) = current.get(&column.name) else {
                continue;
            };
            let changes = existing.changes(&column.spec);
            if !changes.is_empty() {
                operations.push(Operation::alter_column(
                    table_name,
                    &column.name,
                    column.spec.clone(),
                    changes,
                ));
            }
        }

        operations
    }
}
