//! Structure reconstruction from migrations.
//!
//! Replaying every operation of the migration history, in order, yields the
//! structure the database is expected to have. The differ compares declared
//! tables against it.

use std::collections::BTreeMap;

use crate::error::{MigrateError, Result};
use crate::operations::Operation;
use crate::schema::TableStructure;

/// Table structures keyed by table name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureRegistry {
    tables: BTreeMap<String, TableStructure>,
}

impl StructureRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replays a sequence of operations onto an empty registry.
    pub fn replay<'a>(operations: impl IntoIterator<Item = &'a Operation>) -> Result<Self> {
        let mut registry = Self::new();
        registry.apply_all(operations)?;
        Ok(registry)
    }

    /// Applies operations in order, stopping at the first failure.
    pub fn apply_all<'a>(&mut self, operations: impl IntoIterator<Item = &'a Operation>) -> Result<()> {
        for operation in operations {
            operation.apply(self)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TableStructure> {
        self.tables.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Registers a new table.
    pub(crate) fn create(&mut self, structure: TableStructure) -> Result<()> {
        if self.tables.contains_key(&structure.name) {
            return Err(MigrateError::InvalidState(format!(
                "Table '{}' already exists",
                structure.name
            )));
        }
        self.tables.insert(structure.name.clone(), structure);
        Ok(())
    }

    pub(crate) fn table_mut(&mut self, name: &str) -> Result<&mut TableStructure> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| MigrateError::InvalidState(format!("Table '{name}' does not exist")))
    }
}
