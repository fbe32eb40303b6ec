//! Column and table structure as recorded in migrations.
//!
//! These types are the serialized form of a table: plain data that can be
//! written to a migration file, replayed and compared. They are derived from
//! declared [`Table`]s and never hold query state.

use std::fmt;

use oxide_query::render::quote_identifier;
use oxide_query::{ColumnDefault, Field, Table};
use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};

/// The persisted definition of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// SQL type, e.g. `text` or `varchar(80)`.
    pub column_type: String,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Whether the column has a UNIQUE constraint.
    #[serde(default)]
    pub unique: bool,
    /// Rendered SQL default, if any.
    #[serde(default)]
    pub default: Option<String>,
    /// Whether the column is the primary key.
    #[serde(default, skip_serializing_if = "is_false")]
    pub primary: bool,
    /// Check constraint clause appended to the column definition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_false(value: &bool) -> bool {
    !*value
}

impl ColumnSpec {
    /// Creates a nullable column of the given type.
    #[must_use]
    pub fn new(column_type: impl Into<String>) -> Self {
        Self {
            column_type: column_type.into(),
            nullable: true,
            unique: false,
            default: None,
            primary: false,
            check: None,
        }
    }

    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub const fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Sets the rendered SQL default.
    #[must_use]
    pub fn default(mut self, sql: impl Into<String>) -> Self {
        self.default = Some(sql.into());
        self
    }

    #[must_use]
    pub fn check(mut self, sql: impl Into<String>) -> Self {
        self.check = Some(sql.into());
        self
    }

    /// Derives the spec of a declared field.
    #[must_use]
    pub fn from_field(field: &Field) -> Self {
        Self {
            column_type: field.column_type().to_string(),
            nullable: field.is_nullable(),
            unique: field.is_unique(),
            default: field.default().map(ColumnDefault::to_sql),
            primary: field.is_primary(),
            check: field.check_constraint().map(str::to_string),
        }
    }

    /// Attributes that differ between `self` and `other`, in
    /// [`ColumnAttribute::ALL`] order.
    ///
    /// `primary` and `check` are not tracked.
    #[must_use]
    pub fn changes(&self, other: &Self) -> Vec<ColumnAttribute> {
        ColumnAttribute::ALL
            .into_iter()
            .filter(|attr| match attr {
                ColumnAttribute::ColumnType => self.column_type != other.column_type,
                ColumnAttribute::Nullable => self.nullable != other.nullable,
                ColumnAttribute::Unique => self.unique != other.unique,
                ColumnAttribute::Default => self.default != other.default,
            })
            .collect()
    }

    /// Renders the column definition used by CREATE TABLE and ADD COLUMN.
    ///
    /// A missing default renders as `DEFAULT NULL` on nullable columns and
    /// is omitted on NOT NULL columns.
    #[must_use]
    pub fn to_sql(&self, name: &str) -> String {
        let mut parts = vec![quote_identifier(name), self.column_type.clone()];

        if self.primary {
            parts.push("PRIMARY KEY".to_string());
        } else if self.unique {
            parts.push("UNIQUE".to_string());
        }

        parts.push(if self.nullable { "NULL" } else { "NOT NULL" }.to_string());

        let default = self.default.as_deref().unwrap_or("NULL");
        if self.nullable || default != "NULL" {
            parts.push(format!("DEFAULT {default}"));
        }

        if let Some(check) = &self.check {
            parts.push(check.clone());
        }

        parts.join(" ")
    }
}

/// A column attribute tracked by the differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnAttribute {
    ColumnType,
    Nullable,
    Unique,
    Default,
}

impl ColumnAttribute {
    /// Every tracked attribute, in comparison order.
    pub const ALL: [Self; 4] = [Self::ColumnType, Self::Nullable, Self::Unique, Self::Default];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ColumnType => "column_type",
            Self::Nullable => "nullable",
            Self::Unique => "unique",
            Self::Default => "default",
        }
    }
}

impl fmt::Display for ColumnAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column definition.
    #[serde(flatten)]
    pub spec: ColumnSpec,
}

impl Column {
    #[must_use]
    pub fn new(name: impl Into<String>, spec: ColumnSpec) -> Self {
        Self {
            name: name.into(),
            spec,
        }
    }
}

/// The structure of one table: its name and ordered columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStructure {
    /// Table name.
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<Column>,
}

impl TableStructure {
    /// Creates an empty structure.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Adds a column (builder style).
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, spec: ColumnSpec) -> Self {
        self.columns.push(Column::new(name, spec));
        self
    }

    /// Derives the declared structure of a table.
    ///
    /// Columns are keyed by column name, which is the attribute name unless
    /// the field was given an explicit one.
    ///
    /// # Errors
    ///
    /// [`MigrateError::DuplicateColumn`] if two fields resolve to the same
    /// column name.
    pub fn from_table(table: &Table) -> Result<Self> {
        let mut structure = Self::new(table.table_name());
        for (attr, field) in table.fields() {
            let name = field.name().unwrap_or(attr);
            if structure.get(name).is_some() {
                return Err(MigrateError::DuplicateColumn {
                    table: structure.name,
                    column: name.to_string(),
                });
            }
            structure
                .columns
                .push(Column::new(name, ColumnSpec::from_field(field)));
        }
        Ok(structure)
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.spec)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut ColumnSpec> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .map(|c| &mut c.spec)
    }

    /// Removes a column, returning its spec.
    pub fn remove(&mut self, name: &str) -> Option<ColumnSpec> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx).spec)
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}
