//! Migration operations.
//!
//! Each operation knows how to update a [`StructureRegistry`] during replay
//! and how to render itself as PostgreSQL DDL. Operations serialize as
//! `{"op": "AddColumn", "config": {...}}`, which is all a migration file
//! stores.

use oxide_query::render::quote_identifier;
use serde::{Deserialize, Serialize};

use crate::error::{MigrateError, Result};
use crate::schema::{Column, ColumnAttribute, ColumnSpec, TableStructure};
use crate::state::StructureRegistry;

/// Create a table with all its columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTable {
    /// Table name.
    pub table_name: String,
    /// Columns in declaration order.
    pub columns: Vec<Column>,
}

/// Add a column to an existing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddColumn {
    /// Table name.
    pub table_name: String,
    /// Column name.
    pub column_name: String,
    /// Column definition.
    pub column: ColumnSpec,
}

/// Drop a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteColumn {
    /// Table name.
    pub table_name: String,
    /// Column name.
    pub column_name: String,
}

/// Change attributes of an existing column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlterColumn {
    /// Table name.
    pub table_name: String,
    /// Column name.
    pub column_name: String,
    /// The new column definition.
    pub column: ColumnSpec,
    /// Attributes that differ from the previous definition.
    pub changes: Vec<ColumnAttribute>,
}

/// A single migration operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "config")]
pub enum Operation {
    CreateTable(CreateTable),
    AddColumn(AddColumn),
    DeleteColumn(DeleteColumn),
    AlterColumn(AlterColumn),
}

impl Operation {
    /// Creates a table from its full structure.
    #[must_use]
    pub fn create_table(structure: &TableStructure) -> Self {
        Self::CreateTable(CreateTable {
            table_name: structure.name.clone(),
            columns: structure.columns.clone(),
        })
    }

    #[must_use]
    pub fn add_column(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        column: ColumnSpec,
    ) -> Self {
        Self::AddColumn(AddColumn {
            table_name: table_name.into(),
            column_name: column_name.into(),
            column,
        })
    }

    #[must_use]
    pub fn delete_column(table_name: impl Into<String>, column_name: impl Into<String>) -> Self {
        Self::DeleteColumn(DeleteColumn {
            table_name: table_name.into(),
            column_name: column_name.into(),
        })
    }

    #[must_use]
    pub fn alter_column(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        column: ColumnSpec,
        changes: Vec<ColumnAttribute>,
    ) -> Self {
        Self::AlterColumn(AlterColumn {
            table_name: table_name.into(),
            column_name: column_name.into(),
            column,
            changes,
        })
    }

    /// Table the operation targets.
    #[must_use]
    pub fn table_name(&self) -> &str {
        match self {
            Self::CreateTable(op) => &op.table_name,
            Self::AddColumn(op) => &op.table_name,
            Self::DeleteColumn(op) => &op.table_name,
            Self::AlterColumn(op) => &op.table_name,
        }
    }

    /// Applies the operation to the replayed structure.
    ///
    /// # Errors
    ///
    /// [`MigrateError::InvalidState`] when the table or column the operation
    /// expects is missing, or a table or column to create already exists.
    pub fn apply(&self, registry: &mut StructureRegistry) -> Result<()> {
        match self {
            Self::CreateTable(op) => registry.create(TableStructure {
                name: op.table_name.clone(),
                columns: op.columns.clone(),
            }),

            Self::AddColumn(op) => {
                let table = registry.table_mut(&op.table_name)?;
                if table.get(&op.column_name).is_some() {
                    return Err(MigrateError::InvalidState(format!(
                        "Column '{}' already exists in table '{}'",
                        op.column_name, op.table_name
                    )));
                }
                table
                    .columns
                    .push(Column::new(op.column_name.clone(), op.column.clone()));
                Ok(())
            }

            Self::DeleteColumn(op) => {
                let table = registry.table_mut(&op.table_name)?;
                table
                    .remove(&op.column_name)
                    .map(|_| ())
                    .ok_or_else(|| missing_column(&op.table_name, &op.column_name))
            }

            Self::AlterColumn(op) => {
                let table = registry.table_mut(&op.table_name)?;
                let spec = table
                    .get_mut(&op.column_name)
                    .ok_or_else(|| missing_column(&op.table_name, &op.column_name))?;
                *spec = op.column.clone();
                Ok(())
            }
        }
    }

    /// Renders the operation as one DDL statement.
    #[must_use]
    pub fn compile(&self) -> String {
        match self {
            Self::CreateTable(op) => {
                let definitions: Vec<String> = op
                    .columns
                    .iter()
                    .map(|c| c.spec.to_sql(&c.name))
                    .collect();
                format!(
                    "CREATE TABLE {} ({})",
                    quote_identifier(&op.table_name),
                    definitions.join(",")
                )
            }

            Self::AddColumn(op) => format!(
                "ALTER TABLE {} ADD COLUMN {}",
                quote_identifier(&op.table_name),
                op.column.to_sql(&op.column_name)
            ),

            Self::DeleteColumn(op) => format!(
                "ALTER TABLE {} DROP COLUMN {}",
                quote_identifier(&op.table_name),
                quote_identifier(&op.column_name)
            ),

            Self::AlterColumn(op) => {
                format!(
                    "ALTER TABLE {} {}",
                    quote_identifier(&op.table_name),
                    op.clauses().join(", ")
                )
            }
        }
    }

    /// Short description for logs and the CLI.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::CreateTable(op) => {
                format!("Create table {} ({} columns)", op.table_name, op.columns.len())
            }
            Self::AddColumn(op) => format!("Add column {}.{}", op.table_name, op.column_name),
            Self::DeleteColumn(op) => {
                format!("Delete column {}.{}", op.table_name, op.column_name)
            }
            Self::AlterColumn(op) => {
                let changes: Vec<&str> = op.changes.iter().map(|c| c.as_str()).collect();
                format!(
                    "Alter column {}.{} ({})",
                    op.table_name,
                    op.column_name,
                    changes.join(", ")
                )
            }
        }
    }
}

impl AlterColumn {
    fn clauses(&self) -> Vec<String> {
        let column = quote_identifier(&self.column_name);
        let prefix = format!("ALTER COLUMN {column}");
        let spec = &self.column;
        let mut clauses = Vec::new();

        for change in &self.changes {
            match change {
                ColumnAttribute::ColumnType => clauses.push(format!(
                    "{prefix} TYPE {ty} USING {column}::{ty}",
                    ty = spec.column_type
                )),
                ColumnAttribute::Nullable => {
                    if spec.nullable {
                        clauses.push(format!("{prefix} DROP NOT NULL"));
                        if spec.default.is_none() {
                            clauses.push(format!("{prefix} SET DEFAULT NULL"));
                        }
                    } else {
                        clauses.push(format!("{prefix} SET NOT NULL"));
                        if spec.default.is_none() {
                            clauses.push(format!("{prefix} DROP DEFAULT"));
                        }
                    }
                }
                ColumnAttribute::Unique => {
                    if spec.unique {
                        clauses.push(format!("ADD UNIQUE ({column})"));
                    } else {
                        let constraint = format!("{}_{}_key", self.table_name, self.column_name);
                        clauses.push(format!(
                            "DROP CONSTRAINT {}",
                            quote_identifier(&constraint)
                        ));
                    }
                }
                ColumnAttribute::Default => clauses.push(format!(
                    "{prefix} SET DEFAULT {}",
                    spec.default.as_deref().unwrap_or("NULL")
                )),
            }
        }

        clauses
    }
}

fn missing_column(table: &str, column: &str) -> MigrateError {
    MigrateError::InvalidState(format!(
        "Column '{column}' does not exist in table '{table}'"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> TableStructure {
        TableStructure::new("users")
            .column("id", ColumnSpec::new("serial").not_null().primary())
            .column("name", ColumnSpec::new("text").not_null())
    }

    #[test]
    fn test_create_table_sql() {
        let op = Operation::create_table(&users());
        assert_eq!(
            op.compile(),
            r#"CREATE TABLE "users" ("id" serial PRIMARY KEY NOT NULL,"name" text NOT NULL)"#
        );
    }

    #[test]
    fn test_add_and_delete_column_sql() {
        let add = Operation::add_column("users", "bio", ColumnSpec::new("text"));
        assert_eq!(
            add.compile(),
            r#"ALTER TABLE "users" ADD COLUMN "bio" text NULL DEFAULT NULL"#
        );
        let delete = Operation::delete_column("users", "bio");
        assert_eq!(delete.compile(), r#"ALTER TABLE "users" DROP COLUMN "bio""#);
    }

    #[test]
    fn test_alter_type() {
        let op = Operation::alter_column(
            "users",
            "age",
            ColumnSpec::new("bigint"),
            vec![ColumnAttribute::ColumnType],
        );
        assert_eq!(
            op.compile(),
            r#"ALTER TABLE "users" ALTER COLUMN "age" TYPE bigint USING "age"::bigint"#
        );
    }

    #[test]
    fn test_alter_nullable_without_default() {
        let to_nullable = Operation::alter_column(
            "users",
            "name",
            ColumnSpec::new("text"),
            vec![ColumnAttribute::Nullable],
        );
        assert_eq!(
            to_nullable.compile(),
            r#"ALTER TABLE "users" ALTER COLUMN "name" DROP NOT NULL, ALTER COLUMN "name" SET DEFAULT NULL"#
        );

        let to_not_null = Operation::alter_column(
            "users",
            "name",
            ColumnSpec::new("text").not_null(),
            vec![ColumnAttribute::Nullable],
        );
        assert_eq!(
            to_not_null.compile(),
            r#"ALTER TABLE "users" ALTER COLUMN "name" SET NOT NULL, ALTER COLUMN "name" DROP DEFAULT"#
        );
    }

    #[test]
    fn test_alter_nullable_and_default() {
        let op = Operation::alter_column(
            "users",
            "score",
            ColumnSpec::new("integer").not_null().default("0"),
            vec![ColumnAttribute::Nullable, ColumnAttribute::Default],
        );
        assert_eq!(
            op.compile(),
            r#"ALTER TABLE "users" ALTER COLUMN "score" SET NOT NULL, ALTER COLUMN "score" SET DEFAULT 0"#
        );
    }

    #[test]
    fn test_alter_unique() {
        let add = Operation::alter_column(
            "users",
            "email",
            ColumnSpec::new("text").unique(),
            vec![ColumnAttribute::Unique],
        );
        assert_eq!(add.compile(), r#"ALTER TABLE "users" ADD UNIQUE ("email")"#);

        let drop = Operation::alter_column(
            "users",
            "email",
            ColumnSpec::new("text"),
            vec![ColumnAttribute::Unique],
        );
        assert_eq!(
            drop.compile(),
            r#"ALTER TABLE "users" DROP CONSTRAINT "users_email_key""#
        );
    }

    #[test]
    fn test_apply_sequence() {
        let mut registry = StructureRegistry::new();
        Operation::create_table(&users()).apply(&mut registry).unwrap();
        Operation::add_column("users", "bio", ColumnSpec::new("text"))
            .apply(&mut registry)
            .unwrap();
        Operation::alter_column(
            "users",
            "bio",
            ColumnSpec::new("varchar(200)"),
            vec![ColumnAttribute::ColumnType],
        )
        .apply(&mut registry)
        .unwrap();
        Operation::delete_column("users", "name")
            .apply(&mut registry)
            .unwrap();

        let table = registry.get("users").unwrap();
        let names: Vec<&str> = table.column_names().collect();
        assert_eq!(names, vec!["id", "bio"]);
        assert_eq!(table.get("bio").unwrap().column_type, "varchar(200)");
    }

    #[test]
    fn test_apply_invalid_state() {
        let mut registry = StructureRegistry::new();
        let err = Operation::delete_column("ghost", "x")
            .apply(&mut registry)
            .unwrap_err();
        assert!(matches!(err, MigrateError::InvalidState(_)));

        Operation::create_table(&users()).apply(&mut registry).unwrap();
        let err = Operation::create_table(&users())
            .apply(&mut registry)
            .unwrap_err();
        assert!(matches!(err, MigrateError::InvalidState(_)));

        let err = Operation::add_column("users", "name", ColumnSpec::new("text"))
            .apply(&mut registry)
            .unwrap_err();
        assert!(matches!(err, MigrateError::InvalidState(_)));
    }

    #[test]
    fn test_serde_shape() {
        let op = Operation::delete_column("users", "bio");
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "op": "DeleteColumn",
                "config": {"table_name": "users", "column_name": "bio"}
            })
        );

        let alter = Operation::alter_column(
            "users",
            "bio",
            ColumnSpec::new("text"),
            vec![ColumnAttribute::Nullable],
        );
        let back: Operation =
            serde_json::from_str(&serde_json::to_string(&alter).unwrap()).unwrap();
        assert_eq!(back, alter);
    }

    #[test]
    fn test_summary() {
        let op = Operation::alter_column(
            "users",
            "bio",
            ColumnSpec::new("text"),
            vec![ColumnAttribute::Nullable, ColumnAttribute::Default],
        );
        assert_eq!(op.summary(), "Alter column users.bio (nullable, default)");
        assert_eq!(op.table_name(), "users");
    }
}
