//! Tables and table identities.
//!
//! A [`Table`] owns a set of bound [`Field`]s. [`TableRef`] is the small
//! identity value (`table_name` plus alias) that fields point back to and
//! that dependency sets are made of. Aliasing a table yields a new identity
//! with freshly bound field copies, so the same physical table can appear
//! several times in one query.

use std::fmt;
use std::ops::Index;

use crate::error::{QueryError, Result};
use crate::field::Field;
use crate::render::quote_identifier;

/// Identity of a table occurrence in a query.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableRef {
    alias: String,
    table_name: String,
}

impl TableRef {
    /// Creates an unaliased reference.
    #[must_use]
    pub fn new(table_name: impl Into<String>) -> Self {
        let table_name = table_name.into();
        Self {
            alias: table_name.clone(),
            table_name,
        }
    }

    /// Creates an aliased reference.
    #[must_use]
    pub fn aliased(table_name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            table_name: table_name.into(),
        }
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Name used to qualify columns. Equals the table name when unaliased.
    #[must_use]
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Renders `"name"` or `"name" "alias"`.
    #[must_use]
    pub fn to_sql(&self) -> String {
        if self.alias == self.table_name {
            quote_identifier(&self.table_name)
        } else {
            format!(
                "{} {}",
                quote_identifier(&self.table_name),
                quote_identifier(&self.alias)
            )
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// A table definition with bound fields.
#[derive(Debug, Clone)]
pub struct Table {
    reference: TableRef,
    fields: Vec<(String, Field)>,
    verbose_name: Option<String>,
}

impl Table {
    /// Starts a table definition.
    #[must_use]
    pub fn builder(table_name: impl Into<String>) -> TableBuilder {
        TableBuilder {
            table_name: table_name.into(),
            alias: None,
            fields: Vec::new(),
            verbose_name: None,
        }
    }

    /// Returns a new identity of the same table under `alias`.
    ///
    /// Every field is re-bound to the new identity; the original table and
    /// its fields are untouched.
    #[must_use]
    pub fn aliased(&self, alias: impl Into<String>) -> Self {
        let reference = TableRef::aliased(self.reference.table_name(), alias);
        let fields = self
            .fields
            .iter()
            .map(|(attr, field)| (attr.clone(), field.bind(&reference, attr)))
            .collect();
        Self {
            reference,
            fields,
            verbose_name: self.verbose_name.clone(),
        }
    }

    #[must_use]
    pub fn reference(&self) -> &TableRef {
        &self.reference
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        self.reference.table_name()
    }

    #[must_use]
    pub fn alias(&self) -> &str {
        self.reference.alias()
    }

    /// Display name; falls back to the table name.
    #[must_use]
    pub fn verbose_name(&self) -> &str {
        self.verbose_name
            .as_deref()
            .unwrap_or_else(|| self.reference.table_name())
    }

    /// Looks up a field by attribute name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, field)| field)
    }

    /// Looks up a field by attribute name.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnknownField`] if the table has no such field.
    pub fn field(&self, name: &str) -> Result<&Field> {
        self.get(name).ok_or_else(|| QueryError::UnknownField {
            table: self.reference.table_name().to_string(),
            field: name.to_string(),
        })
    }

    /// Fields in declaration order, with their attribute names.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(attr, field)| (attr.as_str(), field))
    }
}

impl Index<&str> for Table {
    type Output = Field;

    fn index(&self, name: &str) -> &Field {
        match self.get(name) {
            Some(field) => field,
            None => panic!("table '{}' has no field '{name}'", self.table_name()),
        }
    }
}

/// Builder for [`Table`].
#[derive(Debug, Clone)]
#[must_use]
pub struct TableBuilder {
    table_name: String,
    alias: Option<String>,
    fields: Vec<(String, Field)>,
    verbose_name: Option<String>,
}

impl TableBuilder {
    /// Declares a field. A second declaration with the same name replaces
    /// the first in place.
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        let name = name.into();
        if let Some(slot) = self.fields.iter_mut().find(|(attr, _)| *attr == name) {
            slot.1 = field;
        } else {
            self.fields.push((name, field));
        }
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn verbose_name(mut self, name: impl Into<String>) -> Self {
        self.verbose_name = Some(name.into());
        self
    }

    /// Binds every field and returns the table.
    ///
    /// An `id` primary key (`serial`, not null) is added first unless a
    /// field already resolves to the `id` column, by attribute or by
    /// explicit name.
    pub fn build(self) -> Table {
        let reference = match self.alias {
            Some(alias) => TableRef::aliased(self.table_name, alias),
            None => TableRef::new(self.table_name),
        };

        let mut declared = self.fields;
        let has_id = declared
            .iter()
            .any(|(attr, field)| field.name().unwrap_or(attr) == "id");
        if !has_id {
            declared.insert(0, ("id".to_string(), Field::serial().not_null().primary()));
        }

        let fields = declared
            .into_iter()
            .map(|(attr, field)| {
                let bound = field.bind(&reference, &attr);
                (attr, bound)
            })
            .collect();

        Table {
            reference,
            fields,
            verbose_name: self.verbose_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Table {
        Table::builder("users")
            .field("name", Field::text().not_null())
            .field("email", Field::text().unique())
            .build()
    }

    #[test]
    fn test_implicit_id_first() {
        let table = users();
        let names: Vec<&str> = table.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["id", "name", "email"]);

        let id = &table["id"];
        assert_eq!(id.column_type(), "serial");
        assert!(id.is_primary());
        assert!(!id.is_nullable());
    }

    #[test]
    fn test_declared_id_is_kept() {
        let table = Table::builder("tokens")
            .field("token", Field::text())
            .field("id", Field::new("uuid").primary().not_null())
            .build();
        let names: Vec<&str> = table.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["token", "id"]);
        assert_eq!(table["id"].column_type(), "uuid");
    }

    #[test]
    fn test_named_id_column_suppresses_implicit_id() {
        let table = Table::builder("tokens")
            .field("ident", Field::new("uuid").named("id").primary())
            .build();
        let columns: Vec<&str> = table.fields().filter_map(|(_, f)| f.name()).collect();
        assert_eq!(columns, vec!["id"]);
        assert_eq!(table["ident"].column_type(), "uuid");
        assert!(table.get("id").is_none());
    }

    #[test]
    fn test_fields_are_bound() {
        let table = users();
        for (_, field) in table.fields() {
            assert_eq!(field.table(), Some(table.reference()));
        }
        assert_eq!(table["email"].qualified_name().unwrap(), r#""users"."email""#);
    }

    #[test]
    fn test_table_ref_display() {
        assert_eq!(TableRef::new("users").to_string(), r#""users""#);
        assert_eq!(
            TableRef::aliased("users", "author").to_string(),
            r#""users" "author""#
        );
    }

    #[test]
    fn test_aliased_rebinds_copies() {
        let table = users();
        let author = table.aliased("author");

        assert_eq!(author.table_name(), "users");
        assert_eq!(author.alias(), "author");
        assert_eq!(
            author["name"].qualified_name().unwrap(),
            r#""author"."name""#
        );
        assert_eq!(table["name"].qualified_name().unwrap(), r#""users"."name""#);
        assert_ne!(author.reference(), table.reference());
    }

    #[test]
    fn test_unknown_field() {
        let table = users();
        assert!(table.get("missing").is_none());
        assert_eq!(
            table.field("missing").unwrap_err(),
            QueryError::UnknownField {
                table: "users".to_string(),
                field: "missing".to_string(),
            }
        );
    }

    #[test]
    #[should_panic(expected = "has no field")]
    fn test_index_panics_on_unknown_field() {
        let _ = &users()["missing"];
    }

    #[test]
    fn test_redeclared_field_replaces() {
        let table = Table::builder("users")
            .field("name", Field::text())
            .field("name", Field::varchar(80))
            .build();
        assert_eq!(table.fields().count(), 2);
        assert_eq!(table["name"].column_type(), "varchar(80)");
    }
}
