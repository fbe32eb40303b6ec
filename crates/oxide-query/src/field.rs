//! Column definitions.
//!
//! A [`Field`] describes one column: its name, SQL type and constraints. A
//! field declared on its own is unbound; [`Table`](crate::Table) binds a copy
//! of it to the table's reference, after which it renders as a qualified
//! column and contributes that table to query dependencies.

use std::fmt;

use crate::error::Result;
use crate::expr::{ColumnRef, Dependencies, Expression, Operand, Operators};
use crate::table::TableRef;
use crate::value::{SqlValue, ToSqlValue};

/// Default value of a column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnDefault {
    /// A literal, rendered escaped.
    Value(SqlValue),
    /// A SQL expression rendered verbatim, e.g. `now()`.
    Expression(String),
}

impl ColumnDefault {
    /// Renders the default for DDL.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Value(value) => value.to_sql_inline(),
            Self::Expression(sql) => sql.clone(),
        }
    }

    /// Returns true for a literal NULL default.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Value(SqlValue::Null))
    }
}

impl fmt::Display for ColumnDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

/// A column definition, optionally bound to a table.
#[derive(Debug, Clone)]
pub struct Field {
    name: Option<String>,
    column_type: String,
    default: Option<ColumnDefault>,
    nullable: bool,
    unique: bool,
    primary: bool,
    check: Option<String>,
    help_text: Option<String>,
    verbose_name: Option<String>,
    table: Option<TableRef>,
}

impl Field {
    /// Creates a nullable field with the given SQL type.
    #[must_use]
    pub fn new(column_type: impl Into<String>) -> Self {
        Self {
            name: None,
            column_type: column_type.into(),
            default: None,
            nullable: true,
            unique: false,
            primary: false,
            check: None,
            help_text: None,
            verbose_name: None,
            table: None,
        }
    }

    #[must_use]
    pub fn text() -> Self {
        Self::new("text")
    }

    #[must_use]
    pub fn integer() -> Self {
        Self::new("integer")
    }

    #[must_use]
    pub fn bigint() -> Self {
        Self::new("bigint")
    }

    #[must_use]
    pub fn serial() -> Self {
        Self::new("serial")
    }

    #[must_use]
    pub fn boolean() -> Self {
        Self::new("boolean")
    }

    #[must_use]
    pub fn jsonb() -> Self {
        Self::new("jsonb")
    }

    #[must_use]
    pub fn timestamptz() -> Self {
        Self::new("timestamptz")
    }

    #[must_use]
    pub fn varchar(length: u32) -> Self {
        Self::new(format!("varchar({length})"))
    }

    /// Sets an explicit column name; otherwise the attribute name is used.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Marks the column `NOT NULL`.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    #[must_use]
    pub const fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the column as the primary key.
    #[must_use]
    pub const fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Sets a literal default.
    #[must_use]
    pub fn default_value<T: ToSqlValue>(mut self, value: T) -> Self {
        self.default = Some(ColumnDefault::Value(value.to_sql_value()));
        self
    }

    /// Sets a SQL expression default, rendered verbatim.
    ///
    /// **Warning**: Only use this for SQL fragments that don't contain user input.
    #[must_use]
    pub fn default_expr(mut self, sql: impl Into<String>) -> Self {
        self.default = Some(ColumnDefault::Expression(sql.into()));
        self
    }

    /// Appends a check constraint clause to the column definition.
    #[must_use]
    pub fn check(mut self, sql: impl Into<String>) -> Self {
        self.check = Some(sql.into());
        self
    }

    #[must_use]
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = Some(text.into());
        self
    }

    #[must_use]
    pub fn verbose_name(mut self, name: impl Into<String>) -> Self {
        self.verbose_name = Some(name.into());
        self
    }

    /// Returns a copy bound to `table`.
    ///
    /// The column name defaults to `attr_name` when none was set explicitly.
    #[must_use]
    pub fn bind(&self, table: &TableRef, attr_name: &str) -> Self {
        let mut bound = self.clone();
        if bound.name.is_none() {
            bound.name = Some(attr_name.to_string());
        }
        bound.table = Some(table.clone());
        bound
    }

    /// Returns true once the field belongs to a table.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.table.is_some()
    }

    /// Column name, if known.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    #[must_use]
    pub fn column_type(&self) -> &str {
        &self.column_type
    }

    #[must_use]
    pub const fn default(&self) -> Option<&ColumnDefault> {
        self.default.as_ref()
    }

    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[must_use]
    pub const fn is_unique(&self) -> bool {
        self.unique
    }

    #[must_use]
    pub const fn is_primary(&self) -> bool {
        self.primary
    }

    #[must_use]
    pub fn check_constraint(&self) -> Option<&str> {
        self.check.as_deref()
    }

    #[must_use]
    pub fn help(&self) -> Option<&str> {
        self.help_text.as_deref()
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.verbose_name.as_deref()
    }

    /// Owning table, once bound.
    #[must_use]
    pub const fn table(&self) -> Option<&TableRef> {
        self.table.as_ref()
    }

    /// Renders `"alias"."name"`.
    ///
    /// # Errors
    ///
    /// [`QueryError::UnboundField`](crate::QueryError::UnboundField) if the
    /// field has no table.
    pub fn qualified_name(&self) -> Result<String> {
        self.column_ref().to_sql()
    }

    /// Returns the owning table as a one-element set, or nothing if unbound.
    #[must_use]
    pub fn dependencies(&self) -> Dependencies {
        self.table.iter().cloned().collect()
    }

    fn column_ref(&self) -> ColumnRef {
        ColumnRef {
            name: self
                .name
                .clone()
                .unwrap_or_else(|| format!("<unnamed {}>", self.column_type)),
            table: self.table.clone(),
        }
    }
}

impl Operators for Field {
    fn expression(&self) -> Expression {
        Expression::column(self.column_ref())
    }
}

impl From<&Field> for Operand {
    fn from(field: &Field) -> Self {
        Self::Expr(field.expression())
    }
}

impl From<Field> for Operand {
    fn from(field: Field) -> Self {
        Self::Expr(field.expression())
    }
}

impl From<&Field> for Expression {
    fn from(field: &Field) -> Self {
        field.expression()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;

    #[test]
    fn test_bind_copies_and_names() {
        let field = Field::text().not_null();
        let table = TableRef::new("users");
        let bound = field.bind(&table, "email");

        assert!(!field.is_bound());
        assert_eq!(field.name(), None);
        assert!(bound.is_bound());
        assert_eq!(bound.name(), Some("email"));
        assert!(!bound.is_nullable());
        assert_eq!(bound.qualified_name().unwrap(), r#""users"."email""#);
    }

    #[test]
    fn test_explicit_name_wins() {
        let bound = Field::text()
            .named("mail")
            .bind(&TableRef::new("users"), "email");
        assert_eq!(bound.name(), Some("mail"));
    }

    #[test]
    fn test_aliased_table_renders_alias() {
        let bound = Field::integer().bind(&TableRef::aliased("users", "u"), "age");
        assert_eq!(bound.qualified_name().unwrap(), r#""u"."age""#);
    }

    #[test]
    fn test_unbound_field_cannot_render() {
        let field = Field::text().named("email");
        assert_eq!(
            field.qualified_name().unwrap_err(),
            QueryError::UnboundField("email".to_string())
        );
        assert!(field.dependencies().is_empty());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(Field::integer().default_value(0).default().unwrap().to_sql(), "0");
        assert_eq!(
            Field::text().default_value("x").default().unwrap().to_sql(),
            "'x'"
        );
        assert_eq!(
            Field::timestamptz()
                .default_expr("now()")
                .default()
                .unwrap()
                .to_sql(),
            "now()"
        );
        assert!(Field::text()
            .default_value(SqlValue::Null)
            .default()
            .unwrap()
            .is_null());
    }

    #[test]
    fn test_field_operators_depend_on_table() {
        let age = Field::integer().bind(&TableRef::new("users"), "age");
        let expr = age.gt(30);
        assert_eq!(expr.dependencies().len(), 1);
        assert_eq!(
            expr.build().unwrap().sql,
            r#"(("users"."age") > $1)"#
        );
    }
}
