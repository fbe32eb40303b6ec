//! SELECT statement builder.
//!
//! The FROM clause is never written by hand: every projected value, filter,
//! group and join condition contributes the tables it reads from, and the
//! FROM list is that set minus the tables that were joined explicitly.
//!
//! # Example
//!
//! ```rust
//! use oxide_query::{Field, Operators, Select, Table};
//!
//! let users = Table::builder("users").field("name", Field::text()).build();
//! let posts = Table::builder("posts")
//!     .field("title", Field::text())
//!     .field("user_id", Field::integer())
//!     .build();
//!
//! let query = Select::new()
//!     .values([&users["name"], &posts["title"]])
//!     .join(&posts, posts["user_id"].eq(&users["id"]))
//!     .filter([users["name"].startswith("A")])
//!     .limit(10);
//!
//! let (sql, params) = query.build().unwrap().into_parts();
//! assert_eq!(
//!     sql,
//!     r#"SELECT "users"."name" "name", "posts"."title" "title" FROM "users" LEFT JOIN "posts" ON (("posts"."user_id") = ("users"."id")) WHERE (("users"."name") LIKE $1 || '%') LIMIT $2"#
//! );
//! assert_eq!(params.len(), 2);
//! ```

use std::fmt;

use crate::error::{QueryError, Result};
use crate::expr::{Dependencies, Expression};
use crate::field::Field;
use crate::projection::{Projection, ProjectionMap};
use crate::render::{quote_identifier, Compiled, PlaceholderStyle, SLOT};
use crate::table::{Table, TableRef};
use crate::value::SqlValue;

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinMode {
    #[default]
    Left,
    Right,
    Full,
    Inner,
}

impl JoinMode {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Full => "FULL",
            Self::Inner => "INNER",
        }
    }
}

impl fmt::Display for JoinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value handed to [`Select::value_positional`].
///
/// Only fields carry a name of their own, so only they can be projected
/// positionally.
#[derive(Debug, Clone)]
pub enum Positional {
    Field(Field),
    Expr(Expression),
    Value(SqlValue),
}

impl Positional {
    fn kind(&self) -> &'static str {
        match self {
            Self::Field(_) => "field",
            Self::Expr(_) => "expression",
            Self::Value(_) => "value",
        }
    }
}

impl From<Field> for Positional {
    fn from(field: Field) -> Self {
        Self::Field(field)
    }
}

impl From<&Field> for Positional {
    fn from(field: &Field) -> Self {
        Self::Field(field.clone())
    }
}

impl From<Expression> for Positional {
    fn from(expr: Expression) -> Self {
        Self::Expr(expr)
    }
}

impl From<SqlValue> for Positional {
    fn from(value: SqlValue) -> Self {
        Self::Value(value)
    }
}

#[derive(Debug, Clone)]
struct Join {
    table: TableRef,
    mode: JoinMode,
    condition: Expression,
}

/// A SELECT query under construction.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct Select {
    fields: ProjectionMap,
    joins: Vec<Join>,
    filters: Vec<Expression>,
    groups: Vec<Expression>,
    offset: Option<u64>,
    limit: Option<u64>,
    dependencies: Dependencies,
}

impl Select {
    pub fn new() -> Self {
        Self::default()
    }

    /// Projects fields under their own column names.
    pub fn values<'a>(mut self, fields: impl IntoIterator<Item = &'a Field>) -> Self {
        for field in fields {
            self.add_field(field);
        }
        self
    }

    /// Projects a dynamically typed value positionally.
    ///
    /// # Errors
    ///
    /// [`QueryError::InvalidPositional`] unless the value is a field.
    pub fn value_positional(mut self, value: impl Into<Positional>) -> Result<Self> {
        match value.into() {
            Positional::Field(field) => {
                self.add_field(&field);
                Ok(self)
            }
            other => Err(QueryError::InvalidPositional(other.kind().to_string())),
        }
    }

    /// Projects a value under `name`.
    pub fn value(mut self, name: impl Into<String>, value: impl Into<Projection>) -> Self {
        let value = value.into();
        self.dependencies.extend(value.dependencies());
        self.fields.insert(name, value);
        self
    }

    fn add_field(&mut self, field: &Field) {
        self.dependencies.extend(field.dependencies());
        let name = field.name().unwrap_or_default().to_string();
        self.fields.insert(name, field);
    }

    /// `LEFT JOIN table ON condition`.
    pub fn join(self, table: &Table, condition: Expression) -> Self {
        self.join_with(table, condition, JoinMode::Left)
    }

    /// `RIGHT JOIN table ON condition`.
    pub fn join_right(self, table: &Table, condition: Expression) -> Self {
        self.join_with(table, condition, JoinMode::Right)
    }

    /// `FULL JOIN table ON condition`.
    pub fn join_full(self, table: &Table, condition: Expression) -> Self {
        self.join_with(table, condition, JoinMode::Full)
    }

    /// Joins `table` explicitly, removing it from the implicit FROM list.
    ///
    /// Joining the same table again replaces the earlier join.
    pub fn join_with(mut self, table: &Table, condition: Expression, mode: JoinMode) -> Self {
        self.dependencies
            .extend(condition.dependencies().iter().cloned());
        let join = Join {
            table: table.reference().clone(),
            mode,
            condition,
        };
        if let Some(existing) = self.joins.iter_mut().find(|j| j.table == join.table) {
            *existing = join;
        } else {
            self.joins.push(join);
        }
        self
    }

    /// Adds conditions, AND-ed with any existing ones.
    pub fn filter(mut self, conditions: impl IntoIterator<Item = Expression>) -> Self {
        for condition in conditions {
            self.dependencies
                .extend(condition.dependencies().iter().cloned());
            self.filters.push(condition);
        }
        self
    }

    /// Replaces the GROUP BY list.
    pub fn group<I, E>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expression>,
    {
        self.groups = exprs.into_iter().map(Into::into).collect();
        for group in &self.groups {
            self.dependencies.extend(group.dependencies().iter().cloned());
        }
        self
    }

    /// `LIMIT n`, clearing any offset.
    pub const fn limit(mut self, limit: u64) -> Self {
        self.offset = None;
        self.limit = Some(limit);
        self
    }

    /// `OFFSET offset LIMIT limit`.
    pub const fn slice(mut self, offset: u64, limit: u64) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    /// Every table the query reads from, joined or not.
    #[must_use]
    pub const fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    /// Tables rendered in the FROM clause.
    pub fn from_tables(&self) -> impl Iterator<Item = &TableRef> {
        self.dependencies
            .iter()
            .filter(move |table| !self.joins.iter().any(|join| &join.table == *table))
    }

    /// Compiles the query, appending bound values to `out` in slot order.
    ///
    /// # Errors
    ///
    /// - [`QueryError::NoProjection`] when nothing is selected.
    /// - [`QueryError::EmptyFrom`] when every referenced table is joined.
    /// - [`QueryError::UnboundField`] when a column has no table.
    pub fn compile(&self, out: &mut Vec<SqlValue>) -> Result<String> {
        if self.fields.is_empty() {
            return Err(QueryError::NoProjection);
        }
        let from: Vec<String> = self.from_tables().map(TableRef::to_sql).collect();
        if from.is_empty() {
            return Err(QueryError::EmptyFrom);
        }

        let mut sql = vec!["SELECT".to_string()];

        let mut values = Vec::with_capacity(self.fields.len());
        for (name, value) in self.fields.iter() {
            values.push(format!("{} {}", value.compile(out)?, quote_identifier(name)));
        }
        sql.push(values.join(", "));

        sql.push("FROM".to_string());
        sql.push(from.join(", "));

        for join in &self.joins {
            sql.push(format!(
                "{} JOIN {} ON {}",
                join.mode,
                join.table,
                join.condition.compile(out)?
            ));
        }

        if !self.filters.is_empty() {
            let filters = self
                .filters
                .iter()
                .map(|f| f.compile(out))
                .collect::<Result<Vec<_>>>()?;
            sql.push("WHERE".to_string());
            sql.push(filters.join(" AND "));
        }

        if !self.groups.is_empty() {
            let groups = self
                .groups
                .iter()
                .map(|g| g.compile(out))
                .collect::<Result<Vec<_>>>()?;
            sql.push("GROUP BY".to_string());
            sql.push(groups.join(", "));
        }

        if let Some(offset) = self.offset {
            out.push(bound_count(offset));
            sql.push(format!("OFFSET {SLOT}"));
        }
        if let Some(limit) = self.limit {
            out.push(bound_count(limit));
            sql.push(format!("LIMIT {SLOT}"));
        }

        Ok(sql.join(" "))
    }

    /// Compiles and renders with `$n` placeholders.
    pub fn build(&self) -> Result<Compiled> {
        self.build_with(PlaceholderStyle::Dollar)
    }

    /// Compiles and renders with the given placeholder style.
    pub fn build_with(&self, style: PlaceholderStyle) -> Result<Compiled> {
        self.wrapped("", "", style)
    }

    /// `SELECT 1 FROM (query)`.
    pub fn exists(&self) -> Result<Compiled> {
        self.wrapped("SELECT 1 FROM (", ")", PlaceholderStyle::Dollar)
    }

    /// Aggregates every row into one JSON array of row objects.
    pub fn as_json(&self) -> Result<Compiled> {
        self.wrapped(
            "SELECT JSON_AGG(ROW_TO_JSON) FROM (SELECT ROW_TO_JSON(s) FROM (",
            ") s) s",
            PlaceholderStyle::Dollar,
        )
    }

    /// `SELECT ARRAY(query)`.
    pub fn as_list(&self) -> Result<Compiled> {
        self.wrapped("SELECT ARRAY(", ")", PlaceholderStyle::Dollar)
    }

    /// `SELECT COUNT(1) FROM (query)`.
    pub fn count(&self) -> Result<Compiled> {
        self.wrapped("SELECT COUNT(1) FROM (", ")", PlaceholderStyle::Dollar)
    }

    /// Turns the query into an expression operand, e.g. for
    /// [`Operators::any`](crate::Operators::any).
    ///
    /// The SQL is left bare; operators parenthesize expression operands
    /// themselves. The subquery carries no dependencies of its own, so it
    /// never leaks its tables into the outer FROM clause.
    pub fn subquery(&self) -> Result<Expression> {
        let mut params = Vec::new();
        let sql = self.compile(&mut params)?;
        Ok(Expression::precompiled(sql, params))
    }

    fn wrapped(&self, prefix: &str, suffix: &str, style: PlaceholderStyle) -> Result<Compiled> {
        let mut params = Vec::new();
        let sql = self.compile(&mut params)?;
        Ok(Compiled::new(
            &format!("{prefix}{sql}{suffix}"),
            params,
            style,
        ))
    }
}

fn bound_count(n: u64) -> SqlValue {
    SqlValue::Int(i64::try_from(n).unwrap_or(i64::MAX))
}
