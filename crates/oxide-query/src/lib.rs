//! # oxide-query
//!
//! Composable SQL expressions and a SELECT compiler for PostgreSQL.
//!
//! This crate provides:
//! - An expression algebra where every operator returns a new [`Expression`]
//! - Tables whose fields render as qualified columns and track the tables
//!   they read from
//! - A [`Select`] builder that derives its FROM clause from those
//!   dependencies, minus explicitly joined tables
//! - JSON aggregation with `JSON_AGG` / `JSON_BUILD_OBJECT`
//!
//! ## Building a query
//!
//! ```rust
//! use oxide_query::prelude::*;
//!
//! let users = Table::builder("users")
//!     .field("name", Field::text().not_null())
//!     .field("age", Field::integer())
//!     .build();
//!
//! let (sql, params) = Select::new()
//!     .values([&users["id"], &users["name"]])
//!     .filter([users["age"].ge(18)])
//!     .slice(20, 10)
//!     .build()
//!     .unwrap()
//!     .into_parts();
//!
//! assert_eq!(
//!     sql,
//!     r#"SELECT "users"."id" "id", "users"."name" "name" FROM "users" WHERE (("users"."age") >= $1) OFFSET $2 LIMIT $3"#
//! );
//! assert_eq!(params, vec![SqlValue::Int(18), SqlValue::Int(20), SqlValue::Int(10)]);
//! ```
//!
//! ## SQL Injection Prevention
//!
//! Values are always bound as parameters. Only identifiers and the
//! operator templates themselves end up in the SQL text:
//!
//! ```rust
//! use oxide_query::prelude::*;
//!
//! let users = Table::builder("users").field("name", Field::text()).build();
//! let user_input = "'; DROP TABLE users; --";
//! let compiled = users["name"].eq(user_input).build().unwrap();
//!
//! assert_eq!(compiled.sql, r#"(("users"."name") = $1)"#);
//! assert_eq!(compiled.params, vec![SqlValue::Text(user_input.to_string())]);
//! ```

pub mod aggregate;
pub mod error;
pub mod expr;
pub mod field;
pub mod projection;
pub mod render;
pub mod select;
pub mod table;
pub mod value;

pub use aggregate::JsonList;
pub use error::{QueryError, Result};
pub use expr::{Arg, ColumnRef, Dependencies, Expression, Operand, Operators};
pub use field::{ColumnDefault, Field};
pub use projection::{Projection, ProjectionMap};
pub use render::{with_statement_timeout, Compiled, PlaceholderStyle};
pub use select::{JoinMode, Positional, Select};
pub use table::{Table, TableBuilder, TableRef};
pub use value::{SqlValue, ToSqlValue};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::aggregate::JsonList;
    pub use crate::error::{QueryError, Result};
    pub use crate::expr::{Expression, Operators};
    pub use crate::field::Field;
    pub use crate::projection::ProjectionMap;
    pub use crate::render::{Compiled, PlaceholderStyle};
    pub use crate::select::{JoinMode, Select};
    pub use crate::table::Table;
    pub use crate::value::{SqlValue, ToSqlValue};
}
