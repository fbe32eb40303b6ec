//! Named output values shared by [`Select`](crate::Select) and
//! [`JsonList`](crate::JsonList).

use crate::error::Result;
use crate::expr::{Arg, Dependencies, Expression, Operators};
use crate::field::Field;
use crate::render::{quote_literal, SLOT};
use crate::value::{SqlValue, ToSqlValue};

/// A single projected value.
#[derive(Debug, Clone)]
pub enum Projection {
    /// An expression or column.
    Expr(Expression),
    /// A nested object, rendered as `JSON_BUILD_OBJECT(...)`.
    Nested(ProjectionMap),
    /// A bound scalar.
    Value(SqlValue),
}

impl Projection {
    /// Tables this projection reads from.
    #[must_use]
    pub fn dependencies(&self) -> Dependencies {
        match self {
            Self::Expr(expr) => expr.dependencies().clone(),
            Self::Nested(map) => map.dependencies(),
            Self::Value(_) => Dependencies::new(),
        }
    }

    /// Compiles the projected value, appending bound values to `out`.
    pub fn compile(&self, out: &mut Vec<SqlValue>) -> Result<String> {
        match self {
            Self::Expr(expr) => expr.compile(out),
            Self::Nested(map) => map.json_object().compile(out),
            Self::Value(value) => {
                out.push(value.clone());
                Ok(SLOT.to_string())
            }
        }
    }

    fn into_arg(self) -> Arg {
        match self {
            Self::Expr(expr) => Arg::Expr(expr),
            Self::Nested(map) => Arg::Expr(map.json_object()),
            Self::Value(value) => Arg::Value(value),
        }
    }
}

impl<T: ToSqlValue> From<T> for Projection {
    fn from(value: T) -> Self {
        Self::Value(value.to_sql_value())
    }
}

impl From<Expression> for Projection {
    fn from(expr: Expression) -> Self {
        Self::Expr(expr)
    }
}

impl From<&Expression> for Projection {
    fn from(expr: &Expression) -> Self {
        Self::Expr(expr.clone())
    }
}

impl From<&Field> for Projection {
    fn from(field: &Field) -> Self {
        Self::Expr(field.expression())
    }
}

impl From<Field> for Projection {
    fn from(field: Field) -> Self {
        Self::Expr(field.expression())
    }
}

impl From<ProjectionMap> for Projection {
    fn from(map: ProjectionMap) -> Self {
        Self::Nested(map)
    }
}

/// An ordered map of output names to projections.
///
/// Inserting an existing name replaces its value but keeps its position.
#[derive(Debug, Clone, Default)]
pub struct ProjectionMap {
    entries: Vec<(String, Projection)>,
}

impl ProjectionMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Projection>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Projection>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(key, _)| *key == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Projection)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Union of every entry's dependencies, recursively.
    #[must_use]
    pub fn dependencies(&self) -> Dependencies {
        self.entries
            .iter()
            .flat_map(|(_, value)| value.dependencies())
            .collect()
    }

    /// Builds `JSON_BUILD_OBJECT('name', value,...)`.
    #[must_use]
    pub fn json_object(&self) -> Expression {
        let pairs: Vec<String> = self
            .entries
            .iter()
            .map(|(name, _)| format!("{}, {SLOT}", quote_literal(name)))
            .collect();
        let template = format!("JSON_BUILD_OBJECT({})", pairs.join(","));
        let args = self
            .entries
            .iter()
            .map(|(_, value)| value.clone().into_arg())
            .collect();
        Expression::from_parts(template, args, self.dependencies())
    }
}
