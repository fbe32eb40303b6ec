//! JSON aggregation.
//!
//! [`JsonList`] collects rows into a JSON array of objects:
//! `JSON_AGG(JSON_BUILD_OBJECT('k', v,...))`. It is usually projected from
//! a [`Select`](crate::Select) together with a `GROUP BY`.

use crate::expr::{Arg, Expression, Operators};
use crate::projection::{Projection, ProjectionMap};
use crate::render::SLOT;
use crate::field::Field;

/// Builder for a `JSON_AGG` of objects.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct JsonList {
    fields: ProjectionMap,
}

impl JsonList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds fields under their own column names.
    pub fn values<'a>(mut self, fields: impl IntoIterator<Item = &'a Field>) -> Self {
        for field in fields {
            let name = field.name().unwrap_or_default().to_string();
            self.fields.insert(name, field);
        }
        self
    }

    /// Adds a named value.
    pub fn value(mut self, name: impl Into<String>, value: impl Into<Projection>) -> Self {
        self.fields.insert(name, value);
        self
    }

    /// The projected object map.
    #[must_use]
    pub const fn fields(&self) -> &ProjectionMap {
        &self.fields
    }
}

impl Operators for JsonList {
    fn expression(&self) -> Expression {
        let object = self.fields.json_object();
        let dependencies = object.dependencies().clone();
        Expression::from_parts(
            format!("JSON_AGG({SLOT})"),
            vec![Arg::Expr(object)],
            dependencies,
        )
    }
}

impl From<JsonList> for Projection {
    fn from(list: JsonList) -> Self {
        Self::Expr(list.expression())
    }
}

impl From<&JsonList> for Projection {
    fn from(list: &JsonList) -> Self {
        Self::Expr(list.expression())
    }
}
