//! Composable SQL expressions.
//!
//! An [`Expression`] is a SQL template with one slot per argument, the
//! arguments themselves, and the set of tables it reads from. Arguments are
//! either bound values, nested expressions, or column references; nested
//! expressions are kept as a tree and only flattened when the statement is
//! compiled, so placeholder numbering is decided once for the whole query.
//!
//! # Example
//!
//! ```rust
//! use oxide_query::{Field, Operators, Table};
//!
//! let users = Table::builder("users")
//!     .field("name", Field::text())
//!     .field("age", Field::integer())
//!     .build();
//!
//! let cond = users["age"].ge(18).and(users["name"].icontains("ann"));
//! let compiled = cond.build().unwrap();
//!
//! assert_eq!(
//!     compiled.sql,
//!     r#"(((("users"."age") >= $1)) AND ((("users"."name") ILIKE '%' || $2 || '%')))"#
//! );
//! assert_eq!(compiled.params.len(), 2);
//! ```

use std::collections::BTreeSet;

use crate::error::{QueryError, Result};
use crate::render::{self, Compiled, PlaceholderStyle, SLOT};
use crate::table::TableRef;
use crate::value::{SqlValue, ToSqlValue};

/// Set of tables an expression or query reads from.
pub type Dependencies = BTreeSet<TableRef>;

/// A reference to a column, rendered as a qualified identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    /// Column name.
    pub name: String,
    /// Owning table; `None` for a field that was never bound.
    pub table: Option<TableRef>,
}

impl ColumnRef {
    /// Renders `"alias"."name"`.
    pub fn to_sql(&self) -> Result<String> {
        match &self.table {
            Some(table) => Ok(format!(
                "{}.{}",
                render::quote_identifier(table.alias()),
                render::quote_identifier(&self.name)
            )),
            None => Err(QueryError::UnboundField(self.name.clone())),
        }
    }
}

/// An argument filling one slot of an expression template.
#[derive(Debug, Clone)]
pub enum Arg {
    /// A bound parameter.
    Value(SqlValue),
    /// A nested expression, inlined at compile time.
    Expr(Expression),
    /// A column reference, rendered inline.
    Column(ColumnRef),
}

/// The right-hand side of an operator: a scalar or another expression.
#[derive(Debug, Clone)]
pub enum Operand {
    /// A bound parameter.
    Value(SqlValue),
    /// An expression.
    Expr(Expression),
}

impl<T: ToSqlValue> From<T> for Operand {
    fn from(value: T) -> Self {
        Self::Value(value.to_sql_value())
    }
}

impl From<Expression> for Operand {
    fn from(expr: Expression) -> Self {
        Self::Expr(expr)
    }
}

impl From<&Expression> for Operand {
    fn from(expr: &Expression) -> Self {
        Self::Expr(expr.clone())
    }
}

impl Operand {
    fn into_arg(self) -> Arg {
        match self {
            Self::Value(v) => Arg::Value(v),
            Self::Expr(e) => Arg::Expr(e),
        }
    }

    fn dependencies(&self) -> Option<&Dependencies> {
        match self {
            Self::Value(_) => None,
            Self::Expr(e) => Some(&e.dependencies),
        }
    }
}

#[derive(Debug, Clone)]
struct JsonPath {
    base: Expression,
    keys: Vec<SqlValue>,
}

/// An immutable, composable SQL fragment.
///
/// Operators never modify their operands; they build a new node that holds
/// the operands as nested arguments.
#[derive(Debug, Clone)]
pub struct Expression {
    template: String,
    args: Vec<Arg>,
    dependencies: Dependencies,
    json_path: Option<Box<JsonPath>>,
}

impl Expression {
    /// Creates an expression from a `{}`-style template and its arguments.
    ///
    /// ```rust
    /// use oxide_query::Expression;
    ///
    /// let expr = Expression::new("LOWER({}) = {}", ["Ann", "ann"]).unwrap();
    /// assert_eq!(expr.build().unwrap().sql, "LOWER($1) = $2");
    /// ```
    pub fn new<I, O>(template: &str, args: I) -> Result<Self>
    where
        I: IntoIterator<Item = O>,
        O: Into<Operand>,
    {
        let template = render::slots_from_braces(template);
        let operands: Vec<Operand> = args.into_iter().map(Into::into).collect();
        let slots = render::slot_count(&template);
        if slots != operands.len() {
            return Err(QueryError::ArgumentMismatch {
                slots,
                args: operands.len(),
            });
        }
        Ok(Self::from_operands(template, operands))
    }

    /// Creates an expression from raw SQL with no parameters.
    ///
    /// **Warning**: Only use this for SQL fragments that don't contain user input.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            template: sql.into(),
            args: vec![],
            dependencies: Dependencies::new(),
            json_path: None,
        }
    }

    /// Creates a parameterized value expression.
    #[must_use]
    pub fn value<T: ToSqlValue>(value: T) -> Self {
        Self {
            template: SLOT.to_string(),
            args: vec![Arg::Value(value.to_sql_value())],
            dependencies: Dependencies::new(),
            json_path: None,
        }
    }

    /// Creates a function call `NAME(arg, ...)`.
    #[must_use]
    pub fn func<I, O>(name: &str, args: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<Operand>,
    {
        let operands: Vec<Operand> = args.into_iter().map(Into::into).collect();
        let slots = vec![SLOT.to_string(); operands.len()];
        let template = format!("{name}({})", slots.join(", "));
        Self::from_operands(template, operands)
    }

    /// Creates a column reference expression.
    #[must_use]
    pub fn column(column: ColumnRef) -> Self {
        let mut dependencies = Dependencies::new();
        if let Some(table) = &column.table {
            dependencies.insert(table.clone());
        }
        Self {
            template: SLOT.to_string(),
            args: vec![Arg::Column(column)],
            dependencies,
            json_path: None,
        }
    }

    /// Creates an expression from an already-compiled template and its
    /// flattened parameters.
    pub(crate) fn precompiled(template: String, params: Vec<SqlValue>) -> Self {
        Self {
            template,
            args: params.into_iter().map(Arg::Value).collect(),
            dependencies: Dependencies::new(),
            json_path: None,
        }
    }

    pub(crate) fn from_parts(template: String, args: Vec<Arg>, dependencies: Dependencies) -> Self {
        Self {
            template,
            args,
            dependencies,
            json_path: None,
        }
    }

    fn from_operands(template: String, operands: Vec<Operand>) -> Self {
        let mut dependencies = Dependencies::new();
        for operand in &operands {
            if let Some(deps) = operand.dependencies() {
                dependencies.extend(deps.iter().cloned());
            }
        }
        Self {
            template,
            args: operands.into_iter().map(Operand::into_arg).collect(),
            dependencies,
            json_path: None,
        }
    }

    /// Returns the template with unresolved slots.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the direct (not yet flattened) arguments.
    #[must_use]
    pub fn args(&self) -> &[Arg] {
        &self.args
    }

    /// Returns the tables this expression reads from.
    #[must_use]
    pub fn dependencies(&self) -> &Dependencies {
        &self.dependencies
    }

    /// Returns true if this expression is a JSON path extraction.
    #[must_use]
    pub fn is_json_path(&self) -> bool {
        self.json_path.is_some()
    }

    /// Compiles the expression.
    ///
    /// Bound values are appended to `out` in slot order and their slots are
    /// left in the returned text; nested expressions and column references
    /// are inlined.
    pub fn compile(&self, out: &mut Vec<SqlValue>) -> Result<String> {
        let mut sql = String::with_capacity(self.template.len());
        let mut args = self.args.iter();
        for ch in self.template.chars() {
            if ch != SLOT {
                sql.push(ch);
                continue;
            }
            match args.next() {
                Some(Arg::Value(value)) => {
                    out.push(value.clone());
                    sql.push(SLOT);
                }
                Some(Arg::Expr(expr)) => sql.push_str(&expr.compile(out)?),
                Some(Arg::Column(column)) => sql.push_str(&column.to_sql()?),
                None => {
                    return Err(QueryError::ArgumentMismatch {
                        slots: render::slot_count(&self.template),
                        args: self.args.len(),
                    });
                }
            }
        }
        Ok(sql)
    }

    /// Compiles and renders the expression with `$n` placeholders.
    pub fn build(&self) -> Result<Compiled> {
        self.build_with(PlaceholderStyle::Dollar)
    }

    /// Compiles and renders the expression with the given placeholder style.
    pub fn build_with(&self, style: PlaceholderStyle) -> Result<Compiled> {
        let mut params = Vec::new();
        let template = self.compile(&mut params)?;
        Ok(Compiled::new(&template, params, style))
    }

    /// Builds `((self) op before(right)after)`, or with a bare slot for a
    /// scalar right-hand side.
    fn binary(&self, op: &str, operand: Operand, before: &str, after: &str) -> Self {
        let mut dependencies = self.dependencies.clone();
        if let Some(deps) = operand.dependencies() {
            dependencies.extend(deps.iter().cloned());
        }
        let right = match operand {
            Operand::Expr(_) => format!("{before}({SLOT}){after}"),
            Operand::Value(_) => format!("{before}{SLOT}{after}"),
        };
        Self {
            template: format!("(({SLOT}) {op} {right})"),
            args: vec![Arg::Expr(self.clone()), operand.into_arg()],
            dependencies,
            json_path: None,
        }
    }

    fn postfix(&self, op: &str) -> Self {
        Self {
            template: format!("(({SLOT}) {op})"),
            args: vec![Arg::Expr(self.clone())],
            dependencies: self.dependencies.clone(),
            json_path: None,
        }
    }

    fn json_get(&self, key: SqlValue) -> Self {
        let (base, mut keys) = match &self.json_path {
            Some(path) => (path.base.clone(), path.keys.clone()),
            None => (self.clone(), Vec::new()),
        };
        keys.push(key);

        let mut template = format!("({SLOT})");
        let last = keys.len() - 1;
        for i in 0..keys.len() {
            template.push_str(if i == last { "->>" } else { "->" });
            template.push(SLOT);
        }

        let mut args = Vec::with_capacity(keys.len() + 1);
        args.push(Arg::Expr(base.clone()));
        args.extend(keys.iter().cloned().map(Arg::Value));

        Self {
            template,
            args,
            dependencies: base.dependencies.clone(),
            json_path: Some(Box::new(JsonPath { base, keys })),
        }
    }
}

/// Operator methods shared by everything that can act as an expression.
///
/// Every method borrows `self` and returns a new [`Expression`].
pub trait Operators {
    /// Returns this value as an expression.
    fn expression(&self) -> Expression;

    /// `=`
    fn eq(&self, value: impl Into<Operand>) -> Expression {
        self.expression().binary("=", value.into(), "", "")
    }

    /// `<>`
    fn ne(&self, value: impl Into<Operand>) -> Expression {
        self.expression().binary("<>", value.into(), "", "")
    }

    /// `AND`
    fn and(&self, value: impl Into<Operand>) -> Expression {
        self.expression().binary("AND", value.into(), "", "")
    }

    /// `OR`
    fn or(&self, value: impl Into<Operand>) -> Expression {
        self.expression().binary("OR", value.into(), "", "")
    }

    /// `>=`
    fn ge(&self, value: impl Into<Operand>) -> Expression {
        self.expression().binary(">=", value.into(), "", "")
    }

    /// `<=`
    fn le(&self, value: impl Into<Operand>) -> Expression {
        self.expression().binary("<=", value.into(), "", "")
    }

    /// `<`
    fn lt(&self, value: impl Into<Operand>) -> Expression {
        self.expression().binary("<", value.into(), "", "")
    }

    /// `>`
    fn gt(&self, value: impl Into<Operand>) -> Expression {
        self.expression().binary(">", value.into(), "", "")
    }

    /// Set membership.
    ///
    /// An expression operand (typically a subquery) renders as `IN (...)`;
    /// a bound array renders as `= ANY($n)`.
    fn any(&self, value: impl Into<Operand>) -> Expression {
        match value.into() {
            operand @ Operand::Expr(_) => self.expression().binary("IN", operand, "", ""),
            operand @ Operand::Value(_) => self.expression().binary("=", operand, "ANY(", ")"),
        }
    }

    /// `BETWEEN low AND high`.
    fn between(&self, low: impl Into<Operand>, high: impl Into<Operand>) -> Expression {
        let expr = self.expression();
        let (low, high) = (low.into(), high.into());
        let mut dependencies = expr.dependencies.clone();
        for operand in [&low, &high] {
            if let Some(deps) = operand.dependencies() {
                dependencies.extend(deps.iter().cloned());
            }
        }
        Expression::from_parts(
            format!("({SLOT}) BETWEEN {SLOT} AND {SLOT}"),
            vec![Arg::Expr(expr), low.into_arg(), high.into_arg()],
            dependencies,
        )
    }

    /// `IS NULL`
    fn is_null(&self) -> Expression {
        self.expression().postfix("IS NULL")
    }

    /// `IS NOT NULL`
    fn is_not_null(&self) -> Expression {
        self.expression().postfix("IS NOT NULL")
    }

    /// `NOT (...)`
    fn not(&self) -> Expression {
        let expr = self.expression();
        let dependencies = expr.dependencies.clone();
        Expression::from_parts(format!("(NOT ({SLOT}))"), vec![Arg::Expr(expr)], dependencies)
    }

    /// `LIKE '%' || value || '%'`
    fn contains(&self, value: impl Into<Operand>) -> Expression {
        self.expression()
            .binary("LIKE", value.into(), "'%' || ", " || '%'")
    }

    /// `ILIKE '%' || value || '%'`
    fn icontains(&self, value: impl Into<Operand>) -> Expression {
        self.expression()
            .binary("ILIKE", value.into(), "'%' || ", " || '%'")
    }

    /// `LIKE value || '%'`
    fn startswith(&self, value: impl Into<Operand>) -> Expression {
        self.expression().binary("LIKE", value.into(), "", " || '%'")
    }

    /// `ILIKE value || '%'`
    fn istartswith(&self, value: impl Into<Operand>) -> Expression {
        self.expression().binary("ILIKE", value.into(), "", " || '%'")
    }

    /// `LIKE '%' || value`
    fn endswith(&self, value: impl Into<Operand>) -> Expression {
        self.expression().binary("LIKE", value.into(), "'%' || ", "")
    }

    /// `ILIKE '%' || value`
    fn iendswith(&self, value: impl Into<Operand>) -> Expression {
        self.expression().binary("ILIKE", value.into(), "'%' || ", "")
    }

    /// POSIX regex match `~`.
    fn matches_regex(&self, value: impl Into<Operand>) -> Expression {
        self.expression().binary("~", value.into(), "", "")
    }

    /// Array containment `@>`.
    fn array_contains(&self, value: impl Into<Operand>) -> Expression {
        self.expression().binary("@>", value.into(), "", "")
    }

    /// Array contained-by `<@`.
    fn array_contained_by(&self, value: impl Into<Operand>) -> Expression {
        self.expression().binary("<@", value.into(), "", "")
    }

    /// Array overlap `&&`.
    fn array_overlap(&self, value: impl Into<Operand>) -> Expression {
        self.expression().binary("&&", value.into(), "", "")
    }

    /// Array concatenation `||`.
    fn array_concat(&self, value: impl Into<Operand>) -> Expression {
        self.expression().binary("||", value.into(), "", "")
    }

    /// JSON key extraction.
    ///
    /// The first step extracts text (`->>`); indexing a JSON path again
    /// navigates the parent steps (`->`) and extracts text at the last one.
    fn get(&self, key: impl ToSqlValue) -> Expression {
        self.expression().json_get(key.to_sql_value())
    }
}

impl Operators for Expression {
    fn expression(&self) -> Expression {
        self.clone()
    }
}
