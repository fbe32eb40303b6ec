//! Final placeholder rendering.
//!
//! Compilation leaves one [`SLOT`] marker per bound argument in the SQL
//! text. Rendering numbers them in a single left-to-right pass once the
//! whole statement has been assembled, so nested fragments never need to
//! know their final parameter positions.

use crate::value::SqlValue;

/// Marker for an unresolved parameter slot in compiled SQL text.
pub const SLOT: char = '\u{1f}';

/// Placeholder syntax of the target backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderStyle {
    /// `$1, $2, ...` (PostgreSQL).
    #[default]
    Dollar,
    /// `?` for every parameter (SQLite, MySQL).
    Question,
}

/// Replaces every slot in `template` with a positional placeholder.
#[must_use]
pub fn render(template: &str, style: PlaceholderStyle) -> String {
    let mut sql = String::with_capacity(template.len() + 8);
    let mut position = 0_usize;
    for ch in template.chars() {
        if ch == SLOT {
            position += 1;
            match style {
                PlaceholderStyle::Dollar => {
                    sql.push('$');
                    sql.push_str(&position.to_string());
                }
                PlaceholderStyle::Question => sql.push('?'),
            }
        } else {
            sql.push(ch);
        }
    }
    sql
}

/// Counts unresolved slots in compiled text.
#[must_use]
pub fn slot_count(template: &str) -> usize {
    template.chars().filter(|&ch| ch == SLOT).count()
}

/// Converts a `{}`-style template into slot form.
pub(crate) fn slots_from_braces(template: &str) -> String {
    template.replace("{}", &SLOT.to_string())
}

/// Quotes an identifier (table, alias, column) with double quotes.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quotes a string literal with single quotes.
#[must_use]
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// A rendered statement: SQL text plus its ordered parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    /// SQL text with positional placeholders.
    pub sql: String,
    /// Parameters in placeholder order.
    pub params: Vec<SqlValue>,
}

impl Compiled {
    /// Renders a compiled template and its arguments.
    #[must_use]
    pub fn new(template: &str, params: Vec<SqlValue>, style: PlaceholderStyle) -> Self {
        Self {
            sql: render(template, style),
            params,
        }
    }

    /// Consumes the statement and returns the SQL and parameters.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<SqlValue>) {
        (self.sql, self.params)
    }
}

/// Wraps a statement so it runs under a statement timeout.
///
/// The timeout is reset to the server default afterwards. Parameters are
/// passed through untouched.
#[must_use]
pub fn with_statement_timeout(statement: Compiled, timeout_ms: u64) -> Compiled {
    Compiled {
        sql: format!(
            "SET statement_timeout = {timeout_ms};{};SET statement_timeout = DEFAULT;",
            statement.sql
        ),
        params: statement.params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_dollar_numbers_left_to_right() {
        let template = format!("a = {SLOT} AND b = {SLOT} OR c = {SLOT}");
        assert_eq!(
            render(&template, PlaceholderStyle::Dollar),
            "a = $1 AND b = $2 OR c = $3"
        );
    }

    #[test]
    fn test_render_question() {
        let template = format!("a IN ({SLOT}, {SLOT})");
        assert_eq!(render(&template, PlaceholderStyle::Question), "a IN (?, ?)");
        assert_eq!(slot_count(&template), 2);
    }

    #[test]
    fn test_slots_from_braces() {
        assert_eq!(slot_count(&slots_from_braces("LOWER({}) || {}")), 2);
    }

    #[test]
    fn test_quoting_escapes() {
        assert_eq!(quote_identifier("users"), "\"users\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_literal("it's"), "'it''s'");
    }

    #[test]
    fn test_statement_timeout_keeps_params() {
        let compiled = Compiled::new(
            &format!("SELECT {SLOT}"),
            vec![SqlValue::Int(1)],
            PlaceholderStyle::Dollar,
        );
        let wrapped = with_statement_timeout(compiled, 500);
        assert_eq!(
            wrapped.sql,
            "SET statement_timeout = 500;SELECT $1;SET statement_timeout = DEFAULT;"
        );
        assert_eq!(wrapped.params, vec![SqlValue::Int(1)]);
    }
}
