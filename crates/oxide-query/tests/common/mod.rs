#![allow(dead_code)]

use oxide_query::{Compiled, Field, SqlValue, Table};

pub fn users() -> Table {
    Table::builder("users")
        .field("name", Field::text().not_null())
        .field("email", Field::text().unique())
        .field("age", Field::integer())
        .field("profile", Field::jsonb())
        .build()
}

pub fn posts() -> Table {
    Table::builder("posts")
        .field("title", Field::text().not_null())
        .field("user_id", Field::integer().not_null())
        .field("tags", Field::new("text[]"))
        .build()
}

pub fn comments() -> Table {
    Table::builder("comments")
        .field("post_id", Field::integer().not_null())
        .field("body", Field::text())
        .build()
}

/// Unwraps a compiled statement, panicking with the error otherwise.
pub fn parts(compiled: oxide_query::Result<Compiled>) -> (String, Vec<SqlValue>) {
    compiled
        .unwrap_or_else(|e| panic!("Failed to compile: {e}"))
        .into_parts()
}

/// Asserts that every `(` has a matching `)`.
pub fn assert_balanced(sql: &str) {
    let mut depth = 0_i32;
    for ch in sql.chars() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                assert!(depth >= 0, "Unbalanced parentheses in: {sql}");
            }
            _ => {}
        }
    }
    assert_eq!(depth, 0, "Unbalanced parentheses in: {sql}");
}

/// Number of `$n` placeholders in the text.
pub fn placeholder_count(sql: &str) -> usize {
    sql.match_indices('$').count()
}
