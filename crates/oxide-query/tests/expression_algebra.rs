//! Tests for operator composition: parenthesization, argument order and
//! dependency tracking across tables and aliases.

mod common;
use common::*;

use oxide_query::prelude::*;
use oxide_query::TableRef;

// ===================================================================
// Composition
// ===================================================================

#[test]
fn composed_operands_keep_left_then_right_arguments() {
    let users = users();
    let left = users["age"].ge(18).and(users["age"].lt(65));
    let right = users["name"].icontains("ann").or(users["email"].endswith("@corp"));
    let expr = left.and(&right);

    let (sql, params) = parts(expr.build());
    assert_balanced(&sql);
    assert_eq!(placeholder_count(&sql), 4);
    assert_eq!(
        params,
        vec![
            SqlValue::Int(18),
            SqlValue::Int(65),
            SqlValue::Text("ann".into()),
            SqlValue::Text("@corp".into()),
        ]
    );
    assert!(sql.find("$1").unwrap() < sql.find("$4").unwrap());
}

#[test]
fn argument_count_is_sum_of_operands() {
    let users = users();
    let a = users["age"].between(10, 20);
    let b = users["name"].eq("x").or(users["name"].eq("y"));

    let (_, a_params) = parts(a.build());
    let (_, b_params) = parts(b.build());
    let (sql, params) = parts(a.and(&b).build());

    assert_eq!(params.len(), a_params.len() + b_params.len());
    assert_eq!(placeholder_count(&sql), params.len());
    assert_balanced(&sql);
}

#[test]
fn dependencies_are_the_union_of_operands() {
    let users = users();
    let posts = posts();
    let expr = posts["user_id"].eq(&users["id"]).and(posts["title"].ne("draft"));

    let deps: Vec<&TableRef> = expr.dependencies().iter().collect();
    assert_eq!(deps, vec![posts.reference(), users.reference()]);
}

#[test]
fn scalar_operand_adds_no_dependency() {
    let users = users();
    let expr = users["age"].gt(1);
    assert_eq!(expr.dependencies().len(), 1);
    assert!(expr.dependencies().contains(users.reference()));
}

// ===================================================================
// Aliases
// ===================================================================

#[test]
fn aliases_are_independent_identities() {
    let users = users();
    let author = users.aliased("author");
    let editor = users.aliased("editor");

    let expr = author["id"].eq(&editor["id"]);
    assert_eq!(expr.dependencies().len(), 2);

    let (sql, _) = parts(expr.build());
    assert_eq!(sql, r#"(("author"."id") = ("editor"."id"))"#);

    assert_eq!(author["id"].table(), Some(author.reference()));
    assert_eq!(editor["id"].table(), Some(editor.reference()));
    assert_eq!(users["id"].table(), Some(users.reference()));
}

// ===================================================================
// JSON and arrays
// ===================================================================

#[test]
fn json_path_navigates_parents_and_extracts_last() {
    let users = users();
    let city = users["profile"].get("address").get("city");
    let (sql, params) = parts(city.eq("Paris").build());

    assert_eq!(sql, r#"((("users"."profile")->$1->>$2) = $3)"#);
    assert_eq!(
        params,
        vec![
            SqlValue::Text("address".into()),
            SqlValue::Text("city".into()),
            SqlValue::Text("Paris".into()),
        ]
    );
    assert!(city.dependencies().contains(users.reference()));
}

#[test]
fn array_operators_bind_arrays() {
    let posts = posts();
    let (sql, params) = parts(
        posts["tags"]
            .array_contains(vec!["rust"])
            .or(posts["tags"].array_contained_by(vec!["a", "b"]))
            .build(),
    );
    assert_eq!(
        sql,
        r#"(((("posts"."tags") @> $1)) OR ((("posts"."tags") <@ $2)))"#
    );
    assert_eq!(params.len(), 2);
}

#[test]
fn concat_against_another_column() {
    let posts = posts();
    let (sql, _) = parts(posts["tags"].array_concat(&posts["tags"]).build());
    assert_eq!(sql, r#"(("posts"."tags") || ("posts"."tags"))"#);
}

// ===================================================================
// Subqueries
// ===================================================================

#[test]
fn any_accepts_a_subquery() {
    let users = users();
    let posts = posts();
    let authors = Select::new()
        .values([&posts["user_id"]])
        .filter([posts["title"].startswith("Rust")])
        .subquery()
        .unwrap();

    let expr = users["id"].any(authors);
    let (sql, params) = parts(expr.build());
    assert_eq!(
        sql,
        r#"(("users"."id") IN (SELECT "posts"."user_id" "user_id" FROM "posts" WHERE (("posts"."title") LIKE $1 || '%')))"#
    );
    assert_eq!(params, vec![SqlValue::Text("Rust".into())]);
    assert_eq!(expr.dependencies().len(), 1);
}

#[test]
fn question_placeholders() {
    let users = users();
    let compiled = users["age"]
        .between(1, 2)
        .build_with(PlaceholderStyle::Question)
        .unwrap();
    assert_eq!(compiled.sql, r#"("users"."age") BETWEEN ? AND ?"#);
}

#[test]
fn unbound_field_fails_to_render() {
    let loose = Field::integer().named("score");
    assert_eq!(
        loose.gt(3).build().unwrap_err(),
        QueryError::UnboundField("score".into())
    );
}
