use super::*;

#[test]
fn builds_placeholders_in_order() {
    let mut q = sql("SELECT * FROM users WHERE a = ");
    q.push_bind(1).push(" AND b = ").push_bind("x");

    let query = q.build();
    assert_eq!(query.sql(), "SELECT * FROM users WHERE a = ? AND b = ?");
    assert_eq!(query.params(), &[Value::Int(1), Value::from("x")]);
}

#[test]
fn can_compose_fragments() {
    let mut w = Sql::empty();
    w.push(" WHERE id = ").push_bind(42);

    let mut q = sql("SELECT * FROM users");
    q.push_sql(w);

    let query = q.build();
    assert_eq!(query.sql(), "SELECT * FROM users WHERE id = ?");
    assert_eq!(query.params().len(), 1);
}

#[test]
fn bind_list_renders_commas() {
    let mut q = sql("SELECT * FROM users WHERE id IN (");
    q.push_bind_list(vec![1, 2, 3]).push(")");
    let query = q.build();
    assert_eq!(query.sql(), "SELECT * FROM users WHERE id IN (?, ?, ?)");
    assert_eq!(query.placeholder_count(), 3);
}

#[test]
fn bind_list_empty_is_valid_sql() {
    let mut q = sql("SELECT * FROM users WHERE id IN (");
    q.push_bind_list(Vec::<i64>::new()).push(")");
    let query = q.build();
    assert_eq!(query.sql(), "SELECT * FROM users WHERE id IN (NULL)");
    assert!(query.params().is_empty());
}

#[test]
fn push_ident_quotes_with_backticks() {
    let mut q = Sql::empty();
    q.push_ident("users").unwrap();
    q.push(", ");
    q.push_ident("shop.users").unwrap();
    assert_eq!(q.to_sql(), "`users`, `shop`.`users`");
}

#[test]
fn push_ident_rejects_placeholder_characters() {
    let mut q = Sql::empty();
    assert!(q.push_ident("users?").is_err());
    assert!(q.push_ident("").is_err());
}

#[test]
fn placeholder_count_ignores_quoted_text() {
    let query = Query::raw("SELECT '?' AS `q?` FROM t WHERE a = ?");
    assert_eq!(query.placeholder_count(), 1);
}
