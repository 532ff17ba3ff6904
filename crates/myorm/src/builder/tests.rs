use super::*;
use crate::condition::{Conditions, Direction, Filter};
use crate::schema::{FieldDescriptor, KeyRole, TableSchema};
use crate::sql::Query;
use crate::value::{Entity, Value};

fn users() -> TableSchema {
    TableSchema::new(
        "users",
        vec![
            FieldDescriptor::new("id", "int(11)")
                .key(KeyRole::Primary)
                .extra("auto_increment"),
            FieldDescriptor::new("name", "varchar(64)"),
            FieldDescriptor::new("email", "varchar(128)").nullable(),
            FieldDescriptor::new("status", "varchar(16)").default_value("new"),
        ],
    )
    .unwrap()
}

fn assert_balanced(query: &Query) {
    assert_eq!(query.placeholder_count(), query.params().len(), "{}", query.sql());
}

#[test]
fn test_select_all() {
    let query = Select::new().build(&users()).unwrap();
    assert_eq!(query.sql(), "SELECT * FROM `users`");
    assert!(query.params().is_empty());
}

#[test]
fn test_select_empty_list_is_null_test() {
    let query = Select::new()
        .filter("status", Vec::<Value>::new())
        .build(&users())
        .unwrap();
    assert_eq!(query.sql(), "SELECT * FROM `users` WHERE `status` IS NULL");
    assert!(query.params().is_empty());
}

#[test]
fn test_select_conditions() {
    let query = Select::new()
        .filter("status", vec!["new", "open"])
        .filter("email", Filter::not_null())
        .filter("name", "Ann")
        .order_by("id", Some(Direction::Desc))
        .limit(20)
        .build(&users())
        .unwrap();
    assert_eq!(
        query.sql(),
        "SELECT * FROM `users` WHERE `status` IN (?, ?) AND `email` IS NOT NULL \
         AND `name` = ? ORDER BY `id` DESC LIMIT 20"
    );
    assert_eq!(
        query.params(),
        &[Value::from("new"), Value::from("open"), Value::from("Ann")]
    );
    assert_balanced(&query);
}

#[test]
fn test_select_sentinel_and_falsy_values() {
    let conditions = Conditions::new()
        .and("email", "IS NOT NULL")
        .and("name", "")
        .and("status", 0);
    let query = Select::new().conditions(conditions).build(&users()).unwrap();
    assert_eq!(
        query.sql(),
        "SELECT * FROM `users` WHERE `email` IS NOT NULL AND `name` IS NULL AND `status` IS NULL"
    );
    assert!(query.params().is_empty());
}

#[test]
fn test_select_drops_unknown_columns() {
    let query = Select::new()
        .filter("password", "hunter2")
        .filter("name", "Ann")
        .order_by("nope", None)
        .limit(1)
        .build(&users())
        .unwrap();
    assert_eq!(query.sql(), "SELECT * FROM `users` WHERE `name` = ? LIMIT 1");
    assert_eq!(query.params(), &[Value::from("Ann")]);
}

#[test]
fn test_select_single_row_flag() {
    assert!(Select::new().limit(1).is_single_row());
    assert!(!Select::new().limit(2).is_single_row());
    assert!(!Select::new().is_single_row());
}

#[test]
fn test_insert_one_modern_upsert() {
    let entity = Entity::new().with("name", "Ann").with("email", "ann@example.com");
    let query = insert_one(&users(), &entity, InsertOptions::upsert(), Dialect::Modern).unwrap();
    assert_eq!(
        query.sql(),
        "INSERT INTO `users` (`name`, `email`) VALUES (?, ?) AS `new_table` \
         ON DUPLICATE KEY UPDATE `name` = `new_table`.`name`, `email` = `new_table`.`email`"
    );
    assert_eq!(
        query.params(),
        &[Value::from("Ann"), Value::from("ann@example.com")]
    );
}

#[test]
fn test_insert_one_legacy_upsert() {
    let entity = Entity::new().with("name", "Ann").with("email", "ann@example.com");
    let query = insert_one(&users(), &entity, InsertOptions::upsert(), Dialect::Legacy).unwrap();
    assert_eq!(
        query.sql(),
        "INSERT INTO `users` (`name`, `email`) VALUES (?, ?) \
         ON DUPLICATE KEY UPDATE `name` = VALUES(`name`), `email` = VALUES(`email`)"
    );
    assert_balanced(&query);
}

#[test]
fn test_insert_one_follows_schema_order_and_skips_unknown() {
    let entity = Entity::new()
        .with("status", "open")
        .with("name", "Ann")
        .with("nickname", "annie")
        .with("email", Value::Null);
    let query = insert_one(&users(), &entity, InsertOptions::ignore(), Dialect::Modern).unwrap();
    assert_eq!(
        query.sql(),
        "INSERT IGNORE INTO `users` (`name`, `status`) VALUES (?, ?)"
    );
    assert_eq!(query.params(), &[Value::from("Ann"), Value::from("open")]);
}

#[test]
fn test_insert_one_without_known_fields_fails() {
    let entity = Entity::new().with("nickname", "annie");
    let err = insert_one(&users(), &entity, InsertOptions::plain(), Dialect::Modern).unwrap_err();
    assert!(matches!(err, crate::OrmError::Validation(_)));
}

#[test]
fn test_insert_many_updates_only_populated_fields() {
    let entities = vec![
        Entity::new().with("name", "Ann"),
        Entity::new().with("name", "Bob").with("email", Value::Null),
        Entity::new().with("id", 7).with("name", "Cid").with("status", "open"),
    ];
    let query = insert_many(&users(), &entities, InsertOptions::upsert(), Dialect::Modern).unwrap();
    assert_eq!(
        query.sql(),
        "INSERT INTO `users` (`id`, `name`, `email`, `status`) VALUES \
         (DEFAULT, ?, DEFAULT, DEFAULT), (DEFAULT, ?, NULL, DEFAULT), (?, ?, DEFAULT, ?) \
         AS `new_table` ON DUPLICATE KEY UPDATE `id` = `new_table`.`id`, \
         `name` = `new_table`.`name`, `status` = `new_table`.`status`"
    );
    assert_eq!(
        query.params(),
        &[
            Value::from("Ann"),
            Value::from("Bob"),
            Value::Int(7),
            Value::from("Cid"),
            Value::from("open"),
        ]
    );
    assert_balanced(&query);
}

#[test]
fn test_insert_many_legacy() {
    let entities = vec![
        Entity::new().with("name", "Ann"),
        Entity::new().with("name", "Bob"),
    ];
    let query = insert_many(&users(), &entities, InsertOptions::upsert(), Dialect::Legacy).unwrap();
    assert_eq!(
        query.sql(),
        "INSERT INTO `users` (`name`) VALUES (?), (?) \
         ON DUPLICATE KEY UPDATE `name` = VALUES(`name`)"
    );
}

#[test]
fn test_insert_many_empty_batch_fails() {
    assert!(insert_many(&users(), &[], InsertOptions::plain(), Dialect::Modern).is_err());
}

#[test]
fn test_update_one() {
    let entity = Entity::new()
        .with("id", 3)
        .with("email", Value::Null)
        .with("name", "Ann")
        .with("nickname", "annie");
    let query = update_one(&users(), &entity).unwrap();
    assert_eq!(
        query.sql(),
        "UPDATE `users` SET `name` = ?, `email` = ? WHERE `id` = ? LIMIT 1"
    );
    assert_eq!(
        query.params(),
        &[Value::from("Ann"), Value::Null, Value::Int(3)]
    );
}

#[test]
fn test_update_one_requires_id() {
    let entity = Entity::new().with("name", "Ann");
    assert!(matches!(
        update_one(&users(), &entity),
        Err(crate::OrmError::Validation(_))
    ));

    let only_id = Entity::new().with("id", 3);
    assert!(update_one(&users(), &only_id).is_err());
}

#[test]
fn test_update_many_case_per_field() {
    let entities = vec![
        Entity::new().with("id", 1).with("name", "Ann"),
        Entity::new().with("id", 2).with("status", "done"),
        Entity::new().with("name", "nobody"),
    ];
    let query = update_many(&users(), &entities).unwrap();
    assert_eq!(
        query.sql(),
        "UPDATE `users` SET \
         `name` = CASE WHEN `id` = ? THEN ? ELSE `name` END, \
         `status` = CASE WHEN `id` = ? THEN ? ELSE `status` END \
         WHERE `id` IN (?, ?)"
    );
    assert_eq!(
        query.params(),
        &[
            Value::Int(1),
            Value::from("Ann"),
            Value::Int(2),
            Value::from("done"),
            Value::Int(1),
            Value::Int(2),
        ]
    );
    assert_balanced(&query);
}

#[test]
fn test_update_many_without_fields_fails() {
    let entities = vec![Entity::new().with("id", 1), Entity::new().with("id", 2)];
    assert!(matches!(
        update_many(&users(), &entities),
        Err(crate::OrmError::Validation(_))
    ));
}

#[test]
fn test_delete_one() {
    let query = delete_one(&users(), 9).unwrap();
    assert_eq!(query.sql(), "DELETE FROM `users` WHERE `id` = ? LIMIT 1");
    assert_eq!(query.params(), &[Value::Int(9)]);
}

#[test]
fn test_delete_many_mixed_targets() {
    let targets = vec![
        Target::from(1_i64),
        Target::from(Entity::new().with("id", 2).with("name", "Bob")),
        Target::from(Entity::new().with("name", "no id")),
        Target::Id(Value::Null),
    ];
    let query = delete_many(&users(), &targets).unwrap();
    assert_eq!(query.sql(), "DELETE FROM `users` WHERE `id` IN (?, ?)");
    assert_eq!(query.params(), &[Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_delete_many_without_ids_fails() {
    let targets = vec![Target::from(Entity::new().with("name", "no id"))];
    assert!(delete_many(&users(), &targets).is_err());
}

#[test]
fn test_identifier_field_comes_from_primary_key() {
    let schema = TableSchema::new(
        "tags",
        vec![
            FieldDescriptor::new("tag_id", "int").key(KeyRole::Primary),
            FieldDescriptor::new("label", "varchar(32)"),
        ],
    )
    .unwrap();
    let query = delete_one(&schema, 4).unwrap();
    assert_eq!(query.sql(), "DELETE FROM `tags` WHERE `tag_id` = ? LIMIT 1");

    let entity = Entity::new().with("tag_id", 4).with("label", "rust");
    let query = update_one(&schema, &entity).unwrap();
    assert_eq!(
        query.sql(),
        "UPDATE `tags` SET `label` = ? WHERE `tag_id` = ? LIMIT 1"
    );
}
