mod common;

use common::{MockClient, describe_row, row};
use myorm::{
    Conditions, Database, Dialect, Direction, Entity, FromValue, Join, JoinRepository, JoinSpec,
    Model, ModelRepository, OrmResult, Select, Value,
};

#[derive(Debug, Clone, PartialEq)]
struct User {
    id: Option<i64>,
    name: String,
    email: Option<String>,
    status: String,
}

impl Model for User {
    const TABLE: &'static str = "users";

    fn from_entity(entity: Entity) -> OrmResult<Self> {
        let field = |name: &str| entity.get(name).cloned().unwrap_or(Value::Null);
        Ok(Self {
            id: Option::<i64>::from_value(&field("id")).flatten(),
            name: String::from_value(&field("name")).unwrap_or_default(),
            email: Option::<String>::from_value(&field("email")).flatten(),
            status: String::from_value(&field("status")).unwrap_or_else(|| "new".into()),
        })
    }

    fn to_entity(&self) -> Entity {
        Entity::new()
            .with("id", self.id)
            .with("name", self.name.as_str())
            .with("email", self.email.clone())
            .with("status", self.status.as_str())
    }
}

fn user_row(id: i64, name: &str, email: Option<&str>) -> myorm::Row {
    row([
        ("id", Value::Int(id)),
        ("name", Value::from(name)),
        ("email", Value::from(email)),
        ("status", Value::from("open")),
    ])
}

fn setup() -> (MockClient, Database<MockClient>) {
    let client = MockClient::with_users();
    (client.clone(), Database::new(client, Dialect::Modern))
}

#[tokio::test]
async fn listed_items_update_back_unchanged() {
    let (client, db) = setup();
    let users = ModelRepository::<User, _>::new(&db);
    client.push_result(vec![
        user_row(1, "Ann", Some("ann@example.com")),
        user_row(2, "Bob", None),
    ]);

    let list = users
        .get_item_list(Select::new().order_by("id", Some(Direction::Asc)))
        .await
        .unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(
        client.selects()[0].0,
        "SELECT * FROM `users` ORDER BY `id` ASC"
    );

    assert!(users.update_all(&list).await.unwrap());
    let writes = client.writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(
        writes[0].0,
        "UPDATE `users` SET `name` = ?, `email` = ?, `status` = ? WHERE `id` = ? LIMIT 1"
    );
    assert_eq!(
        writes[0].1,
        vec![
            Value::from("Ann"),
            Value::from("ann@example.com"),
            Value::from("open"),
            Value::Int(1),
        ]
    );
    assert_eq!(writes[1].1[1], Value::Null);
}

#[tokio::test]
async fn rows_missing_required_fields_are_skipped() {
    let (client, db) = setup();
    let users = ModelRepository::<User, _>::new(&db);
    client.push_result(vec![
        user_row(1, "Ann", None),
        row([("id", Value::Int(2)), ("email", Value::from("x@example.com"))]),
    ]);

    let list = users.get_item_list(Select::new()).await.unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].name, "Ann");
}

#[tokio::test]
async fn get_item_by_id_uses_single_row_select() {
    let (client, db) = setup();
    let users = ModelRepository::<User, _>::new(&db);
    client.push_result(vec![user_row(7, "Ann", None)]);

    let user = users.get_item_by_id(7).await.unwrap().unwrap();
    assert_eq!(user.id, Some(7));
    let (sql, params) = &client.selects()[0];
    assert_eq!(sql, "SELECT * FROM `users` WHERE `id` = ? LIMIT 1");
    assert_eq!(params, &vec![Value::Int(7)]);

    assert_eq!(users.get_item_by_id(8).await.unwrap(), None);
}

#[tokio::test]
async fn save_rejects_incomplete_items_without_writing() {
    let (client, db) = setup();
    let users = ModelRepository::<Entity, _>::for_table(&db, "users");

    let missing_name = Entity::new().with("email", "a@example.com");
    assert!(!users.save(&missing_name, false).await.unwrap());
    assert!(client.writes().is_empty());

    let ann = Entity::new().with("name", "Ann").with("nickname", "annie");
    assert!(users.save(&ann, true).await.unwrap());
    let writes = client.writes();
    assert_eq!(
        writes[0].0,
        "INSERT INTO `users` (`name`) VALUES (?) AS `new_table` ON DUPLICATE KEY UPDATE `name` = `new_table`.`name`"
    );
}

#[tokio::test]
async fn save_all_stops_at_first_failure() {
    let (client, db) = setup();
    let users = ModelRepository::<Entity, _>::for_table(&db, "users");
    let items = vec![
        Entity::new().with("name", "Ann"),
        Entity::new().with("email", "no-name@example.com"),
        Entity::new().with("name", "Cid"),
    ];

    assert!(!users.save_all(&items).await.unwrap());
    assert_eq!(client.writes().len(), 1);
}

#[tokio::test]
async fn engine_failures_degrade() {
    let (client, db) = setup();
    let missing = ModelRepository::<Entity, _>::for_table(&db, "missing");

    assert_eq!(missing.get_item_by_id(1).await.unwrap(), None);
    assert!(missing.get_item_list(Select::new()).await.unwrap().is_empty());
    assert_eq!(missing.count().await.unwrap(), 0);

    let users = ModelRepository::<User, _>::new(&db);
    client.fail_writes_after(0);
    let ann = User {
        id: Some(1),
        name: "Ann".into(),
        email: None,
        status: "new".into(),
    };
    assert!(!users.update(&ann).await.unwrap());
    assert!(!users.remove_item_by_id(1).await.unwrap());
}

#[tokio::test]
async fn update_and_remove_need_an_identifier() {
    let (client, db) = setup();
    let users = ModelRepository::<Entity, _>::for_table(&db, "users");

    assert!(!users.update(&Entity::new().with("name", "Ann")).await.unwrap());
    assert!(!users.remove_item(&Entity::new().with("id", "abc")).await.unwrap());
    assert!(client.writes().is_empty());

    assert!(users.remove_item(&Entity::new().with("id", "12")).await.unwrap());
    let writes = client.writes();
    assert_eq!(writes[0].0, "DELETE FROM `users` WHERE `id` = ? LIMIT 1");
    assert_eq!(writes[0].1, vec![Value::Int(12)]);
}

#[tokio::test]
async fn create_item_cleans_on_request() {
    let (client, db) = setup();
    let users = ModelRepository::<Entity, _>::for_table(&db, "users");

    let raw = Entity::new().with("name", "Ann").with("extra", 1);
    let cleaned = users.create_item(raw.clone(), true).await.unwrap().unwrap();
    assert!(!cleaned.contains_key("extra"));
    let kept = users.create_item(raw, false).await.unwrap().unwrap();
    assert!(kept.contains_key("extra"));

    assert_eq!(users.create_item(Entity::new(), false).await.unwrap(), None);
    let batch = vec![
        Entity::new().with("name", "Ann"),
        Entity::new().with("status", "open"),
    ];
    assert_eq!(users.create_items(batch, true).await.unwrap(), None);
    assert!(client.writes().is_empty());
}

#[tokio::test]
async fn id_list_pages_only_with_both_bounds() {
    let (client, db) = setup();
    let users = ModelRepository::<User, _>::new(&db);
    client.push_result(vec![
        row([("id", Value::Int(3))]),
        row([("id", Value::from("n/a"))]),
        row([("id", Value::from("5"))]),
    ]);

    let ids = users.get_item_id_list(Some(10), Some(20)).await.unwrap();
    assert_eq!(ids, vec![3, 5]);
    users.get_item_id_list(Some(10), None).await.unwrap();

    let selects = client.selects();
    assert_eq!(selects[0].0, "SELECT `id` FROM `users` LIMIT 10, 20");
    assert_eq!(selects[1].0, "SELECT `id` FROM `users`");
}

fn orders_client() -> MockClient {
    MockClient::with_users().table(
        "orders",
        vec![
            describe_row("id", "int", "NO", "PRI", None, "auto_increment"),
            describe_row("user_id", "int", "NO", "MUL", None, ""),
            describe_row("total", "decimal(10,2)", "NO", "", None, ""),
            describe_row("note", "text", "YES", "", None, ""),
        ],
    )
}

fn order_spec() -> JoinSpec {
    JoinSpec::new("orders")
        .select("orders", ["id", "total"])
        .select_as("users", "name", "customer")
        .join(
            Join::left("users")
                .on_column("id", "orders", "user_id")
                .on_param("status", "status"),
        )
}

#[tokio::test]
async fn joined_reads_bind_params_before_conditions() {
    let client = orders_client();
    let db = Database::new(client.clone(), Dialect::Modern);
    let mut orders = JoinRepository::<Entity, _>::new(&db, order_spec());
    orders.bind_param("status", "open");

    client.push_result(vec![
        row([
            ("id", Value::Int(1)),
            ("total", Value::Float(9.5)),
            ("customer", Value::from("Ann")),
        ]),
        row([("id", Value::Int(2)), ("customer", Value::Null)]),
    ]);

    let list = orders
        .get_item_list(
            Conditions::new().and("id", vec![1, 2]),
            Some(("customer", Some(Direction::Desc))),
            Some(10),
        )
        .await
        .unwrap();
    // the second row lacks the required `total`
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].get("customer"), Some(&Value::from("Ann")));

    let (sql, params) = &client.selects()[0];
    assert_eq!(
        sql,
        "SELECT `orders`.`id`, `orders`.`total`, `users`.`name` AS `customer` FROM `orders` \
         LEFT JOIN `users` ON `users`.`id` = `orders`.`user_id` AND `users`.`status` = ? \
         WHERE `orders`.`id` IN (?, ?) ORDER BY `customer` DESC LIMIT 10"
    );
    assert_eq!(
        params,
        &vec![Value::from("open"), Value::Int(1), Value::Int(2)]
    );
}

#[tokio::test]
async fn joined_read_without_param_degrades() {
    let client = orders_client();
    let db = Database::new(client.clone(), Dialect::Modern);
    let orders = JoinRepository::<Entity, _>::new(&db, order_spec());

    assert_eq!(orders.get_item_by_id(1).await.unwrap(), None);
    assert!(client.selects().is_empty());

    let orders = orders.with_param("status", "open");
    client.push_result(vec![row([
        ("id", Value::Int(1)),
        ("total", Value::Float(3.0)),
        ("customer", Value::from("Ann")),
    ])]);
    let order = orders.get_item_by_id(1).await.unwrap().unwrap();
    assert_eq!(order.get("total"), Some(&Value::Float(3.0)));
    assert!(client.selects()[0].0.ends_with("WHERE `orders`.`id` IN (?) LIMIT 1"));

    let fields = orders.field_list().await.unwrap();
    let names: Vec<Vec<&str>> = fields.iter().map(|s| s.field_names().collect()).collect();
    assert_eq!(names, vec![vec!["id", "total"], vec!["name"]]);
}
