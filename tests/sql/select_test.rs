//! Tests for SELECT generation from entity graphs.

use insta::assert_snapshot;
use tablemap::config::MapperSettings;
use tablemap::entity::{EntityDescriptor, Entity, EntityDeclaration, FieldKind};
use tablemap::mapper::{IdFilter, Scope, SelectExtension};
use tablemap::query::QueryBase;
use tablemap::sql::{CompareOp, LogicalFilter, SelectBuilder, Value};
use tablemap::Mapper;

struct Customer;

impl Entity for Customer {
    fn declare(entity: &mut EntityDeclaration) {
        entity
            .table("customers", "c")
            .field("id", FieldKind::Integer)
            .field("name", FieldKind::Text);
    }
}

struct Order;

impl Entity for Order {
    fn declare(entity: &mut EntityDeclaration) {
        entity
            .table("orders", "o")
            .join_root()
            .field("id", FieldKind::Integer)
            .field("customerId", FieldKind::Integer)
            .reference_on::<Customer>("customer", "customerId", "id");
    }
}

struct Product;

impl Entity for Product {
    fn declare(entity: &mut EntityDeclaration) {
        entity
            .table("products", "p")
            .field("Id", FieldKind::Integer)
            .field("Name", FieldKind::Text)
            .field("Price", FieldKind::Decimal)
            .field("InStock", FieldKind::Bool)
            .field("AddedOn", FieldKind::DateTime)
            .field("Thumbnail", FieldKind::Bytes)
            .field("Tags", FieldKind::Sequence)
            .field("Supplier", FieldKind::Object);
    }
}

fn order_mapper() -> Mapper<Order, QueryBase> {
    Mapper::with_references(MapperSettings::default()).unwrap()
}

/// Restricts joined customers by name, leaving the root alone.
struct CustomerName(&'static str);

impl SelectExtension<QueryBase> for CustomerName {
    fn extend(
        &self,
        builder: &mut SelectBuilder,
        entity: &EntityDescriptor,
        scope: Scope<'_>,
        _query: &QueryBase,
    ) {
        if let Scope::Joined(reference) = scope {
            assert_eq!(reference.field, "customer");
            builder.filter(entity.table(), "name", CompareOp::Like, self.0);
        }
    }
}

#[test]
fn test_order_customer_select() {
    let sql = order_mapper().statement(&QueryBase::new()).sql;
    assert_snapshot!(sql, @"SELECT o.id, o.customerId, c.id, c.name FROM orders AS o LEFT JOIN customers AS c ON o.customerId = c.id");
}

#[test]
fn test_only_scalar_fields_are_columns() {
    let mapper = Mapper::<Product, QueryBase>::new(MapperSettings::default()).unwrap();
    let sql = mapper.statement(&QueryBase::new()).sql;
    assert_snapshot!(sql, @"SELECT p.Id, p.Name, p.Price, p.InStock, p.AddedOn, p.Thumbnail FROM products AS p");
}

#[test]
fn test_id_filter_binds_in_list() {
    let mapper = order_mapper().with_extension(IdFilter::new("id"));
    let statement = mapper.statement(&QueryBase::new().with_ids(vec![10, 20, 30]));

    assert_snapshot!(statement.sql, @"SELECT o.id, o.customerId, c.id, c.name FROM orders AS o LEFT JOIN customers AS c ON o.customerId = c.id WHERE o.id IN @oid");
    assert_eq!(statement.param("@oid"), Some(&Value::IntList(vec![10, 20, 30])));
}

#[test]
fn test_logical_filter_shapes_where() {
    let mapper = order_mapper().with_extension((IdFilter::new("id"), CustomerName("A%")));
    let filter = LogicalFilter::new()
        .or_field::<Order>("id")
        .unwrap()
        .or_field::<Customer>("name")
        .unwrap();
    let query = QueryBase::new()
        .with_ids(vec![1])
        .with_logical_filter(&filter);

    let statement = mapper.statement(&query);
    assert_snapshot!(statement.sql, @"SELECT o.id, o.customerId, c.id, c.name FROM orders AS o LEFT JOIN customers AS c ON o.customerId = c.id WHERE (o.id IN @oid OR c.name LIKE @cname)");

    let names: Vec<_> = statement.params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["@oid", "@cname"]);
    assert_eq!(statement.param("@cname"), Some(&Value::Text("A%".into())));
}

#[test]
fn test_without_logical_filter_conditions_are_anded() {
    let mapper = order_mapper().with_extension((IdFilter::new("id"), CustomerName("B%")));
    let statement = mapper.statement(&QueryBase::new().with_ids(vec![1, 2]));

    assert_eq!(
        statement.sql.split(" WHERE ").nth(1),
        Some("o.id IN @oid AND c.name LIKE @cname")
    );
}

#[test]
fn test_notification_can_extend_builder() {
    let mut query = QueryBase::new();
    query.on_after_builder_initialized(|builder| {
        builder.select_raw("COUNT(*) OVER () AS total");
    });
    query.on_after_builder_initialized(|builder| {
        builder.where_raw("o.deleted = 0");
    });

    let sql = order_mapper().statement(&query).sql;
    assert_snapshot!(sql, @"SELECT o.id, o.customerId, c.id, c.name, COUNT(*) OVER () AS total FROM orders AS o LEFT JOIN customers AS c ON o.customerId = c.id WHERE o.deleted = 0");
}

#[test]
fn test_build_select_skips_notification() {
    let mut query = QueryBase::new();
    query.on_after_builder_initialized(|builder| {
        builder.where_raw("1 = 0");
    });

    let builder = order_mapper().build_select(&query);
    assert_eq!(builder.where_clause(), None);
}
