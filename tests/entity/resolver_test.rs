//! Tests for entity resolution and reference graph construction.

use tablemap::config::MapperSettings;
use tablemap::entity::{resolve, resolve_graph, Entity, EntityDeclaration, FieldKind};
use tablemap::query::QueryBase;
use tablemap::{Mapper, MappingError};

// =============================================================================
// Fixtures
// =============================================================================

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

/// References the same type through two fields.
struct Shipment;

impl Entity for Shipment {
    fn declare(entity: &mut EntityDeclaration) {
        entity
            .table("shipments", "s")
            .join_root()
            .field("Id", FieldKind::Integer)
            .reference::<Customer>("Sender", "SenderId")
            .reference::<Customer>("Receiver", "ReceiverId");
    }
}

struct Country;

impl Entity for Country {
    fn declare(entity: &mut EntityDeclaration) {
        entity.table("countries", "co").field("Id", FieldKind::Integer);
    }
}

struct City;

impl Entity for City {
    fn declare(entity: &mut EntityDeclaration) {
        entity
            .table("cities", "ci")
            .field("Id", FieldKind::Integer)
            .reference::<Country>("Country", "CountryId");
    }
}

struct Currency;

impl Entity for Currency {
    fn declare(entity: &mut EntityDeclaration) {
        entity.table("currencies", "cu").field("Id", FieldKind::Integer);
    }
}

struct Store;

impl Entity for Store {
    fn declare(entity: &mut EntityDeclaration) {
        entity
            .table("stores", "st")
            .join_root()
            .field("Id", FieldKind::Integer)
            .reference::<City>("City", "CityId")
            .reference::<Currency>("Currency", "CurrencyId");
    }
}

struct Employee;

impl Entity for Employee {
    fn declare(entity: &mut EntityDeclaration) {
        entity
            .table("employees", "e")
            .join_root()
            .field("Id", FieldKind::Integer)
            .reference::<Employee>("Manager", "ManagerId");
    }
}

struct Author;

impl Entity for Author {
    fn declare(entity: &mut EntityDeclaration) {
        entity
            .table("authors", "a")
            .join_root()
            .field("Id", FieldKind::Integer)
            .reference::<Book>("LatestBook", "LatestBookId");
    }
}

struct Book;

impl Entity for Book {
    fn declare(entity: &mut EntityDeclaration) {
        entity
            .table("books", "b")
            .field("Id", FieldKind::Integer)
            .reference::<Author>("Author", "AuthorId");
    }
}

struct Unmapped;

impl Entity for Unmapped {
    fn declare(entity: &mut EntityDeclaration) {
        entity.join_root().field("Id", FieldKind::Integer);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_order_customer_graph() {
    let graph = resolve_graph::<Order>().unwrap();

    assert_eq!(graph.root().table_name(), "orders");
    assert_eq!(graph.root().alias(), "o");
    assert_eq!(graph.len(), 1);

    let customer = &graph.references()[0];
    assert_eq!(customer.field, "customer");
    assert_eq!(customer.foreign_key, "customerId");
    assert_eq!(customer.target_column, "id");
    assert_eq!(customer.target.table_name(), "customers");
    assert_eq!(customer.on_expr().to_sql(), "o.customerId = c.id");
}

#[test]
fn test_selectable_fields_skip_reference_fields() {
    let order = resolve::<Order>().unwrap();
    let fields: Vec<_> = order.selectable_fields().collect();
    assert_eq!(fields, vec!["id", "customerId"]);
}

#[test]
fn test_graph_is_preorder() {
    let graph = resolve_graph::<Store>().unwrap();

    let visited: Vec<_> = graph
        .references()
        .iter()
        .map(|r| (r.target.alias(), r.source.alias.as_str(), r.depth))
        .collect();

    // Parent before children, siblings in declared order
    assert_eq!(
        visited,
        vec![("ci", "st", 0), ("co", "ci", 1), ("cu", "st", 0)]
    );
}

#[test]
fn test_same_type_appears_once_per_field() {
    let graph = resolve_graph::<Shipment>().unwrap();

    let fields: Vec<_> = graph.references().iter().map(|r| r.field.as_str()).collect();
    assert_eq!(fields, vec!["Sender", "Receiver"]);
    assert!(graph
        .references()
        .iter()
        .all(|r| r.target.table_name() == "customers"));
}

#[test]
fn test_same_type_twice_clashes_on_alias_in_mapper() {
    let result = Mapper::<Shipment, QueryBase>::with_references(MapperSettings::default());
    match result {
        Err(MappingError::DuplicateAlias { alias, .. }) => assert_eq!(alias, "c"),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("expected a duplicate alias error"),
    }
}

#[test]
fn test_self_reference_is_a_cycle() {
    let err = resolve_graph::<Employee>().unwrap_err();
    assert!(err.is_cycle());

    let MappingError::CyclicReference(path) = err else {
        panic!("expected a cycle");
    };
    assert_eq!(path.len(), 2);
    assert!(path.iter().all(|name| name.ends_with("Employee")));
}

#[test]
fn test_indirect_cycle_reports_path() {
    let err = resolve_graph::<Author>().unwrap_err();
    let MappingError::CyclicReference(path) = &err else {
        panic!("expected a cycle, got {}", err);
    };

    let short: Vec<_> = path
        .iter()
        .map(|name| name.rsplit("::").next().unwrap_or(name))
        .collect();
    assert_eq!(short, vec!["Author", "Book", "Author"]);
    assert!(err.to_string().contains(" -> "));
}

#[test]
fn test_missing_table() {
    let err = resolve::<Unmapped>().unwrap_err();
    assert!(matches!(err, MappingError::MissingTable(_)));

    let err = resolve_graph::<Unmapped>().unwrap_err();
    assert!(matches!(err, MappingError::MissingTable(_)));
}

#[test]
fn test_graph_requires_join_root() {
    let err = resolve_graph::<Customer>().unwrap_err();
    assert!(matches!(err, MappingError::MissingJoinRoot(name) if name.ends_with("Customer")));
}

#[test]
fn test_table_only_mapper_ignores_references() {
    let mapper = Mapper::<Order, QueryBase>::new(MapperSettings::default()).unwrap();
    assert!(mapper.graph().is_empty());
    assert_eq!(mapper.root().alias(), "o");
}
