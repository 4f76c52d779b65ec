//! Tests for `#[derive(Specimen)]`

use std::collections::BTreeMap;

use autofixture::{Fixture, MemberKind, Reflect, Specimen, TypeKey};

#[derive(Debug, Clone, PartialEq, Specimen)]
struct User {
    id: u32,
    name: String,
    active: bool,
}

/// Test the memberwise model of a named struct
#[test]
fn test_memberwise_model() {
    let model = TypeKey::of::<User>().describe();

    assert_eq!(model.constructors().len(), 1);
    let names: Vec<_> = model.constructors()[0]
        .parameters()
        .iter()
        .map(|parameter| parameter.name)
        .collect();
    assert_eq!(names, vec!["id", "name", "active"]);

    assert_eq!(model.members().len(), 3);
    assert!(model.members().iter().all(|member| !member.auto_populate()));
    assert_eq!(model.member("name").unwrap().info().kind, MemberKind::Field);
}

/// Test that memberwise structs are built through their constructor
#[test]
fn test_memberwise_struct() {
    let fixture = Fixture::new();
    let user: User = fixture.create().unwrap();

    assert!(user.id > 0);
    assert!(user.name.starts_with("name"));
    assert!(user.active);
}

/// Test that bound fields can still be overridden by a composer
#[test]
fn test_bound_fields_are_composable() {
    let fixture = Fixture::new();
    let user = fixture
        .build::<User>()
        .with("name", "alice".to_string())
        .with("active", false)
        .create()
        .unwrap();

    assert_eq!(user.name, "alice");
    assert!(!user.active);
}

#[derive(Debug, Specimen)]
struct Coordinates(i32, i32, String);

/// Test that tuple struct members are named by position
#[test]
fn test_tuple_struct() {
    let fixture = Fixture::new();
    let coordinates: Coordinates = fixture.create().unwrap();
    assert!(coordinates.0 > 0);
    assert!(coordinates.2.starts_with('2'));

    let moved = fixture
        .build::<Coordinates>()
        .with("1", -5i32)
        .create()
        .unwrap();
    assert_eq!(moved.1, -5);
}

#[derive(Debug, Specimen)]
struct Marker;

/// Test that unit structs are supported
#[test]
fn test_unit_struct() {
    let fixture = Fixture::new();
    assert!(fixture.create::<Marker>().is_ok());
}

#[derive(Debug, Default, Specimen)]
#[specimen(default)]
struct Document {
    title: String,
    pages: u16,
    tags: Vec<String>,
    #[specimen(skip)]
    cached: Option<String>,
}

/// Test default construction with auto-populated fields
#[test]
fn test_default_struct_with_skip() {
    let model = TypeKey::of::<Document>().describe();
    assert!(model.member("cached").is_none());
    assert!(model.members().iter().all(|member| member.auto_populate()));

    let fixture = Fixture::new();
    let document: Document = fixture.create().unwrap();
    assert!(document.title.starts_with("title"));
    assert!(document.pages > 0);
    assert_eq!(document.tags.len(), 3);
    assert!(document.cached.is_none());
}

#[derive(Debug, Specimen)]
struct Session {
    token: String,
    #[specimen(skip)]
    retries: u8,
}

/// Test that skipped fields in memberwise structs get their default
#[test]
fn test_memberwise_skip() {
    let fixture = Fixture::new();
    let session: Session = fixture.create().unwrap();
    assert!(session.token.starts_with("token"));
    assert_eq!(session.retries, 0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Specimen)]
enum Priority {
    Low,
    Medium,
    High,
}

/// Test that enum variants are produced in declaration order
#[test]
fn test_enum_variants() {
    assert_eq!(TypeKey::of::<Priority>().describe().variant_count(), 3);

    let fixture = Fixture::new();
    let priorities: Vec<Priority> = fixture.create_many_count(4).unwrap();
    assert_eq!(
        priorities,
        vec![Priority::Low, Priority::Medium, Priority::High, Priority::Low]
    );
}

#[derive(Debug, Specimen)]
struct Pair<K, V> {
    key: K,
    value: V,
}

/// Test generic structs
#[test]
fn test_generic_struct() {
    let fixture = Fixture::new();
    let pair: Pair<String, Vec<u8>> = fixture.create().unwrap();
    assert!(pair.key.starts_with("key"));
    assert_eq!(pair.value.len(), 3);

    let nested: Pair<Priority, BTreeMap<Priority, u8>> = fixture.create().unwrap();
    assert_eq!(nested.key, Priority::Low);
    assert!(!nested.value.is_empty());
}

/// Test that derived names strip module paths
#[test]
fn test_type_name_in_diagnostics() {
    assert_eq!(TypeKey::of::<Pair<String, u8>>().to_string(), "Pair<String, u8>");
    assert!(<User as Reflect>::type_name().ends_with("User"));
}
