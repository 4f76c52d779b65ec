//! Tests for one-off builds and per-type customization

use autofixture::{
    Fixture, FixtureConfig, FixtureError, ModelBuilder, NumericSequenceCustomization, Reflect,
    Seed,
};

#[derive(Debug, Default, Clone, PartialEq)]
struct Filter {
    max: i32,
    min: i32,
    label: String,
}

impl Reflect for Filter {
    fn reflect(model: &mut ModelBuilder<Self>) {
        model.constructor(&[], |(): ()| Filter::default());
        model.property("max", |filter: &mut Filter, max: i32| {
            if max < filter.min {
                Err("max below min")
            } else {
                filter.max = max;
                Ok(())
            }
        });
        model.property("min", |filter: &mut Filter, min: i32| {
            if min > filter.max {
                Err("min above max")
            } else {
                filter.min = min;
                Ok(())
            }
        });
        model.field("label", |filter: &mut Filter, label: String| {
            filter.label = label
        });
    }
}

fn sequential_fixture() -> Fixture {
    let mut fixture = Fixture::new();
    fixture.customize_with(NumericSequenceCustomization).unwrap();
    fixture
}

/// Test that a rejecting setter fails the whole specimen
#[test]
fn test_setter_rejection_is_reported() {
    let fixture = sequential_fixture();
    let error = fixture.create::<Filter>().unwrap_err();

    assert!(error.is_user_error());
    assert!(matches!(error, FixtureError::MemberAssignment { .. }));
    assert_eq!(
        error.to_string(),
        "assigning property Filter.min: i32 failed: min above max"
    );
}

/// Test that explicit values are assigned in declaration order, whatever the call order
#[test]
fn test_explicit_values_follow_declaration_order() {
    let fixture = sequential_fixture();
    let filter = fixture
        .build::<Filter>()
        .with("min", 5i32)
        .with("max", 6i32)
        .create()
        .unwrap();

    assert_eq!(filter.min, 5);
    assert_eq!(filter.max, 6);
    assert!(filter.label.starts_with("label"));
}

/// Test that excluded members keep the value the constructor gave them
#[test]
fn test_without_leaves_member_alone() {
    let fixture = sequential_fixture();
    let filter = fixture
        .build::<Filter>()
        .with("max", 10i32)
        .without("min")
        .without("label")
        .create()
        .unwrap();

    assert_eq!(filter, Filter {
        max: 10,
        min: 0,
        label: String::new()
    });
}

/// Test that actions run after assignment, in call order
#[test]
fn test_perform_runs_after_assignment() {
    let fixture = Fixture::new();
    let filter = fixture
        .build::<Filter>()
        .with("max", 3i32)
        .with("min", 1i32)
        .with_factory("label", || "raw".to_string())
        .perform(|filter| filter.max *= 10)
        .perform(|filter| filter.label.push_str("-done"))
        .create()
        .unwrap();

    assert_eq!(filter.max, 30);
    assert_eq!(filter.min, 1);
    assert_eq!(filter.label, "raw-done");
}

/// Test that a customization applies to every later specimen, nested or not
#[test]
fn test_customize_applies_to_every_specimen() {
    let mut fixture = Fixture::new();
    fixture
        .customize::<Filter, _>(|composer| composer.with("max", 100i32).with("min", 50i32))
        .unwrap();

    let filters: Vec<Filter> = fixture.create_many().unwrap();
    assert_eq!(filters.len(), 3);
    assert!(filters.iter().all(|filter| filter.max == 100 && filter.min == 50));

    let pair: (Filter, u8) = fixture.create().unwrap();
    assert_eq!(pair.0.max, 100);
}

/// Test that composer mistakes surface as configuration errors
#[test]
fn test_composer_errors_are_reported_before_resolution() {
    let mut fixture = Fixture::new();
    let error = fixture
        .customize::<Filter, _>(|composer| composer.with("maximum", 1i32))
        .err()
        .unwrap();
    assert!(matches!(error, FixtureError::Configuration(_)));
    assert!(error.to_string().contains("Filter has no member `maximum`"));

    let error = fixture
        .build::<Filter>()
        .with("label", 7u8)
        .create()
        .unwrap_err();
    assert!(error.to_string().contains("member `label` of Filter is String, not u8"));
}

/// Test that registered factories bypass auto-population
#[test]
fn test_register_uses_factory_verbatim() {
    let mut fixture = Fixture::new();
    fixture
        .register(|| Filter {
            max: 2,
            min: 1,
            label: "fixed".to_string(),
        })
        .unwrap();

    let filter: Filter = fixture.create().unwrap();
    assert_eq!(filter, Filter {
        max: 2,
        min: 1,
        label: "fixed".to_string()
    });
}

/// Test that registered factories receive anonymous arguments
#[test]
fn test_register_with_resolves_arguments() {
    let mut fixture = sequential_fixture();
    fixture
        .register_with(|(max, label): (i32, String)| Filter { max, min: 0, label })
        .unwrap();

    let first: Filter = fixture.create().unwrap();
    let second: Filter = fixture.create().unwrap();
    assert_eq!(first.max, 1);
    assert_eq!(second.max, 2);
    assert_eq!(first.min, 0);
    assert!(uuid::Uuid::parse_str(&first.label).is_ok());
}

/// Test that seeded factories see the seed of the request
#[test]
fn test_from_seed_uses_request_seed() {
    let mut fixture = Fixture::new();
    fixture
        .customize::<Filter, _>(|composer| {
            composer
                .from_seed(|seed| Filter {
                    label: seed
                        .and_then(Seed::as_text)
                        .unwrap_or("unnamed")
                        .to_string(),
                    ..Filter::default()
                })
                .omit_auto_properties()
        })
        .unwrap();

    let seeded: Filter = fixture.create_seeded("catalog").unwrap();
    assert_eq!(seeded.label, "catalog");
    assert_eq!(seeded.max, 0);

    let plain: Filter = fixture.create().unwrap();
    assert_eq!(plain.label, "unnamed");
}

/// Test that with_auto populates a member even when auto-population is off
#[test]
fn test_with_auto_overrides_global_switch() {
    let config = FixtureConfig::default().with_omit_auto_properties(true);
    let fixture = Fixture::with_config(config).unwrap();

    let untouched: Filter = fixture.create().unwrap();
    assert_eq!(untouched, Filter::default());

    let filter = fixture.build::<Filter>().with_auto("label").create().unwrap();
    assert!(filter.label.starts_with("label"));
    assert_eq!(filter.max, 0);

    let populated = fixture
        .build::<Filter>()
        .with_auto_properties()
        .without("min")
        .create()
        .unwrap();
    assert!(populated.max > 0);
    assert!(!populated.label.is_empty());
}

/// Test create_many on a composer
#[test]
fn test_composer_create_many() {
    let fixture = Fixture::new();
    let filters = fixture
        .build::<Filter>()
        .omit_auto_properties()
        .with("label", "shared".to_string())
        .create_many()
        .unwrap();

    assert_eq!(filters.len(), 3);
    assert!(filters.iter().all(|filter| filter.label == "shared" && filter.max == 0));
}
