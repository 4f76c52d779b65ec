//! Tests for freezing values into a fixture

use std::rc::Rc;

use autofixture::{
    CompositeCustomization, CustomizationFn, Fixture, FixtureError, FreezeOnMatchCustomization,
    Matching, Specimen,
};

#[derive(Debug, Specimen)]
struct Account {
    owner: String,
}

#[derive(Debug, Specimen)]
struct Transfer {
    from: Rc<Account>,
    to: Rc<Account>,
    amount: u32,
}

#[derive(Debug, Specimen)]
struct Ledger {
    owner: String,
    auditor: String,
}

#[derive(Debug, Default, Specimen)]
#[specimen(default)]
struct Profile {
    nickname: String,
    email: String,
}

/// Test that a frozen type is shared by every consumer
#[test]
fn test_freeze_shares_one_value() {
    let mut fixture = Fixture::new();
    let account: Rc<Account> = fixture.freeze().unwrap();

    let transfer: Transfer = fixture.create().unwrap();
    assert!(Rc::ptr_eq(&transfer.from, &account));
    assert!(Rc::ptr_eq(&transfer.to, &account));
    assert!(account.owner.starts_with("owner"));
}

/// Test that seeded freezing keeps the seed and answers parameter requests
#[test]
fn test_freeze_seeded() {
    let mut fixture = Fixture::new();
    let name: String = fixture.freeze_seeded("Frozen").unwrap();
    assert!(name.starts_with("Frozen"));

    let ledger: Ledger = fixture.create().unwrap();
    assert_eq!(ledger.owner, name);
    assert_eq!(ledger.auditor, name);
}

/// Test that a value frozen by parameter name only answers that parameter
#[test]
fn test_freeze_by_parameter_name() {
    let mut fixture = Fixture::new();
    let owner = fixture
        .freeze_matching(
            FreezeOnMatchCustomization::<String>::new(Matching::PARAMETER_NAME).with_name("owner"),
        )
        .unwrap();

    let ledger: Ledger = fixture.create().unwrap();
    assert_eq!(ledger.owner, owner);
    assert_ne!(ledger.auditor, owner);
    assert!(ledger.auditor.starts_with("auditor"));

    let account: Account = fixture.create().unwrap();
    assert_eq!(account.owner, owner);
    assert_ne!(fixture.create::<String>().unwrap(), owner);
}

/// Test that a value frozen by field name only answers that field
#[test]
fn test_freeze_by_field_name() {
    let mut fixture = Fixture::new();
    let email = fixture
        .freeze_matching(
            FreezeOnMatchCustomization::<String>::new(Matching::FIELD_NAME).with_name("email"),
        )
        .unwrap();

    let profile: Profile = fixture.create().unwrap();
    assert_eq!(profile.email, email);
    assert_ne!(profile.nickname, email);

    let account: Account = fixture.create().unwrap();
    assert_ne!(account.owner, email);
}

/// Test that MEMBER_NAME covers parameters and fields alike
#[test]
fn test_freeze_by_member_name() {
    let mut fixture = Fixture::new();
    let owner = fixture
        .freeze_matching(
            FreezeOnMatchCustomization::<String>::new(Matching::MEMBER_NAME).with_name("owner"),
        )
        .unwrap();

    assert_eq!(fixture.create::<Ledger>().unwrap().owner, owner);
    assert_eq!(fixture.create::<Account>().unwrap().owner, owner);
}

trait Notifier {
    fn sender(&self) -> String;
}

impl autofixture::Reflect for Box<dyn Notifier> {}

#[derive(Debug, Clone, Specimen)]
#[specimen(implements = "Box<dyn Notifier>")]
struct EmailNotifier {
    sender: String,
}

impl Notifier for EmailNotifier {
    fn sender(&self) -> String {
        self.sender.clone()
    }
}

/// Test that a frozen value answers requests for the interfaces it implements
#[test]
fn test_freeze_implemented_interfaces() {
    let mut fixture = Fixture::new();
    let notifier = fixture
        .freeze_matching(FreezeOnMatchCustomization::<EmailNotifier>::new(
            Matching::EXACT_TYPE | Matching::IMPLEMENTED_INTERFACES,
        ))
        .unwrap();

    let boxed: Box<dyn Notifier> = fixture.create().unwrap();
    assert_eq!(boxed.sender(), notifier.sender);
    assert_eq!(fixture.create::<EmailNotifier>().unwrap().sender, notifier.sender);
}

#[derive(Debug, Clone, PartialEq, Specimen)]
struct Shape {
    name: String,
}

#[derive(Debug, Clone, Specimen)]
#[specimen(base_type = "Shape")]
struct Square {
    side: u8,
}

impl From<Square> for Shape {
    fn from(square: Square) -> Self {
        Shape {
            name: format!("square {}", square.side),
        }
    }
}

/// Test that a frozen value answers requests for its base type
#[test]
fn test_freeze_direct_base_type() {
    let mut fixture = Fixture::new();
    let square = fixture
        .freeze_matching(FreezeOnMatchCustomization::<Square>::new(
            Matching::DIRECT_BASE_TYPE,
        ))
        .unwrap();

    let shape: Shape = fixture.create().unwrap();
    assert_eq!(shape.name, format!("square {}", square.side));
}

/// Test that invalid matching criteria are rejected
#[test]
fn test_invalid_matching_is_rejected() {
    let mut fixture = Fixture::new();

    let error = fixture
        .freeze_matching(FreezeOnMatchCustomization::<String>::new(Matching::PARAMETER_NAME))
        .unwrap_err();
    assert!(matches!(error, FixtureError::Configuration(_)));
    assert!(error.to_string().contains("needs a name"));

    let error = fixture
        .freeze_matching(FreezeOnMatchCustomization::<String>::new(Matching::empty()))
        .unwrap_err();
    assert!(matches!(error, FixtureError::Configuration(_)));
}

/// Test that freezing is applied after ordinary customizations of the same batch
#[test]
fn test_freeze_wins_over_registration_in_one_batch() {
    let batch = CompositeCustomization::default()
        .with(FreezeOnMatchCustomization::<Rc<Account>>::new(Matching::EXACT_TYPE))
        .with(CustomizationFn::new(|fixture: &mut Fixture| -> autofixture::Result<()> {
            fixture.register(|| {
                Rc::new(Account {
                    owner: "registered".to_string(),
                })
            })?;
            Ok(())
        }));

    let mut fixture = Fixture::new();
    fixture.customize_with(batch).unwrap();

    let first: Rc<Account> = fixture.create().unwrap();
    let second: Rc<Account> = fixture.create().unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(first.owner, "registered");
}

/// Test that injected values answer exact type requests only
#[test]
fn test_inject_answers_exact_type() {
    let mut fixture = Fixture::new();
    fixture.inject("fixed".to_string());

    let account: Account = fixture.create().unwrap();
    assert_eq!(account.owner, "fixed");
    assert_eq!(fixture.create_seeded::<String>("seed").unwrap(), "fixed");
    assert!(fixture.create::<u8>().unwrap() > 0);
}
