//! Integration test: directory metadata and events.
//!
//! 1. Oracle metadata is set at creation and editable by the owner
//! 2. Symbols and names stay unique across the directory
//! 3. Provider names are kept and renamed
//! 4. Ownership transfer moves every admin right
//! 5. Events record successful calls only and serialize as tagged JSON

use msoracle_core::{NewOracle, OracleDirectory, OracleError};
use msoracle_integration_tests::{account, new_oracle, Fixture, OWNER};
use msoracle_types::events::OracleEvent;
use msoracle_types::MAX_SYMBOL_LEN;

#[test]
fn set_and_retrieve_metadata() {
    let mut dir = OracleDirectory::new(OWNER);
    let id = dir
        .create_oracle(
            OWNER,
            NewOracle {
                symbol: "TEST-META".to_string(),
                name: "Test oracle metadata".to_string(),
                decimals: 18,
                token: account(5),
                maintainer: "Test maintainer field".to_string(),
            },
        )
        .expect("create");

    let meta = dir.metadata(id).expect("metadata").clone();
    assert_eq!(meta.symbol, "TEST-META");
    assert_eq!(meta.name, "Test oracle metadata");
    assert_eq!(meta.decimals, 18);
    assert_eq!(meta.token, account(5));
    assert_eq!(meta.maintainer, "Test maintainer field");

    dir.set_maintainer(OWNER, id, "test maintainer updated".to_string())
        .expect("maintainer");
    dir.set_name(OWNER, id, "test update name".to_string())
        .expect("name");

    let meta = dir.metadata(id).expect("metadata");
    assert_eq!(meta.maintainer, "test maintainer updated");
    assert_eq!(meta.name, "test update name");
    assert_eq!(meta.symbol, "TEST-META");
}

#[test]
fn symbols_and_names_are_unique() {
    let mut dir = OracleDirectory::new(OWNER);
    let first = dir.create_oracle(OWNER, new_oracle("ETH-USD")).expect("create");
    let second = dir.create_oracle(OWNER, new_oracle("BTC-USD")).expect("create");

    assert_eq!(
        dir.create_oracle(OWNER, new_oracle("ETH-USD")),
        Err(OracleError::DuplicateInstance("ETH-USD".to_string()))
    );
    assert_eq!(
        dir.set_name(OWNER, second, "ETH-USD oracle".to_string()),
        Err(OracleError::NameAlreadyInUse("ETH-USD oracle".to_string()))
    );

    // A released name becomes available again.
    dir.set_name(OWNER, first, "Ether".to_string()).expect("rename");
    dir.set_name(OWNER, second, "ETH-USD oracle".to_string())
        .expect("reuse released name");
    assert_eq!(dir.find_by_name("ETH-USD oracle"), Some(second));
    assert_eq!(dir.find_by_name("Ether"), Some(first));
    assert_eq!(dir.len(), 2);
}

#[test]
fn symbol_length_bounds() {
    let mut dir = OracleDirectory::new(OWNER);
    let longest = "S".repeat(MAX_SYMBOL_LEN);
    dir.create_oracle(OWNER, new_oracle(&longest))
        .expect("32-byte symbol");

    let too_long = "S".repeat(MAX_SYMBOL_LEN + 1);
    assert_eq!(
        dir.create_oracle(OWNER, new_oracle(&too_long)),
        Err(OracleError::SymbolTooLong {
            len: MAX_SYMBOL_LEN + 1,
            max: MAX_SYMBOL_LEN
        })
    );
    assert_eq!(
        dir.create_oracle(OWNER, new_oracle("")),
        Err(OracleError::EmptySymbol)
    );
}

#[test]
fn provider_names_are_listed_and_renamed() {
    let mut fixture = Fixture::with_providers(2).expect("fixture");
    fixture.provide(2, 10).expect("provide");
    let oracle = fixture.oracle;

    fixture
        .directory
        .rename_provider(OWNER, oracle, account(1), "alpha".to_string())
        .expect("rename");
    assert_eq!(
        fixture
            .directory
            .rename_provider(account(1), oracle, account(1), "self".to_string()),
        Err(OracleError::UnauthorizedCaller(account(1)))
    );
    assert_eq!(
        fixture
            .directory
            .rename_provider(OWNER, oracle, account(7), "ghost".to_string()),
        Err(OracleError::ProviderNotFound(account(7)))
    );

    let providers = fixture.directory.providers(oracle).expect("providers");
    assert_eq!(providers.len(), 2);
    assert_eq!(providers[0].address, account(2));
    assert_eq!(providers[0].value, Some(10));
    assert_eq!(providers[1].name, "alpha");
    assert_eq!(providers[1].value, None);
}

#[test]
fn ownership_transfer_moves_admin_rights() {
    let mut fixture = Fixture::with_providers(1).expect("fixture");
    let oracle = fixture.oracle;
    let next = account(77);

    fixture
        .directory
        .transfer_ownership(OWNER, next)
        .expect("transfer");
    assert_eq!(
        fixture
            .directory
            .add_provider(OWNER, oracle, account(2), String::new()),
        Err(OracleError::UnauthorizedCaller(OWNER))
    );
    fixture
        .directory
        .add_provider(next, oracle, account(2), String::new())
        .expect("new owner adds");
    fixture
        .directory
        .pause_oracle(next, oracle)
        .expect("new owner pauses");
    assert_eq!(
        fixture.directory.pause_all(OWNER),
        Err(OracleError::NotAuthorizedToPause(OWNER))
    );
}

#[test]
fn events_track_successful_calls() {
    let mut fixture = Fixture::with_providers(1).expect("fixture");
    let oracle = fixture.oracle;
    fixture.directory.drain_events();

    let _ = fixture.provide(1, 0);
    let _ = fixture.directory.set_name(OWNER, oracle, String::new());
    assert!(fixture.directory.drain_events().is_empty());

    fixture.provide(1, 42).expect("provide");
    fixture
        .directory
        .set_upgrade(OWNER, oracle, None)
        .expect("clear upgrade");
    fixture.directory.pause_all(OWNER).expect("pause all");

    let events = fixture.directory.drain_events();
    assert_eq!(
        events,
        vec![
            OracleEvent::Provided {
                oracle,
                provider: account(1),
                value: 42
            },
            OracleEvent::Upgraded {
                oracle,
                successor: None
            },
            OracleEvent::Paused {
                oracle: None,
                by: OWNER
            },
        ]
    );

    let json = serde_json::to_value(&events[0]).expect("serialize");
    assert_eq!(json["event_type"], "provided");
    assert_eq!(json["value"], "42");
    assert_eq!(json["provider"], account(1).to_string());
    let back: OracleEvent = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back, events[0]);
}
