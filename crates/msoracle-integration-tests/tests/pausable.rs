//! Integration test: pause gates.
//!
//! Exercises per-oracle and global pausing through the directory:
//! 1. Owner and delegated pausers may pause, outsiders may not
//! 2. Only the owner may start again
//! 3. Pausing twice and starting an open gate both fail
//! 4. A paused gate rejects reads and submissions but not admin metadata
//! 5. The global gate closes every oracle at once

use msoracle_core::{OracleError, PauseGate};
use msoracle_integration_tests::{account, new_oracle, Fixture, OWNER};

const PAUSER: u8 = 40;
const OUTSIDER: u8 = 41;

#[test]
fn pausable_by_pauser() {
    let mut fixture = Fixture::with_providers(1).expect("fixture");
    let oracle = fixture.oracle;
    fixture
        .directory
        .set_oracle_pauser(OWNER, oracle, account(PAUSER), true)
        .expect("grant pauser");
    fixture
        .directory
        .pause_oracle(account(PAUSER), oracle)
        .expect("pauser pauses");
    assert_eq!(fixture.directory.is_oracle_paused(oracle), Ok(true));
}

#[test]
fn pausable_by_owner() {
    let mut fixture = Fixture::with_providers(1).expect("fixture");
    let oracle = fixture.oracle;
    fixture
        .directory
        .pause_oracle(OWNER, oracle)
        .expect("owner pauses");
    assert_eq!(fixture.directory.is_oracle_paused(oracle), Ok(true));
}

#[test]
fn not_pausable_by_outsider() {
    let mut fixture = Fixture::with_providers(1).expect("fixture");
    let oracle = fixture.oracle;
    let err = fixture
        .directory
        .pause_oracle(account(OUTSIDER), oracle)
        .expect_err("outsider");
    assert_eq!(err, OracleError::NotAuthorizedToPause(account(OUTSIDER)));
    assert_eq!(fixture.directory.is_oracle_paused(oracle), Ok(false));
}

#[test]
fn restartable_only_by_owner() {
    let mut fixture = Fixture::with_providers(1).expect("fixture");
    let oracle = fixture.oracle;
    let dir = &mut fixture.directory;
    dir.set_oracle_pauser(OWNER, oracle, account(PAUSER), true)
        .expect("grant pauser");
    dir.pause_oracle(account(PAUSER), oracle).expect("pause");

    assert_eq!(
        dir.start_oracle(account(PAUSER), oracle),
        Err(OracleError::UnauthorizedCaller(account(PAUSER)))
    );
    assert_eq!(
        dir.start_oracle(account(OUTSIDER), oracle),
        Err(OracleError::UnauthorizedCaller(account(OUTSIDER)))
    );
    dir.start_oracle(OWNER, oracle).expect("owner starts");
    assert_eq!(dir.is_oracle_paused(oracle), Ok(false));
}

#[test]
fn start_and_pause_preconditions() {
    let mut fixture = Fixture::with_providers(1).expect("fixture");
    let oracle = fixture.oracle;
    let dir = &mut fixture.directory;

    assert_eq!(dir.start_oracle(OWNER, oracle), Err(OracleError::NotPaused));
    dir.pause_oracle(OWNER, oracle).expect("pause");
    assert_eq!(
        dir.pause_oracle(OWNER, oracle),
        Err(OracleError::AlreadyPaused)
    );
}

#[test]
fn paused_oracle_rejects_reads_and_writes() {
    let mut fixture = Fixture::with_providers(2).expect("fixture");
    fixture.provide(1, 100_000).expect("provide");
    let oracle = fixture.oracle;
    fixture
        .directory
        .pause_oracle(OWNER, oracle)
        .expect("pause");

    assert_eq!(fixture.sample(), Err(OracleError::Paused));
    assert_eq!(fixture.provide(2, 200_000), Err(OracleError::Paused));
    assert_eq!(
        fixture
            .directory
            .add_provider(OWNER, oracle, account(3), String::new()),
        Err(OracleError::Paused)
    );

    // Metadata stays editable while paused.
    fixture
        .directory
        .set_maintainer(OWNER, oracle, "on call".to_string())
        .expect("maintainer");

    fixture
        .directory
        .start_oracle(OWNER, oracle)
        .expect("start");
    assert_eq!(fixture.sample().expect("sample").aggregate, 100_000);
}

#[test]
fn global_pause_closes_every_oracle() {
    let mut fixture = Fixture::with_providers(1).expect("fixture");
    fixture.provide(1, 100_000).expect("provide");
    let second = fixture
        .directory
        .create_oracle(OWNER, new_oracle("SECOND"))
        .expect("second oracle");

    let dir = &mut fixture.directory;
    dir.set_global_pauser(OWNER, account(PAUSER), true)
        .expect("grant global pauser");
    dir.pause_all(account(PAUSER)).expect("global pause");
    assert!(dir.is_paused());
    assert_eq!(dir.is_oracle_paused(fixture.oracle), Ok(true));
    assert_eq!(dir.is_oracle_paused(second), Ok(true));

    // The oracle's own gate is still open.
    assert!(!dir.oracle(fixture.oracle).expect("oracle").gate().is_paused());
    assert_eq!(
        dir.start_all(account(PAUSER)),
        Err(OracleError::UnauthorizedCaller(account(PAUSER)))
    );

    dir.start_all(OWNER).expect("global start");
    assert_eq!(fixture.sample().expect("sample").aggregate, 100_000);
}

#[test]
fn revoked_global_pauser_cannot_pause() {
    let mut fixture = Fixture::with_providers(1).expect("fixture");
    let dir = &mut fixture.directory;
    dir.set_global_pauser(OWNER, account(PAUSER), true)
        .expect("grant");
    dir.set_global_pauser(OWNER, account(PAUSER), false)
        .expect("revoke");
    assert_eq!(
        dir.pause_all(account(PAUSER)),
        Err(OracleError::NotAuthorizedToPause(account(PAUSER)))
    );
}
