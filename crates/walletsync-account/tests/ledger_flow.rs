//! End-to-end account flows against an in-process identity service

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use walletsync_account::{
    AccountLedger, DirectoryError, DirectoryResult, IdentityDirectory, LedgerError, LocalDirectory,
    ProfileSyncPropagator, SyncConfig,
};
use walletsync_auth::{AuthConfig, AuthService, PasswordConfig, Principal, PublicInfo};
use walletsync_db::Database;

fn auth_config() -> AuthConfig {
    let mut config = AuthConfig::default();
    config.jwt.secret = "ledger-flow-test-secret-with-32-bytes!".to_string();
    config.password = PasswordConfig {
        memory_cost: 1024,
        time_cost: 1,
        ..PasswordConfig::default()
    };
    config
}

struct Harness {
    auth: AuthService,
    ledger: AccountLedger,
}

fn harness() -> Harness {
    let db = Database::in_memory();
    let auth = AuthService::new(db.identities.clone(), auth_config()).unwrap();
    let directory: Arc<dyn IdentityDirectory> =
        Arc::new(LocalDirectory::new(auth.clone(), Duration::from_secs(5)));
    let propagator = Arc::new(ProfileSyncPropagator::spawn(directory.clone(), &SyncConfig::default()));
    let ledger = AccountLedger::new(db.accounts.clone(), directory, propagator);
    Harness { auth, ledger }
}

async fn login(auth: &AuthService, username: &str, password: &str) -> Principal {
    let issued = auth.login(username, password).await.unwrap();
    let claims = auth.tokens.validate(&issued.token).unwrap();
    Principal::new(claims, issued.token)
}

#[tokio::test]
async fn alice_registers_reads_and_deposits() {
    let h = harness();
    h.auth.register("alice", "pw123", "Alice A").await.unwrap();
    let alice = login(&h.auth, "alice", "pw123").await;

    let account = h.ledger.get_account(&alice, "alice").await.unwrap();
    assert_eq!(account.username, "alice");
    assert_eq!(account.display_name, "Alice A");
    assert_eq!(account.bank_name, "");
    assert_eq!(account.wallet, 0.0);

    h.ledger.deposit(&alice, "alice", 25.5).await.unwrap();
    let account = h.ledger.get_account(&alice, "alice").await.unwrap();
    assert_eq!(account.wallet, 25.5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_deposits_do_not_lose_updates() {
    let h = harness();
    h.auth.register("bob", "pw", "Bob").await.unwrap();
    let bob = login(&h.auth, "bob", "pw").await;
    h.ledger.get_account(&bob, "bob").await.unwrap();

    let a = {
        let ledger = h.ledger.clone();
        let bob = bob.clone();
        tokio::spawn(async move { ledger.deposit(&bob, "bob", 100.0).await })
    };
    let b = {
        let ledger = h.ledger.clone();
        let bob = bob.clone();
        tokio::spawn(async move { ledger.deposit(&bob, "bob", 50.0).await })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    assert_eq!(h.ledger.get_account(&bob, "bob").await.unwrap().wallet, 150.0);
}

#[tokio::test]
async fn concurrent_first_reads_create_one_account() {
    let h = harness();
    h.auth.register("carol", "pw", "Carol").await.unwrap();
    let carol = login(&h.auth, "carol", "pw").await;

    let reads = (0..8).map(|_| h.ledger.get_account(&carol, "carol"));
    let accounts = futures::future::join_all(reads).await;

    let first = accounts[0].as_ref().unwrap().clone();
    assert!(accounts.iter().all(|a| a.as_ref().unwrap() == &first));
}

#[tokio::test]
async fn profile_update_propagates_to_identity() {
    let h = harness();
    h.auth.register("dave", "pw", "Dave").await.unwrap();
    let dave = login(&h.auth, "dave", "pw").await;

    let account = h
        .ledger
        .update_profile(&dave, "dave", "David", "River Bank")
        .await
        .unwrap();
    assert_eq!(account.display_name, "David");

    h.ledger.propagator().shutdown().await;

    let info = h.auth.public_info_for(&dave, "dave").await.unwrap();
    assert_eq!(info.display_name, "David");
}

struct Down;

#[async_trait]
impl IdentityDirectory for Down {
    async fn public_info(&self, _: &str, _: &Principal) -> DirectoryResult<PublicInfo> {
        Err(DirectoryError::Timeout)
    }

    async fn update_display_name(&self, _: &str, _: &str) -> DirectoryResult<()> {
        Err(DirectoryError::Timeout)
    }
}

#[tokio::test]
async fn profile_update_survives_propagation_failure() {
    let db = Database::in_memory();
    let auth = AuthService::new(db.identities.clone(), auth_config()).unwrap();
    auth.register("erin", "pw", "Erin").await.unwrap();
    let erin = login(&auth, "erin", "pw").await;

    let directory: Arc<dyn IdentityDirectory> = Arc::new(Down);
    let propagator = Arc::new(ProfileSyncPropagator::spawn(directory.clone(), &SyncConfig::default()));
    let ledger = AccountLedger::new(db.accounts.clone(), directory, propagator.clone());

    ledger
        .update_profile(&erin, "erin", "Erin E", "Hill Bank")
        .await
        .unwrap();
    propagator.shutdown().await;
    assert_eq!(propagator.stats().failed, 1);

    let account = ledger.get_account(&erin, "erin").await.unwrap();
    assert_eq!(account.display_name, "Erin E");
    assert_eq!(account.bank_name, "Hill Bank");

    // Identity store keeps the old name
    let info = auth.public_info_for(&erin, "erin").await.unwrap();
    assert_eq!(info.display_name, "Erin");

    // Lookup failures surface as not-found for users without an account
    auth.register("frank", "pw", "Frank").await.unwrap();
    let frank = login(&auth, "frank", "pw").await;
    assert!(matches!(
        ledger.get_account(&frank, "frank").await,
        Err(LedgerError::NotFound(_))
    ));
}
