use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    CreateAccountCmd, Engine, EngineError, EntryKind, LedgerEvent, Money, TransferCmd,
    TransferState,
};
use migration::{Migrator, MigratorTrait};

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn engine_with_file_db() -> (Engine, DatabaseConnection, std::path::PathBuf) {
    let root =
        std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db, path)
}

async fn account_with_balance(engine: &Engine, username: &str, balance_minor: i64) -> i64 {
    let mut cmd = CreateAccountCmd::new(username, "password", username);
    if balance_minor > 0 {
        cmd = cmd.seed_income(Money::new(balance_minor));
    }
    engine.create_account(cmd).await.unwrap().id
}

async fn insert_pending_transfer(db: &DatabaseConnection, sender: i64, receiver: i64) -> Uuid {
    let id = Uuid::new_v4();
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "INSERT INTO transfers \
         (id, reference, sender_id, receiver_id, amount_minor, state, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        vec![
            id.into(),
            format!("TR-{}", &id.simple().to_string()[..8].to_uppercase()).into(),
            sender.into(),
            receiver.into(),
            500i64.into(),
            "pending".into(),
            Utc::now().into(),
        ],
    ))
    .await
    .unwrap();
    id
}

#[tokio::test]
async fn transfer_moves_funds_and_writes_mirrored_entries() {
    let (engine, _db) = engine_with_db().await;
    let alice = account_with_balance(&engine, "alice", 10_000).await;
    let bob = account_with_balance(&engine, "bob", 0).await;

    let transfer = engine
        .execute_transfer(TransferCmd::new(alice, "bob", Money::new(2_500)).memo("rent"))
        .await
        .unwrap();

    assert_eq!(transfer.state, TransferState::Completed);
    assert!(transfer.processed_at.is_some());
    assert!(transfer.reference.starts_with("TR-"));
    assert_eq!(engine.balance_of(alice).await.unwrap(), Money::new(7_500));
    assert_eq!(engine.balance_of(bob).await.unwrap(), Money::new(2_500));

    let sender_entries = engine.list_transactions(alice, 10).await.unwrap();
    assert_eq!(sender_entries[0].kind, EntryKind::Expense);
    assert_eq!(sender_entries[0].amount, Money::new(2_500));
    assert_eq!(
        sender_entries[0].description.as_deref(),
        Some("Transfer to bob: rent")
    );
    assert_eq!(sender_entries[0].category.as_deref(), Some("Transfer sent"));

    let receiver_entries = engine.list_transactions(bob, 10).await.unwrap();
    assert_eq!(receiver_entries[0].kind, EntryKind::Income);
    assert_eq!(
        receiver_entries[0].description.as_deref(),
        Some("Transfer from alice: rent")
    );
    assert_eq!(
        receiver_entries[0].category.as_deref(),
        Some("Transfer received")
    );
}

#[tokio::test]
async fn transfer_without_memo_keeps_description_short() {
    let (engine, _db) = engine_with_db().await;
    let alice = account_with_balance(&engine, "alice", 1_000).await;
    let bob = account_with_balance(&engine, "bob", 0).await;

    engine
        .execute_transfer(TransferCmd::new(alice, "bob", Money::new(400)))
        .await
        .unwrap();

    let entries = engine.list_transactions(bob, 10).await.unwrap();
    assert_eq!(entries[0].description.as_deref(), Some("Transfer from alice"));
}

#[tokio::test]
async fn transfer_rejections_persist_nothing() {
    let (engine, _db) = engine_with_db().await;
    let alice = account_with_balance(&engine, "alice", 10_000).await;
    let bob = account_with_balance(&engine, "bob", 0).await;

    let err = engine
        .execute_transfer(TransferCmd::new(alice, "bob", Money::ZERO))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .execute_transfer(TransferCmd::new(alice, "bob", Money::new(-100)))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .execute_transfer(TransferCmd::new(alice, "nobody", Money::new(100)))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ReceiverNotFound("nobody".to_string()));

    let err = engine
        .execute_transfer(TransferCmd::new(alice, "alice", Money::new(100)))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::SelfTransfer);

    let lists = engine.list_transfers(alice).await.unwrap();
    assert!(lists.sent.is_empty());
    assert!(lists.received.is_empty());
    assert_eq!(engine.balance_of(alice).await.unwrap(), Money::new(10_000));
    assert!(engine.list_transactions(bob, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn insufficient_funds_reports_balance_and_rolls_back() {
    let (engine, _db) = engine_with_db().await;
    let alice = account_with_balance(&engine, "alice", 10_000).await;
    let bob = account_with_balance(&engine, "bob", 0).await;

    let err = engine
        .execute_transfer(TransferCmd::new(alice, "bob", Money::new(20_000)))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientFunds {
            balance: Money::new(10_000)
        }
    );

    let lists = engine.list_transfers(alice).await.unwrap();
    assert!(lists.sent.is_empty());
    assert_eq!(engine.balance_of(alice).await.unwrap(), Money::new(10_000));
    assert_eq!(engine.balance_of(bob).await.unwrap(), Money::ZERO);
}

#[tokio::test]
async fn concurrent_debits_let_exactly_one_through() {
    let (engine, db, path) = engine_with_file_db().await;
    let alice = account_with_balance(&engine, "alice", 10_000).await;
    account_with_balance(&engine, "bob", 0).await;
    account_with_balance(&engine, "carol", 0).await;

    let engine = Arc::new(engine);
    let to_bob = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .execute_transfer(TransferCmd::new(alice, "bob", Money::new(6_000)))
                .await
        })
    };
    let to_carol = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .execute_transfer(TransferCmd::new(alice, "carol", Money::new(6_000)))
                .await
        })
    };

    let results = [to_bob.await.unwrap(), to_carol.await.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let rejected = results
        .iter()
        .find_map(|r| r.as_ref().err())
        .expect("one debit must lose the race");
    assert!(matches!(rejected, EngineError::InsufficientFunds { .. }));

    assert_eq!(engine.balance_of(alice).await.unwrap(), Money::new(4_000));

    drop(engine);
    drop(db);
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn reciprocal_transfers_do_not_deadlock() {
    let (engine, db, path) = engine_with_file_db().await;
    let alice = account_with_balance(&engine, "alice", 10_000).await;
    let bob = account_with_balance(&engine, "bob", 10_000).await;

    let engine = Arc::new(engine);
    let a_to_b = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .execute_transfer(TransferCmd::new(alice, "bob", Money::new(1_000)))
                .await
        })
    };
    let b_to_a = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .execute_transfer(TransferCmd::new(bob, "alice", Money::new(1_000)))
                .await
        })
    };

    let (first, second) = tokio::time::timeout(Duration::from_secs(10), async {
        (a_to_b.await.unwrap(), b_to_a.await.unwrap())
    })
    .await
    .expect("reciprocal transfers must finish");
    first.unwrap();
    second.unwrap();

    assert_eq!(engine.balance_of(alice).await.unwrap(), Money::new(10_000));
    assert_eq!(engine.balance_of(bob).await.unwrap(), Money::new(10_000));

    drop(engine);
    drop(db);
    let _ = std::fs::remove_file(path);
}

#[tokio::test]
async fn cancel_pending_transfer_once() {
    let (engine, db) = engine_with_db().await;
    let alice = account_with_balance(&engine, "alice", 1_000).await;
    let bob = account_with_balance(&engine, "bob", 0).await;

    let id = insert_pending_transfer(&db, alice, bob).await;

    let cancelled = engine.cancel_transfer(alice, id).await.unwrap();
    assert_eq!(cancelled.state, TransferState::Cancelled);
    assert!(cancelled.processed_at.is_some());

    let err = engine.cancel_transfer(alice, id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::NotCancellable("state is cancelled".to_string())
    );

    // A pending transfer never touched the ledger, so nothing to reverse.
    assert_eq!(engine.balance_of(alice).await.unwrap(), Money::new(1_000));
    assert_eq!(engine.balance_of(bob).await.unwrap(), Money::ZERO);
}

#[tokio::test]
async fn cancel_completed_transfer_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let alice = account_with_balance(&engine, "alice", 1_000).await;
    account_with_balance(&engine, "bob", 0).await;

    let transfer = engine
        .execute_transfer(TransferCmd::new(alice, "bob", Money::new(200)))
        .await
        .unwrap();

    let err = engine.cancel_transfer(alice, transfer.id).await.unwrap_err();
    assert_eq!(
        err,
        EngineError::NotCancellable("state is completed".to_string())
    );

    let unchanged = engine.transfer(alice, transfer.id).await.unwrap();
    assert_eq!(unchanged.state, TransferState::Completed);
}

#[tokio::test]
async fn cancel_is_sender_only() {
    let (engine, db) = engine_with_db().await;
    let alice = account_with_balance(&engine, "alice", 1_000).await;
    let bob = account_with_balance(&engine, "bob", 0).await;

    let id = insert_pending_transfer(&db, alice, bob).await;

    let err = engine.cancel_transfer(bob, id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("transfer not exists".to_string()));
}

#[tokio::test]
async fn detail_is_visible_to_participants_only() {
    let (engine, _db) = engine_with_db().await;
    let alice = account_with_balance(&engine, "alice", 1_000).await;
    let bob = account_with_balance(&engine, "bob", 0).await;
    let carol = account_with_balance(&engine, "carol", 0).await;

    let transfer = engine
        .execute_transfer(TransferCmd::new(alice, "bob", Money::new(300)))
        .await
        .unwrap();

    assert!(engine.transfer(alice, transfer.id).await.is_ok());
    assert!(engine.transfer(bob, transfer.id).await.is_ok());
    let err = engine.transfer(carol, transfer.id).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("transfer not exists".to_string()));
}

#[tokio::test]
async fn lists_split_sent_and_received_newest_first() {
    let (engine, _db) = engine_with_db().await;
    let alice = account_with_balance(&engine, "alice", 10_000).await;
    let bob = account_with_balance(&engine, "bob", 0).await;

    engine
        .execute_transfer(TransferCmd::new(alice, "bob", Money::new(1_000)))
        .await
        .unwrap();
    engine
        .execute_transfer(TransferCmd::new(bob, "alice", Money::new(300)))
        .await
        .unwrap();
    engine
        .execute_transfer(TransferCmd::new(alice, "bob", Money::new(2_000)))
        .await
        .unwrap();

    let alice_lists = engine.list_transfers(alice).await.unwrap();
    assert_eq!(alice_lists.sent.len(), 2);
    assert_eq!(alice_lists.sent[0].amount, Money::new(2_000));
    assert_eq!(alice_lists.sent[1].amount, Money::new(1_000));
    assert_eq!(alice_lists.received.len(), 1);

    let bob_lists = engine.list_transfers(bob).await.unwrap();
    assert_eq!(bob_lists.sent.len(), 1);
    assert_eq!(bob_lists.received.len(), 2);
}

#[tokio::test]
async fn completed_event_carries_transfer_detail() {
    let (engine, _db) = engine_with_db().await;
    let alice = account_with_balance(&engine, "alice", 1_000).await;
    let bob = account_with_balance(&engine, "bob", 0).await;

    let mut events = engine.subscribe();
    let transfer = engine
        .execute_transfer(TransferCmd::new(alice, "bob", Money::new(750)))
        .await
        .unwrap();

    let event = events.recv().await.unwrap();
    assert_eq!(
        event,
        LedgerEvent::TransferCompleted {
            transfer_id: transfer.id,
            sender_id: alice,
            receiver_id: bob,
            amount: Money::new(750),
        }
    );
    // The event is emitted after commit, so the moved funds are visible.
    assert_eq!(engine.balance_of(bob).await.unwrap(), Money::new(750));
}
