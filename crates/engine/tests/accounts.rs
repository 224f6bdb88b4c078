use chrono::{TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{
    CreateAccountCmd, Engine, EngineError, EntryKind, Money, RecordTransactionCmd, SetBudgetCmd,
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

#[tokio::test]
async fn create_account_provisions_default_categories() {
    let (engine, _db) = engine_with_db().await;

    let account = engine
        .create_account(CreateAccountCmd::new("alice", "password", "Alice"))
        .await
        .unwrap();
    assert_eq!(account.username, "alice");
    assert_eq!(account.display_name, "Alice");

    let categories = engine.list_categories(account.id).await.unwrap();
    assert_eq!(categories.len(), 6);
    let income = categories
        .iter()
        .filter(|c| c.kind == EntryKind::Income)
        .count();
    let expense = categories
        .iter()
        .filter(|c| c.kind == EntryKind::Expense)
        .count();
    assert_eq!(income, 3);
    assert_eq!(expense, 3);
    assert!(categories.iter().any(|c| c.name == "Salary"));
    assert!(categories.iter().any(|c| c.name == "Transfer sent"));
    assert!(categories.iter().any(|c| c.name == "Transfer received"));
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let (engine, _db) = engine_with_db().await;

    engine
        .create_account(CreateAccountCmd::new("alice", "password", "Alice"))
        .await
        .unwrap();
    let err = engine
        .create_account(CreateAccountCmd::new("alice", "other", "Alice Again"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("alice".to_string()));
}

#[tokio::test]
async fn seed_income_posts_opening_balance() {
    let (engine, _db) = engine_with_db().await;

    let account = engine
        .create_account(CreateAccountCmd::new("alice", "password", "Alice").seed_income(Money::new(5_000)))
        .await
        .unwrap();

    assert_eq!(engine.balance_of(account.id).await.unwrap(), Money::new(5_000));

    let entries = engine.list_transactions(account.id, 10).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, EntryKind::Income);
    assert_eq!(entries[0].amount, Money::new(5_000));
    assert_eq!(entries[0].category.as_deref(), Some("Salary"));
    assert_eq!(entries[0].description.as_deref(), Some("Opening balance"));
}

#[tokio::test]
async fn balance_is_income_minus_expenses() {
    let (engine, _db) = engine_with_db().await;
    let account = engine
        .create_account(CreateAccountCmd::new("alice", "password", "Alice"))
        .await
        .unwrap();

    engine
        .record_transaction(
            RecordTransactionCmd::new(account.id, EntryKind::Income, Money::new(10_000))
                .category("Salary"),
        )
        .await
        .unwrap();
    engine
        .record_transaction(
            RecordTransactionCmd::new(account.id, EntryKind::Expense, Money::new(2_500))
                .category("Groceries")
                .description("weekly shop"),
        )
        .await
        .unwrap();

    assert_eq!(engine.balance_of(account.id).await.unwrap(), Money::new(7_500));
}

#[tokio::test]
async fn record_transaction_rejects_bad_input() {
    let (engine, _db) = engine_with_db().await;
    let account = engine
        .create_account(CreateAccountCmd::new("alice", "password", "Alice"))
        .await
        .unwrap();

    let err = engine
        .record_transaction(RecordTransactionCmd::new(
            account.id,
            EntryKind::Expense,
            Money::ZERO,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .record_transaction(RecordTransactionCmd::new(
            999,
            EntryKind::Income,
            Money::new(100),
        ))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("account not exists".to_string()));

    let err = engine.balance_of(999).await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("account not exists".to_string()));
}

#[tokio::test]
async fn category_names_fold_accents_and_case() {
    let (engine, _db) = engine_with_db().await;
    let account = engine
        .create_account(CreateAccountCmd::new("alice", "password", "Alice"))
        .await
        .unwrap();

    engine
        .record_transaction(
            RecordTransactionCmd::new(account.id, EntryKind::Expense, Money::new(100))
                .category("Alimentación"),
        )
        .await
        .unwrap();
    engine
        .record_transaction(
            RecordTransactionCmd::new(account.id, EntryKind::Expense, Money::new(200))
                .category("alimentacion"),
        )
        .await
        .unwrap();

    let categories = engine.list_categories(account.id).await.unwrap();
    let matching: Vec<_> = categories
        .iter()
        .filter(|c| c.name.to_lowercase().starts_with("alimentaci"))
        .collect();
    // The second spelling reuses the first category instead of creating one.
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].name, "Alimentación");

    let entries = engine.list_transactions(account.id, 10).await.unwrap();
    assert!(
        entries
            .iter()
            .all(|entry| entry.category.as_deref() == Some("Alimentación"))
    );
}

#[tokio::test]
async fn list_transactions_is_newest_first_with_limit() {
    let (engine, _db) = engine_with_db().await;
    let account = engine
        .create_account(CreateAccountCmd::new("alice", "password", "Alice"))
        .await
        .unwrap();

    for (day, amount) in [(1, 100), (2, 200), (3, 300)] {
        let occurred = Utc.with_ymd_and_hms(2026, 7, day, 12, 0, 0).unwrap();
        engine
            .record_transaction(
                RecordTransactionCmd::new(account.id, EntryKind::Income, Money::new(amount))
                    .occurred_at(occurred),
            )
            .await
            .unwrap();
    }

    let entries = engine.list_transactions(account.id, 2).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].amount, Money::new(300));
    assert_eq!(entries[1].amount, Money::new(200));
}

#[tokio::test]
async fn budget_upsert_and_month_window() {
    let (engine, _db) = engine_with_db().await;
    let account = engine
        .create_account(CreateAccountCmd::new("alice", "password", "Alice"))
        .await
        .unwrap();

    // June and July spend on the same category; only June counts below.
    for (month, amount) in [(6, 4_000), (7, 9_999)] {
        let occurred = Utc.with_ymd_and_hms(2026, month, 10, 9, 0, 0).unwrap();
        engine
            .record_transaction(
                RecordTransactionCmd::new(account.id, EntryKind::Expense, Money::new(amount))
                    .category("Groceries")
                    .occurred_at(occurred),
            )
            .await
            .unwrap();
    }

    let status = engine
        .set_budget(SetBudgetCmd::new(
            account.id,
            "Groceries",
            2026,
            6,
            Money::new(10_000),
        ))
        .await
        .unwrap();
    assert_eq!(status.category, "Groceries");
    assert_eq!(status.cap, Money::new(10_000));
    assert_eq!(status.spent, Money::new(4_000));

    // Setting the same month again replaces the cap instead of stacking.
    engine
        .set_budget(SetBudgetCmd::new(
            account.id,
            "groceries",
            2026,
            6,
            Money::new(5_000),
        ))
        .await
        .unwrap();

    let june = engine.list_budgets(account.id, 2026, 6).await.unwrap();
    assert_eq!(june.len(), 1);
    assert_eq!(june[0].cap, Money::new(5_000));
    assert_eq!(june[0].spent, Money::new(4_000));

    let august = engine.list_budgets(account.id, 2026, 8).await.unwrap();
    assert!(august.is_empty());
}

#[tokio::test]
async fn budget_requires_existing_expense_category() {
    let (engine, _db) = engine_with_db().await;
    let account = engine
        .create_account(CreateAccountCmd::new("alice", "password", "Alice"))
        .await
        .unwrap();

    let err = engine
        .set_budget(SetBudgetCmd::new(
            account.id,
            "Never spent",
            2026,
            6,
            Money::new(1_000),
        ))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("category not exists".to_string()));

    let err = engine
        .set_budget(SetBudgetCmd::new(
            account.id,
            "Purchases",
            2026,
            13,
            Money::new(1_000),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .set_budget(SetBudgetCmd::new(
            account.id,
            "Purchases",
            2026,
            6,
            Money::ZERO,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn lookup_accounts_by_username_and_id() {
    let (engine, _db) = engine_with_db().await;
    let alice = engine
        .create_account(CreateAccountCmd::new("alice", "password", "Alice"))
        .await
        .unwrap();
    let bob = engine
        .create_account(CreateAccountCmd::new("bob", "password", "Bob"))
        .await
        .unwrap();

    let found = engine.account_by_username("alice").await.unwrap();
    assert_eq!(found.id, alice.id);

    let err = engine.account_by_username("nobody").await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("account not exists".to_string()));

    let names = engine.usernames(&[alice.id, bob.id]).await.unwrap();
    assert_eq!(names.get(&alice.id).map(String::as_str), Some("alice"));
    assert_eq!(names.get(&bob.id).map(String::as_str), Some("bob"));

    let all = engine.list_accounts().await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].username, "alice");
    assert_eq!(all[1].username, "bob");
}
