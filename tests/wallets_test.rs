/*!
 * Wallet Integration Tests
 *
 * Covers wallet CRUD, the delete guard against referenced wallets, and
 * transfers: balance movement, the two linked journal entries, and
 * all-or-nothing failure behavior.
 *
 * All tests use isolated temporary databases for complete test isolation.
 */

mod common;

use common::*;
use money_tracker_server::error::ApiError;
use money_tracker_server::models::{
    CreateWalletPayload, TransactionKind, TransferPayload, UpdateWalletPayload, WalletKind,
};
use money_tracker_server::wallets::{
    create_wallet, delete_wallet, list_wallets, transfer_between_wallets, update_wallet,
};

fn transfer_payload(from: &str, to: &str, amount: &str) -> TransferPayload {
    TransferPayload {
        from_wallet_id: from.to_string(),
        to_wallet_id: to.to_string(),
        amount: dec(amount),
    }
}

#[tokio::test]
async fn create_wallet_stores_initial_balance() {
    let db = setup_test_db().await;
    let user_id = create_test_user(&db).await;

    let payload = CreateWalletPayload {
        name: "  Checking  ".to_string(),
        kind: WalletKind::Bank,
        balance: dec("250.75"),
    };
    let wallet = create_wallet(&db, &user_id, &payload).await.unwrap();

    assert_eq!(wallet.name, "Checking");
    assert_eq!(wallet.kind, WalletKind::Bank);
    assert_eq!(wallet.balance, dec("250.75"));
    assert_eq!(wallet.user_id, user_id);

    let stored = fetch_wallet(&db, &wallet.id).await;
    assert_eq!(stored.balance, dec("250.75"));
    assert_eq!(stored.kind, WalletKind::Bank);
}

#[tokio::test]
async fn create_wallet_rejects_empty_name() {
    let db = setup_test_db().await;
    let user_id = create_test_user(&db).await;

    let payload = CreateWalletPayload {
        name: "   ".to_string(),
        kind: WalletKind::Cash,
        balance: dec("0"),
    };
    let err = create_wallet(&db, &user_id, &payload).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn create_wallet_rejects_negative_balance() {
    let db = setup_test_db().await;
    let user_id = create_test_user(&db).await;

    let payload = CreateWalletPayload {
        name: "Overdrawn".to_string(),
        kind: WalletKind::Cash,
        balance: dec("-1"),
    };
    let err = create_wallet(&db, &user_id, &payload).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn list_wallets_returns_newest_first_and_only_own() {
    let db = setup_test_db().await;
    let user_id = create_test_user(&db).await;
    let other_user = create_test_user(&db).await;

    create_test_wallet(&db, &user_id, "First", "0").await;
    create_test_wallet(&db, &user_id, "Second", "0").await;
    create_test_wallet(&db, &user_id, "Third", "0").await;
    create_test_wallet(&db, &other_user, "Foreign", "0").await;

    let wallets = list_wallets(&db, &user_id).await.unwrap();
    let names: Vec<&str> = wallets.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, vec!["Third", "Second", "First"]);
}

#[tokio::test]
async fn update_wallet_changes_name_and_kind_but_not_balance() {
    let db = setup_test_db().await;
    let user_id = create_test_user(&db).await;
    let wallet = create_test_wallet(&db, &user_id, "Old Name", "42.50").await;

    let payload = UpdateWalletPayload {
        name: Some("New Name".to_string()),
        kind: Some(WalletKind::Crypto),
    };
    let updated = update_wallet(&db, &user_id, &wallet.id, &payload)
        .await
        .unwrap();

    assert_eq!(updated.name, "New Name");
    assert_eq!(updated.kind, WalletKind::Crypto);
    assert_eq!(updated.balance, dec("42.50"));

    let stored = fetch_wallet(&db, &wallet.id).await;
    assert_eq!(stored.name, "New Name");
    assert_eq!(stored.balance, dec("42.50"));
}

#[tokio::test]
async fn update_wallet_requires_at_least_one_field() {
    let db = setup_test_db().await;
    let user_id = create_test_user(&db).await;
    let wallet = create_test_wallet(&db, &user_id, "Wallet", "0").await;

    let err = update_wallet(&db, &user_id, &wallet.id, &UpdateWalletPayload::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn update_wallet_of_another_user_is_not_found() {
    let db = setup_test_db().await;
    let owner = create_test_user(&db).await;
    let intruder = create_test_user(&db).await;
    let wallet = create_test_wallet(&db, &owner, "Private", "0").await;

    let payload = UpdateWalletPayload {
        name: Some("Hijacked".to_string()),
        kind: None,
    };
    let err = update_wallet(&db, &intruder, &wallet.id, &payload)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    assert_eq!(fetch_wallet(&db, &wallet.id).await.name, "Private");
}

#[tokio::test]
async fn update_missing_wallet_is_not_found() {
    let db = setup_test_db().await;
    let user_id = create_test_user(&db).await;

    let payload = UpdateWalletPayload {
        name: Some("Ghost".to_string()),
        kind: None,
    };
    let err = update_wallet(&db, &user_id, "no-such-wallet", &payload)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn delete_wallet_without_transactions_succeeds() {
    let db = setup_test_db().await;
    let user_id = create_test_user(&db).await;
    let wallet = create_test_wallet(&db, &user_id, "Disposable", "10").await;

    delete_wallet(&db, &user_id, &wallet.id).await.unwrap();
    assert!(!wallet_exists(&db, &wallet.id).await);
}

#[tokio::test]
async fn delete_wallet_with_transactions_is_rejected() {
    let db = setup_test_db().await;
    let user_id = create_test_user(&db).await;
    let wallet = create_test_wallet(&db, &user_id, "Busy", "100").await;
    create_test_transaction(
        &db,
        &user_id,
        &wallet.id,
        "Groceries",
        "25",
        TransactionKind::Expense,
        "Food",
        "2026-08-01",
    )
    .await;

    let err = delete_wallet(&db, &user_id, &wallet.id).await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));

    // Nothing changed
    assert!(wallet_exists(&db, &wallet.id).await);
    assert_eq!(fetch_wallet(&db, &wallet.id).await.balance, dec("75"));
    assert_eq!(count_wallet_transactions(&db, &wallet.id).await, 1);
}

#[tokio::test]
async fn transfer_moves_funds_and_records_two_transactions() {
    let db = setup_test_db().await;
    let user_id = create_test_user(&db).await;
    let a = create_test_wallet(&db, &user_id, "Wallet A", "200").await;
    let b = create_test_wallet(&db, &user_id, "Wallet B", "0").await;

    let response = transfer_between_wallets(&db, &user_id, &transfer_payload(&a.id, &b.id, "50"))
        .await
        .unwrap();

    assert_eq!(response.from_wallet.balance, dec("150"));
    assert_eq!(response.to_wallet.balance, dec("50"));
    assert_eq!(fetch_wallet(&db, &a.id).await.balance, dec("150"));
    assert_eq!(fetch_wallet(&db, &b.id).await.balance, dec("50"));

    let expense = &response.expense;
    let income = &response.income;
    assert_eq!(expense.kind, TransactionKind::Expense);
    assert_eq!(expense.wallet_id, a.id);
    assert_eq!(expense.amount, dec("50"));
    assert_eq!(expense.category, "Transfer");
    assert_eq!(expense.description, "Transfer to Wallet B");

    assert_eq!(income.kind, TransactionKind::Income);
    assert_eq!(income.wallet_id, b.id);
    assert_eq!(income.amount, dec("50"));
    assert_eq!(income.category, "Transfer");
    assert_eq!(income.description, "Transfer from Wallet A");

    // Both sides share one timestamp
    assert_eq!(expense.date, income.date);
    assert_eq!(expense.created_at, income.created_at);

    assert_eq!(count_wallet_transactions(&db, &a.id).await, 1);
    assert_eq!(count_wallet_transactions(&db, &b.id).await, 1);
}

#[tokio::test]
async fn transfer_to_same_wallet_is_rejected() {
    let db = setup_test_db().await;
    let user_id = create_test_user(&db).await;
    let a = create_test_wallet(&db, &user_id, "Solo", "100").await;

    let err = transfer_between_wallets(&db, &user_id, &transfer_payload(&a.id, &a.id, "10"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    assert_eq!(fetch_wallet(&db, &a.id).await.balance, dec("100"));
    assert_eq!(count_user_transactions(&db, &user_id).await, 0);
}

#[tokio::test]
async fn transfer_rejects_nonpositive_amount() {
    let db = setup_test_db().await;
    let user_id = create_test_user(&db).await;
    let a = create_test_wallet(&db, &user_id, "A", "100").await;
    let b = create_test_wallet(&db, &user_id, "B", "0").await;

    for amount in ["0", "-5"] {
        let err = transfer_between_wallets(&db, &user_id, &transfer_payload(&a.id, &b.id, amount))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    assert_eq!(fetch_wallet(&db, &a.id).await.balance, dec("100"));
    assert_eq!(fetch_wallet(&db, &b.id).await.balance, dec("0"));
    assert_eq!(count_user_transactions(&db, &user_id).await, 0);
}

#[tokio::test]
async fn transfer_with_insufficient_funds_changes_nothing() {
    let db = setup_test_db().await;
    let user_id = create_test_user(&db).await;
    let a = create_test_wallet(&db, &user_id, "Poor", "10").await;
    let b = create_test_wallet(&db, &user_id, "Rich", "0").await;

    let err = transfer_between_wallets(&db, &user_id, &transfer_payload(&a.id, &b.id, "50"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));

    assert_eq!(fetch_wallet(&db, &a.id).await.balance, dec("10"));
    assert_eq!(fetch_wallet(&db, &b.id).await.balance, dec("0"));
    assert_eq!(count_user_transactions(&db, &user_id).await, 0);
}

#[tokio::test]
async fn transfer_involving_unknown_or_foreign_wallet_is_not_found() {
    let db = setup_test_db().await;
    let user_id = create_test_user(&db).await;
    let other_user = create_test_user(&db).await;
    let mine = create_test_wallet(&db, &user_id, "Mine", "100").await;
    let theirs = create_test_wallet(&db, &other_user, "Theirs", "100").await;

    let err = transfer_between_wallets(
        &db,
        &user_id,
        &transfer_payload(&mine.id, "no-such-wallet", "10"),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    // Another user's wallet is as good as missing
    let err = transfer_between_wallets(&db, &user_id, &transfer_payload(&mine.id, &theirs.id, "10"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    assert_eq!(fetch_wallet(&db, &mine.id).await.balance, dec("100"));
    assert_eq!(fetch_wallet(&db, &theirs.id).await.balance, dec("100"));
    assert_eq!(count_user_transactions(&db, &user_id).await, 0);
}
