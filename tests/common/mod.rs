#![allow(dead_code)]

use rust_decimal::Decimal;
use tempfile::tempdir;
use uuid::Uuid;

use money_tracker_server::database::{Db, init_db};
use money_tracker_server::models::{
    CreateTransactionPayload, CreateWalletPayload, Transaction, TransactionKind, Wallet,
    WalletKind,
};
use money_tracker_server::{transactions, wallets};

pub fn dec(s: &str) -> Decimal {
    s.parse().expect("valid decimal literal")
}

pub async fn setup_test_db() -> Db {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let data_path = temp_dir
        .path()
        .to_str()
        .expect("Failed to convert path to string")
        .to_string();

    let db = init_db(&data_path)
        .await
        .unwrap_or_else(|e| panic!("Failed to initialize database at {}: {}", data_path, e));

    // Keep the temp_dir alive by leaking it (for test duration)
    std::mem::forget(temp_dir);

    db
}

pub async fn create_test_user(db: &Db) -> String {
    let user_id = Uuid::new_v4().to_string();
    let subject = format!("ext-{}", user_id);

    let conn = db.write().await;
    conn.execute(
        "INSERT INTO users (id, subject, email, name) VALUES (?, ?, ?, ?)",
        (
            user_id.as_str(),
            subject.as_str(),
            "test@example.com",
            "Test User",
        ),
    )
    .await
    .unwrap_or_else(|e| panic!("Failed to insert test user {}: {}", user_id, e));

    user_id
}

pub async fn create_test_wallet(db: &Db, user_id: &str, name: &str, balance: &str) -> Wallet {
    let payload = CreateWalletPayload {
        name: name.to_string(),
        kind: WalletKind::Cash,
        balance: dec(balance),
    };
    wallets::create_wallet(db, user_id, &payload)
        .await
        .unwrap_or_else(|e| panic!("Failed to create test wallet '{}': {}", name, e))
}

pub async fn create_test_transaction(
    db: &Db,
    user_id: &str,
    wallet_id: &str,
    description: &str,
    amount: &str,
    kind: TransactionKind,
    category: &str,
    date: &str,
) -> Transaction {
    let payload = CreateTransactionPayload {
        wallet_id: wallet_id.to_string(),
        description: description.to_string(),
        amount: dec(amount),
        kind,
        category: category.to_string(),
        date: date.to_string(),
    };
    transactions::create_transaction(db, user_id, &payload)
        .await
        .unwrap_or_else(|e| panic!("Failed to create test transaction '{}': {}", description, e))
}

pub async fn fetch_wallet(db: &Db, wallet_id: &str) -> Wallet {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, user_id, name, kind, balance, created_at, updated_at \
             FROM wallets WHERE id = ?",
            [wallet_id],
        )
        .await
        .expect("Failed to query wallet");

    let row = rows
        .next()
        .await
        .expect("Failed to read wallet row")
        .unwrap_or_else(|| panic!("Wallet {} not found", wallet_id));

    wallets::extract_wallet_from_row(row).expect("Failed to extract wallet")
}

pub async fn wallet_exists(db: &Db, wallet_id: &str) -> bool {
    let conn = db.read().await;
    let mut rows = conn
        .query("SELECT id FROM wallets WHERE id = ?", [wallet_id])
        .await
        .expect("Failed to query wallet");
    rows.next().await.expect("Failed to read row").is_some()
}

pub async fn count_wallet_transactions(db: &Db, wallet_id: &str) -> u32 {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT COUNT(*) FROM transactions WHERE wallet_id = ?",
            [wallet_id],
        )
        .await
        .expect("Failed to count transactions");

    match rows.next().await.expect("Failed to read count row") {
        Some(row) => row.get(0).expect("Failed to get count value"),
        None => 0,
    }
}

pub async fn count_user_transactions(db: &Db, user_id: &str) -> u32 {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT COUNT(*) FROM transactions WHERE user_id = ?",
            [user_id],
        )
        .await
        .expect("Failed to count transactions");

    match rows.next().await.expect("Failed to read count row") {
        Some(row) => row.get(0).expect("Failed to get count value"),
        None => 0,
    }
}
