use anyhow::Result;
use libsql::{Builder, Connection};
use std::{path::Path, sync::Arc};
use tokio::sync::RwLock;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id       TEXT PRIMARY KEY,
    subject  TEXT UNIQUE NOT NULL,
    email    TEXT,
    name     TEXT
);
"#;

const CREATE_WALLETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS wallets (
    id          TEXT    PRIMARY KEY,
    user_id     TEXT    NOT NULL REFERENCES users (id),
    name        TEXT    NOT NULL,
    kind        TEXT    NOT NULL,
    balance     TEXT    NOT NULL,
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL
);
"#;

const CREATE_TRANSACTIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS transactions (
    id          TEXT    PRIMARY KEY,
    user_id     TEXT    NOT NULL REFERENCES users (id),
    wallet_id   TEXT    NOT NULL REFERENCES wallets (id),
    description TEXT    NOT NULL,
    amount      TEXT    NOT NULL,
    kind        TEXT    NOT NULL,
    category    TEXT    NOT NULL,
    date        TEXT    NOT NULL,
    created_at  INTEGER NOT NULL,
    updated_at  INTEGER NOT NULL
);
"#;

const CREATE_INDEXES: [&str; 3] = [
    "CREATE INDEX IF NOT EXISTS idx_wallets_user ON wallets (user_id);",
    "CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions (user_id, date DESC);",
    "CREATE INDEX IF NOT EXISTS idx_transactions_wallet ON transactions (wallet_id);",
];

/// Shared handle to the single application database. The `RwLock` serializes
/// mutating requests behind the write half; reads go through the read half.
pub type Db = Arc<RwLock<Connection>>;

/// Open (or create) money.db under `data_dir` and bootstrap the schema.
pub async fn init_db(data_dir: &str) -> Result<Db> {
    tokio::fs::create_dir_all(data_dir).await?;
    let path = Path::new(data_dir).join("money.db");
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;

    conn.execute(CREATE_USERS_TABLE, ()).await?;
    conn.execute(CREATE_WALLETS_TABLE, ()).await?;
    conn.execute(CREATE_TRANSACTIONS_TABLE, ()).await?;
    for stmt in CREATE_INDEXES {
        conn.execute(stmt, ()).await?;
    }

    Ok(Arc::new(RwLock::new(conn)))
}
