use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::AppState;
use crate::auth::authenticate;
use crate::constants::*;
use crate::database::Db;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreateWalletPayload, MessageResponse, Transaction, TransactionKind, TransferPayload,
    TransferResponse, UpdateWalletPayload, Wallet, WalletKind,
};
use crate::transactions::insert_transaction;
use crate::utils::{now_ts, today, validate_positive_amount, validate_string_length};

pub fn extract_wallet_from_row(row: libsql::Row) -> ApiResult<Wallet> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let name: String = row.get(2)?;
    let kind_raw: String = row.get(3)?;
    let balance_raw: String = row.get(4)?;
    let created_at: i64 = row.get(5)?;
    let updated_at: i64 = row.get(6)?;

    let kind = WalletKind::parse(&kind_raw)
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("corrupt wallet kind '{}'", kind_raw)))?;
    let balance = crate::utils::parse_stored_decimal(&balance_raw, "wallet balance")?;

    Ok(Wallet {
        id,
        user_id,
        name,
        kind,
        balance,
        created_at,
        updated_at,
    })
}

const WALLET_COLUMNS: &str = "id, user_id, name, kind, balance, created_at, updated_at";

/// Fetch a wallet scoped to its owner. A wallet belonging to another user is
/// indistinguishable from a missing one.
pub(crate) async fn load_wallet(
    conn: &libsql::Connection,
    wallet_id: &str,
    user_id: &str,
) -> ApiResult<Option<Wallet>> {
    let mut rows = conn
        .query(
            &format!("SELECT {} FROM wallets WHERE id = ? AND user_id = ?", WALLET_COLUMNS),
            [wallet_id, user_id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(extract_wallet_from_row(row)?)),
        None => Ok(None),
    }
}

pub(crate) async fn save_wallet_balance(
    conn: &libsql::Connection,
    wallet: &Wallet,
) -> ApiResult<()> {
    conn.execute(
        "UPDATE wallets SET balance = ?, updated_at = ? WHERE id = ?",
        (wallet.balance.to_string(), wallet.updated_at, wallet.id.as_str()),
    )
    .await?;
    Ok(())
}

pub async fn create_wallet(
    db: &Db,
    user_id: &str,
    payload: &CreateWalletPayload,
) -> ApiResult<Wallet> {
    validate_string_length(&payload.name, "Wallet name", MAX_WALLET_NAME_LENGTH)?;
    if payload.balance < Decimal::ZERO {
        return Err(ApiError::Validation(
            "Balance cannot be negative".to_string(),
        ));
    }

    let now = now_ts();
    let wallet = Wallet {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        name: payload.name.trim().to_string(),
        kind: payload.kind,
        balance: payload.balance,
        created_at: now,
        updated_at: now,
    };

    let conn = db.write().await;
    conn.execute(
        "INSERT INTO wallets (id, user_id, name, kind, balance, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
        (
            wallet.id.as_str(),
            wallet.user_id.as_str(),
            wallet.name.as_str(),
            wallet.kind.as_str(),
            wallet.balance.to_string(),
            wallet.created_at,
            wallet.updated_at,
        ),
    )
    .await?;

    Ok(wallet)
}

pub async fn list_wallets(db: &Db, user_id: &str) -> ApiResult<Vec<Wallet>> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            &format!(
                "SELECT {} FROM wallets WHERE user_id = ? ORDER BY created_at DESC, rowid DESC",
                WALLET_COLUMNS
            ),
            [user_id],
        )
        .await?;

    let mut wallets = Vec::new();
    while let Some(row) = rows.next().await? {
        wallets.push(extract_wallet_from_row(row)?);
    }
    Ok(wallets)
}

/// Rename or re-type a wallet. Balance is off limits here; only transactions
/// move balances.
pub async fn update_wallet(
    db: &Db,
    user_id: &str,
    wallet_id: &str,
    payload: &UpdateWalletPayload,
) -> ApiResult<Wallet> {
    if payload.name.is_none() && payload.kind.is_none() {
        return Err(ApiError::Validation(
            "At least one of name or type must be provided".to_string(),
        ));
    }
    if let Some(name) = &payload.name {
        validate_string_length(name, "Wallet name", MAX_WALLET_NAME_LENGTH)?;
    }

    let conn = db.write().await;
    let mut wallet = load_wallet(&conn, wallet_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(ERR_WALLET_NOT_FOUND.to_string()))?;

    if let Some(name) = &payload.name {
        wallet.name = name.trim().to_string();
    }
    if let Some(kind) = payload.kind {
        wallet.kind = kind;
    }
    wallet.updated_at = now_ts();

    conn.execute(
        "UPDATE wallets SET name = ?, kind = ?, updated_at = ? WHERE id = ? AND user_id = ?",
        (
            wallet.name.as_str(),
            wallet.kind.as_str(),
            wallet.updated_at,
            wallet.id.as_str(),
            user_id,
        ),
    )
    .await?;

    Ok(wallet)
}

pub async fn delete_wallet(db: &Db, user_id: &str, wallet_id: &str) -> ApiResult<()> {
    let conn = db.write().await;
    let wallet = load_wallet(&conn, wallet_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(ERR_WALLET_NOT_FOUND.to_string()))?;

    let mut rows = conn
        .query(
            "SELECT COUNT(*) FROM transactions WHERE wallet_id = ?",
            [wallet.id.as_str()],
        )
        .await?;
    let referencing: u32 = match rows.next().await? {
        Some(row) => row.get(0)?,
        None => 0,
    };

    if referencing > 0 {
        return Err(ApiError::Conflict(ERR_WALLET_HAS_TRANSACTIONS.to_string()));
    }

    conn.execute(
        "DELETE FROM wallets WHERE id = ? AND user_id = ?",
        (wallet.id.as_str(), user_id),
    )
    .await?;

    Ok(())
}

/// Move value between two wallets of the same user. Runs as one storage
/// transaction: both balance updates and both journal rows land together or
/// not at all.
pub async fn transfer_between_wallets(
    db: &Db,
    user_id: &str,
    payload: &TransferPayload,
) -> ApiResult<TransferResponse> {
    validate_positive_amount(payload.amount)?;
    if payload.from_wallet_id == payload.to_wallet_id {
        return Err(ApiError::Validation(
            "Cannot transfer to the same wallet".to_string(),
        ));
    }

    let conn = db.write().await;
    let tx = conn.transaction().await?;

    match apply_transfer(&tx, user_id, payload).await {
        Ok(response) => {
            tx.commit().await?;
            Ok(response)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "transfer rollback failed");
            }
            Err(err)
        }
    }
}

async fn apply_transfer(
    conn: &libsql::Connection,
    user_id: &str,
    payload: &TransferPayload,
) -> ApiResult<TransferResponse> {
    let from = load_wallet(conn, &payload.from_wallet_id, user_id).await?;
    let to = load_wallet(conn, &payload.to_wallet_id, user_id).await?;
    let (Some(mut from), Some(mut to)) = (from, to) else {
        return Err(ApiError::NotFound("One or both wallets not found".to_string()));
    };

    if from.balance < payload.amount {
        return Err(ApiError::Conflict(
            "Insufficient funds in source wallet".to_string(),
        ));
    }

    let now = now_ts();
    from.balance -= payload.amount;
    to.balance += payload.amount;
    from.updated_at = now;
    to.updated_at = now;
    save_wallet_balance(conn, &from).await?;
    save_wallet_balance(conn, &to).await?;

    // Both sides share one date and creation timestamp
    let date = today();
    let expense = Transaction {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        wallet_id: from.id.clone(),
        description: format!("Transfer to {}", to.name),
        amount: payload.amount,
        kind: TransactionKind::Expense,
        category: TRANSFER_CATEGORY.to_string(),
        date: date.clone(),
        created_at: now,
        updated_at: now,
    };
    let income = Transaction {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        wallet_id: to.id.clone(),
        description: format!("Transfer from {}", from.name),
        amount: payload.amount,
        kind: TransactionKind::Income,
        category: TRANSFER_CATEGORY.to_string(),
        date,
        created_at: now,
        updated_at: now,
    };
    insert_transaction(conn, &expense).await?;
    insert_transaction(conn, &income).await?;

    Ok(TransferResponse {
        message: "Transfer successful".to_string(),
        from_wallet: from,
        to_wallet: to,
        expense,
        income,
    })
}

// HTTP handlers

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateWalletPayload>,
) -> Result<(StatusCode, Json<Wallet>), ApiError> {
    let user = authenticate(&state, &headers).await?;
    let wallet = create_wallet(&state.db, &user.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(wallet)))
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(StatusCode, Json<Vec<Wallet>>), ApiError> {
    let user = authenticate(&state, &headers).await?;
    let wallets = list_wallets(&state.db, &user.id).await?;
    Ok((StatusCode::OK, Json(wallets)))
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(wallet_id): Path<String>,
    Json(payload): Json<UpdateWalletPayload>,
) -> Result<(StatusCode, Json<Wallet>), ApiError> {
    let user = authenticate(&state, &headers).await?;
    let wallet = update_wallet(&state.db, &user.id, &wallet_id, &payload).await?;
    Ok((StatusCode::OK, Json(wallet)))
}

pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(wallet_id): Path<String>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let user = authenticate(&state, &headers).await?;
    delete_wallet(&state.db, &user.id, &wallet_id).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Wallet deleted successfully".to_string(),
        }),
    ))
}

pub async fn transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<TransferPayload>,
) -> Result<(StatusCode, Json<TransferResponse>), ApiError> {
    let user = authenticate(&state, &headers).await?;
    let response = transfer_between_wallets(&state.db, &user.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}
