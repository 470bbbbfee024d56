use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use libsql::Value;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::AppState;
use crate::auth::authenticate;
use crate::constants::*;
use crate::database::Db;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreateTransactionPayload, ListTransactionsQuery, ListTransactionsResponse, MessageResponse,
    Transaction, TransactionKind, UpdateTransactionPayload,
};
use crate::utils::{
    now_ts, parse_stored_decimal, validate_date, validate_limit, validate_month, validate_offset,
    validate_positive_amount, validate_string_length,
};
use crate::wallets::{load_wallet, save_wallet_balance};

const TRANSACTION_COLUMNS: &str =
    "id, user_id, wallet_id, description, amount, kind, category, date, created_at, updated_at";

pub fn extract_transaction_from_row(row: libsql::Row) -> ApiResult<Transaction> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let wallet_id: String = row.get(2)?;
    let description: String = row.get(3)?;
    let amount_raw: String = row.get(4)?;
    let kind_raw: String = row.get(5)?;
    let category: String = row.get(6)?;
    let date: String = row.get(7)?;
    let created_at: i64 = row.get(8)?;
    let updated_at: i64 = row.get(9)?;

    let amount = parse_stored_decimal(&amount_raw, "transaction amount")?;
    let kind = TransactionKind::parse(&kind_raw).ok_or_else(|| {
        ApiError::Internal(anyhow::anyhow!("corrupt transaction kind '{}'", kind_raw))
    })?;

    Ok(Transaction {
        id,
        user_id,
        wallet_id,
        description,
        amount,
        kind,
        category,
        date,
        created_at,
        updated_at,
    })
}

pub(crate) async fn insert_transaction(
    conn: &libsql::Connection,
    t: &Transaction,
) -> ApiResult<()> {
    conn.execute(
        "INSERT INTO transactions \
         (id, user_id, wallet_id, description, amount, kind, category, date, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            t.id.as_str(),
            t.user_id.as_str(),
            t.wallet_id.as_str(),
            t.description.as_str(),
            t.amount.to_string(),
            t.kind.as_str(),
            t.category.as_str(),
            t.date.as_str(),
            t.created_at,
            t.updated_at,
        ),
    )
    .await?;
    Ok(())
}

/// Fetch a transaction by id alone. Callers compare the stored owner stamp
/// themselves so they can answer 401 instead of 404 on a mismatch.
async fn load_transaction(
    conn: &libsql::Connection,
    transaction_id: &str,
) -> ApiResult<Option<Transaction>> {
    let mut rows = conn
        .query(
            &format!("SELECT {} FROM transactions WHERE id = ?", TRANSACTION_COLUMNS),
            [transaction_id],
        )
        .await?;

    match rows.next().await? {
        Some(row) => Ok(Some(extract_transaction_from_row(row)?)),
        None => Ok(None),
    }
}

/// Record an income or expense against a wallet. The journal row and the
/// balance change commit together; an expense never takes a balance below
/// zero.
pub async fn create_transaction(
    db: &Db,
    user_id: &str,
    payload: &CreateTransactionPayload,
) -> ApiResult<Transaction> {
    validate_string_length(&payload.description, "Description", MAX_DESCRIPTION_LENGTH)?;
    validate_string_length(&payload.category, "Category", MAX_CATEGORY_LENGTH)?;
    validate_positive_amount(payload.amount)?;
    validate_date(&payload.date)?;

    let conn = db.write().await;
    let tx = conn.transaction().await?;

    match apply_create(&tx, user_id, payload).await {
        Ok(transaction) => {
            tx.commit().await?;
            Ok(transaction)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "transaction create rollback failed");
            }
            Err(err)
        }
    }
}

async fn apply_create(
    conn: &libsql::Connection,
    user_id: &str,
    payload: &CreateTransactionPayload,
) -> ApiResult<Transaction> {
    let mut wallet = load_wallet(conn, &payload.wallet_id, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(ERR_WALLET_NOT_FOUND.to_string()))?;

    let new_balance = wallet.balance + payload.kind.signed(payload.amount);
    if new_balance < Decimal::ZERO {
        return Err(ApiError::Conflict(ERR_INSUFFICIENT_FUNDS.to_string()));
    }

    let now = now_ts();
    let transaction = Transaction {
        id: Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        wallet_id: wallet.id.clone(),
        description: payload.description.trim().to_string(),
        amount: payload.amount,
        kind: payload.kind,
        category: payload.category.trim().to_string(),
        date: payload.date.clone(),
        created_at: now,
        updated_at: now,
    };

    insert_transaction(conn, &transaction).await?;
    wallet.balance = new_balance;
    wallet.updated_at = now;
    save_wallet_balance(conn, &wallet).await?;

    Ok(transaction)
}

pub async fn list_transactions(
    db: &Db,
    user_id: &str,
    query: &ListTransactionsQuery,
) -> ApiResult<ListTransactionsResponse> {
    let limit = validate_limit(query.limit)?;
    let offset = validate_offset(query.offset)?;

    let mut filters = String::from("user_id = ?");
    let mut params: Vec<Value> = vec![Value::Text(user_id.to_string())];

    if let Some(wallet_id) = &query.wallet_id {
        if wallet_id.trim().is_empty() {
            return Err(ApiError::Validation("Wallet ID cannot be empty".to_string()));
        }
        filters.push_str(" AND wallet_id = ?");
        params.push(Value::Text(wallet_id.clone()));
    }
    if let Some(month) = &query.month {
        validate_month(month)?;
        filters.push_str(" AND date LIKE ?");
        params.push(Value::Text(format!("{}%", month)));
    }
    if let Some(category) = &query.category {
        validate_string_length(category, "Category filter", MAX_SEARCH_TERM_LENGTH)?;
        filters.push_str(" AND category LIKE ?");
        params.push(Value::Text(format!("%{}%", category.trim())));
    }
    if let Some(search) = &query.search {
        validate_string_length(search, "Search term", MAX_SEARCH_TERM_LENGTH)?;
        filters.push_str(" AND description LIKE ?");
        params.push(Value::Text(format!("%{}%", search.trim())));
    }

    let conn = db.read().await;

    let count_sql = format!("SELECT COUNT(*) FROM transactions WHERE {}", filters);
    let mut count_rows = conn.query(&count_sql, params.clone()).await?;
    let total_count: u32 = match count_rows.next().await? {
        Some(row) => row.get(0)?,
        None => 0,
    };

    let list_sql = format!(
        "SELECT {} FROM transactions WHERE {} \
         ORDER BY date DESC, created_at DESC, rowid DESC LIMIT ? OFFSET ?",
        TRANSACTION_COLUMNS, filters
    );
    params.push(Value::Integer(limit as i64));
    params.push(Value::Integer(offset as i64));

    let mut rows = conn.query(&list_sql, params).await?;
    let mut transactions = Vec::new();
    while let Some(row) = rows.next().await? {
        transactions.push(extract_transaction_from_row(row)?);
    }

    Ok(ListTransactionsResponse {
        transactions,
        total_count,
    })
}

/// Edit a transaction. The wallet balance is re-derived: the old effect is
/// reversed and the new one applied in the same storage transaction, so
/// balances cannot drift after edits.
pub async fn update_transaction(
    db: &Db,
    user_id: &str,
    transaction_id: &str,
    payload: &UpdateTransactionPayload,
) -> ApiResult<Transaction> {
    if payload.description.is_none()
        && payload.amount.is_none()
        && payload.kind.is_none()
        && payload.category.is_none()
        && payload.date.is_none()
    {
        return Err(ApiError::Validation(
            "At least one field must be provided for update".to_string(),
        ));
    }
    if let Some(description) = &payload.description {
        validate_string_length(description, "Description", MAX_DESCRIPTION_LENGTH)?;
    }
    if let Some(category) = &payload.category {
        validate_string_length(category, "Category", MAX_CATEGORY_LENGTH)?;
    }
    if let Some(amount) = payload.amount {
        validate_positive_amount(amount)?;
    }
    if let Some(date) = &payload.date {
        validate_date(date)?;
    }

    let conn = db.write().await;
    let tx = conn.transaction().await?;

    match apply_update(&tx, user_id, transaction_id, payload).await {
        Ok(transaction) => {
            tx.commit().await?;
            Ok(transaction)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "transaction update rollback failed");
            }
            Err(err)
        }
    }
}

async fn apply_update(
    conn: &libsql::Connection,
    user_id: &str,
    transaction_id: &str,
    payload: &UpdateTransactionPayload,
) -> ApiResult<Transaction> {
    let mut transaction = load_transaction(conn, transaction_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(ERR_TRANSACTION_NOT_FOUND.to_string()))?;

    if transaction.user_id != user_id {
        return Err(ApiError::Unauthorized(
            "User not authorized to update this transaction".to_string(),
        ));
    }

    let mut wallet = load_wallet(conn, &transaction.wallet_id, &transaction.user_id)
        .await?
        .ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!(
                "transaction {} references missing wallet {}",
                transaction.id,
                transaction.wallet_id
            ))
        })?;

    let old_effect = transaction.kind.signed(transaction.amount);

    if let Some(description) = &payload.description {
        transaction.description = description.trim().to_string();
    }
    if let Some(amount) = payload.amount {
        transaction.amount = amount;
    }
    if let Some(kind) = payload.kind {
        transaction.kind = kind;
    }
    if let Some(category) = &payload.category {
        transaction.category = category.trim().to_string();
    }
    if let Some(date) = &payload.date {
        transaction.date = date.clone();
    }

    let now = now_ts();
    transaction.updated_at = now;

    let new_effect = transaction.kind.signed(transaction.amount);
    let new_balance = wallet.balance - old_effect + new_effect;
    if new_balance < Decimal::ZERO {
        return Err(ApiError::Conflict(ERR_INSUFFICIENT_FUNDS.to_string()));
    }

    conn.execute(
        "UPDATE transactions SET description = ?, amount = ?, kind = ?, category = ?, date = ?, \
         updated_at = ? WHERE id = ?",
        (
            transaction.description.as_str(),
            transaction.amount.to_string(),
            transaction.kind.as_str(),
            transaction.category.as_str(),
            transaction.date.as_str(),
            transaction.updated_at,
            transaction.id.as_str(),
        ),
    )
    .await?;

    if new_balance != wallet.balance {
        wallet.balance = new_balance;
        wallet.updated_at = now;
        save_wallet_balance(conn, &wallet).await?;
    }

    Ok(transaction)
}

/// Remove a transaction, reversing its effect on the wallet in the same
/// storage transaction. Refused when reversing an income would push the
/// balance negative.
pub async fn delete_transaction(
    db: &Db,
    user_id: &str,
    transaction_id: &str,
) -> ApiResult<()> {
    let conn = db.write().await;
    let tx = conn.transaction().await?;

    match apply_delete(&tx, user_id, transaction_id).await {
        Ok(()) => {
            tx.commit().await?;
            Ok(())
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "transaction delete rollback failed");
            }
            Err(err)
        }
    }
}

async fn apply_delete(
    conn: &libsql::Connection,
    user_id: &str,
    transaction_id: &str,
) -> ApiResult<()> {
    let transaction = load_transaction(conn, transaction_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(ERR_TRANSACTION_NOT_FOUND.to_string()))?;

    if transaction.user_id != user_id {
        return Err(ApiError::Unauthorized(
            "User not authorized to delete this transaction".to_string(),
        ));
    }

    let mut wallet = load_wallet(conn, &transaction.wallet_id, &transaction.user_id)
        .await?
        .ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!(
                "transaction {} references missing wallet {}",
                transaction.id,
                transaction.wallet_id
            ))
        })?;

    let new_balance = wallet.balance - transaction.kind.signed(transaction.amount);
    if new_balance < Decimal::ZERO {
        return Err(ApiError::Conflict(
            "Cannot delete transaction: wallet balance would go negative".to_string(),
        ));
    }

    conn.execute(
        "DELETE FROM transactions WHERE id = ?",
        [transaction.id.as_str()],
    )
    .await?;

    wallet.balance = new_balance;
    wallet.updated_at = now_ts();
    save_wallet_balance(conn, &wallet).await?;

    Ok(())
}

// HTTP handlers

pub async fn create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateTransactionPayload>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let user = authenticate(&state, &headers).await?;
    let transaction = create_transaction(&state.db, &user.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<(StatusCode, Json<ListTransactionsResponse>), ApiError> {
    let user = authenticate(&state, &headers).await?;
    let response = list_transactions(&state.db, &user.id, &query).await?;
    Ok((StatusCode::OK, Json(response)))
}

pub async fn update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(transaction_id): Path<String>,
    Json(payload): Json<UpdateTransactionPayload>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let user = authenticate(&state, &headers).await?;
    let transaction = update_transaction(&state.db, &user.id, &transaction_id, &payload).await?;
    Ok((StatusCode::OK, Json(transaction)))
}

pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(transaction_id): Path<String>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let user = authenticate(&state, &headers).await?;
    delete_transaction(&state.db, &user.id, &transaction_id).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Transaction removed successfully".to_string(),
        }),
    ))
}
