use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::AppState;
use crate::auth::authenticate;
use crate::constants::MAX_LIMIT;
use crate::error::ApiError;
use crate::models::{ListTransactionsQuery, Transaction, TransactionKind};
use crate::transactions::list_transactions;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub net: Decimal,
    pub expense_by_category: BTreeMap<String, Decimal>,
    pub transaction_count: usize,
}

/// Aggregate an already-fetched transaction set. Pure; the only storage
/// access in this module is the handler's fetch.
pub fn summarize(transactions: &[Transaction]) -> Summary {
    let mut total_income = Decimal::ZERO;
    let mut total_expense = Decimal::ZERO;
    let mut expense_by_category: BTreeMap<String, Decimal> = BTreeMap::new();

    for t in transactions {
        match t.kind {
            TransactionKind::Income => total_income += t.amount,
            TransactionKind::Expense => {
                total_expense += t.amount;
                *expense_by_category
                    .entry(t.category.clone())
                    .or_insert(Decimal::ZERO) += t.amount;
            }
        }
    }

    Summary {
        total_income,
        total_expense,
        net: total_income - total_expense,
        expense_by_category,
        transaction_count: transactions.len(),
    }
}

/// GET /reports/summary — same filters as the transaction list, aggregated.
pub async fn summary(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<(StatusCode, Json<Summary>), ApiError> {
    let user = authenticate(&state, &headers).await?;

    // Aggregate over as much as one page can carry unless the caller narrows it
    let query = ListTransactionsQuery {
        limit: Some(query.limit.unwrap_or(MAX_LIMIT)),
        ..query
    };
    let listing = list_transactions(&state.db, &user.id, &query).await?;

    Ok((StatusCode::OK, Json(summarize(&listing.transactions))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::now_ts;

    fn tx(kind: TransactionKind, amount: &str, category: &str) -> Transaction {
        Transaction {
            id: format!("tx-{}-{}", category, amount),
            user_id: "user-1".to_string(),
            wallet_id: "wallet-1".to_string(),
            description: "test".to_string(),
            amount: amount.parse().unwrap(),
            kind,
            category: category.to_string(),
            date: "2026-08-01".to_string(),
            created_at: now_ts(),
            updated_at: now_ts(),
        }
    }

    #[test]
    fn empty_set_sums_to_zero() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_income, Decimal::ZERO);
        assert_eq!(summary.total_expense, Decimal::ZERO);
        assert_eq!(summary.net, Decimal::ZERO);
        assert!(summary.expense_by_category.is_empty());
        assert_eq!(summary.transaction_count, 0);
    }

    #[test]
    fn sums_income_and_expense_separately() {
        let transactions = vec![
            tx(TransactionKind::Income, "1500", "Salary"),
            tx(TransactionKind::Expense, "300.50", "Groceries"),
            tx(TransactionKind::Expense, "99.99", "Entertainment"),
        ];
        let summary = summarize(&transactions);

        assert_eq!(summary.total_income, "1500".parse().unwrap());
        assert_eq!(summary.total_expense, "400.49".parse().unwrap());
        assert_eq!(summary.net, "1099.51".parse().unwrap());
        assert_eq!(summary.transaction_count, 3);
    }

    #[test]
    fn groups_expenses_by_category() {
        let transactions = vec![
            tx(TransactionKind::Expense, "20", "Groceries"),
            tx(TransactionKind::Expense, "35.25", "Groceries"),
            tx(TransactionKind::Expense, "12", "Transport"),
            tx(TransactionKind::Income, "500", "Salary"),
        ];
        let summary = summarize(&transactions);

        assert_eq!(summary.expense_by_category.len(), 2);
        assert_eq!(
            summary.expense_by_category["Groceries"],
            "55.25".parse().unwrap()
        );
        assert_eq!(summary.expense_by_category["Transport"], "12".parse().unwrap());
        // Income never lands in the expense breakdown
        assert!(!summary.expense_by_category.contains_key("Salary"));
    }

    #[test]
    fn net_can_be_negative() {
        let transactions = vec![
            tx(TransactionKind::Income, "100", "Salary"),
            tx(TransactionKind::Expense, "250", "Rent"),
        ];
        let summary = summarize(&transactions);
        assert_eq!(summary.net, "-150".parse().unwrap());
    }
}
