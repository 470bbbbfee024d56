use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct User {
    pub id: String,
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WalletKind {
    #[default]
    Cash,
    Bank,
    Card,
    Crypto,
}

impl WalletKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletKind::Cash => "cash",
            WalletKind::Bank => "bank",
            WalletKind::Card => "card",
            WalletKind::Crypto => "crypto",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(WalletKind::Cash),
            "bank" => Some(WalletKind::Bank),
            "card" => Some(WalletKind::Card),
            "crypto" => Some(WalletKind::Crypto),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Wallet {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: WalletKind,
    pub balance: Decimal,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "income" => Some(TransactionKind::Income),
            "expense" => Some(TransactionKind::Expense),
            _ => None,
        }
    }

    /// The effect of a transaction of this kind on its wallet's balance.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            TransactionKind::Income => amount,
            TransactionKind::Expense => -amount,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub wallet_id: String,
    pub description: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub date: String,
    pub created_at: i64,
    pub updated_at: i64,
}

// Request payloads are strict: unknown or mistyped fields are rejected.

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct CreateWalletPayload {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: WalletKind,
    #[serde(default)]
    pub balance: Decimal,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct UpdateWalletPayload {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<WalletKind>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct TransferPayload {
    pub from_wallet_id: String,
    pub to_wallet_id: String,
    pub amount: Decimal,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
pub struct CreateTransactionPayload {
    pub wallet_id: String,
    pub description: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub date: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct UpdateTransactionPayload {
    pub description: Option<String>,
    pub amount: Option<Decimal>,
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub date: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct ListTransactionsQuery {
    /// Restrict to a calendar month, formatted YYYY-MM.
    pub month: Option<String>,
    /// Substring match on category.
    pub category: Option<String>,
    /// Substring match on description.
    pub search: Option<String>,
    pub wallet_id: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Serialize, Debug)]
pub struct ListTransactionsResponse {
    pub transactions: Vec<Transaction>,
    pub total_count: u32,
}

#[derive(Serialize, Debug)]
pub struct TransferResponse {
    pub message: String,
    pub from_wallet: Wallet,
    pub to_wallet: Wallet,
    pub expense: Transaction,
    pub income: Transaction,
}

#[derive(Serialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}
