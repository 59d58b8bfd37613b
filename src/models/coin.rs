use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinAccount {
    pub id: i32,
    pub user_id: i32,
    pub total_coins: i64,
    pub updated_at: DateTime<Utc>,
}

/// Append-only ledger row. Positive amounts are credits, negative are debits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinTransaction {
    pub id: i32,
    pub user_id: i32,
    pub amount: i64,
    pub transaction_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Body of both `/api/coins/add` and `/api/coins/spend`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinRequest {
    pub amount: i64,
    pub transaction_type: String,
    #[serde(default)]
    pub reference_id: Option<i32>,
    #[serde(default)]
    pub reference_type: Option<String>,
}

impl CoinRequest {
    pub fn new(amount: i64, transaction_type: impl Into<String>) -> Self {
        Self {
            amount,
            transaction_type: transaction_type.into(),
            reference_id: None,
            reference_type: None,
        }
    }

    pub fn with_reference(mut self, reference_id: i32, reference_type: impl Into<String>) -> Self {
        self.reference_id = Some(reference_id);
        self.reference_type = Some(reference_type.into());
        self
    }
}

/// A signed balance change handed to the repository, applied together with
/// its transaction row as one atomic unit.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub user_id: i32,
    pub amount: i64,
    pub transaction_type: String,
    pub reference_id: Option<i32>,
    pub reference_type: Option<String>,
}

impl LedgerEntry {
    pub fn credit(user_id: i32, request: &CoinRequest) -> Self {
        Self::signed(user_id, request.amount, request)
    }

    pub fn debit(user_id: i32, request: &CoinRequest) -> Self {
        Self::signed(user_id, -request.amount, request)
    }

    fn signed(user_id: i32, amount: i64, request: &CoinRequest) -> Self {
        Self {
            user_id,
            amount,
            transaction_type: request.transaction_type.clone(),
            reference_id: request.reference_id,
            reference_type: request.reference_type.clone(),
        }
    }
}

/// Outcome of a credit or debit: the new balance and the appended row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerReceipt {
    pub account: CoinAccount,
    pub transaction: CoinTransaction,
}
