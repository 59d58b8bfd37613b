use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::models::{CoinAccount, CoinTransaction, LedgerEntry};
use crate::repository::{CoinRepository, RepoResult, RepositoryError};

#[derive(Debug, FromRow)]
struct CoinAccountRow {
    id: i32,
    user_id: i32,
    total_coins: i64,
    updated_at: DateTime<Utc>,
}

impl From<CoinAccountRow> for CoinAccount {
    fn from(row: CoinAccountRow) -> Self {
        CoinAccount {
            id: row.id,
            user_id: row.user_id,
            total_coins: row.total_coins,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct CoinTransactionRow {
    id: i32,
    user_id: i32,
    amount: i64,
    transaction_type: String,
    reference_id: Option<i32>,
    reference_type: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CoinTransactionRow> for CoinTransaction {
    fn from(row: CoinTransactionRow) -> Self {
        CoinTransaction {
            id: row.id,
            user_id: row.user_id,
            amount: row.amount,
            transaction_type: row.transaction_type,
            reference_id: row.reference_id,
            reference_type: row.reference_type,
            created_at: row.created_at,
        }
    }
}

#[derive(Clone)]
pub struct PgCoinRepository {
    db: PgPool,
}

impl PgCoinRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn insert_account_if_missing(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i32,
    ) -> RepoResult<()> {
        sqlx::query("INSERT INTO user_coins (user_id, total_coins) VALUES ($1, 0) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CoinRepository for PgCoinRepository {
    async fn ensure_account(&self, user_id: i32) -> RepoResult<CoinAccount> {
        let mut tx = self.db.begin().await?;
        Self::insert_account_if_missing(&mut tx, user_id).await?;

        let account = sqlx::query_as::<_, CoinAccountRow>(
            "SELECT id, user_id, total_coins, updated_at FROM user_coins WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(account.into())
    }

    async fn get_account(&self, user_id: i32) -> RepoResult<Option<CoinAccount>> {
        let account = sqlx::query_as::<_, CoinAccountRow>(
            "SELECT id, user_id, total_coins, updated_at FROM user_coins WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(account.map(CoinAccount::from))
    }

    async fn record(&self, entry: LedgerEntry) -> RepoResult<(CoinAccount, CoinTransaction)> {
        let mut tx = self.db.begin().await?;
        Self::insert_account_if_missing(&mut tx, entry.user_id).await?;

        // Row lock serializes concurrent ledger writes for this user.
        let (balance,): (i64,) =
            sqlx::query_as("SELECT total_coins FROM user_coins WHERE user_id = $1 FOR UPDATE")
                .bind(entry.user_id)
                .fetch_one(&mut *tx)
                .await?;

        let new_balance = balance.checked_add(entry.amount).ok_or(RepositoryError::BalanceOverflow {
            balance,
            amount: entry.amount,
        })?;
        if new_balance < 0 {
            return Err(RepositoryError::InsufficientFunds {
                balance,
                requested: -entry.amount,
            });
        }

        let account = sqlx::query_as::<_, CoinAccountRow>(
            r#"
            UPDATE user_coins
            SET total_coins = total_coins + $1, updated_at = NOW()
            WHERE user_id = $2 AND total_coins + $1 >= 0
            RETURNING id, user_id, total_coins, updated_at
            "#,
        )
        .bind(entry.amount)
        .bind(entry.user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::InsufficientFunds {
            balance,
            requested: -entry.amount,
        })?;

        let transaction = sqlx::query_as::<_, CoinTransactionRow>(
            r#"
            INSERT INTO coin_transactions
                (user_id, amount, transaction_type, reference_id, reference_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, amount, transaction_type, reference_id, reference_type, created_at
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.amount)
        .bind(&entry.transaction_type)
        .bind(entry.reference_id)
        .bind(&entry.reference_type)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok((account.into(), transaction.into()))
    }

    async fn transactions(&self, user_id: i32) -> RepoResult<Vec<CoinTransaction>> {
        let rows = sqlx::query_as::<_, CoinTransactionRow>(
            r#"
            SELECT id, user_id, amount, transaction_type, reference_id, reference_type, created_at
            FROM coin_transactions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(CoinTransaction::from).collect())
    }
}
