use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, instrument, warn};

use crate::errors::ServiceError;
use crate::models::validation::validate_coin_request;
use crate::models::{CoinAccount, CoinRequest, CoinTransaction, LedgerEntry, LedgerReceipt};
use crate::repository::CoinRepository;

/// Coin ledger. Balance changes and their transaction rows are applied
/// together; writes for one user are serialized so a debit's balance check
/// can never race another write.
#[derive(Clone)]
pub struct CoinService {
    coins: Arc<dyn CoinRepository>,
    locks: Arc<Mutex<HashMap<i32, Arc<AsyncMutex<()>>>>>,
}

impl CoinService {
    pub fn new(coins: Arc<dyn CoinRepository>) -> Self {
        Self {
            coins,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `op` holding the user's ledger lock. The lock entry is dropped
    /// from the map once no other task holds or waits on it.
    async fn with_user_lock<T>(&self, user_id: i32, op: impl Future<Output = T>) -> T {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            locks
                .entry(user_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        let result = {
            let _guard = lock.lock().await;
            op.await
        };

        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        drop(lock);
        if locks.get(&user_id).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(&user_id);
        }
        result
    }

    /// Create a zero-balance account if the user has none yet
    pub async fn ensure_account(&self, user_id: i32) -> Result<CoinAccount, ServiceError> {
        Ok(self.coins.ensure_account(user_id).await?)
    }

    pub async fn get_balance(&self, user_id: i32) -> Result<CoinAccount, ServiceError> {
        self.ensure_account(user_id).await
    }

    /// Add coins to the user's balance
    #[instrument(skip(self, request), fields(amount = request.amount, kind = %request.transaction_type))]
    pub async fn credit(&self, user_id: i32, request: &CoinRequest) -> Result<LedgerReceipt, ServiceError> {
        validate_coin_request(request)?;

        self.with_user_lock(user_id, async {
            let (account, transaction) = self
                .coins
                .record(LedgerEntry::credit(user_id, request))
                .await?;

            info!("Credited {} coins, balance now {}", request.amount, account.total_coins);
            Ok::<_, ServiceError>(LedgerReceipt { account, transaction })
        })
        .await
    }

    /// Spend coins. Fails with `InsufficientFunds` and changes nothing when
    /// the balance is lower than the amount.
    #[instrument(skip(self, request), fields(amount = request.amount, kind = %request.transaction_type))]
    pub async fn debit(&self, user_id: i32, request: &CoinRequest) -> Result<LedgerReceipt, ServiceError> {
        validate_coin_request(request)?;

        self.with_user_lock(user_id, async {
            let balance = self.coins.ensure_account(user_id).await?.total_coins;
            if balance < request.amount {
                warn!("Debit of {} rejected, balance {}", request.amount, balance);
                return Err(ServiceError::InsufficientFunds {
                    balance,
                    requested: request.amount,
                });
            }

            let (account, transaction) = self
                .coins
                .record(LedgerEntry::debit(user_id, request))
                .await?;

            info!("Debited {} coins, balance now {}", request.amount, account.total_coins);
            Ok::<_, ServiceError>(LedgerReceipt { account, transaction })
        })
        .await
    }

    /// Transactions, newest first
    pub async fn history(&self, user_id: i32) -> Result<Vec<CoinTransaction>, ServiceError> {
        Ok(self.coins.transactions(user_id).await?)
    }
}
