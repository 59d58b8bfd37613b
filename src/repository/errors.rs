use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Insufficient coins: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: i64, requested: i64 },

    #[error("Balance {balance} cannot absorb {amount} more coins")]
    BalanceOverflow { balance: i64, amount: i64 },

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl RepositoryError {
    pub fn not_found(what: impl Into<String>) -> Self {
        RepositoryError::NotFound(what.into())
    }
}

pub type RepoResult<T> = Result<T, RepositoryError>;
