pub mod app;
pub mod database;
pub mod oracle;

pub use app::{AppConfig, StorageBackend};
pub use database::{run_migrations, DatabaseConfig};
pub use oracle::OracleConfig;
