//! SIGAP health-tracking backend: stroke-risk assessment, activity rewards,
//! the coin ledger, food analysis and the health chatbot.

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod models;
pub mod oracle;
pub mod repository;
pub mod services;

pub use errors::{ServiceError, ValidationError};
