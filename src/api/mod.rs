// HTTP surface: one router per domain, merged in `routes`

pub mod activities;
pub mod assessment;
pub mod auth;
pub mod chatbot;
pub mod coins;
pub mod food;
pub mod health;
pub mod profile;
pub mod routes;
pub mod state;

pub use routes::create_routes;
pub use state::AppState;
