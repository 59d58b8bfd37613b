// Domain models and request/response payloads

pub mod user;
pub mod health_profile;
pub mod assessment;
pub mod coin;
pub mod activity;
pub mod chatbot;
pub mod food;
pub mod validation;

pub use user::*;
pub use health_profile::*;
pub use assessment::*;
pub use coin::*;
pub use activity::*;
pub use chatbot::*;
pub use food::*;
