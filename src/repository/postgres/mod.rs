mod activities;
mod assessments;
mod chatbot;
mod coins;
mod food;
mod users;

pub use activities::PgActivityRepository;
pub use assessments::PgAssessmentRepository;
pub use chatbot::PgChatbotRepository;
pub use coins::PgCoinRepository;
pub use food::PgFoodRepository;
pub use users::PgUserRepository;

use super::RepositoryError;

/// Map a unique-constraint violation to `Conflict`, everything else to
/// `Database`.
pub(crate) fn conflict_or_database(err: sqlx::Error, what: &str) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(format!("{} already exists", what))
        }
        _ => RepositoryError::Database(err),
    }
}
