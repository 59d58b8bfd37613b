use regex::Regex;
use std::sync::OnceLock;

use super::{ActivityLogRequest, AssessmentRequest, CoinRequest, ProfileUpdateRequest};
use crate::errors::ValidationError;

type Result<T> = std::result::Result<T, ValidationError>;

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok())
        .as_ref()
}

/// Email validation
pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Err(ValidationError::new("email", "Email cannot be empty"));
    }

    if email.len() > 255 {
        return Err(ValidationError::new("email", "Email cannot be longer than 255 characters"));
    }

    if !email_regex().is_some_and(|re| re.is_match(email)) {
        return Err(ValidationError::new("email", "Invalid email format"));
    }

    Ok(())
}

/// Password validation
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < 6 {
        return Err(ValidationError::new("password", "Password must be at least 6 characters long"));
    }

    if password.len() > 128 {
        return Err(ValidationError::new("password", "Password cannot be longer than 128 characters"));
    }

    Ok(())
}

pub fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(ValidationError::new("username", "Username cannot be empty"));
    }
    if username.len() > 50 {
        return Err(ValidationError::new("username", "Username cannot be longer than 50 characters"));
    }
    Ok(())
}

fn validate_answer(value: i32, field: &'static str) -> Result<()> {
    if !(1..=4).contains(&value) {
        return Err(ValidationError::new(field, "Answer must be between 1 and 4"));
    }
    Ok(())
}

/// Validate the four questionnaire answers
pub fn validate_assessment(req: &AssessmentRequest) -> Result<()> {
    validate_answer(req.screen_time_hours, "screen_time_hours")?;
    validate_answer(req.exercise_hours, "exercise_hours")?;
    validate_answer(req.late_night_frequency, "late_night_frequency")?;
    validate_answer(req.diet_quality, "diet_quality")?;
    Ok(())
}

/// Validate a ledger request before it reaches the ledger
pub fn validate_coin_request(req: &CoinRequest) -> Result<()> {
    if req.amount <= 0 {
        return Err(ValidationError::new("amount", "Amount must be greater than zero"));
    }
    if req.transaction_type.trim().is_empty() {
        return Err(ValidationError::new("transaction_type", "Transaction type cannot be empty"));
    }
    if req.transaction_type.chars().count() > 50 {
        return Err(ValidationError::new(
            "transaction_type",
            "Transaction type cannot be longer than 50 characters",
        ));
    }
    Ok(())
}

pub fn validate_activity(req: &ActivityLogRequest) -> Result<()> {
    if req.activity_type.trim().is_empty() {
        return Err(ValidationError::new("activity_type", "Activity type cannot be empty"));
    }
    if req.activity_type.chars().count() > 50 {
        return Err(ValidationError::new("activity_type", "Activity type cannot be longer than 50 characters"));
    }

    if req.duration_minutes < 1 {
        return Err(ValidationError::new("duration_minutes", "Duration must be at least 1 minute"));
    }

    if req.distance_km.is_some_and(|d| d < 0.0 || !d.is_finite()) {
        return Err(ValidationError::new("distance_km", "Distance cannot be negative"));
    }

    if req.calories_burned.is_some_and(|c| c < 0) {
        return Err(ValidationError::new("calories_burned", "Calories cannot be negative"));
    }

    if req.heart_rate_avg.is_some_and(|hr| hr < 0) {
        return Err(ValidationError::new("heart_rate_avg", "Heart rate cannot be negative"));
    }

    if req.avg_pace.is_some_and(|p| p < 0.0 || !p.is_finite()) {
        return Err(ValidationError::new("avg_pace", "Pace cannot be negative"));
    }

    Ok(())
}

/// Validate body measurements
pub fn validate_profile(req: &ProfileUpdateRequest) -> Result<()> {
    if !(1..=120).contains(&req.age) {
        return Err(ValidationError::new("age", "Age must be between 1 and 120"));
    }
    if !(50.0..=250.0).contains(&req.height) {
        return Err(ValidationError::new("height", "Height must be between 50 and 250 cm"));
    }
    if !(20.0..=300.0).contains(&req.weight) {
        return Err(ValidationError::new("weight", "Weight must be between 20 and 300 kg"));
    }
    Ok(())
}
