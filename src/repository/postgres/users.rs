use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::conflict_or_database;
use crate::models::{NewUser, User, UserVitals};
use crate::repository::{RepoResult, RepositoryError, UserRepository};

const USER_COLUMNS: &str =
    "id, username, email, password_hash, google_id, age, height, weight, created_at, updated_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: i32,
    username: String,
    email: String,
    password_hash: Option<String>,
    google_id: Option<String>,
    age: Option<i32>,
    height: Option<f64>,
    weight: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            google_id: row.google_id,
            age: row.age,
            height: row.height,
            weight: row.weight,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_one(&self, filter: &str, value: &str) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, filter);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(User::from))
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash, google_id) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.google_id)
            .fetch_one(&self.db)
            .await
            .map_err(|e| conflict_or_database(e, "User"))?;
        Ok(row.into())
    }

    async fn get_by_id(&self, id: i32) -> RepoResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(User::from))
    }

    async fn get_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        self.find_one("email", email).await
    }

    async fn get_by_google_id(&self, google_id: &str) -> RepoResult<Option<User>> {
        self.find_one("google_id", google_id).await
    }

    async fn link_google_id(&self, user_id: i32, google_id: &str) -> RepoResult<User> {
        let sql = format!(
            "UPDATE users SET google_id = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(google_id)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await
            .map_err(|e| conflict_or_database(e, "Google account"))?
            .map(User::from)
            .ok_or_else(|| RepositoryError::not_found("User"))
    }

    async fn update_profile(&self, user_id: i32, vitals: UserVitals) -> RepoResult<User> {
        let sql = format!(
            "UPDATE users SET age = $1, height = $2, weight = $3, updated_at = NOW() \
             WHERE id = $4 RETURNING {}",
            USER_COLUMNS
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(vitals.age)
            .bind(vitals.height)
            .bind(vitals.weight)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?
            .map(User::from)
            .ok_or_else(|| RepositoryError::not_found("User"))
    }
}
