use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::auth::{AuthError, JwtService};
use crate::models::validation::{validate_email, validate_password, validate_username};
use crate::models::{AuthResponse, GoogleLoginRequest, LoginRequest, NewUser, SignupRequest, User};
use crate::repository::{RepositoryError, UserRepository};
use crate::ValidationError;

/// Account creation and sign-in. Every successful call returns a fresh token.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    jwt_service: JwtService,
    hash_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, jwt_service: JwtService) -> Self {
        Self {
            users,
            jwt_service,
            hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Lower bcrypt cost, for tests.
    pub fn with_hash_cost(mut self, cost: u32) -> Self {
        self.hash_cost = cost;
        self
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt_service
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: SignupRequest) -> Result<AuthResponse, AuthError> {
        let email = request.email.trim();
        validate_username(&request.username)?;
        validate_email(email)?;
        validate_password(&request.password)?;

        if self.users.get_by_email(email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = bcrypt::hash(&request.password, self.hash_cost)?;
        let user = self
            .users
            .create_user(NewUser {
                username: request.username.trim().to_string(),
                email: email.to_string(),
                password_hash: Some(password_hash),
                google_id: None,
            })
            .await
            .map_err(duplicate_email)?;

        info!("User {} registered", user.id);
        self.respond(user)
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        let user = self
            .users
            .get_by_email(request.email.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        // Google-only accounts have no password to check against
        let hash = user
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        if !bcrypt::verify(&request.password, hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        self.respond(user)
    }

    /// Find by Google id, else link the Google id to the account with the
    /// same e-mail, else create a password-less account.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn google_login(&self, request: GoogleLoginRequest) -> Result<AuthResponse, AuthError> {
        if request.google_id.trim().is_empty() {
            return Err(ValidationError::new("google_id", "Google id is required").into());
        }
        let email = request.email.trim();
        validate_email(email)?;

        if let Some(user) = self.users.get_by_google_id(&request.google_id).await? {
            return self.respond(user);
        }

        if let Some(existing) = self.users.get_by_email(email).await? {
            let user = self.users.link_google_id(existing.id, &request.google_id).await?;
            info!("Linked Google account to user {}", user.id);
            return self.respond(user);
        }

        let username = match request.username.trim() {
            "" => email
                .split('@')
                .next()
                .unwrap_or_default()
                .to_string(),
            name => name.to_string(),
        };
        let user = self
            .users
            .create_user(NewUser {
                username,
                email: email.to_string(),
                password_hash: None,
                google_id: Some(request.google_id.clone()),
            })
            .await
            .map_err(duplicate_email)?;

        info!("User {} registered through Google", user.id);
        self.respond(user)
    }

    fn respond(&self, user: User) -> Result<AuthResponse, AuthError> {
        let token = self.jwt_service.create_token(user.id, &user.email)?;
        Ok(AuthResponse { token, user })
    }
}

fn duplicate_email(err: RepositoryError) -> AuthError {
    match err {
        RepositoryError::Conflict(what) => {
            warn!("Concurrent signup lost the race: {}", what);
            AuthError::EmailAlreadyExists
        }
        other => AuthError::Database(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryStore;
    use assert_matches::assert_matches;

    fn service() -> AuthService {
        AuthService::new(Arc::new(MemoryStore::new()), JwtService::new("test_secret"))
            .with_hash_cost(4)
    }

    fn signup(email: &str) -> SignupRequest {
        SignupRequest {
            username: "budi".to_string(),
            email: email.to_string(),
            password: "secret123".to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let auth = service();
        let registered = auth.register(signup("budi@example.com")).await.unwrap();
        assert_eq!(auth.jwt().validate_token(&registered.token).unwrap().sub, registered.user.id);

        let logged_in = auth
            .login(LoginRequest {
                email: "budi@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let auth = service();
        auth.register(signup("budi@example.com")).await.unwrap();
        assert_matches!(
            auth.register(signup("budi@example.com")).await,
            Err(AuthError::EmailAlreadyExists)
        );
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let auth = service();
        auth.register(signup("budi@example.com")).await.unwrap();
        let result = auth
            .login(LoginRequest {
                email: "budi@example.com".to_string(),
                password: "nope-nope".to_string(),
            })
            .await;
        assert_matches!(result, Err(AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn google_login_links_existing_account() {
        let auth = service();
        let registered = auth.register(signup("budi@example.com")).await.unwrap();

        let google = auth
            .google_login(GoogleLoginRequest {
                google_id: "g-123".to_string(),
                email: "budi@example.com".to_string(),
                username: "Budi".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(google.user.id, registered.user.id);
        assert_eq!(google.user.google_id.as_deref(), Some("g-123"));
    }

    #[tokio::test]
    async fn google_only_account_cannot_password_login() {
        let auth = service();
        auth.google_login(GoogleLoginRequest {
            google_id: "g-9".to_string(),
            email: "sari@example.com".to_string(),
            username: String::new(),
        })
        .await
        .unwrap();

        let result = auth
            .login(LoginRequest {
                email: "sari@example.com".to_string(),
                password: "anything".to_string(),
            })
            .await;
        assert_matches!(result, Err(AuthError::InvalidCredentials));
    }
}
