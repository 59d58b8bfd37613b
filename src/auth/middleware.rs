use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    RequestPartsExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::auth::{AuthError, JwtService};

/// Authenticated caller, extracted from `Authorization: Bearer <token>`.
/// Handlers take it as an argument and pass `user_id` into service calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i32,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    JwtService: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|rejection| {
                if rejection.is_missing() {
                    AuthError::MissingAuthHeader
                } else {
                    AuthError::InvalidAuthHeaderFormat
                }
            })?;

        let claims = JwtService::from_ref(state).validate_token(bearer.token())?;
        Ok(AuthUser { user_id: claims.sub })
    }
}
