pub mod password;
pub mod session;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::headers::Cookie;
use axum_extra::TypedHeader;

use crate::{error::AppError, models::User, state::AppState};

use self::session::{hash_session_token, SESSION_COOKIE_NAME};

#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: User,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(cookies) = TypedHeader::<Cookie>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::unauthorized())?;

        let token = cookies
            .get(SESSION_COOKIE_NAME)
            .ok_or_else(AppError::unauthorized)?;

        let session_user = state.store.session_user(&hash_session_token(token)).await?;

        match session_user {
            Some((_, user)) => Ok(AuthenticatedUser { user }),
            None => Err(AppError::unauthorized()),
        }
    }
}
