use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    Json,
};
use axum_extra::{headers::Cookie, typed_header::TypedHeader};
use chrono::{Duration as ChronoDuration, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::{password, session, AuthenticatedUser},
    error::{AppError, AppResult},
    models::{NewSession, NewUser, User, UserRole},
    state::AppState,
    utils::json::AppJson,
};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub role: UserRole,
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> AppResult<(StatusCode, HeaderMap, Json<User>)> {
    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_string();

    if username.is_empty() {
        return Err(AppError::bad_request("username must not be empty"));
    }
    if email.is_empty() {
        return Err(AppError::bad_request("email must not be empty"));
    }
    if payload.password.is_empty() {
        return Err(AppError::bad_request("password must not be empty"));
    }

    if state.store.user_by_username(&username).await?.is_some() {
        return Err(AppError::bad_request("username already exists"));
    }
    if state.store.user_by_email(&email).await?.is_some() {
        return Err(AppError::bad_request("email already exists"));
    }

    let password_hash = password::hash_password(&payload.password)?;

    // A concurrent duplicate slips past the check above; the store's
    // uniqueness errors come back as 400 through the same mapping.
    let user = state
        .store
        .create_user(NewUser {
            id: Uuid::new_v4(),
            username,
            password_hash,
            email,
            role: payload.role,
            organization_name: payload.organization_name,
            phone_number: payload.phone_number,
            address: payload.address,
        })
        .await?;

    let headers = start_session(&state, user.id).await?;
    Ok((StatusCode::CREATED, headers, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> AppResult<(HeaderMap, Json<User>)> {
    let user = state
        .store
        .user_by_username(payload.username.trim())
        .await?
        .ok_or_else(AppError::unauthorized)?;

    let valid = password::verify_password(&payload.password, &user.password_hash)
        .map_err(|_| AppError::unauthorized())?;
    if !valid {
        return Err(AppError::unauthorized());
    }

    let headers = start_session(&state, user.id).await?;
    Ok((headers, Json(user)))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: Option<TypedHeader<Cookie>>,
) -> AppResult<(HeaderMap, StatusCode)> {
    if let Some(TypedHeader(cookies)) = jar {
        if let Some(token) = cookies.get(session::SESSION_COOKIE_NAME) {
            state
                .store
                .delete_session(&session::hash_session_token(token))
                .await?;
        }
    }

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        session::build_clear_session_cookie(&state.config),
    );
    Ok((headers, StatusCode::NO_CONTENT))
}

pub async fn current_user(user: AuthenticatedUser) -> Json<User> {
    Json(user.user)
}

async fn start_session(state: &AppState, user_id: Uuid) -> AppResult<HeaderMap> {
    let token = session::generate_session_token();
    let expires_at = Utc::now() + ChronoDuration::days(state.config.session_ttl_days);

    state
        .store
        .create_session(NewSession {
            id: Uuid::new_v4(),
            user_id,
            token_hash: session::hash_session_token(&token),
            expires_at,
        })
        .await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        session::build_session_cookie(&state.config, &token, expires_at),
    );
    Ok(headers)
}
