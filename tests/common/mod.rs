use std::sync::Arc;

use anyhow::{anyhow, ensure, Context, Result};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use ecoconnect::auth::session::SESSION_COOKIE_NAME;
use ecoconnect::config::AppConfig;
use ecoconnect::routes;
use ecoconnect::state::AppState;
use ecoconnect::store::MemoryStorage;
use http_body_util::BodyExt;
use serde::Serialize;
use tower::util::ServiceExt;

// The suite runs the real router against the in-memory backend, so no
// external services are involved and tests stay independent.
pub struct TestApp {
    #[allow(dead_code)]
    pub state: AppState,
    router: Router,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: None,
        database_max_pool_size: 1,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        environment: "test".to_string(),
        session_ttl_days: 7,
        session_cookie_secure: false,
        session_cookie_domain: None,
        cors_allowed_origins: Vec::new(),
        rate_limit_max_requests: 10_000,
        rate_limit_window_secs: 900,
        static_dir: None,
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store = Arc::new(MemoryStorage::new());
        let state = AppState::new(config, store);
        let router = routes::create_router(state.clone());
        Self { state, router }
    }

    #[allow(dead_code)]
    pub async fn signup(&self, username: &str, password: &str, role: &str) -> Result<String> {
        #[derive(Serialize)]
        struct RegisterPayload<'a> {
            username: &'a str,
            password: &'a str,
            email: String,
            role: &'a str,
        }

        let response = self
            .post_json(
                "/api/register",
                &RegisterPayload {
                    username,
                    password,
                    email: format!("{username}@example.com"),
                    role,
                },
                None,
            )
            .await?;
        ensure!(
            response.status() == StatusCode::CREATED,
            "registration failed with status {}",
            response.status()
        );
        session_token(&response)
    }

    #[allow(dead_code)]
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        #[derive(Serialize)]
        struct LoginPayload<'a> {
            username: &'a str,
            password: &'a str,
        }

        let response = self
            .post_json("/api/login", &LoginPayload { username, password }, None)
            .await?;
        ensure!(
            response.status() == StatusCode::OK,
            "login failed with status {}",
            response.status()
        );
        session_token(&response)
    }

    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        session: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::POST, path, payload, session).await
    }

    #[allow(dead_code)]
    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
        session: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        self.send_json(Method::PATCH, path, payload, session).await
    }

    async fn send_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        payload: &T,
        session: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = serde_json::to_vec(payload)?;
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = session {
            builder = builder.header(header::COOKIE, session_cookie(token));
        }
        let request = builder.body(Body::from(body))?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn get(&self, path: &str, session: Option<&str>) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(token) = session {
            builder = builder.header(header::COOKIE, session_cookie(token));
        }
        let request = builder.body(Body::empty())?;
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    #[allow(dead_code)]
    pub async fn send(&self, request: Request<Body>) -> hyper::Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response")
    }

    #[allow(dead_code)]
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE_NAME}={token}")
}

// Pulls the session token out of a login/register Set-Cookie header.
pub fn session_token(response: &hyper::Response<Body>) -> Result<String> {
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .context("missing Set-Cookie header")?
        .to_str()?;
    let pair = cookie.split(';').next().unwrap_or(cookie);
    let (name, value) = pair.split_once('=').context("malformed Set-Cookie pair")?;
    ensure!(name == SESSION_COOKIE_NAME, "unexpected cookie {name}");
    ensure!(!value.is_empty(), "empty session token");
    Ok(value.to_string())
}

pub async fn body_to_vec(body: Body) -> Result<Vec<u8>> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(collected.to_bytes().to_vec())
}

#[allow(dead_code)]
pub async fn body_to_json(body: Body) -> Result<serde_json::Value> {
    let bytes = body_to_vec(body).await?;
    serde_json::from_slice(&bytes).context("response body is not JSON")
}
