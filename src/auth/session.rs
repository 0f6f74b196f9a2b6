use axum::http::HeaderValue;
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::config::AppConfig;

pub const SESSION_COOKIE_NAME: &str = "ecoconnect_session";

pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

// Only the hash is persisted; a leaked sessions table cannot be replayed.
pub fn hash_session_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn build_session_cookie(
    config: &AppConfig,
    token: &str,
    expires_at: DateTime<Utc>,
) -> HeaderValue {
    let max_age = Duration::days(config.session_ttl_days).num_seconds();

    let mut parts = vec![format!("{}={}", SESSION_COOKIE_NAME, token)];
    parts.push("Path=/".into());
    parts.push("HttpOnly".into());
    parts.push("SameSite=Lax".into());
    parts.push(format!("Max-Age={}", max_age));
    parts.push(format!(
        "Expires={}",
        expires_at.format("%a, %d %b %Y %H:%M:%S GMT")
    ));
    if config.session_cookie_secure {
        parts.push("Secure".into());
    }
    if let Some(domain) = &config.session_cookie_domain {
        parts.push(format!("Domain={}", domain));
    }

    HeaderValue::from_str(&parts.join("; ")).expect("valid session cookie")
}

pub fn build_clear_session_cookie(config: &AppConfig) -> HeaderValue {
    let mut parts = vec![format!("{}=", SESSION_COOKIE_NAME)];
    parts.push("Path=/".into());
    parts.push("HttpOnly".into());
    parts.push("SameSite=Lax".into());
    parts.push("Max-Age=0".into());
    parts.push("Expires=Thu, 01 Jan 1970 00:00:00 GMT".into());
    if config.session_cookie_secure {
        parts.push("Secure".into());
    }
    if let Some(domain) = &config.session_cookie_domain {
        parts.push(format!("Domain={}", domain));
    }

    HeaderValue::from_str(&parts.join("; ")).expect("valid session cookie")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig {
            database_url: None,
            database_max_pool_size: 1,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            environment: "test".to_string(),
            session_ttl_days: 7,
            session_cookie_secure: true,
            session_cookie_domain: Some("ecoconnect.example".to_string()),
            cors_allowed_origins: Vec::new(),
            rate_limit_max_requests: 300,
            rate_limit_window_secs: 900,
            static_dir: None,
        }
    }

    #[test]
    fn tokens_are_long_random_hex() {
        let token = generate_session_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_session_token());
    }

    #[test]
    fn hash_is_stable_and_not_the_token() {
        let token = generate_session_token();
        let hash = hash_session_token(&token);
        assert_eq!(hash, hash_session_token(&token));
        assert_ne!(hash, token);
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn session_cookie_carries_expected_attributes() {
        let config = test_config();
        let cookie = build_session_cookie(&config, "abc123", Utc::now() + Duration::days(7));
        let value = cookie.to_str().unwrap();

        assert!(value.starts_with("ecoconnect_session=abc123"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.contains("Secure"));
        assert!(value.contains("Domain=ecoconnect.example"));
        assert!(value.contains("GMT"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let config = test_config();
        let value = build_clear_session_cookie(&config);
        let value = value.to_str().unwrap();

        assert!(value.starts_with("ecoconnect_session="));
        assert!(value.contains("Max-Age=0"));
        assert!(value.contains("Expires=Thu, 01 Jan 1970"));
    }
}
