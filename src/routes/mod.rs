use std::path::Path;

use axum::http::{header, request::Parts, HeaderName, HeaderValue};
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::{rate_limit, state::AppState};

pub mod analytics;
pub mod auth;
pub mod claims;
pub mod contact;
pub mod health;
pub mod listings;
pub mod profiles;
pub mod reviews;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = cors_layer(&state);

    let api_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/user", get(auth::current_user))
        .route("/contact", post(contact::submit_contact))
        .route(
            "/food-listings",
            get(listings::list_listings).post(listings::create_listing),
        )
        .route("/food-listings/my", get(listings::my_listings))
        .route("/food-claims", post(claims::create_claim))
        .route("/food-claims/my", get(claims::my_claims))
        .route("/food-claims/:id/status", patch(claims::update_claim_status))
        .route("/analytics", get(analytics::get_analytics))
        .route("/public/profiles", get(profiles::public_profiles))
        .route(
            "/public/reviews",
            get(reviews::list_reviews).post(reviews::add_review),
        )
        .route("/health", get(health::health_check))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::enforce,
        ))
        .layer(cors);

    let mut router = Router::new().nest("/api", api_routes);

    if let Some(static_dir) = state.config.static_dir.as_deref() {
        let index = Path::new(static_dir).join("index.html");
        router =
            router.fallback_service(ServeDir::new(static_dir).fallback(ServeFile::new(index)));
    }

    router.with_state(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("cross-origin-opener-policy"),
                HeaderValue::from_static("same-origin"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("cross-origin-resource-policy"),
                HeaderValue::from_static("same-site"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            )),
    )
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let allowed = state.config.cors_allowed_origins.clone();
    let development = state.config.is_development();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _request_parts: &Parts| {
                origin_allowed(origin, &allowed, development)
            },
        ))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

fn origin_allowed(origin: &HeaderValue, allowed: &[String], development: bool) -> bool {
    let Ok(origin) = origin.to_str() else {
        return false;
    };

    if allowed.iter().any(|candidate| candidate == origin) {
        return true;
    }

    // Local frontends get a pass outside production.
    if development {
        if let Ok(url) = Url::parse(origin) {
            return matches!(url.scheme(), "http" | "https")
                && url.host_str() == Some("localhost");
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origins() -> Vec<String> {
        vec!["https://app.ecoconnect.example".to_string()]
    }

    #[test]
    fn allow_listed_origin_is_accepted() {
        let origin = HeaderValue::from_static("https://app.ecoconnect.example");
        assert!(origin_allowed(&origin, &origins(), false));
    }

    #[test]
    fn unknown_origin_is_rejected_in_production() {
        let origin = HeaderValue::from_static("https://evil.example");
        assert!(!origin_allowed(&origin, &origins(), false));
        let localhost = HeaderValue::from_static("http://localhost:5173");
        assert!(!origin_allowed(&localhost, &origins(), false));
    }

    #[test]
    fn localhost_is_accepted_only_in_development() {
        let localhost = HeaderValue::from_static("http://localhost:5173");
        assert!(origin_allowed(&localhost, &origins(), true));
        let bare = HeaderValue::from_static("http://localhost");
        assert!(origin_allowed(&bare, &origins(), true));

        // Not any host that merely contains the word.
        let tricky = HeaderValue::from_static("http://localhost.evil.example");
        assert!(!origin_allowed(&tricky, &origins(), true));
    }
}
