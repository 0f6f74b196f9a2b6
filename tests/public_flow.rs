mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_to_json, body_to_vec, test_config, TestApp};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn contact_submission_round_trip() -> Result<()> {
    let app = TestApp::new();

    let response = app
        .post_json(
            "/api/contact",
            &json!({
                "name": "Dana Fields",
                "email": "dana@example.com",
                "message": "How do we sign our kitchen up?",
            }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_to_json(response.into_body()).await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Contact form submitted successfully");
    assert!(body["id"].as_str().unwrap().parse::<Uuid>().is_ok());

    // Whitespace-only fields are rejected.
    let blank = app
        .post_json(
            "/api/contact",
            &json!({
                "name": "Dana Fields",
                "email": "dana@example.com",
                "message": "   ",
            }),
            None,
        )
        .await?;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    let missing = app
        .post_json("/api/contact", &json!({ "name": "Dana Fields" }), None)
        .await?;
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn reviews_validate_ratings_and_return_newest_first() -> Result<()> {
    let app = TestApp::new();

    for rating in [0, 6, -1] {
        let response = app
            .post_json(
                "/api/public/reviews",
                &json!({
                    "subjectId": Uuid::new_v4(),
                    "subjectType": "restaurant",
                    "rating": rating,
                }),
                None,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let first = app
        .post_json(
            "/api/public/reviews",
            &json!({
                "subjectId": Uuid::new_v4(),
                "subjectType": "restaurant",
                "rating": 4,
                "comment": "Generous portions",
            }),
            None,
        )
        .await?;
    assert_eq!(first.status(), StatusCode::CREATED);
    let first = body_to_json(first.into_body()).await?;
    assert_eq!(first["rating"], 4);
    assert_eq!(first["comment"], "Generous portions");

    let second = app
        .post_json(
            "/api/public/reviews",
            &json!({
                "subjectId": Uuid::new_v4(),
                "subjectType": "ngo",
                "rating": 5,
            }),
            None,
        )
        .await?;
    assert_eq!(second.status(), StatusCode::CREATED);

    let listed = app.get("/api/public/reviews", None).await?;
    assert_eq!(listed.status(), StatusCode::OK);
    let listed = body_to_json(listed.into_body()).await?;
    let reviews = listed.as_array().expect("review array");
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0]["subjectType"], "ngo");
    assert_eq!(reviews[1]["subjectType"], "restaurant");

    Ok(())
}

#[tokio::test]
async fn public_profiles_expose_only_directory_fields() -> Result<()> {
    let app = TestApp::new();

    let response = app
        .post_json(
            "/api/register",
            &json!({
                "username": "harvest-table",
                "password": "resto-pass",
                "email": "contact@harvest-table.example",
                "role": "restaurant",
                "organizationName": "Harvest Table",
                "phoneNumber": "+1-555-7001",
                "address": "41 Mill Road",
            }),
            None,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    app.signup("food-bridge", "ngo-pass", "ngo").await?;
    app.signup("lone-driver", "vol-pass", "volunteer").await?;

    let response = app.get("/api/public/profiles", None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let raw = String::from_utf8(body_to_vec(response.into_body()).await?)?;

    // Directory fields only; contact details and credentials stay internal.
    assert!(!raw.contains("email"));
    assert!(!raw.contains("phoneNumber"));
    assert!(!raw.contains("password"));

    let body: serde_json::Value = serde_json::from_str(&raw)?;
    let restaurants = body["restaurants"].as_array().expect("restaurants array");
    assert_eq!(restaurants.len(), 1);
    assert_eq!(restaurants[0]["username"], "harvest-table");
    assert_eq!(restaurants[0]["organizationName"], "Harvest Table");
    assert_eq!(restaurants[0]["address"], "41 Mill Road");

    let ngos = body["ngos"].as_array().expect("ngos array");
    assert_eq!(ngos.len(), 1);
    assert_eq!(ngos[0]["username"], "food-bridge");

    // Volunteers are not part of the public directory.
    assert!(!raw.contains("lone-driver"));

    Ok(())
}

#[tokio::test]
async fn health_reports_ok_with_security_headers() -> Result<()> {
    let app = TestApp::new();

    let response = app.get("/api/health", None).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(
        headers.get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(
        headers.get("cross-origin-opener-policy").unwrap(),
        "same-origin"
    );
    assert_eq!(
        headers.get("cross-origin-resource-policy").unwrap(),
        "same-site"
    );

    let body = body_to_json(response.into_body()).await?;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "ecoconnect");

    Ok(())
}

#[tokio::test]
async fn api_requests_are_rate_limited_per_client() -> Result<()> {
    let mut config = test_config();
    config.rate_limit_max_requests = 3;
    let app = TestApp::with_config(config);

    for _ in 0..3 {
        let response = app.get("/api/health", None).await?;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let blocked = app.get("/api/health", None).await?;
    assert_eq!(blocked.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = body_to_vec(blocked.into_body()).await?;
    assert!(String::from_utf8_lossy(&body).contains("too many requests"));

    // A different forwarded client gets its own window.
    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/health")
        .header("x-forwarded-for", "203.0.113.9")
        .body(Body::empty())?;
    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn spa_fallback_serves_index_for_client_routes() -> Result<()> {
    let dir = std::env::temp_dir().join(format!("ecoconnect-spa-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir)?;
    std::fs::write(
        dir.join("index.html"),
        "<!doctype html><title>EcoConnect</title>",
    )?;

    let mut config = test_config();
    config.static_dir = Some(dir.to_string_lossy().into_owned());
    let app = TestApp::with_config(config);

    let root = app.get("/", None).await?;
    assert_eq!(root.status(), StatusCode::OK);
    let body = body_to_vec(root.into_body()).await?;
    assert!(String::from_utf8_lossy(&body).contains("EcoConnect"));

    // Client-side routes fall back to the SPA entry point.
    let deep = app.get("/impact", None).await?;
    assert_eq!(deep.status(), StatusCode::OK);
    let body = body_to_vec(deep.into_body()).await?;
    assert!(String::from_utf8_lossy(&body).contains("EcoConnect"));

    // API routes are unaffected by the static fallback.
    let api = app.get("/api/health", None).await?;
    assert_eq!(api.status(), StatusCode::OK);

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}
