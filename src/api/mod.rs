//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP endpoints for the Cinebook booking system:
//! - Auth endpoints (signup, login, refresh)
//! - Movie catalog endpoints
//! - Booking endpoints
//! - Admin endpoints (catalog management, stats)

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod middleware;
pub mod movies;
pub mod responses;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Build the API router, nested under /api by `build_router`
pub fn build_api_router(state: AppState) -> Router<AppState> {
    let admin_routes = Router::new()
        .route("/admin/movies/", post(admin::create_movie))
        .route("/admin/shows/", post(admin::create_show))
        .route("/admin/stats/", get(admin::stats))
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    let protected_routes = Router::new()
        .route("/movies/", get(movies::list_movies))
        .route("/movies/{movie_id}/shows/", get(movies::movie_shows))
        .route("/shows/{show_id}/book/", post(bookings::book_seat))
        .route("/my-bookings/", get(bookings::my_bookings))
        .route("/bookings/{booking_id}/cancel/", post(bookings::cancel_booking))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    Router::new()
        .route("/auth/signup/", post(auth::signup))
        .route("/auth/login/", post(auth::login))
        .route("/auth/refresh/", post(auth::refresh))
        .merge(protected_routes)
        .merge(admin_routes)
}

/// Build the complete router with CORS and request tracing
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) if cors_origin != "*" => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        _ => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
    };

    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::db::{create_test_pool, migrations};
    use axum_test::TestServer;
    use chrono::{Duration, Utc};
    use serde_json::{json, Value};

    async fn test_server() -> TestServer {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Migrations should run");
        let state = AppState::new(pool, &AuthConfig::default());
        TestServer::new(build_router(state, "*")).expect("Server should build")
    }

    /// Sign up a user and return an access token. The first signup on a
    /// fresh server becomes the admin.
    async fn signup_and_login(server: &TestServer, username: &str) -> String {
        let response = server
            .post("/api/auth/signup/")
            .json(&json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": "Str0ng!pass",
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .post("/api/auth/login/")
            .json(&json!({ "username": username, "password": "Str0ng!pass" }))
            .await;
        response.assert_status_ok();
        response.json::<Value>()["access"]
            .as_str()
            .expect("Login should return an access token")
            .to_string()
    }

    /// Create a movie and a future show via the admin endpoints, returning
    /// (movie_id, show_id).
    async fn seed_show(server: &TestServer, admin_token: &str) -> (i64, i64) {
        let response = server
            .post("/api/admin/movies/")
            .authorization_bearer(admin_token)
            .json(&json!({ "title": "Dune", "duration_minutes": 155 }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let movie_id = response.json::<Value>()["id"].as_i64().unwrap();

        let response = server
            .post("/api/admin/shows/")
            .authorization_bearer(admin_token)
            .json(&json!({
                "movie_id": movie_id,
                "screen_name": "Screen 1",
                "date_time": (Utc::now() + Duration::days(1)).to_rfc3339(),
                "total_seats": 10,
                "price_cents": 1500,
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let show_id = response.json::<Value>()["id"].as_i64().unwrap();

        (movie_id, show_id)
    }

    #[tokio::test]
    async fn test_signup_validation_error_shape() {
        let server = test_server().await;
        let response = server
            .post("/api/auth/signup/")
            .json(&json!({
                "username": "ab",
                "email": "ab@example.com",
                "password": "Str0ng!pass",
            }))
            .await;
        response.assert_status_bad_request();
        let body = response.json::<Value>();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_login_bad_credentials() {
        let server = test_server().await;
        signup_and_login(&server, "alice").await;

        let response = server
            .post("/api/auth/login/")
            .json(&json!({ "username": "alice", "password": "Wrong1!pass" }))
            .await;
        response.assert_status_unauthorized();
        let body = response.json::<Value>();
        assert_eq!(body["detail"], "Invalid username or password");
    }

    #[tokio::test]
    async fn test_movies_requires_auth() {
        let server = test_server().await;
        let response = server.get("/api/movies/").await;
        response.assert_status_unauthorized();
        let body = response.json::<Value>();
        assert_eq!(body["detail"], "Missing authentication token");
    }

    #[tokio::test]
    async fn test_movies_with_token() {
        let server = test_server().await;
        let token = signup_and_login(&server, "alice").await;

        let response = server
            .get("/api/movies/")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!([]));
    }

    #[tokio::test]
    async fn test_garbage_token_rejected() {
        let server = test_server().await;
        let response = server
            .get("/api/movies/")
            .authorization_bearer("not-a-jwt")
            .await;
        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_admin_endpoints_forbidden_for_customers() {
        let server = test_server().await;
        // First user is admin, second is a customer
        signup_and_login(&server, "admin_user").await;
        let customer = signup_and_login(&server, "customer").await;

        let response = server
            .post("/api/admin/movies/")
            .authorization_bearer(&customer)
            .json(&json!({ "title": "Dune", "duration_minutes": 155 }))
            .await;
        response.assert_status_forbidden();
        let body = response.json::<Value>();
        assert_eq!(body["detail"], "Admin privileges required");
    }

    #[tokio::test]
    async fn test_shows_for_unknown_movie() {
        let server = test_server().await;
        let token = signup_and_login(&server, "alice").await;

        let response = server
            .get("/api/movies/999/shows/")
            .authorization_bearer(&token)
            .await;
        response.assert_status_not_found();
        let body = response.json::<Value>();
        assert_eq!(body["error"], "Movie not found");
    }

    #[tokio::test]
    async fn test_show_listing_includes_availability() {
        let server = test_server().await;
        let admin = signup_and_login(&server, "admin_user").await;
        let (movie_id, show_id) = seed_show(&server, &admin).await;

        server
            .post(&format!("/api/shows/{}/book/", show_id))
            .authorization_bearer(&admin)
            .json(&json!({ "seat_number": 4 }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .get(&format!("/api/movies/{}/shows/", movie_id))
            .authorization_bearer(&admin)
            .await;
        response.assert_status_ok();
        let shows = response.json::<Value>();
        assert_eq!(shows[0]["booked_seats"], json!([4]));
        assert_eq!(shows[0]["available_seats"], 9);
        assert_eq!(shows[0]["is_bookable"], true);
    }

    #[tokio::test]
    async fn test_booking_flow_end_to_end() {
        let server = test_server().await;
        let admin = signup_and_login(&server, "admin_user").await;
        let user_a = signup_and_login(&server, "user_a").await;
        let user_b = signup_and_login(&server, "user_b").await;
        let (_, show_id) = seed_show(&server, &admin).await;

        // A books seat 3
        let response = server
            .post(&format!("/api/shows/{}/book/", show_id))
            .authorization_bearer(&user_a)
            .json(&json!({ "seat_number": 3 }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let booking = response.json::<Value>();
        assert_eq!(booking["status"], "booked");
        let booking_id = booking["id"].as_i64().unwrap();

        // B is refused the same seat
        let response = server
            .post(&format!("/api/shows/{}/book/", show_id))
            .authorization_bearer(&user_b)
            .json(&json!({ "seat_number": 3 }))
            .await;
        response.assert_status(axum::http::StatusCode::CONFLICT);
        assert_eq!(response.json::<Value>()["error"], "Seat already booked");

        // B cannot cancel A's booking
        let response = server
            .post(&format!("/api/bookings/{}/cancel/", booking_id))
            .authorization_bearer(&user_b)
            .await;
        response.assert_status_not_found();

        // A cancels well before showtime
        let response = server
            .post(&format!("/api/bookings/{}/cancel/", booking_id))
            .authorization_bearer(&user_a)
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "cancelled");

        // Now B gets the seat
        let response = server
            .post(&format!("/api/shows/{}/book/", show_id))
            .authorization_bearer(&user_b)
            .json(&json!({ "seat_number": 3 }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_invalid_seat_number() {
        let server = test_server().await;
        let admin = signup_and_login(&server, "admin_user").await;
        let (_, show_id) = seed_show(&server, &admin).await;

        for seat in [0, 11] {
            let response = server
                .post(&format!("/api/shows/{}/book/", show_id))
                .authorization_bearer(&admin)
                .json(&json!({ "seat_number": seat }))
                .await;
            response.assert_status_bad_request();
            assert_eq!(
                response.json::<Value>()["error"],
                "Seat number must be valid"
            );
        }
    }

    #[tokio::test]
    async fn test_booking_unknown_show() {
        let server = test_server().await;
        let token = signup_and_login(&server, "alice").await;

        let response = server
            .post("/api/shows/999/book/")
            .authorization_bearer(&token)
            .json(&json!({ "seat_number": 1 }))
            .await;
        response.assert_status_not_found();
        assert_eq!(response.json::<Value>()["error"], "Show not found");
    }

    #[tokio::test]
    async fn test_my_bookings_listing() {
        let server = test_server().await;
        let admin = signup_and_login(&server, "admin_user").await;
        let (_, show_id) = seed_show(&server, &admin).await;

        for seat in [1, 2] {
            server
                .post(&format!("/api/shows/{}/book/", show_id))
                .authorization_bearer(&admin)
                .json(&json!({ "seat_number": seat }))
                .await
                .assert_status(axum::http::StatusCode::CREATED);
        }

        let response = server
            .get("/api/my-bookings/")
            .authorization_bearer(&admin)
            .await;
        response.assert_status_ok();
        let bookings = response.json::<Value>();
        assert_eq!(bookings.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_refresh_flow() {
        let server = test_server().await;
        signup_and_login(&server, "alice").await;

        let response = server
            .post("/api/auth/login/")
            .json(&json!({ "username": "alice", "password": "Str0ng!pass" }))
            .await;
        let tokens = response.json::<Value>();
        let refresh = tokens["refresh"].as_str().unwrap();

        let response = server
            .post("/api/auth/refresh/")
            .json(&json!({ "refresh": refresh }))
            .await;
        response.assert_status_ok();
        let access = response.json::<Value>()["access"]
            .as_str()
            .unwrap()
            .to_string();

        // The refreshed access token works
        server
            .get("/api/movies/")
            .authorization_bearer(&access)
            .await
            .assert_status_ok();

        // An access token is rejected by the refresh endpoint
        let response = server
            .post("/api/auth/refresh/")
            .json(&json!({ "refresh": access }))
            .await;
        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_admin_stats() {
        let server = test_server().await;
        let admin = signup_and_login(&server, "admin_user").await;
        let (_, show_id) = seed_show(&server, &admin).await;

        server
            .post(&format!("/api/shows/{}/book/", show_id))
            .authorization_bearer(&admin)
            .json(&json!({ "seat_number": 1 }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .get("/api/admin/stats/")
            .authorization_bearer(&admin)
            .await;
        response.assert_status_ok();
        let stats = response.json::<Value>();
        assert_eq!(stats["total_bookings"], 1);
        assert_eq!(stats["active_bookings"], 1);
        assert_eq!(stats["window_days"], 30);
    }

    #[tokio::test]
    async fn test_admin_show_slot_conflict() {
        let server = test_server().await;
        let admin = signup_and_login(&server, "admin_user").await;
        let (movie_id, _) = seed_show(&server, &admin).await;

        let when = (Utc::now() + Duration::days(2)).to_rfc3339();
        let payload = json!({
            "movie_id": movie_id,
            "screen_name": "IMAX",
            "date_time": when,
            "total_seats": 50,
        });

        server
            .post("/api/admin/shows/")
            .authorization_bearer(&admin)
            .json(&payload)
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let response = server
            .post("/api/admin/shows/")
            .authorization_bearer(&admin)
            .json(&payload)
            .await;
        response.assert_status(axum::http::StatusCode::CONFLICT);
    }
}
