//! HTTP routes.
//!
//! Paths and JSON shapes match what the driver and viewer pages already
//! speak, so they are unversioned.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use busline_core::PositionRecord;
use chrono::{Local, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::api::auth::{self, DriverSession, RateLimiter, SESSION_COOKIE};
use crate::api::error::ApiError;
use crate::api::location_validation::parse_location_update;
use crate::config::Config;
use crate::persistence::locations::LocationSnapshot;
use crate::state::AppState;

/// Create the API router.
pub fn create_router(config: &Config) -> Router<Arc<AppState>> {
    let login_limiter = RateLimiter::new(
        config.login_rate_limit_rps,
        config.rate_limit_enabled,
        config.trust_proxy,
    );

    // Viewers: no session required
    let public_routes = Router::new()
        .route("/get_locations", get(get_locations))
        .route("/health", get(|| async { "OK" }));

    // Drivers: handlers take a DriverSession
    let driver_routes = Router::new()
        .route("/update_location", post(update_location))
        .route("/get_my_location", get(get_my_location))
        .route("/logout", get(logout));

    let login_route = Router::new()
        .route("/login", post(login))
        .layer(middleware::from_fn_with_state(login_limiter, auth::rate_limit));

    public_routes.merge(driver_routes).merge(login_route)
}

// === Request types ===

/// Anything that does not decode into this shape is a failed login.
#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

// === Handlers ===

async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Bytes,
) -> Response {
    let Ok(LoginRequest {
        username: Some(username),
        password: Some(password),
    }) = serde_json::from_slice::<LoginRequest>(&body)
    else {
        return invalid_credentials();
    };

    match state.login(&username, &password, Utc::now()).await {
        Some((token, _)) => {
            let cookie = auth::session_cookie(token, state.config().secure_cookies);
            (
                jar.add(cookie),
                Json(json!({ "status": "success", "message": "Login successful" })),
            )
                .into_response()
        }
        None => invalid_credentials(),
    }
}

fn invalid_credentials() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "status": "error", "message": "Invalid credentials" })),
    )
        .into_response()
}

async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.logout(cookie.value());
    }
    (
        jar.remove(auth::expired_session_cookie()),
        Redirect::to(&state.config().driver_page),
    )
}

async fn update_location(
    State(state): State<Arc<AppState>>,
    DriverSession(session): DriverSession,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let update = parse_location_update(&body)?;
    let record = state
        .report_location(
            &session,
            update.latitude,
            update.longitude,
            update.accuracy,
            Local::now(),
        )
        .await?;

    Ok(Json(json!({ "status": "ok", "timestamp": record.captured_at })))
}

async fn get_locations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LocationSnapshot>, ApiError> {
    Ok(Json(state.all_locations().await?))
}

async fn get_my_location(
    State(state): State<Arc<AppState>>,
    DriverSession(session): DriverSession,
) -> Result<Json<PositionRecord>, ApiError> {
    Ok(Json(state.own_location(&session, Utc::now()).await?))
}
