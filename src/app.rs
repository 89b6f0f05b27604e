use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{protected, public};
use crate::middleware::auth_middleware;
use crate::state::AppState;

/// The full HTTP surface of the check-in server
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.server.max_request_size_bytes;
    let cors = cors_layer(&state.config.security);

    let app = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Protected API
        .merge(protected_routes(state.clone()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http());

    let app = match cors {
        Some(cors) => app.layer(cors),
        None => app,
    };

    app.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(public::login))
        .route("/api/auth/user", get(public::current_user))
        .route("/api/qr", get(public::qr_get))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Session
        .route("/api/auth/signout", post(protected::sign_out))
        .route("/api/profile", get(protected::profile_get).put(protected::profile_put))
        // Events
        .route("/api/events", get(protected::event_list).post(protected::event_create))
        .route(
            "/api/events/:id",
            get(protected::event_get)
                .patch(protected::event_patch)
                .delete(protected::event_delete),
        )
        // Guests
        .route(
            "/api/events/:id/guests",
            get(protected::guest_list).post(protected::guest_add),
        )
        .route("/api/guests/:id", axum::routing::delete(protected::guest_remove))
        .route("/api/guests/:id/check-in", post(protected::guest_check_in))
        .route("/api/check-in", post(protected::guest_scan))
        .route_layer(from_fn_with_state(state, auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> Option<CorsLayer> {
    if !security.enable_cors {
        return None;
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    Some(
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any),
    )
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Guest Check-in API",
            "version": version,
            "endpoints": {
                "login": "POST /auth/login (public)",
                "user": "GET /api/auth/user (public, optional bearer)",
                "qr": "GET /api/qr?guest_id=:id (public)",
                "signout": "POST /api/auth/signout (protected)",
                "profile": "GET|PUT /api/profile (protected)",
                "events": "/api/events[/:id] (protected)",
                "guests": "/api/events/:id/guests, /api/guests/:id[/check-in] (protected)",
                "check_in": "POST /api/check-in (protected)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
