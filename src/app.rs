use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Extension, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::SessionStore;
use crate::config::Settings;
use crate::handlers;
use crate::payments::RazorpayClient;
use crate::storage::DynStorage;

pub fn router(
    storage: DynStorage,
    sessions: Arc<SessionStore>,
    gateway: Arc<RazorpayClient>,
    settings: Settings,
) -> Router {
    Router::new()
        .route("/api/status", get(handlers::health::status))
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/user", get(handlers::auth::current_user))
        .route("/api/advocates", get(handlers::advocates::list))
        .route("/api/advocates/{id}", get(handlers::advocates::get))
        .route(
            "/api/advocates/{id}/reviews",
            get(handlers::reviews::list).post(handlers::reviews::create),
        )
        .route("/api/practice-areas", get(handlers::practice_areas::list))
        .route("/api/chat", post(handlers::chat::post_message))
        .route("/api/chat/history/{user_id}", get(handlers::chat::history))
        .route(
            "/api/chat/suggested-questions",
            get(handlers::chat::suggested_questions),
        )
        .route("/api/payments/order", post(handlers::payments::create_order))
        .route("/api/payments/verify", post(handlers::payments::verify))
        .route("/api/connections", get(handlers::connections::list))
        .layer(Extension(storage))
        .layer(Extension(sessions))
        .layer(Extension(gateway))
        .layer(Extension(settings))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
}
