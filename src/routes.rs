use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use http::{header, Method};
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{handlers, state::AppState};

/// The session API routes, without any layers.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/user/init", get(handlers::user::init_user))
        .route(
            "/api/user",
            get(handlers::user::get_user).post(handlers::user::set_user),
        )
        .route("/api/user/logout", post(handlers::user::logout))
        .with_state(state)
}

/// The full application: session API with cookie, tracing and CORS layers.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.config.allowed_origins.clone())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::COOKIE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400));

    api_routes(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
        .layer(cors)
}
