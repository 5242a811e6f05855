//! HTTP server implementation for the API

use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::any::Any as PanicPayload;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use super::handlers;
use super::models::{BookSearchRequest, ErrorResponse, SearchReply};
use crate::error::LookupError;
use crate::models::BookRecord;
use crate::resolver::BookResolver;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Resolver for the configured lookup strategy
    pub resolver: Arc<BookResolver>,
    /// Metadata-API-only resolver for the compatibility endpoint
    pub metadata_resolver: Arc<BookResolver>,
}

/// Build the application router
pub fn create_router(state: AppState, cors_allow_any: bool) -> Router {
    let router = Router::new()
        // Health check endpoints
        .route("/", get(health_handler))
        .route("/health", get(health_handler))

        // Book lookup endpoints
        .route("/api/book-search", post(book_search_handler))
        .route("/api/google-books-search", post(metadata_search_handler))

        .fallback(not_found_handler)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic));

    if cors_allow_any {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]);

        router.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
    } else {
        router.layer(TraceLayer::new_for_http())
    }
}

/// Configure and start the HTTP server
pub async fn start_http_server(state: AppState, host: &str, port: u16, cors_allow_any: bool) -> Result<()> {
    let app = create_router(state, cors_allow_any);

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
    info!("🌐 TikTok TBR API running on http://{}:{}", host, port);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check handler
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(handlers::health_check()))
}

/// Primary book search handler
async fn book_search_handler(
    State(state): State<AppState>,
    payload: Result<Json<BookSearchRequest>, JsonRejection>,
) -> SearchReply {
    match payload {
        Ok(Json(request)) => handlers::search_book(&state.resolver, &request).await,
        Err(rejection) => reject_body(rejection),
    }
}

/// Metadata-API-only search handler, kept for older clients
async fn metadata_search_handler(
    State(state): State<AppState>,
    payload: Result<Json<BookSearchRequest>, JsonRejection>,
) -> SearchReply {
    match payload {
        Ok(Json(request)) => handlers::search_book(&state.metadata_resolver, &request).await,
        Err(rejection) => reject_body(rejection),
    }
}

fn reject_body(rejection: JsonRejection) -> SearchReply {
    warn!("Rejected request body: {}", rejection.body_text());
    SearchReply::Rejected(rejection.body_text())
}

/// A panicking handler still answers with a record-shaped 500
fn handle_panic(payload: Box<dyn PanicPayload + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!("{}", LookupError::Internal(message));

    (StatusCode::INTERNAL_SERVER_ERROR, Json(BookRecord::fault())).into_response()
}

async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Not Found".to_string(),
        }),
    )
}
