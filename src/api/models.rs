//! API data models

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

use crate::models::BookRecord;

/// Body of both book search endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookSearchRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub tiktok_url: Option<String>,
}

/// Error body for rejected requests
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check body
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub timestamp: String,
}

/// Result of a book search, mapped onto an HTTP response
#[derive(Debug)]
pub enum SearchReply {
    /// 200, including `found: false` records
    Resolved(BookRecord),
    /// 400 with an error body; no lookup was attempted
    Rejected(String),
    /// 500 with a well-formed fallback record
    Failed(BookRecord),
}

impl IntoResponse for SearchReply {
    fn into_response(self) -> Response {
        match self {
            Self::Resolved(record) => (StatusCode::OK, Json(record)).into_response(),
            Self::Rejected(error) => (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response(),
            Self::Failed(record) => (StatusCode::INTERNAL_SERVER_ERROR, Json(record)).into_response(),
        }
    }
}
