//! API request handlers

use tracing::{error, info};

use super::models::{BookSearchRequest, HealthResponse, SearchReply};
use crate::error::LookupError;
use crate::models::{BookQuery, BookRecord};
use crate::resolver::BookResolver;

/// Handle health check requests
pub fn health_check() -> HealthResponse {
    HealthResponse {
        status: "TikTok TBR API is running!".to_string(),
        service: "tbr-lookup".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

/// Validate the request and resolve it. Validation failures never reach
/// a source.
pub async fn search_book(resolver: &BookResolver, request: &BookSearchRequest) -> SearchReply {
    let query = match BookQuery::new(
        request.title.as_deref(),
        request.author.as_deref(),
        request.tiktok_url.as_deref(),
    ) {
        Ok(query) => query,
        Err(LookupError::InvalidInput(message)) => return SearchReply::Rejected(message),
        Err(e) => return SearchReply::Rejected(e.to_string()),
    };

    info!("Searching for: {} by {}", query.title, query.author_or_default());

    match resolver.resolve(&query).await {
        Ok(record) => SearchReply::Resolved(record),
        Err(e) if e.is_client_error() => SearchReply::Rejected(e.to_string()),
        Err(e) => {
            error!("Book search failed for {}: {}", query.title, e);
            SearchReply::Failed(BookRecord::unavailable(&query))
        }
    }
}
