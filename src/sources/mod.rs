/// External book sources
///
/// Each source resolves a title/author pair into [`BookDetails`]. Sources are
/// interchangeable behind [`BookSource`]; the resolver picks and orders them
/// from the configured lookup strategy.

pub mod caption;
pub mod catalog;
pub mod extract;
pub mod metadata_api;

pub use caption::{CaptionHint, CaptionSource, VideoCaptionClient};
pub use catalog::CatalogScraper;
pub use metadata_api::MetadataApiClient;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::SourcesConfig;
use crate::error::{LookupError, Result};

/// Structured fields a source extracted for one book
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookDetails {
    pub title: Option<String>,
    pub author: Option<String>,
    pub page_count: Option<u32>,
    /// Already truncated description
    pub description: Option<String>,
    /// Catalog page the details came from
    pub source_url: Option<String>,
    pub published_date: Option<String>,
    pub rating: Option<f64>,
    /// Tropes the source computed on its own description
    pub tropes: Vec<String>,
}

impl BookDetails {
    /// Usable only when a page count or a description was obtained
    pub fn has_content(&self) -> bool {
        self.page_count.is_some() || self.description.is_some()
    }
}

/// Outcome of a lookup that reached its source
#[derive(Debug, Clone, PartialEq)]
pub enum SourceLookup {
    Found(BookDetails),
    NotFound,
}

impl SourceLookup {
    pub fn into_details(self) -> Option<BookDetails> {
        match self {
            Self::Found(details) => Some(details),
            Self::NotFound => None,
        }
    }
}

/// Source identifiers, used in logs and errors
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Catalog,
    MetadataApi,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::MetadataApi => "metadata-api",
        }
    }
}

/// Trait for book metadata sources
#[async_trait]
pub trait BookSource: Send + Sync {
    /// Look a book up by title and optional author.
    /// `Ok(SourceLookup::NotFound)` is a normal outcome; `Err` means the
    /// source could not be reached.
    async fn lookup(&self, title: &str, author: Option<&str>) -> Result<SourceLookup>;

    fn kind(&self) -> SourceKind;
}

/// Shared HTTP client: desktop browser user agent and a per-request timeout
pub fn build_http_client(config: &SourcesConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_seconds))
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(|e| LookupError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Join title and author into one URL-encoded search string
pub fn encode_search_terms(title: &str, author: Option<&str>) -> String {
    let terms = match author.map(str::trim).filter(|a| !a.is_empty()) {
        Some(author) => format!("{} {}", title.trim(), author),
        None => title.trim().to_string(),
    };
    urlencoding::encode(&terms).into_owned()
}
