/// Public book metadata API client
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::{build_http_client, encode_search_terms, BookDetails, BookSource, SourceKind, SourceLookup};
use crate::config::SourcesConfig;
use crate::error::{LookupError, Result};
use crate::models::truncate_description;
use crate::tropes::TropeDictionary;

#[derive(Debug, Default, Deserialize)]
pub struct VolumesResponse {
    #[serde(default)]
    pub items: Vec<Volume>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct Volume {
    #[serde(rename = "volumeInfo", default)]
    pub volume_info: VolumeInfo,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct VolumeInfo {
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    #[serde(rename = "pageCount")]
    pub page_count: Option<u32>,
    pub description: Option<String>,
    #[serde(rename = "publishedDate")]
    pub published_date: Option<String>,
    #[serde(rename = "averageRating")]
    pub average_rating: Option<f64>,
}

impl VolumeInfo {
    fn page_count(&self) -> Option<u32> {
        self.page_count.filter(|n| *n > 0)
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref().map(str::trim).filter(|d| !d.is_empty())
    }

    fn is_complete(&self) -> bool {
        self.page_count().is_some() && self.description().is_some()
    }
}

/// Prefer the first candidate with both a page count and a description,
/// otherwise the first candidate.
pub fn select_candidate(items: &[Volume]) -> Option<&Volume> {
    items
        .iter()
        .find(|item| item.volume_info.is_complete())
        .or_else(|| items.first())
}

/// Metadata API client
#[derive(Clone)]
pub struct MetadataApiClient {
    client: Client,
    base_url: String,
    max_results: u32,
    tropes: TropeDictionary,
}

impl MetadataApiClient {
    pub fn new(config: &SourcesConfig, tropes: TropeDictionary) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            base_url: config.metadata_api.base_url.clone(),
            max_results: config.metadata_api.max_results,
            tropes,
        })
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn query_url(&self, title: &str, author: Option<&str>) -> String {
        format!(
            "{}?q={}&maxResults={}",
            self.base_url,
            encode_search_terms(title, author),
            self.max_results
        )
    }

    /// Map a provider candidate into book details
    pub fn map_volume(&self, volume: &VolumeInfo) -> BookDetails {
        let description = volume.description().map(truncate_description);
        let tropes = self.tropes.extract(description.as_deref().unwrap_or_default());

        BookDetails {
            title: volume.title.clone().filter(|t| !t.trim().is_empty()),
            author: (!volume.authors.is_empty()).then(|| volume.authors.join(", ")),
            page_count: volume.page_count(),
            description,
            source_url: None,
            published_date: volume.published_date.clone(),
            rating: volume.average_rating,
            tropes,
        }
    }
}

#[async_trait]
impl BookSource for MetadataApiClient {
    async fn lookup(&self, title: &str, author: Option<&str>) -> Result<SourceLookup> {
        let url = self.query_url(title, author);
        info!("📚 Querying metadata API for: {}", title);
        debug!("Metadata API request: {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LookupError::unavailable(SourceKind::MetadataApi.name(), e))?;

        if !response.status().is_success() {
            return Err(LookupError::unavailable(
                SourceKind::MetadataApi.name(),
                format!("HTTP error {}", response.status()),
            ));
        }

        let volumes: VolumesResponse = response.json().await?;
        debug!("Metadata API returned {} candidates", volumes.items.len());

        let Some(volume) = select_candidate(&volumes.items) else {
            info!("No metadata API results for: {}", title);
            return Ok(SourceLookup::NotFound);
        };

        let details = self.map_volume(&volume.volume_info);
        if !details.has_content() {
            info!("Metadata API result had neither page count nor description");
            return Ok(SourceLookup::NotFound);
        }

        info!("✅ Metadata API match: {:?} (pages: {:?})", details.title, details.page_count);
        Ok(SourceLookup::Found(details))
    }

    fn kind(&self) -> SourceKind {
        SourceKind::MetadataApi
    }
}
