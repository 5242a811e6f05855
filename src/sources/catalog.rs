/// Book catalog scraper (search page + detail page)
use async_trait::async_trait;
use reqwest::Client;
use scraper::Html;
use tracing::{debug, info, warn};
use url::Url;

use super::extract;
use super::{build_http_client, encode_search_terms, BookDetails, BookSource, SourceKind, SourceLookup};
use crate::config::SourcesConfig;
use crate::error::{LookupError, Result};
use crate::tropes::TropeDictionary;

/// Catalog web scraper
#[derive(Clone)]
pub struct CatalogScraper {
    client: Client,
    base_url: Url,
    search_path: String,
    tropes: TropeDictionary,
}

impl CatalogScraper {
    /// Create a new scraper from the sources configuration
    pub fn new(config: &SourcesConfig, tropes: TropeDictionary) -> Result<Self> {
        let base_url = Url::parse(&config.catalog.base_url).map_err(|e| {
            LookupError::Config(format!("Invalid catalog base URL {}: {}", config.catalog.base_url, e))
        })?;

        Ok(Self {
            client: build_http_client(config)?,
            base_url,
            search_path: config.catalog.search_path.clone(),
            tropes,
        })
    }

    pub fn search_url(&self, title: &str, author: Option<&str>) -> String {
        format!(
            "{}{}?q={}",
            self.base_url.as_str().trim_end_matches('/'),
            self.search_path,
            encode_search_terms(title, author)
        )
    }

    /// Resolve a possibly relative result link against the catalog base
    fn resolve_link(&self, href: &str) -> Option<String> {
        self.base_url.join(href).ok().map(String::from)
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        debug!("📄 Fetching catalog page: {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(LookupError::Parse(format!("HTTP error {}: {}", response.status(), url)));
        }

        let html_content = response.text().await?;
        debug!("📄 Downloaded {} characters of HTML content", html_content.len());
        Ok(html_content)
    }

    /// Detail page fetch and field extraction. Failures here are not
    /// reported to the caller.
    async fn scrape_detail_page(&self, detail_url: &str, fallback_title: &str, fallback_author: Option<&str>) -> SourceLookup {
        let html_content = match self.fetch_page(detail_url).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Catalog detail page failed for {}: {}", detail_url, e);
                return SourceLookup::NotFound;
            }
        };

        let mut details = parse_detail_page(&html_content);

        if !details.has_content() {
            info!("Catalog page had neither page count nor description: {}", detail_url);
            return SourceLookup::NotFound;
        }

        details.title = details.title.or_else(|| Some(fallback_title.to_string()));
        details.author = details.author.or_else(|| fallback_author.map(str::to_string));
        details.source_url = Some(detail_url.to_string());
        details.tropes = self.tropes.extract(details.description.as_deref().unwrap_or_default());

        info!(
            "✅ Catalog match: {:?} (pages: {:?}, description: {})",
            details.title,
            details.page_count,
            details.description.is_some()
        );
        SourceLookup::Found(details)
    }
}

/// Extract every field from a detail page
pub fn parse_detail_page(html_content: &str) -> BookDetails {
    let document = Html::parse_document(html_content);

    BookDetails {
        title: extract::extract_title(&document),
        author: extract::extract_author(&document),
        page_count: extract::extract_page_count(&document),
        description: extract::extract_description(&document),
        ..Default::default()
    }
}

#[async_trait]
impl BookSource for CatalogScraper {
    async fn lookup(&self, title: &str, author: Option<&str>) -> Result<SourceLookup> {
        let search_url = self.search_url(title, author);
        info!("🔍 Searching catalog for: {}", title);

        // Only the search request is reported upward; everything after it
        // degrades to NotFound.
        let response = self
            .client
            .get(&search_url)
            .send()
            .await
            .map_err(|e| LookupError::unavailable(SourceKind::Catalog.name(), e))?;

        let search_html = match response.error_for_status() {
            Ok(response) => match response.text().await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Failed to read catalog search page: {}", e);
                    return Ok(SourceLookup::NotFound);
                }
            },
            Err(e) => {
                warn!("Catalog search returned an error status: {}", e);
                return Ok(SourceLookup::NotFound);
            }
        };

        let link = {
            let document = Html::parse_document(&search_html);
            extract::extract_first_result_link(&document)
        };

        let Some(detail_url) = link.and_then(|href| self.resolve_link(&href)) else {
            info!("No catalog search result for: {}", title);
            return Ok(SourceLookup::NotFound);
        };

        info!("📄 Found catalog page: {}", detail_url);
        Ok(self.scrape_detail_page(&detail_url, title, author).await)
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Catalog
    }
}
