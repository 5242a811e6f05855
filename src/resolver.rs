/// Book resolution: consult sources in priority order and merge the answer
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{Config, LookupStrategy};
use crate::error::Result;
use crate::models::{BookQuery, BookRecord, NO_API_DESCRIPTION};
use crate::sources::{
    BookSource, CaptionSource, CatalogScraper, MetadataApiClient, SourceKind, SourceLookup,
    VideoCaptionClient,
};
use crate::tropes::TropeDictionary;

/// What to do when a source cannot be reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnError {
    /// Log it and treat the source as NotFound
    Absorb,
    /// Fail the whole lookup
    Surface,
}

/// A source at one position of the fallback chain
#[derive(Clone)]
pub struct SourceSlot {
    pub source: Arc<dyn BookSource>,
    pub on_error: OnError,
}

impl SourceSlot {
    pub fn absorbing(source: Arc<dyn BookSource>) -> Self {
        Self { source, on_error: OnError::Absorb }
    }

    pub fn surfacing(source: Arc<dyn BookSource>) -> Self {
        Self { source, on_error: OnError::Surface }
    }
}

/// Resolves a [`BookQuery`] into a [`BookRecord`]
#[derive(Clone)]
pub struct BookResolver {
    slots: Vec<SourceSlot>,
    captions: Option<Arc<dyn CaptionSource>>,
    tropes: TropeDictionary,
    default_description: Option<&'static str>,
}

impl BookResolver {
    pub fn new(slots: Vec<SourceSlot>, tropes: TropeDictionary) -> Self {
        Self {
            slots,
            captions: None,
            tropes,
            default_description: None,
        }
    }

    pub fn with_captions(mut self, captions: Arc<dyn CaptionSource>) -> Self {
        self.captions = Some(captions);
        self
    }

    /// Description used when no source supplies one
    pub fn with_default_description(mut self, description: &'static str) -> Self {
        self.default_description = Some(description);
        self
    }

    /// Build the source chain for a lookup strategy
    pub fn from_strategy(config: &Config, strategy: LookupStrategy, tropes: TropeDictionary) -> Result<Self> {
        let sources = &config.sources;

        let slots = match strategy {
            LookupStrategy::CatalogThenApi => vec![
                SourceSlot::absorbing(Arc::new(CatalogScraper::new(sources, tropes.clone())?)),
                SourceSlot::absorbing(Arc::new(MetadataApiClient::new(sources, tropes.clone())?)),
            ],
            LookupStrategy::CatalogOnly => vec![SourceSlot::absorbing(Arc::new(CatalogScraper::new(
                sources,
                tropes.clone(),
            )?))],
            LookupStrategy::ApiOnly => vec![SourceSlot::surfacing(Arc::new(MetadataApiClient::new(
                sources,
                tropes.clone(),
            )?))],
        };

        let mut resolver = Self::new(slots, tropes);
        if strategy == LookupStrategy::ApiOnly {
            resolver = resolver.with_default_description(NO_API_DESCRIPTION);
        }
        if sources.captions.enabled {
            resolver = resolver.with_captions(Arc::new(VideoCaptionClient::new(sources)?));
        }

        info!("🔧 Book resolver ready (strategy: {:?})", strategy);
        Ok(resolver)
    }

    /// Metadata-API-only resolver with a single requested candidate
    pub fn metadata_only(config: &Config, tropes: TropeDictionary) -> Result<Self> {
        let client = MetadataApiClient::new(&config.sources, tropes.clone())?.with_max_results(1);
        Ok(Self::new(vec![SourceSlot::surfacing(Arc::new(client))], tropes)
            .with_default_description(NO_API_DESCRIPTION))
    }

    /// Resolve a book. "Nothing found" is a normal `found: false` record;
    /// `Err` only comes from a source whose errors are surfaced.
    pub async fn resolve(&self, query: &BookQuery) -> Result<BookRecord> {
        info!("🔍 Resolving: {} by {}", query.title, query.author_or_default());

        let mut record = BookRecord::from_query(query);
        if let Some(description) = self.default_description {
            record.description = description.to_string();
        }

        let mut source_author = None;
        for slot in &self.slots {
            let kind = slot.source.kind();
            let name = kind.name();

            match slot.source.lookup(&query.title, query.author.as_deref()).await {
                Ok(SourceLookup::Found(details)) => {
                    if record.merge(&details) {
                        if kind == SourceKind::MetadataApi && details.description.is_none() {
                            record.description = NO_API_DESCRIPTION.to_string();
                        }
                        source_author = details.author.clone();
                        info!("✅ Resolved from {}", name);
                        break;
                    }
                    debug!("{} returned details without page count or description", name);
                }
                Ok(SourceLookup::NotFound) => {
                    info!("{} has no match, trying next source", name);
                }
                Err(e) => match slot.on_error {
                    OnError::Absorb => warn!("{} lookup failed: {}", name, e),
                    OnError::Surface => {
                        warn!("{} lookup failed, surfacing error: {}", name, e);
                        return Err(e);
                    }
                },
            }
        }

        if query.author.is_none() && source_author.is_none() {
            self.apply_caption_hint(query, &mut record).await;
        }

        record.tropes = self.tropes.extract(&record.description);

        if !record.found {
            info!("No source resolved: {}", query.title);
        }
        Ok(record)
    }

    /// Fill the author from the video caption when nobody else did.
    /// The title is always caller supplied and is never replaced.
    async fn apply_caption_hint(&self, query: &BookQuery, record: &mut BookRecord) {
        let (Some(captions), Some(video_url)) = (&self.captions, &query.source_url) else {
            return;
        };

        match captions.caption_hint(video_url).await {
            Ok(Some(hint)) => {
                info!("🎬 Caption suggests: {} by {}", hint.title, hint.author);
                record.author = hint.author;
            }
            Ok(None) => debug!("Caption had no book hint"),
            Err(e) => warn!("Caption extraction failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LookupError;
    use crate::models::{PageCount, NO_DESCRIPTION};
    use crate::sources::{BookDetails, CaptionHint};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Reply {
        Found(BookDetails),
        NotFound,
        Fail,
    }

    struct StubSource {
        kind: SourceKind,
        reply: Reply,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn new(kind: SourceKind, reply: Reply) -> Arc<Self> {
            Arc::new(Self { kind, reply, calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait]
    impl BookSource for StubSource {
        async fn lookup(&self, _title: &str, _author: Option<&str>) -> Result<SourceLookup> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Reply::Found(details) => Ok(SourceLookup::Found(details.clone())),
                Reply::NotFound => Ok(SourceLookup::NotFound),
                Reply::Fail => Err(LookupError::unavailable(self.kind.name(), "timed out")),
            }
        }

        fn kind(&self) -> SourceKind {
            self.kind
        }
    }

    struct StubCaptions(Option<CaptionHint>);

    #[async_trait]
    impl CaptionSource for StubCaptions {
        async fn caption_hint(&self, _video_url: &str) -> Result<Option<CaptionHint>> {
            Ok(self.0.clone())
        }
    }

    fn query(title: &str, author: Option<&str>, url: Option<&str>) -> BookQuery {
        BookQuery::new(Some(title), author, url).unwrap()
    }

    fn catalog_details() -> BookDetails {
        BookDetails {
            title: Some("Beach Read".to_string()),
            author: Some("Emily Henry".to_string()),
            page_count: Some(361),
            description: Some("A grumpy sunshine, enemies to lovers story set in a small town by the lake.".to_string()),
            source_url: Some("https://www.goodreads.com/book/show/52867387".to_string()),
            tropes: vec!["stale".to_string()],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_nothing_found_returns_defaults() {
        let catalog = StubSource::new(SourceKind::Catalog, Reply::NotFound);
        let api = StubSource::new(SourceKind::MetadataApi, Reply::Fail);
        let resolver = BookResolver::new(
            vec![SourceSlot::absorbing(catalog.clone()), SourceSlot::absorbing(api.clone())],
            TropeDictionary::new(),
        );

        let record = resolver.resolve(&query("Beach Read", None, None)).await.unwrap();
        assert!(!record.found);
        assert_eq!(record.title, "Beach Read");
        assert_eq!(record.author, "Unknown");
        assert_eq!(record.page_count, PageCount::Unknown);
        assert_eq!(record.description, NO_DESCRIPTION);
        assert!(record.tropes.is_empty());
        assert_eq!(catalog.calls.load(Ordering::SeqCst), 1);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_catalog_hit_skips_fallback() {
        let catalog = StubSource::new(SourceKind::Catalog, Reply::Found(catalog_details()));
        let api = StubSource::new(SourceKind::MetadataApi, Reply::NotFound);
        let resolver = BookResolver::new(
            vec![SourceSlot::absorbing(catalog), SourceSlot::absorbing(api.clone())],
            TropeDictionary::new(),
        );

        let record = resolver.resolve(&query("beach read", Some("henry"), None)).await.unwrap();
        assert!(record.found);
        assert_eq!(record.title, "Beach Read");
        assert_eq!(record.author, "Emily Henry");
        assert_eq!(record.page_count, PageCount::Known(361));
        assert_eq!(record.source_url, "https://www.goodreads.com/book/show/52867387");
        assert_eq!(record.tropes, vec!["enemies to lovers", "small town", "grumpy sunshine"]);
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_catalog_failure_falls_back_to_api() {
        let catalog = StubSource::new(SourceKind::Catalog, Reply::Fail);
        let api = StubSource::new(
            SourceKind::MetadataApi,
            Reply::Found(BookDetails { page_count: Some(320), ..Default::default() }),
        );
        let resolver = BookResolver::new(
            vec![SourceSlot::absorbing(catalog), SourceSlot::absorbing(api)],
            TropeDictionary::new(),
        );

        let record = resolver.resolve(&query("Beach Read", Some("Emily Henry"), None)).await.unwrap();
        assert!(record.found);
        assert_eq!(record.page_count, PageCount::Known(320));
        assert_eq!(record.author, "Emily Henry");
        assert_eq!(record.source_url, "");
        assert_eq!(record.description, NO_API_DESCRIPTION);
    }

    #[tokio::test]
    async fn test_catalog_record_keeps_catalog_default_description() {
        let catalog = StubSource::new(
            SourceKind::Catalog,
            Reply::Found(BookDetails { page_count: Some(384), ..Default::default() }),
        );
        let resolver = BookResolver::new(vec![SourceSlot::absorbing(catalog)], TropeDictionary::new());

        let record = resolver.resolve(&query("Beach Read", None, None)).await.unwrap();
        assert!(record.found);
        assert_eq!(record.description, NO_DESCRIPTION);
    }

    #[tokio::test]
    async fn test_surfaced_error() {
        let api = StubSource::new(SourceKind::MetadataApi, Reply::Fail);
        let resolver = BookResolver::new(vec![SourceSlot::surfacing(api)], TropeDictionary::new());

        let err = resolver.resolve(&query("Beach Read", None, None)).await.unwrap_err();
        assert!(matches!(err, LookupError::SourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_caption_fills_missing_author_only() {
        let hint = CaptionHint {
            title: "Some Other Title".to_string(),
            author: "Emily Henry".to_string(),
            caption: "book: Some Other Title by Emily Henry".to_string(),
        };
        let catalog = StubSource::new(SourceKind::Catalog, Reply::NotFound);
        let resolver = BookResolver::new(vec![SourceSlot::absorbing(catalog)], TropeDictionary::new())
            .with_captions(Arc::new(StubCaptions(Some(hint))));

        let record = resolver
            .resolve(&query("Beach Read", None, Some("https://www.tiktok.com/@a/video/1")))
            .await
            .unwrap();
        assert_eq!(record.title, "Beach Read");
        assert_eq!(record.author, "Emily Henry");
        assert_eq!(record.passthrough_url, "https://www.tiktok.com/@a/video/1");
        assert!(!record.found);

        let record = resolver
            .resolve(&query("Beach Read", Some("E. Henry"), Some("https://www.tiktok.com/@a/video/1")))
            .await
            .unwrap();
        assert_eq!(record.author, "E. Henry");
    }

    #[tokio::test]
    async fn test_tropes_follow_final_description() {
        let mut details = catalog_details();
        details.description = Some(format!("{} vampire", "x".repeat(600)));
        let catalog = StubSource::new(SourceKind::Catalog, Reply::Found(details));
        let resolver = BookResolver::new(vec![SourceSlot::absorbing(catalog)], TropeDictionary::new());

        let record = resolver.resolve(&query("Beach Read", None, None)).await.unwrap();
        assert_eq!(record.description.chars().count(), 503);
        assert!(record.tropes.is_empty());
    }

    #[tokio::test]
    async fn test_identical_requests_are_identical() {
        let catalog = StubSource::new(SourceKind::Catalog, Reply::Found(catalog_details()));
        let resolver = BookResolver::new(vec![SourceSlot::absorbing(catalog)], TropeDictionary::new());
        let q = query("Beach Read", None, None);

        let first = serde_json::to_vec(&resolver.resolve(&q).await.unwrap()).unwrap();
        let second = serde_json::to_vec(&resolver.resolve(&q).await.unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
