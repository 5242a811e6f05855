/// Title/author hints from social video captions
///
/// Best-effort only: captions are free text and the pattern below will miss
/// or misread plenty of them.
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info};

use super::build_http_client;
use crate::config::SourcesConfig;
use crate::error::{LookupError, Result};

/// "book: TITLE by AUTHOR", quotes around the title optional
static CAPTION_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\b(?:reading|read|book)\b\s*[:\-]?\s*["“”]?([^"“”\n]+?)["“”]?\s+by\s+([^#@\n]+)"#).unwrap()
});

const CAPTION_SELECTORS: &[&str] = &[
    "[data-e2e=\"browse-video-desc\"]",
    "[data-e2e=\"video-desc\"]",
    ".video-meta-caption",
    ".tt-video-meta-caption",
];

/// Captions sit in the page head; nothing past this is read
pub const MAX_CAPTION_PAGE_BYTES: usize = 2 * 1024 * 1024;

const CAPTION_META: &[&str] = &["meta[property=\"og:description\"]", "meta[name=\"description\"]"];

/// Title and author read from a caption
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionHint {
    pub title: String,
    pub author: String,
    pub caption: String,
}

/// Trait for caption hint providers
#[async_trait]
pub trait CaptionSource: Send + Sync {
    async fn caption_hint(&self, video_url: &str) -> Result<Option<CaptionHint>>;
}

/// Parse "book: TITLE by AUTHOR" out of caption text
pub fn parse_caption(caption: &str) -> Option<CaptionHint> {
    let captures = CAPTION_PATTERN.captures(caption)?;
    let title = captures.get(1)?.as_str().trim();
    let author = captures
        .get(2)?
        .as_str()
        .trim()
        .trim_end_matches(['.', '!', ',', '?'])
        .trim();

    if title.is_empty() || author.is_empty() {
        return None;
    }

    Some(CaptionHint {
        title: title.to_string(),
        author: author.to_string(),
        caption: caption.to_string(),
    })
}

/// Caption text from a video page: caption elements first, then meta tags
pub fn extract_caption(html_content: &str) -> Option<String> {
    let document = Html::parse_document(html_content);

    let from_elements = CAPTION_SELECTORS.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        document
            .select(&selector)
            .map(|el| el.text().collect::<String>().trim().to_string())
            .find(|text| !text.is_empty())
    });

    from_elements.or_else(|| {
        CAPTION_META.iter().find_map(|css| {
            let selector = Selector::parse(css).ok()?;
            document
                .select(&selector)
                .filter_map(|el| el.value().attr("content"))
                .map(str::trim)
                .find(|text| !text.is_empty())
                .map(str::to_string)
        })
    })
}

/// Fetches video pages and reads their captions
#[derive(Clone)]
pub struct VideoCaptionClient {
    client: Client,
    max_page_bytes: usize,
}

impl VideoCaptionClient {
    pub fn new(config: &SourcesConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
            max_page_bytes: MAX_CAPTION_PAGE_BYTES,
        })
    }

    pub fn with_max_page_bytes(mut self, max_page_bytes: usize) -> Self {
        self.max_page_bytes = max_page_bytes;
        self
    }
}

#[async_trait]
impl CaptionSource for VideoCaptionClient {
    async fn caption_hint(&self, video_url: &str) -> Result<Option<CaptionHint>> {
        info!("🎬 Reading caption from: {}", video_url);

        let mut response = self
            .client
            .get(video_url)
            .send()
            .await
            .map_err(|e| LookupError::unavailable("video", e))?;
        if !response.status().is_success() {
            return Err(LookupError::unavailable(
                "video",
                format!("HTTP error {}", response.status()),
            ));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let room = self.max_page_bytes - body.len();
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                debug!("Video page cut at {} bytes", self.max_page_bytes);
                break;
            }
            body.extend_from_slice(&chunk);
        }

        let html_content = String::from_utf8_lossy(&body);
        let Some(caption) = extract_caption(&html_content) else {
            debug!("No caption found on video page");
            return Ok(None);
        };

        debug!("Caption text: {}", caption);
        Ok(parse_caption(&caption))
    }
}
