//! Request and response data model shared by the resolver and the API layer

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{LookupError, Result};
use crate::sources::BookDetails;

/// Maximum number of description characters kept before the marker
pub const DESCRIPTION_LIMIT: usize = 500;
/// Appended to descriptions cut at [`DESCRIPTION_LIMIT`]
pub const TRUNCATION_MARKER: &str = "...";

pub const UNKNOWN_AUTHOR: &str = "Unknown";
pub const UNKNOWN_PAGES: &str = "Unknown";
pub const NO_DESCRIPTION: &str = "No description found";
pub const NO_API_DESCRIPTION: &str = "No description available";
pub const UNAVAILABLE_DESCRIPTION: &str = "Search temporarily unavailable";

/// Validated lookup input, built once per request
#[derive(Debug, Clone, PartialEq)]
pub struct BookQuery {
    pub title: String,
    pub author: Option<String>,
    /// Opaque video URL echoed back and used for caption hints
    pub source_url: Option<String>,
}

impl BookQuery {
    /// Build a query, rejecting a missing or blank title.
    /// Blank author and source URL values are treated as absent.
    pub fn new(title: Option<&str>, author: Option<&str>, source_url: Option<&str>) -> Result<Self> {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| LookupError::InvalidInput("Book title is required".to_string()))?;

        Ok(Self {
            title: title.to_string(),
            author: non_blank(author),
            source_url: non_blank(source_url),
        })
    }

    pub fn author_or_default(&self) -> &str {
        self.author.as_deref().unwrap_or(UNKNOWN_AUTHOR)
    }

    /// Free-text search terms: title followed by the author when known
    pub fn search_terms(&self) -> String {
        match &self.author {
            Some(author) => format!("{} {}", self.title, author),
            None => self.title.clone(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Page count as returned to callers: a positive number or `"Unknown"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageCount {
    Known(u32),
    #[default]
    Unknown,
}

impl PageCount {
    pub fn from_option(pages: Option<u32>) -> Self {
        match pages {
            Some(n) if n > 0 => Self::Known(n),
            _ => Self::Unknown,
        }
    }
}

impl Serialize for PageCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Known(n) => serializer.serialize_u32(*n),
            Self::Unknown => serializer.serialize_str(UNKNOWN_PAGES),
        }
    }
}

impl<'de> Deserialize<'de> for PageCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u32),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self::from_option(Some(n)),
            Raw::Text(text) => Self::from_option(text.trim().parse().ok()),
        })
    }
}

/// Unified book shape returned by every lookup endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    #[serde(rename = "tiktok_url")]
    pub passthrough_url: String,
    #[serde(rename = "pages")]
    pub page_count: PageCount,
    pub description: String,
    pub tropes: Vec<String>,
    #[serde(rename = "goodreads_url")]
    pub source_url: String,
    pub found: bool,
    #[serde(rename = "publishedDate", default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl BookRecord {
    /// Defaults derived from the query, before any source has answered
    pub fn from_query(query: &BookQuery) -> Self {
        Self {
            title: query.title.clone(),
            author: query.author_or_default().to_string(),
            passthrough_url: query.source_url.clone().unwrap_or_default(),
            page_count: PageCount::Unknown,
            description: NO_DESCRIPTION.to_string(),
            tropes: Vec::new(),
            source_url: String::new(),
            found: false,
            published_date: None,
            rating: None,
        }
    }

    /// Well-formed record for lookups that failed outright
    pub fn unavailable(query: &BookQuery) -> Self {
        Self {
            description: UNAVAILABLE_DESCRIPTION.to_string(),
            ..Self::from_query(query)
        }
    }

    /// Record for a request that faulted before its query was known
    pub fn fault() -> Self {
        Self {
            title: String::new(),
            author: UNKNOWN_AUTHOR.to_string(),
            passthrough_url: String::new(),
            page_count: PageCount::Unknown,
            description: UNAVAILABLE_DESCRIPTION.to_string(),
            tropes: Vec::new(),
            source_url: String::new(),
            found: false,
            published_date: None,
            rating: None,
        }
    }

    /// Overwrite every field the source populated.
    /// Details without a page count or description are ignored.
    pub fn merge(&mut self, details: &BookDetails) -> bool {
        if !details.has_content() {
            return false;
        }

        if let Some(title) = &details.title {
            self.title = title.clone();
        }
        if let Some(author) = &details.author {
            self.author = author.clone();
        }
        if let Some(pages) = details.page_count {
            self.page_count = PageCount::from_option(Some(pages));
        }
        if let Some(description) = &details.description {
            self.description = truncate_description(description);
        }
        if let Some(url) = &details.source_url {
            self.source_url = url.clone();
        }
        if details.published_date.is_some() {
            self.published_date = details.published_date.clone();
        }
        if details.rating.is_some() {
            self.rating = details.rating;
        }

        self.found = true;
        true
    }
}

/// Cut a description to [`DESCRIPTION_LIMIT`] characters plus the marker.
/// Text at or under the limit is returned unchanged.
pub fn truncate_description(text: &str) -> String {
    match text.char_indices().nth(DESCRIPTION_LIMIT) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}
