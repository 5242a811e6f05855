/// TBR Lookup - book metadata enrichment service
///
/// Resolves a book title (and optional author or source video) into page
/// count, description, detected tropes and a catalog link, scraping a book
/// catalog first and falling back to a public metadata API.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod resolver;
pub mod sources;
pub mod tropes;

// Re-export main types for easy access
pub use crate::config::{Config, ConfigBuilder, LookupStrategy};
pub use crate::error::{LookupError, Result};
pub use crate::models::{BookQuery, BookRecord, PageCount};
pub use crate::resolver::{BookResolver, OnError, SourceSlot};
pub use crate::sources::{BookDetails, BookSource, SourceKind, SourceLookup};
pub use crate::tropes::TropeDictionary;
