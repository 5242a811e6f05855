/// Ordered-fallback field extraction for catalog pages
///
/// The catalog markup changes between redesigns, so every field carries a
/// prioritized list of rules. Rules are tried top to bottom and the first
/// one that produces an accepted value wins.
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::models::truncate_description;

/// Descriptions at or under this many characters are boilerplate
pub const MIN_DESCRIPTION_CHARS: usize = 50;

static PAGE_COUNT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d[\d,]*)\s*pages?\b").unwrap());

/// One way of locating a field's text in a parsed page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionRule {
    /// Text of the first non-empty element matching a CSS selector
    Selector(&'static str),
    /// Text of the first element matching `selector` whose text contains `needle`
    Contains {
        selector: &'static str,
        needle: &'static str,
    },
}

impl ExtractionRule {
    pub fn apply(&self, document: &Html) -> Option<String> {
        match self {
            Self::Selector(css) => {
                let selector = Selector::parse(css).ok()?;
                document
                    .select(&selector)
                    .map(element_text)
                    .find(|text| !text.is_empty())
            }
            Self::Contains { selector, needle } => {
                let selector = Selector::parse(selector).ok()?;
                let needle = needle.to_lowercase();
                document
                    .select(&selector)
                    .map(element_text)
                    .find(|text| text.to_lowercase().contains(&needle))
            }
        }
    }
}

pub const TITLE_RULES: &[ExtractionRule] = &[
    ExtractionRule::Selector("[data-testid=\"bookTitle\"]"),
    ExtractionRule::Selector("h1.Text__title1"),
    ExtractionRule::Selector(".BookPageTitleSection__title h1"),
    ExtractionRule::Selector("h1#bookTitle"),
];

pub const AUTHOR_RULES: &[ExtractionRule] = &[
    ExtractionRule::Selector("[data-testid=\"name\"]"),
    ExtractionRule::Selector(".ContributorLink__name"),
    ExtractionRule::Selector(".BookPageMetadataSection__contributor a"),
    ExtractionRule::Selector("a.authorName span"),
];

pub const PAGE_COUNT_RULES: &[ExtractionRule] = &[
    ExtractionRule::Selector("[data-testid=\"pagesFormat\"]"),
    ExtractionRule::Selector(".FeaturedDetails p"),
    ExtractionRule::Selector(".BookPageMetadataSection__ratingStats + div"),
    ExtractionRule::Selector("span[itemprop=\"numberOfPages\"]"),
    ExtractionRule::Contains { selector: "span", needle: "pages" },
    ExtractionRule::Contains { selector: "p", needle: "pages" },
];

pub const DESCRIPTION_RULES: &[ExtractionRule] = &[
    ExtractionRule::Selector("[data-testid=\"description\"] .Formatted"),
    ExtractionRule::Selector(".BookPageMetadataSection__description .Formatted"),
    ExtractionRule::Selector(".DetailsLayoutRightParagraph__widthConstrained"),
    ExtractionRule::Selector("#description span"),
];

/// Search result links, most specific first
pub const SEARCH_RESULT_RULES: &[&str] = &["a.bookTitle", "[data-testid=\"bookTitle\"] a"];

/// Try `rules` in order; the first value accepted by `accept` wins
pub fn first_match<T>(
    document: &Html,
    rules: &[ExtractionRule],
    accept: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    rules.iter().enumerate().find_map(|(i, rule)| {
        let text = rule.apply(document)?;
        let value = accept(&text);
        if value.is_some() {
            debug!("Field matched by rule {}: {:?}", i, rule);
        }
        value
    })
}

pub fn extract_title(document: &Html) -> Option<String> {
    first_match(document, TITLE_RULES, |text| Some(text.to_string()))
}

pub fn extract_author(document: &Html) -> Option<String> {
    first_match(document, AUTHOR_RULES, |text| Some(text.to_string()))
}

pub fn extract_page_count(document: &Html) -> Option<u32> {
    first_match(document, PAGE_COUNT_RULES, parse_page_count)
}

/// Description, truncated; short snippets are rejected
pub fn extract_description(document: &Html) -> Option<String> {
    first_match(document, DESCRIPTION_RULES, |text| {
        (text.chars().count() > MIN_DESCRIPTION_CHARS).then(|| truncate_description(text))
    })
}

/// Href of the first search result; may be relative
pub fn extract_first_result_link(document: &Html) -> Option<String> {
    SEARCH_RESULT_RULES.iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        document
            .select(&selector)
            .filter_map(|a| a.value().attr("href"))
            .map(str::trim)
            .find(|href| !href.is_empty())
            .map(str::to_string)
    })
}

/// Extract N from text like "384 pages, Paperback"
pub fn parse_page_count(text: &str) -> Option<u32> {
    let captures = PAGE_COUNT_PATTERN.captures(text)?;
    let digits: String = captures.get(1)?.as_str().chars().filter(char::is_ascii_digit).collect();
    digits.parse::<u32>().ok().filter(|n| *n > 0)
}

/// Whitespace-normalised text content of an element
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_DESCRIPTION: &str = "Augustus Everett is an acclaimed author of literary fiction. \
        January Andrews writes bestselling romance. When she pens a happily ever after, he kills off his entire cast.";

    #[test]
    fn test_parse_page_count() {
        assert_eq!(parse_page_count("384 pages, Paperback"), Some(384));
        assert_eq!(parse_page_count("Kindle Edition, 1 page"), Some(1));
        assert_eq!(parse_page_count("1,024 Pages"), Some(1024));
        assert_eq!(parse_page_count("First published 2020"), None);
        assert_eq!(parse_page_count("0 pages"), None);
    }

    #[test]
    fn test_primary_selectors() {
        let html = format!(
            r#"<html><body>
                <h1 data-testid="bookTitle">Beach Read</h1>
                <span data-testid="name">Emily Henry</span>
                <p data-testid="pagesFormat">361 pages, Paperback</p>
                <div data-testid="description"><span class="Formatted">{}</span></div>
            </body></html>"#,
            LONG_DESCRIPTION
        );
        let document = Html::parse_document(&html);

        assert_eq!(extract_title(&document).as_deref(), Some("Beach Read"));
        assert_eq!(extract_author(&document).as_deref(), Some("Emily Henry"));
        assert_eq!(extract_page_count(&document), Some(361));
        assert_eq!(extract_description(&document).as_deref(), Some(LONG_DESCRIPTION.split_whitespace().collect::<Vec<_>>().join(" ").as_str()));
    }

    #[test]
    fn test_page_count_falls_back_to_later_rule() {
        let html = r#"<html><body>
            <p data-testid="pagesFormat">Paperback</p>
            <div class="FeaturedDetails"><p>First published June 2020</p></div>
            <div><span>Hardcover</span><span>384 pages</span></div>
        </body></html>"#;
        let document = Html::parse_document(html);

        assert_eq!(extract_page_count(&document), Some(384));
    }

    #[test]
    fn test_short_description_is_rejected() {
        let html = format!(
            r#"<html><body>
                <div data-testid="description"><span class="Formatted">Read more</span></div>
                <div id="description"><span>{}</span></div>
            </body></html>"#,
            LONG_DESCRIPTION
        );
        let document = Html::parse_document(&html);

        let description = extract_description(&document).unwrap();
        assert!(description.starts_with("Augustus Everett"));

        let only_short = Html::parse_document(r#"<div id="description"><span>Too short.</span></div>"#);
        assert_eq!(extract_description(&only_short), None);
    }

    #[test]
    fn test_description_is_truncated() {
        let long = "word ".repeat(200);
        let html = format!(r#"<div class="DetailsLayoutRightParagraph__widthConstrained">{}</div>"#, long);
        let document = Html::parse_document(&html);

        let description = extract_description(&document).unwrap();
        assert_eq!(description.chars().count(), 503);
        assert!(description.ends_with("..."));
    }

    #[test]
    fn test_missing_fields() {
        let document = Html::parse_document("<html><body><p>Nothing here</p></body></html>");

        assert_eq!(extract_title(&document), None);
        assert_eq!(extract_author(&document), None);
        assert_eq!(extract_page_count(&document), None);
        assert_eq!(extract_description(&document), None);
    }

    #[test]
    fn test_first_result_link() {
        let html = r#"<table>
            <tr><td><a class="bookTitle" href="/book/show/52867387-beach-read"><span>Beach Read</span></a></td></tr>
            <tr><td><a class="bookTitle" href="/book/show/2">Other</a></td></tr>
        </table>"#;
        let document = Html::parse_document(html);

        assert_eq!(
            extract_first_result_link(&document).as_deref(),
            Some("/book/show/52867387-beach-read")
        );
        assert_eq!(extract_first_result_link(&Html::parse_document("<p>No results</p>")), None);
    }
}
