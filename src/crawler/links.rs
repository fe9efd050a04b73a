//! Link extraction from the listing page
//!
//! Applies the configured link selector to the listing page and turns each
//! matched element's `href` into an absolute URL.

use scraper::{Html, Selector};
use std::fmt;
use url::Url;

/// A detail-page URL discovered on the listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    url: Url,
}

impl CrawlTarget {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl fmt::Display for CrawlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Extracts detail-page links from listing HTML
///
/// Links come back in document order. Duplicates are kept. A selector that
/// matches nothing yields an empty vector.
///
/// **Skipped:**
/// - Matched elements without an `href`
/// - `javascript:`, `mailto:`, `tel:` and `data:` links
/// - Fragment-only links
/// - Links that do not resolve to http(s)
///
/// # Arguments
///
/// * `html` - The listing page content
/// * `selector` - Selector matching the link elements
/// * `base_url` - The listing page URL, for resolving relative links
///
/// # Example
///
/// ```
/// use physician_indexer::crawler::extract_links;
/// use scraper::Selector;
/// use url::Url;
///
/// let html = r#"<ul class="list"><li><a href="/doctors/jane-doe">Jane</a></li></ul>"#;
/// let selector = Selector::parse("ul.list a").unwrap();
/// let base = Url::parse("https://example.com/doctors/").unwrap();
/// let links = extract_links(html, &selector, &base);
/// assert_eq!(links[0].as_str(), "https://example.com/doctors/jane-doe");
/// ```
pub fn extract_links(html: &str, selector: &Selector, base_url: &Url) -> Vec<CrawlTarget> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    for element in document.select(selector) {
        match element.value().attr("href") {
            Some(href) => match resolve_link(href, base_url) {
                Some(url) => links.push(CrawlTarget::new(url)),
                None => tracing::debug!("Skipping unresolvable link {:?}", href),
            },
            None => tracing::debug!("Skipping matched <{}> without href", element.value().name()),
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    // Skip special schemes
    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
        Some(absolute_url)
    } else {
        None
    }
}
