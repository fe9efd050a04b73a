//! Field extraction from detail-page HTML
//!
//! Each field is resolved on its own: its selector is applied to the parsed
//! document, the first match's text is cleaned, and a miss leaves the field
//! absent.

use crate::record::{CompiledSelectors, PhysicianRecord};
use scraper::{Html, Selector};

/// Extracts a physician record from detail-page HTML
///
/// # Arguments
///
/// * `html` - The detail page markup
/// * `selectors` - One compiled selector per field
///
/// # Example
///
/// ```
/// use physician_indexer::record::{extract_record, SelectorRules};
///
/// let rules = SelectorRules {
///     full_name: "h1.name".to_string(),
///     ..SelectorRules::default()
/// };
/// let selectors = rules.compile().unwrap();
/// let record = extract_record(r#"<h1 class="name"> Jane Doe </h1>"#, &selectors);
/// assert_eq!(record.full_name.as_deref(), Some("Jane Doe"));
/// assert_eq!(record.overview, None);
/// ```
pub fn extract_record(html: &str, selectors: &CompiledSelectors) -> PhysicianRecord {
    let document = Html::parse_document(html);
    let mut record = PhysicianRecord::default();

    for (field, selector) in selectors.iter() {
        record.set(field, select_first_text(&document, selector));
    }

    record
}

/// Text of the first element matching `selector`, cleaned for storage
fn select_first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|element| clean_text(&element.text().collect::<String>()))
}

/// Trims surrounding whitespace and drops embedded double quotes
fn clean_text(raw: &str) -> String {
    raw.trim().replace('"', "")
}
