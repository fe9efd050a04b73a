//! Record module: physician records and how they are extracted
//!
//! # Components
//!
//! - `PhysicianRecord`: the structured document stored in the search index
//! - `Field`: the fixed set of record attributes
//! - `SelectorRules`: one CSS selector per field, loaded from configuration
//! - `extract_record`: applies the selector rules to a detail page

mod extractor;
mod physician;
mod selectors;

pub use extractor::extract_record;
pub use physician::{Field, PhysicianRecord};
pub use selectors::{CompiledSelectors, SelectorRules};
