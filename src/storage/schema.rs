//! Index schema definition
//!
//! The physicians index stores every record attribute as `text`. Each text
//! field also carries a `keyword` sub-field so term aggregations can run on
//! it without enabling fielddata.

use crate::record::Field;
use serde_json::{json, Map, Value};

/// Sub-field used for exact-value aggregations on text fields
pub const KEYWORD_SUBFIELD: &str = "keyword";

/// Longest value indexed into the keyword sub-field
const KEYWORD_IGNORE_ABOVE: u32 = 256;

/// Declared shape of the target index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
    /// Number of primary shards
    pub shards: u32,

    /// Number of replicas per shard
    pub replicas: u32,

    /// Text fields, in mapping order
    pub fields: Vec<&'static str>,
}

impl IndexSchema {
    /// Schema holding one text field per physician record attribute
    pub fn physicians(shards: u32, replicas: u32) -> Self {
        Self {
            shards,
            replicas,
            fields: Field::ALL.iter().map(|f| f.name()).collect(),
        }
    }

    /// Returns true if the schema declares `field`
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| *f == field)
    }

    /// Renders the create-index request body
    pub fn to_body(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            properties.insert(
                (*field).to_string(),
                json!({
                    "type": "text",
                    "fields": {
                        "keyword": {
                            "type": "keyword",
                            "ignore_above": KEYWORD_IGNORE_ABOVE
                        }
                    }
                }),
            );
        }

        json!({
            "settings": {
                "number_of_shards": self.shards,
                "number_of_replicas": self.replicas
            },
            "mappings": {
                "dynamic": "strict",
                "properties": properties
            }
        })
    }
}
