//! Catalog record type

use serde::{Deserialize, Serialize};

/// One expected item in the manifest.
///
/// Immutable once loaded. A reload replaces the whole catalog rather than
/// patching individual records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    /// Item code as printed on the manifest (may contain dashes or spaces)
    pub sku: String,
    /// Human-readable title
    pub title: String,
    /// Quantity the manifest expects in `box_id`
    pub expected_qty: i64,
    /// Box the manifest places this item in
    pub box_id: String,
}

impl CatalogRecord {
    /// Create a new record, trimming surrounding whitespace from text fields.
    pub fn new(
        sku: impl Into<String>,
        title: impl Into<String>,
        expected_qty: i64,
        box_id: impl Into<String>,
    ) -> Self {
        Self {
            sku: sku.into().trim().to_string(),
            title: title.into().trim().to_string(),
            expected_qty,
            box_id: box_id.into().trim().to_string(),
        }
    }
}
