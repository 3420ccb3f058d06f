use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Sentinel bucket for items whose stored category is not in the domain's
/// allow-list. Applied at read time only; the catalog file is never modified.
/// Excluded from category listings — it is a normalization bucket, not a real
/// browsing category.
pub const OTHER_CATEGORY: &str = "Other";

/// One addressable catalog record: an emoji, a man page, an icon, a command.
///
/// `keywords`, `aliases` and `sections` are stored as JSON-encoded text
/// columns and decoded through [`decode_json_column`] on every read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    /// Hash key derived from the item's composite identifier (see `keys`).
    pub key: i64,
    /// Stable slug; unique within a domain.
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Raw stored category; normalized against the domain allow-list when
    /// composing listings.
    pub category: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Structured long-form content (e.g. man-page sections), shape varies
    /// per domain.
    #[serde(default)]
    pub sections: serde_json::Value,
}

/// A named grouping of catalog items with precomputed metadata.
///
/// `item_count` is a cached value written by the catalog build pipeline; the
/// single-cluster lookup trusts it rather than recounting per request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterInfo {
    pub name: String,
    pub item_count: i64,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub alt_names: Vec<String>,
}

/// A binary image blob owned by one catalog item. Several assets per item
/// represent style or version variants; the filename encodes a sortable
/// version token.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub item_slug: String,
    pub filename: String,
    pub kind: String,
    pub data: Vec<u8>,
}

/// One category in the browse view: its (exclusion-aware) count and a
/// bounded list of representative items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPreview {
    pub name: String,
    pub count: usize,
    pub preview_items: Vec<CatalogItem>,
}

/// A page over the category listing itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPage {
    pub categories: Vec<CategoryPreview>,
    /// Total number of categories (before category-list pagination).
    pub total: usize,
}

/// An item plus its resolved latest image, ready for JSON embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemWithAsset {
    #[serde(flatten)]
    pub item: CatalogItem,
    /// `data:` URI of the latest image variant, when assets were requested
    /// and the item has any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// A page of items within one category. A page past the end carries an empty
/// `items` with the true `total`; a zero-result category is
/// `{items: [], total: 0}`, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemPage {
    pub items: Vec<ItemWithAsset>,
    pub total: usize,
}

/// Centralized decode boundary for JSON-encoded text columns.
///
/// Malformed or missing data decodes to the type's default and logs a
/// warning; a single bad row must not fail a whole listing.
pub(crate) fn decode_json_column<T>(slug: &str, column: &str, raw: Option<String>) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = raw else {
        return T::default();
    };
    if raw.trim().is_empty() {
        return T::default();
    }
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Item '{}': malformed JSON in column '{}': {}", slug, column, e);
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_json_column_lenient() {
        let keywords: Vec<String> =
            decode_json_column("smile", "keywords", Some(r#"["happy","face"]"#.into()));
        assert_eq!(keywords, vec!["happy", "face"]);

        // Missing, empty and malformed all fall back to the default.
        let missing: Vec<String> = decode_json_column("smile", "keywords", None);
        assert!(missing.is_empty());
        let empty: Vec<String> = decode_json_column("smile", "keywords", Some(String::new()));
        assert!(empty.is_empty());
        let bad: Vec<String> = decode_json_column("smile", "keywords", Some("{not json".into()));
        assert!(bad.is_empty());
    }
}
