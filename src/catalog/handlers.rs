//! Domain Handler Registry
//!
//! Wires the named catalog queries onto the generic pool: each handler
//! deserializes its params, runs parameterized SQL on the worker's
//! connection, post-processes rows through the composer, and returns a
//! JSON-serializable result. One [`DomainSpec`] per content domain (emoji,
//! man pages, icons, commands) parameterizes the shared logic instead of
//! duplicating a pool per domain.

use super::compose;
use super::types::{
    CatalogItem, ClusterInfo, ImageAsset, ItemPage, ItemWithAsset, decode_json_column,
};
use crate::assets;
use crate::keys;
use crate::pool::registry::HandlerRegistry;

use anyhow::{Context, Result};
use regex::Regex;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub const QUERY_CATEGORIES: &str = "categories_with_previews";
pub const QUERY_ITEMS: &str = "items_in_category";
pub const QUERY_ITEM_BY_KEY: &str = "item_by_key";
pub const QUERY_CLUSTER: &str = "cluster_info";

/// Preview items per category when the caller does not say otherwise.
pub const DEFAULT_PREVIEWS: usize = 6;
/// Items per page when the caller does not say otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 24;

/// Per-domain knobs for the shared handlers: the category allow-list, the
/// slug markers identifying variant entries, and the filename convention for
/// asset version tokens.
#[derive(Debug, Clone)]
pub struct DomainSpec {
    pub name: String,
    pub categories: Vec<String>,
    pub variant_markers: Vec<String>,
    pub version_pattern: Regex,
}

impl DomainSpec {
    pub fn emoji() -> Self {
        Self {
            name: "emoji".into(),
            categories: [
                "Smileys & Emotion",
                "People & Body",
                "Animals & Nature",
                "Food & Drink",
                "Travel & Places",
                "Activities",
                "Objects",
                "Symbols",
                "Flags",
            ]
            .map(String::from)
            .to_vec(),
            variant_markers: vec!["skin-tone".into(), "skin_tone".into()],
            version_pattern: assets::trailing_version_pattern(),
        }
    }

    pub fn man_pages() -> Self {
        Self {
            name: "man".into(),
            categories: [
                "User Commands",
                "System Calls",
                "Library Functions",
                "Special Files",
                "File Formats",
                "Games",
                "Miscellanea",
                "Administration",
            ]
            .map(String::from)
            .to_vec(),
            variant_markers: Vec::new(),
            version_pattern: assets::trailing_version_pattern(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoriesParams {
    #[serde(default)]
    pub page: usize,
    /// Page size over the category list; 0 means all categories.
    #[serde(default)]
    pub per_page: usize,
    #[serde(default = "default_previews")]
    pub previews: usize,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Default for CategoriesParams {
    fn default() -> Self {
        Self {
            page: 0,
            per_page: 0,
            previews: DEFAULT_PREVIEWS,
            exclude: Vec::new(),
        }
    }
}

fn default_previews() -> usize {
    DEFAULT_PREVIEWS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemsParams {
    pub category: String,
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub per_page: usize,
    #[serde(default)]
    pub with_assets: bool,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl ItemsParams {
    pub fn new(category: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            page: 0,
            per_page: DEFAULT_PAGE_SIZE,
            with_assets: false,
            exclude: Vec::new(),
        }
    }
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemByKeyParams {
    /// Identifier components in derivation order (see `keys::derive_key`).
    pub parts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterParams {
    pub name: String,
}

const ITEM_COLUMNS: &str = "key, slug, title, description, category, keywords, aliases, sections";

fn item_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CatalogItem> {
    let slug: String = row.get(1)?;
    Ok(CatalogItem {
        key: row.get(0)?,
        title: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        description: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        category: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        keywords: decode_json_column(&slug, "keywords", row.get(5)?),
        aliases: decode_json_column(&slug, "aliases", row.get(6)?),
        sections: decode_json_column(&slug, "sections", row.get(7)?),
        slug,
    })
}

fn fetch_all_items(conn: &Connection) -> Result<Vec<CatalogItem>> {
    let mut stmt = conn.prepare(&format!("SELECT {ITEM_COLUMNS} FROM items"))?;
    let rows = stmt.query_map([], item_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

fn fetch_items_in_category(conn: &Connection, category: &str) -> Result<Vec<CatalogItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM items WHERE category = ?1 COLLATE NOCASE"
    ))?;
    let rows = stmt.query_map([category], item_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Fetches every asset for the given slugs in one batch query — never once
/// per item — grouped in memory by owning slug.
fn fetch_assets_for(conn: &Connection, slugs: &[&str]) -> Result<HashMap<String, Vec<ImageAsset>>> {
    if slugs.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = vec!["?"; slugs.len()].join(", ");
    let sql = format!(
        "SELECT item_slug, filename, kind, data FROM assets WHERE item_slug IN ({placeholders})"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(slugs.iter()), |row| {
        Ok(ImageAsset {
            item_slug: row.get(0)?,
            filename: row.get(1)?,
            kind: row.get(2)?,
            data: row.get(3)?,
        })
    })?;

    let mut grouped: HashMap<String, Vec<ImageAsset>> = HashMap::new();
    for asset in rows {
        let asset = asset?;
        grouped.entry(asset.item_slug.clone()).or_default().push(asset);
    }
    Ok(grouped)
}

/// Attaches the latest image variant per item as a data URI, keeping
/// declaration order for version ties.
fn attach_latest(
    items: Vec<CatalogItem>,
    grouped: &HashMap<String, Vec<ImageAsset>>,
    pattern: &Regex,
) -> Vec<ItemWithAsset> {
    items
        .into_iter()
        .map(|item| {
            let image = grouped.get(&item.slug).and_then(|variants| {
                assets::latest_index(variants.iter().map(|a| a.filename.as_str()), pattern)
                    .map(|index| assets::to_data_uri(&variants[index].data))
            });
            ItemWithAsset { item, image }
        })
        .collect()
}

fn cluster_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ClusterInfo> {
    let name: String = row.get(0)?;
    Ok(ClusterInfo {
        item_count: row.get(1)?,
        keywords: decode_json_column(&name, "keywords", row.get(2)?),
        description: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        alt_names: decode_json_column(&name, "alt_names", row.get(4)?),
        name,
    })
}

/// Builds the closed handler registry for one content domain.
pub fn build_registry(domain: DomainSpec) -> HandlerRegistry {
    let domain = Arc::new(domain);
    let mut registry = HandlerRegistry::new();

    let spec = domain.clone();
    registry.register(QUERY_CATEGORIES, move |conn, params| {
        let params: CategoriesParams =
            serde_json::from_value(params).context("invalid categories_with_previews params")?;
        let items = fetch_all_items(conn)?;
        let exclude: HashSet<String> = params.exclude.into_iter().collect();
        let page = compose::categories_with_previews(
            items,
            &spec.categories,
            &spec.variant_markers,
            params.previews,
            &exclude,
            params.page,
            params.per_page,
        );
        Ok(serde_json::to_value(page)?)
    });

    let spec = domain.clone();
    registry.register(QUERY_ITEMS, move |conn, params| {
        let params: ItemsParams =
            serde_json::from_value(params).context("invalid items_in_category params")?;
        let rows = fetch_items_in_category(conn, &params.category)?;
        let exclude: HashSet<String> = params.exclude.into_iter().collect();
        let (page_rows, total) = compose::page_items(
            rows,
            &spec.variant_markers,
            &exclude,
            params.page,
            params.per_page,
        );

        let items = if params.with_assets {
            let slugs: Vec<&str> = page_rows.iter().map(|item| item.slug.as_str()).collect();
            let grouped = fetch_assets_for(conn, &slugs)?;
            attach_latest(page_rows, &grouped, &spec.version_pattern)
        } else {
            page_rows
                .into_iter()
                .map(|item| ItemWithAsset { item, image: None })
                .collect()
        };

        Ok(serde_json::to_value(ItemPage { items, total })?)
    });

    registry.register(QUERY_ITEM_BY_KEY, move |conn, params| {
        let params: ItemByKeyParams =
            serde_json::from_value(params).context("invalid item_by_key params")?;
        let key = keys::derive_key(&params.parts);
        let item = conn
            .query_row(
                &format!("SELECT {ITEM_COLUMNS} FROM items WHERE key = ?1"),
                [key],
                item_from_row,
            )
            .optional()?;
        Ok(serde_json::to_value(item)?)
    });

    registry.register(QUERY_CLUSTER, move |conn, params| {
        let params: ClusterParams =
            serde_json::from_value(params).context("invalid cluster_info params")?;
        let cluster = conn
            .query_row(
                "SELECT name, item_count, keywords, description, alt_names \
                 FROM clusters WHERE name = ?1 COLLATE NOCASE",
                [&params.name],
                cluster_from_row,
            )
            .optional()?;
        Ok(serde_json::to_value(cluster)?)
    });

    registry
}
