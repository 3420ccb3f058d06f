//! Catalog Module Tests
//!
//! Pure composer tests plus end-to-end scenarios that seed an on-disk
//! database, run a real worker pool over it, and query through the typed
//! client.
//!
//! ## Test Scopes
//! - **Composition**: category normalization, variant-last preview ordering,
//!   exclusion filtering, pagination boundaries.
//! - **Handlers**: asset joining with numeric version selection, hashed-key
//!   lookup, cached cluster counts, malformed-column tolerance.

use crate::assets;
use crate::catalog::client::CatalogClient;
use crate::catalog::compose;
use crate::catalog::handlers::{CategoriesParams, DomainSpec, ItemsParams};
use crate::catalog::types::{CatalogItem, OTHER_CATEGORY};
use crate::keys;
use crate::pool::types::PoolConfig;

use rusqlite::params;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

fn test_domain() -> DomainSpec {
    DomainSpec {
        name: "test".into(),
        categories: vec!["Tools".into(), "Toys".into()],
        variant_markers: vec!["skin-tone".into()],
        version_pattern: assets::trailing_version_pattern(),
    }
}

fn item(slug: &str, title: &str, category: &str) -> CatalogItem {
    CatalogItem {
        key: keys::derive_key(&[category, slug]),
        slug: slug.into(),
        title: title.into(),
        description: String::new(),
        category: category.into(),
        keywords: Vec::new(),
        aliases: Vec::new(),
        sections: serde_json::Value::Null,
    }
}

const SCHEMA: &str = "
    CREATE TABLE items(
        key INTEGER, slug TEXT, title TEXT, description TEXT,
        category TEXT, keywords TEXT, aliases TEXT, sections TEXT
    );
    CREATE INDEX idx_items_key ON items(key);
    CREATE TABLE clusters(
        name TEXT, item_count INTEGER, keywords TEXT,
        description TEXT, alt_names TEXT
    );
    CREATE TABLE assets(item_slug TEXT, filename TEXT, kind TEXT, data BLOB);
";

fn seed(dir: &tempfile::TempDir, items: &[CatalogItem]) -> PathBuf {
    let path = dir.path().join("catalog.db");
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    for it in items {
        conn.execute(
            "INSERT INTO items VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                it.key,
                it.slug,
                it.title,
                it.description,
                it.category,
                serde_json::to_string(&it.keywords).unwrap(),
                serde_json::to_string(&it.aliases).unwrap(),
                it.sections.to_string(),
            ],
        )
        .unwrap();
    }
    path
}

fn client_for(path: PathBuf) -> CatalogClient {
    let config = PoolConfig {
        db_path: path,
        worker_count: 2,
        query_timeout: Duration::from_secs(5),
    };
    CatalogClient::new(config, test_domain())
}

// ============================================================
// Composer (pure)
// ============================================================

#[test]
fn test_normalize_category() {
    let allowed = vec!["Tools".to_string(), "Toys".to_string()];
    assert_eq!(compose::normalize_category("Tools", &allowed), "Tools");
    assert_eq!(compose::normalize_category("  tools ", &allowed), "Tools");
    assert_eq!(compose::normalize_category("Gadgets", &allowed), OTHER_CATEGORY);
    assert_eq!(compose::normalize_category("", &allowed), OTHER_CATEGORY);
}

#[test]
fn test_preview_ordering_variants_sort_last() {
    let markers = vec!["skin-tone".to_string()];
    let mut items = vec![
        item("a-skin-tone", "", "Tools"),
        item("b", "", "Tools"),
        item("a", "", "Tools"),
    ];
    compose::sort_items(&mut items, &markers);

    let slugs: Vec<&str> = items.iter().map(|i| i.slug.as_str()).collect();
    assert_eq!(slugs, vec!["a", "b", "a-skin-tone"]);
}

#[test]
fn test_other_bucket_is_grouped_but_not_listed() {
    let allowed = vec!["Tools".to_string()];
    let items = vec![
        item("alpha", "Alpha", "Tools"),
        item("mystery", "Mystery", "Unmapped Category"),
    ];
    let page = compose::categories_with_previews(
        items,
        &allowed,
        &[],
        10,
        &HashSet::new(),
        0,
        0,
    );

    assert_eq!(page.total, 1);
    assert_eq!(page.categories.len(), 1);
    assert_eq!(page.categories[0].name, "Tools");
}

#[test]
fn test_category_list_pagination() {
    let allowed: Vec<String> = ["A", "B", "C"].map(String::from).to_vec();
    let items = vec![
        item("a1", "", "A"),
        item("b1", "", "B"),
        item("c1", "", "C"),
    ];
    let page = compose::categories_with_previews(
        items,
        &allowed,
        &[],
        1,
        &HashSet::new(),
        1,
        2,
    );

    // Three categories total, second page of size 2 holds only "C".
    assert_eq!(page.total, 3);
    assert_eq!(page.categories.len(), 1);
    assert_eq!(page.categories[0].name, "C");
}

// ============================================================
// End-to-end through the pool
// ============================================================

#[tokio::test]
async fn test_categories_with_two_previews_each() {
    let dir = tempfile::tempdir().unwrap();
    let path = seed(
        &dir,
        &[
            item("alpha", "", "Tools"),
            item("beta", "", "Tools"),
            item("beta-skin-tone", "", "Tools"),
        ],
    );
    let client = client_for(path);

    let page = client
        .categories_with_previews(CategoriesParams {
            previews: 2,
            ..Default::default()
        })
        .await
        .unwrap();

    // One category, full count, previews capped at 2: the variant is pushed
    // out by the cap, not by the tie-break.
    assert_eq!(page.total, 1);
    let tools = &page.categories[0];
    assert_eq!(tools.name, "Tools");
    assert_eq!(tools.count, 3);
    let slugs: Vec<&str> = tools.preview_items.iter().map(|i| i.slug.as_str()).collect();
    assert_eq!(slugs, vec!["alpha", "beta"]);

    client.shutdown().await;
}

#[tokio::test]
async fn test_pagination_past_last_page_returns_empty_with_total() {
    let dir = tempfile::tempdir().unwrap();
    let items: Vec<CatalogItem> = (1..=5)
        .map(|i| item(&format!("toy-{i}"), &format!("Toy {i}"), "Toys"))
        .collect();
    let path = seed(&dir, &items);
    let client = client_for(path);

    let page = client
        .items_in_category(ItemsParams {
            page: 3,
            per_page: 10,
            ..ItemsParams::new("Toys")
        })
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total, 5);

    client.shutdown().await;
}

#[tokio::test]
async fn test_zero_result_category_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = seed(&dir, &[item("alpha", "Alpha", "Tools")]);
    let client = client_for(path);

    let page = client
        .items_in_category(ItemsParams::new("Ghosts"))
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 0);

    client.shutdown().await;
}

#[tokio::test]
async fn test_category_filter_is_case_insensitive() {
    let dir = tempfile::tempdir().unwrap();
    let path = seed(&dir, &[item("alpha", "Alpha", "Tools")]);
    let client = client_for(path);

    let page = client
        .items_in_category(ItemsParams::new("tools"))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].item.slug, "alpha");

    client.shutdown().await;
}

#[tokio::test]
async fn test_excluded_slugs_vanish_everywhere() {
    let dir = tempfile::tempdir().unwrap();
    let path = seed(
        &dir,
        &[
            item("alpha", "", "Tools"),
            item("beta", "", "Tools"),
            item("gamma", "", "Tools"),
        ],
    );
    let client = client_for(path);

    let categories = client
        .categories_with_previews(CategoriesParams {
            exclude: vec!["beta".into()],
            ..Default::default()
        })
        .await
        .unwrap();
    let tools = &categories.categories[0];
    assert_eq!(tools.count, 2);
    assert!(tools.preview_items.iter().all(|i| i.slug != "beta"));

    let items = client
        .items_in_category(ItemsParams {
            exclude: vec!["beta".into()],
            ..ItemsParams::new("Tools")
        })
        .await
        .unwrap();
    assert_eq!(items.total, 2);
    assert!(items.items.iter().all(|i| i.item.slug != "beta"));

    client.shutdown().await;
}

#[tokio::test]
async fn test_latest_asset_is_joined_numerically() {
    let dir = tempfile::tempdir().unwrap();
    let path = seed(
        &dir,
        &[item("alpha", "Alpha", "Tools"), item("beta", "Beta", "Tools")],
    );

    let old = b"\x89PNG\r\n\x1a\nold".to_vec();
    let mid = b"\x89PNG\r\n\x1a\nmid".to_vec();
    let new = b"\x89PNG\r\n\x1a\nnew".to_vec();
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        for (name, data) in [
            ("icon_2.png", &old),
            ("icon_10.png", &new),
            ("icon_9.png", &mid),
        ] {
            conn.execute(
                "INSERT INTO assets VALUES ('alpha', ?1, 'default', ?2)",
                params![name, data],
            )
            .unwrap();
        }
    }

    let client = client_for(path);
    let page = client
        .items_in_category(ItemsParams {
            with_assets: true,
            ..ItemsParams::new("Tools")
        })
        .await
        .unwrap();

    let alpha = page.items.iter().find(|i| i.item.slug == "alpha").unwrap();
    // icon_10 wins over icon_9 numerically, not lexicographically.
    assert_eq!(alpha.image.as_deref(), Some(assets::to_data_uri(&new).as_str()));
    assert!(alpha.image.as_deref().unwrap().starts_with("data:image/png;base64,"));

    let beta = page.items.iter().find(|i| i.item.slug == "beta").unwrap();
    assert!(beta.image.is_none());

    client.shutdown().await;
}

#[tokio::test]
async fn test_item_lookup_by_derived_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = seed(&dir, &[item("alpha", "Alpha", "Tools")]);
    let client = client_for(path);

    let found = client.item_by_parts(&["Tools", "alpha"]).await.unwrap();
    assert_eq!(found.unwrap().slug, "alpha");

    let missing = client.item_by_parts(&["Tools", "nothing"]).await.unwrap();
    assert!(missing.is_none());

    client.shutdown().await;
}

#[tokio::test]
async fn test_cluster_info_trusts_cached_count() {
    let dir = tempfile::tempdir().unwrap();
    let path = seed(&dir, &[item("alpha", "Alpha", "Tools")]);
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        // Cached count deliberately differs from the live row count; the
        // lookup must report the cached value verbatim.
        conn.execute(
            "INSERT INTO clusters VALUES ('Tools', 99, '[\"hardware\"]', 'Handy things', '[]')",
            [],
        )
        .unwrap();
    }
    let client = client_for(path);

    let cluster = client.cluster_info("tools").await.unwrap().unwrap();
    assert_eq!(cluster.name, "Tools");
    assert_eq!(cluster.item_count, 99);
    assert_eq!(cluster.keywords, vec!["hardware"]);

    assert!(client.cluster_info("Ghosts").await.unwrap().is_none());

    client.shutdown().await;
}

#[tokio::test]
async fn test_malformed_json_columns_do_not_fail_listings() {
    let dir = tempfile::tempdir().unwrap();
    let path = seed(&dir, &[item("alpha", "Alpha", "Tools")]);
    {
        let conn = rusqlite::Connection::open(&path).unwrap();
        conn.execute(
            "INSERT INTO items VALUES (?1, 'broken', 'Broken', '', 'Tools', '{not json', NULL, '')",
            params![keys::derive_key(&["Tools", "broken"])],
        )
        .unwrap();
    }
    let client = client_for(path);

    let page = client.items_in_category(ItemsParams::new("Tools")).await.unwrap();
    assert_eq!(page.total, 2);
    let broken = page.items.iter().find(|i| i.item.slug == "broken").unwrap();
    assert!(broken.item.keywords.is_empty());
    assert!(broken.item.aliases.is_empty());

    client.shutdown().await;
}
