//! Catalog/Preview Composition
//!
//! Pure post-processing over fetched rows: category normalization, grouping,
//! variant-aware preview ordering, exclusion filtering and pagination. No
//! database access happens here, which keeps every rule unit-testable in
//! isolation.

use super::types::{CatalogItem, CategoryPage, CategoryPreview, OTHER_CATEGORY};
use std::collections::{BTreeMap, HashSet};

/// Maps a stored category onto the domain allow-list (case-insensitive);
/// anything unrecognized lands in the sentinel "Other" bucket.
pub fn normalize_category(raw: &str, allowed: &[String]) -> String {
    let trimmed = raw.trim();
    allowed
        .iter()
        .find(|name| name.eq_ignore_ascii_case(trimmed))
        .cloned()
        .unwrap_or_else(|| OTHER_CATEGORY.to_string())
}

/// Variant entries (e.g. skin-tone emoji) are less representative and must
/// not crowd base entries out of short preview lists.
pub fn is_variant(item: &CatalogItem, markers: &[String]) -> bool {
    let slug = item.slug.to_lowercase();
    markers
        .iter()
        .any(|marker| slug.contains(&marker.to_lowercase()))
}

/// Orders items for listing: variants last, then case-insensitive by title
/// (falling back to slug for untitled items).
pub fn sort_items(items: &mut [CatalogItem], markers: &[String]) {
    items.sort_by_cached_key(|item| {
        let label = if item.title.is_empty() {
            &item.slug
        } else {
            &item.title
        };
        (is_variant(item, markers), label.to_lowercase())
    });
}

fn paginate<T>(list: Vec<T>, page: usize, per_page: usize) -> Vec<T> {
    if per_page == 0 {
        return list;
    }
    list.into_iter()
        .skip(page.saturating_mul(per_page))
        .take(per_page)
        .collect()
}

/// Builds the browse view: categories sorted by name, each with its count
/// and up to `previews` representative items, paginated over the category
/// list itself.
///
/// Excluded slugs are dropped before grouping, so they appear in neither the
/// counts nor the preview lists. The "Other" bucket is grouped (its items are
/// normalized like any) but left out of the listing.
pub fn categories_with_previews(
    items: Vec<CatalogItem>,
    allowed: &[String],
    markers: &[String],
    previews: usize,
    exclude: &HashSet<String>,
    page: usize,
    per_page: usize,
) -> CategoryPage {
    let mut groups: BTreeMap<String, Vec<CatalogItem>> = BTreeMap::new();
    for item in items {
        if exclude.contains(&item.slug) {
            continue;
        }
        let category = normalize_category(&item.category, allowed);
        groups.entry(category).or_default().push(item);
    }
    groups.remove(OTHER_CATEGORY);

    let categories: Vec<CategoryPreview> = groups
        .into_iter()
        .map(|(name, mut members)| {
            let count = members.len();
            sort_items(&mut members, markers);
            members.truncate(previews);
            CategoryPreview {
                name,
                count,
                preview_items: members,
            }
        })
        .collect();

    let total = categories.len();
    CategoryPage {
        categories: paginate(categories, page, per_page),
        total,
    }
}

/// Filters, orders and pages the items of one category (category filtering
/// itself happens upstream in SQL). Returns the page plus the total match
/// count so callers can compute total pages; a page past the end is simply
/// empty.
pub fn page_items(
    items: Vec<CatalogItem>,
    markers: &[String],
    exclude: &HashSet<String>,
    page: usize,
    per_page: usize,
) -> (Vec<CatalogItem>, usize) {
    let mut matches: Vec<CatalogItem> = items
        .into_iter()
        .filter(|item| !exclude.contains(&item.slug))
        .collect();

    let total = matches.len();
    sort_items(&mut matches, markers);
    (paginate(matches, page, per_page), total)
}
