//! Typed Client Facade
//!
//! The consumer-facing surface: one async function per query name, with
//! domain-typed parameters and results. Rendering, authentication and search
//! layers call these and never see the worker message protocol.

use super::handlers::{
    CategoriesParams, ClusterParams, DomainSpec, ItemByKeyParams, ItemsParams, QUERY_CATEGORIES,
    QUERY_CLUSTER, QUERY_ITEM_BY_KEY, QUERY_ITEMS, build_registry,
};
use super::types::{CatalogItem, CategoryPage, ClusterInfo, ItemPage};
use crate::pool::manager::QueryPool;
use crate::pool::types::{PoolConfig, PoolError};

use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Async entry points for one content domain, backed by a worker pool.
pub struct CatalogClient {
    pool: Arc<QueryPool>,
}

impl CatalogClient {
    /// Builds a client (and its pool) for one domain. Workers start lazily on
    /// the first query.
    pub fn new(config: PoolConfig, domain: DomainSpec) -> Self {
        Self {
            pool: QueryPool::new(config, build_registry(domain)),
        }
    }

    /// Wraps an existing pool; used when the embedding process manages pool
    /// lifecycles itself.
    pub fn with_pool(pool: Arc<QueryPool>) -> Self {
        Self { pool }
    }

    pub async fn initialize(&self) -> Result<(), PoolError> {
        self.pool.initialize().await
    }

    pub async fn shutdown(&self) {
        self.pool.shutdown().await
    }

    /// The browse view: categories with counts and bounded previews.
    pub async fn categories_with_previews(
        &self,
        params: CategoriesParams,
    ) -> Result<CategoryPage, PoolError> {
        self.call(QUERY_CATEGORIES, &params).await
    }

    /// Paginated items within one category, optionally with their latest
    /// image variants attached as data URIs.
    pub async fn items_in_category(&self, params: ItemsParams) -> Result<ItemPage, PoolError> {
        self.call(QUERY_ITEMS, &params).await
    }

    /// Equality lookup of a single item by its composite identifier parts.
    pub async fn item_by_parts(&self, parts: &[&str]) -> Result<Option<CatalogItem>, PoolError> {
        let params = ItemByKeyParams {
            parts: parts.iter().map(|s| s.to_string()).collect(),
        };
        self.call(QUERY_ITEM_BY_KEY, &params).await
    }

    /// Cluster metadata with its precomputed item count.
    pub async fn cluster_info(&self, name: &str) -> Result<Option<ClusterInfo>, PoolError> {
        let params = ClusterParams {
            name: name.to_string(),
        };
        self.call(QUERY_CLUSTER, &params).await
    }

    async fn call<P, R>(&self, query: &str, params: &P) -> Result<R, PoolError>
    where
        P: serde::Serialize,
        R: DeserializeOwned,
    {
        let params = serde_json::to_value(params).map_err(|e| PoolError::Decode {
            query: query.to_string(),
            message: e.to_string(),
        })?;
        let result = self.pool.dispatch(query, params).await?;
        serde_json::from_value(result).map_err(|e| PoolError::Decode {
            query: query.to_string(),
            message: e.to_string(),
        })
    }
}
