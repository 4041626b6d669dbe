//! Catalog client seam
//!
//! The core never talks to the catalog transport directly; it consumes this
//! trait and leaves retries and connection management to the implementation.

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::items::{ItemId, PriceColumn, SpaceId};

/// Catalog lookup failures.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The requested entity is unknown to the catalog.
    #[error("not found in catalog")]
    NotFound,

    /// Anything else: transport, deadline, malformed response.
    #[error("catalog request failed: {0}")]
    Transport(String),
}

/// A priced product record as returned by the catalog for one price column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub item_id: ItemId,
    pub name: String,
    pub image: String,
    /// `None` when the product has no price for the requested column.
    pub price: Option<u64>,
    pub bonus: u32,
    pub in_store: bool,
    pub stock: u32,
    pub oem: bool,
    pub marked: bool,
    pub fns_tracked: bool,
    pub credit_programs: Vec<String>,
    pub category_id: String,
    pub brand: String,
}

/// A service offered for a given product in a given region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub item_id: ItemId,
    pub name: String,
    pub price: u64,
    pub bonus: u32,
    pub allowed_b2b: bool,
    pub allowed_b2c: bool,
    /// Substitute offered when this service is withdrawn.
    pub replacement_item_id: Option<ItemId>,
}

/// Synchronous-RPC view of the product catalog.
#[automock]
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Bulk lookup of full product records priced for one column.
    async fn find_full(
        &self,
        item_ids: &[ItemId],
        space_id: &SpaceId,
        price_column: PriceColumn,
    ) -> Result<Vec<ProductRecord>, CatalogError>;

    /// Services available for one product in one region.
    async fn find_services(
        &self,
        product_item_id: &ItemId,
        space_id: &SpaceId,
    ) -> Result<Vec<ServiceRecord>, CatalogError>;
}
