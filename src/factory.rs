//! Item factory
//!
//! New items are priced against the catalog at construction time. The basket
//! consumes the seam; [`CatalogItemFactory`] is the stock implementation.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;

use crate::{
    catalog::{CatalogError, ProductCatalog},
    items::{
        Item, ItemId, PriceColumn, SpaceId, UniqId,
        additions::{Additions, ProductAdditions, ServiceAdditions},
        types::ItemType,
    },
    users::User,
};

/// Everything needed to construct one new basket item.
#[derive(Debug, Clone)]
pub struct CreateItem {
    pub item_id: ItemId,
    pub item_type: ItemType,
    pub count: u32,
    pub parent_uniq_id: Option<UniqId>,
    /// Catalog id of the parent product, for service lookups.
    pub parent_item_id: Option<ItemId>,
    pub space_id: SpaceId,
    pub price_column: PriceColumn,
    pub user: User,
    /// Skip the fair-price guard on the catalog side.
    pub ignore_fair_price: bool,
}

#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("item {0} not found in catalog")]
    NotFound(ItemId),

    #[error("item {0} has no price for the requested price column")]
    NoPrice(ItemId),

    #[error("a parent product is required to price item {0}")]
    ParentRequired(ItemId),

    #[error("can't get products from catalog")]
    Catalog(#[source] CatalogError),
}

/// Constructs one priced item from the catalog.
#[automock]
#[async_trait]
pub trait ItemFactory: Send + Sync {
    async fn create(&self, request: CreateItem) -> Result<Item, FactoryError>;
}

/// Stock factory backed by the product catalog client.
#[derive(Clone)]
pub struct CatalogItemFactory {
    catalog: Arc<dyn ProductCatalog>,
}

impl std::fmt::Debug for CatalogItemFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogItemFactory").finish_non_exhaustive()
    }
}

impl CatalogItemFactory {
    pub fn new(catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { catalog }
    }

    async fn create_product(&self, request: CreateItem) -> Result<Item, FactoryError> {
        let records = self
            .catalog
            .find_full(
                std::slice::from_ref(&request.item_id),
                &request.space_id,
                request.price_column,
            )
            .await
            .map_err(FactoryError::Catalog)?;

        let record = records
            .into_iter()
            .find(|r| r.item_id == request.item_id)
            .ok_or_else(|| FactoryError::NotFound(request.item_id.clone()))?;

        let price = record
            .price
            .ok_or_else(|| FactoryError::NoPrice(request.item_id.clone()))?;

        let mut item = Item::new(
            request.item_id,
            request.item_type,
            request.count,
            request.space_id,
            request.price_column,
        );
        item.parent_uniq_id = request.parent_uniq_id;
        item.name = record.name;
        item.image = record.image;
        item.price = price;
        item.bonus = record.bonus;
        item.additions = Additions::Product(ProductAdditions {
            in_store: record.in_store,
            stock: record.stock,
            oem: record.oem,
            marked: record.marked,
            fns_tracked: record.fns_tracked,
            credit_programs: record.credit_programs,
            category_id: record.category_id,
            brand: record.brand,
        });

        Ok(item)
    }

    async fn create_service(&self, request: CreateItem) -> Result<Item, FactoryError> {
        let parent_item_id = request
            .parent_item_id
            .as_ref()
            .ok_or_else(|| FactoryError::ParentRequired(request.item_id.clone()))?;

        let services = self
            .catalog
            .find_services(parent_item_id, &request.space_id)
            .await
            .map_err(FactoryError::Catalog)?;

        let record = services
            .into_iter()
            .find(|r| r.item_id == request.item_id)
            .ok_or_else(|| FactoryError::NotFound(request.item_id.clone()))?;

        let mut item = Item::new(
            request.item_id,
            request.item_type,
            request.count,
            request.space_id,
            request.price_column,
        );
        item.parent_uniq_id = request.parent_uniq_id;
        item.name = record.name;
        item.price = record.price;
        item.bonus = record.bonus;
        item.additions = Additions::Service(ServiceAdditions {
            allowed_b2b: record.allowed_b2b,
            allowed_b2c: record.allowed_b2c,
            replacement_item_id: record.replacement_item_id,
        });

        Ok(item)
    }
}

#[async_trait]
impl ItemFactory for CatalogItemFactory {
    async fn create(&self, request: CreateItem) -> Result<Item, FactoryError> {
        if request.item_type.spec().is_service {
            self.create_service(request).await
        } else {
            self.create_product(request).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{MockProductCatalog, ProductRecord, ServiceRecord};

    fn request(item_type: ItemType) -> CreateItem {
        CreateItem {
            item_id: ItemId::new("123"),
            item_type,
            count: 2,
            parent_uniq_id: None,
            parent_item_id: None,
            space_id: SpaceId::new("msk"),
            price_column: PriceColumn::new(1),
            user: User::anonymous(),
            ignore_fair_price: false,
        }
    }

    fn product_record(id: &str, price: Option<u64>) -> ProductRecord {
        ProductRecord {
            item_id: ItemId::new(id),
            name: "Graphics card".to_string(),
            image: "img".to_string(),
            price,
            bonus: 5,
            in_store: true,
            stock: 10,
            oem: false,
            marked: false,
            fns_tracked: false,
            credit_programs: vec![],
            category_id: "gpu".to_string(),
            brand: "Acme".to_string(),
        }
    }

    #[tokio::test]
    async fn product_is_priced_from_the_catalog() {
        let mut catalog = MockProductCatalog::new();
        catalog
            .expect_find_full()
            .returning(|_, _, _| Ok(vec![product_record("123", Some(15_000))]));

        let factory = CatalogItemFactory::new(Arc::new(catalog));
        let item = factory
            .create(request(ItemType::Product))
            .await
            .expect("create should succeed");

        assert_eq!(item.price, 15_000);
        assert_eq!(item.count, 2);
        assert_eq!(item.name, "Graphics card");
        assert!(item.product_additions().is_some_and(|p| p.in_store));
    }

    #[tokio::test]
    async fn missing_price_column_is_rejected() {
        let mut catalog = MockProductCatalog::new();
        catalog
            .expect_find_full()
            .returning(|_, _, _| Ok(vec![product_record("123", None)]));

        let factory = CatalogItemFactory::new(Arc::new(catalog));
        let result = factory.create(request(ItemType::Product)).await;

        assert!(matches!(result, Err(FactoryError::NoPrice(_))));
    }

    #[tokio::test]
    async fn service_requires_a_parent_product() {
        let factory = CatalogItemFactory::new(Arc::new(MockProductCatalog::new()));

        let result = factory.create(request(ItemType::SubcontractService)).await;

        assert!(matches!(result, Err(FactoryError::ParentRequired(_))));
    }

    #[tokio::test]
    async fn service_is_looked_up_under_its_parent() {
        let mut catalog = MockProductCatalog::new();
        catalog.expect_find_services().returning(|_, _| {
            Ok(vec![ServiceRecord {
                item_id: ItemId::new("123"),
                name: "Setup".to_string(),
                price: 900,
                bonus: 0,
                allowed_b2b: false,
                allowed_b2c: true,
                replacement_item_id: None,
            }])
        });

        let factory = CatalogItemFactory::new(Arc::new(catalog));
        let mut req = request(ItemType::SubcontractService);
        req.parent_item_id = Some(ItemId::new("999"));

        let item = factory.create(req).await.expect("create should succeed");

        assert_eq!(item.price, 900);
        assert!(item.service_additions().is_some_and(|s| s.allowed_b2c));
    }
}
