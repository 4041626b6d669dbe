//! Checkout Example
//!
//! Builds a small basket against in-memory catalog doubles, refreshes it and
//! prints the resulting positions and totals.

use std::sync::Arc;

use anyhow::Result;
use wicker::{
    actualizer::{ActualizerItem, ActualizerSnapshot},
    basket::{Basket, BasketData},
    catalog::{MockProductCatalog, ProductCatalog, ProductRecord, ServiceRecord},
    factory::CatalogItemFactory,
    items::{ItemId, PriceColumn, SpaceId, types::ItemType},
    refresher::MockItemRefresher,
    users::User,
};

fn catalog() -> MockProductCatalog {
    let mut catalog = MockProductCatalog::new();
    catalog.expect_find_full().returning(|ids, _, _| {
        Ok(ids
            .iter()
            .map(|id| ProductRecord {
                item_id: id.clone(),
                name: format!("Product {id}"),
                image: String::new(),
                price: Some(49_990),
                bonus: 250,
                in_store: true,
                stock: 12,
                oem: false,
                marked: false,
                fns_tracked: false,
                credit_programs: vec![],
                category_id: "pc".to_string(),
                brand: "Acme".to_string(),
            })
            .collect())
    });
    catalog.expect_find_services().returning(|_, _| {
        Ok(vec![ServiceRecord {
            item_id: ItemId::new("setup"),
            name: "Установка и настройка".to_string(),
            price: 1_500,
            bonus: 0,
            allowed_b2b: true,
            allowed_b2c: true,
            replacement_item_id: None,
        }])
    });
    catalog
}

/// Checkout Example
#[expect(clippy::print_stdout, reason = "Example code")]
#[tokio::main]
async fn main() -> Result<()> {
    let catalog: Arc<dyn ProductCatalog> = Arc::new(catalog());
    let mut refresher = MockItemRefresher::new();
    refresher.expect_refresh().returning(|_| Ok(()));

    let mut basket = Basket::new(
        BasketData::new(SpaceId::new("msk"), PriceColumn::new(1)),
        User::anonymous(),
        Arc::new(CatalogItemFactory::new(Arc::clone(&catalog))),
        Arc::new(refresher),
        catalog,
    );

    let gpu = basket
        .add(ItemId::new("gpu-4080"), ItemType::Product, None, 1, false)
        .await?;
    basket
        .add(
            ItemId::new("setup"),
            ItemType::SubcontractService,
            Some(gpu),
            1,
            false,
        )
        .await?;

    let snapshot = ActualizerSnapshot::new(
        basket
            .data()
            .all()
            .iter()
            .map(|item| ActualizerItem {
                item_id: item.item_id.clone(),
                parent_item_id: None,
                item_type: item.item_type,
                name: item.name.clone(),
                price: item.price,
                count: item.count,
                not_exist: false,
                reduce: None,
            })
            .collect(),
    );

    basket.refresh(&snapshot).await?;

    let mut positions = basket.data().all();
    positions.sort_by_key(|item| item.uniq_id);
    for item in positions {
        println!("{} × {} — {}", item.name, item.count, item.price);
    }
    println!("Total: {}", basket.data().cost());
    println!("Bonus: {}", basket.data().accrued_bonus());
    println!("Fingerprint: {:x}", basket.data().fingerprint());

    Ok(())
}
