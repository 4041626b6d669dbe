//! End-to-end checkout flows over the public API: catalog-priced adds,
//! refresh reconciliation, fingerprint stability and configuration assembly.

use std::sync::Arc;

use testresult::TestResult;
use uuid::Uuid;
use wicker::{
    actualizer::{ActualizerItem, ActualizerSnapshot},
    basket::{Basket, BasketData},
    catalog::{MockProductCatalog, ProductCatalog, ProductRecord, ServiceRecord},
    configuration::{CompatibilityRow, ConfItem, Configurator, compat::MockCompatibilityGate},
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
                price: Some(10_000),
                bonus: 50,
                in_store: true,
                stock: 20,
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
            item_id: ItemId::new("ins-1"),
            name: "Страховка".to_string(),
            price: 900,
            bonus: 0,
            allowed_b2b: true,
            allowed_b2c: true,
            replacement_item_id: None,
        }])
    });
    catalog
}

fn basket() -> Basket {
    let catalog: Arc<dyn ProductCatalog> = Arc::new(catalog());
    let mut refresher = MockItemRefresher::new();
    refresher.expect_refresh().returning(|_| Ok(()));

    Basket::new(
        BasketData::new(SpaceId::new("msk"), PriceColumn::new(1)),
        User::retail(Uuid::now_v7()),
        Arc::new(CatalogItemFactory::new(Arc::clone(&catalog))),
        Arc::new(refresher),
        catalog,
    )
}

fn row(id: &str, item_type: ItemType, price: u64, count: u32) -> ActualizerItem {
    ActualizerItem {
        item_id: ItemId::new(id),
        parent_item_id: None,
        item_type,
        name: format!("Product {id}"),
        price,
        count,
        not_exist: false,
        reduce: None,
    }
}

#[tokio::test]
async fn priced_add_refresh_and_commit() -> TestResult {
    let mut basket = basket();

    let gpu = basket
        .add(ItemId::new("gpu"), ItemType::Product, None, 2, false)
        .await?;
    basket
        .add(
            ItemId::new("ins-1"),
            ItemType::InsuranceService,
            Some(gpu),
            1,
            false,
        )
        .await?;

    assert_eq!(basket.data().cost(), 2 * 10_000 + 900);
    assert_eq!(basket.data().accrued_bonus(), 2 * 50);
    assert!(basket.data().is_changed());

    basket
        .refresh(&ActualizerSnapshot::new(vec![
            row("gpu", ItemType::Product, 10_000, 2),
            row("ins-1", ItemType::InsuranceService, 900, 1),
        ]))
        .await?;

    // Nothing moved: the refresh committed and raised no notices.
    assert!(!basket.data().is_changed());
    assert!(basket.data_mut().take_infos().is_empty());
    assert!(basket.data().all().iter().all(|item| item.is_available()));

    // Any quantity change is visible again until the next commit.
    if let Some(item) = basket.data_mut().get_mut(gpu) {
        item.set_count(3);
    }
    assert!(basket.data().is_changed());

    Ok(())
}

#[tokio::test]
async fn fingerprints_agree_for_identically_built_baskets() -> TestResult {
    let mut first = basket();
    let mut second = basket();

    for basket in [&mut first, &mut second] {
        let gpu = basket
            .add(ItemId::new("gpu"), ItemType::Product, None, 2, false)
            .await?;
        basket
            .add(
                ItemId::new("ins-1"),
                ItemType::InsuranceService,
                Some(gpu),
                1,
                false,
            )
            .await?;
    }

    assert_eq!(first.data().fingerprint(), second.data().fingerprint());

    second
        .add(ItemId::new("cpu"), ItemType::Product, None, 1, false)
        .await?;
    assert_ne!(first.data().fingerprint(), second.data().fingerprint());

    Ok(())
}

#[tokio::test]
async fn configuration_assembly_round_trip() -> TestResult {
    let mut basket = basket();
    basket
        .add(ItemId::new("cpu"), ItemType::Product, None, 3, false)
        .await?;

    let mut gate = MockCompatibilityGate::new();
    gate.expect_check().returning(|_, item_list| {
        assert!(item_list.contains(r#"id="cpu""#));
        Ok(Some(CompatibilityRow {
            conf_id: 7,
            assembly_type_id: 1,
            compatible: true,
        }))
    });
    let configurator = Configurator::new(Arc::new(catalog()), Arc::new(gate));

    let root_id = configurator
        .assemble(
            &mut basket,
            &ItemId::new("asm"),
            &[ConfItem {
                item_id: ItemId::new("cpu"),
                count: 1,
                services: vec![],
            }],
            2,
        )
        .await?
        .expect("a configuration should be assembled");

    // 3 standalone cpus, 1×2 consumed by the configuration.
    assert_eq!(
        basket
            .data()
            .find(|i| i.item_type == ItemType::Product && i.item_id == ItemId::new("cpu"))
            .first()
            .map(|i| i.count),
        Some(1)
    );
    assert_eq!(basket.data().get(root_id).map(|root| root.count), Some(2));

    configurator.disassemble(&mut basket)?;

    assert!(basket.data().configuration().is_none());
    // The standalone remainder merges with the restored members: 1 + 1×2.
    assert_eq!(
        basket
            .data()
            .find(|i| i.item_type == ItemType::Product && i.item_id == ItemId::new("cpu"))
            .first()
            .map(|i| i.count),
        Some(3)
    );

    Ok(())
}
