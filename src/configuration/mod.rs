//! Configuration assembly
//!
//! A configuration is a composite purchase: one root item owning member
//! products, their member services and one assembly service. The
//! [`Configurator`] builds, moves and tears down that sub-tree, pricing
//! everything through the catalog and validating candidate builds through the
//! compatibility stored procedure.

pub mod compat;
pub mod errors;

use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

pub use compat::{CompatibilityGate, CompatibilityRow, PgCompatibilityGate};
pub use errors::ConfigurationError;

use rustc_hash::FxHashMap;

use crate::{
    basket::Basket,
    catalog::{ProductCatalog, ProductRecord},
    finder,
    items::{
        Item, ItemId, UniqId,
        additions::{Additions, ConfigurationAdditions, ProductAdditions},
        types::ItemType,
    },
};

/// A configuration member may not carry more units than this.
pub const MAX_PRODUCT_ITEMS_IN_CONF: u32 = 10;

/// Conf id submitted to the compatibility check before the server assigns a
/// real one.
const DEFAULT_CONF_ID: i64 = 0;

/// One requested member of a configuration: a product and the services to
/// attach under it.
#[derive(Debug, Clone)]
pub struct ConfItem {
    pub item_id: ItemId,
    pub count: u32,
    pub services: Vec<ItemId>,
}

/// Builds and dismantles the configuration sub-tree of a basket.
pub struct Configurator {
    catalog: Arc<dyn ProductCatalog>,
    compat: Arc<dyn CompatibilityGate>,
}

impl fmt::Debug for Configurator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configurator").finish_non_exhaustive()
    }
}

impl Configurator {
    pub fn new(catalog: Arc<dyn ProductCatalog>, compat: Arc<dyn CompatibilityGate>) -> Self {
        Self { catalog, compat }
    }

    /// Price and build the whole configuration tree without touching the
    /// basket.
    ///
    /// All ids, the assembly service included, are priced in a single bulk
    /// catalog call; a missing record or a missing price for the basket's
    /// price column fails the build.
    pub async fn assemble_configuration_items(
        &self,
        basket: &Basket,
        conf_id: i64,
        conf_type: i64,
        assembly_service_item_id: &ItemId,
        conf_items: &[ConfItem],
    ) -> Result<Vec<Item>, ConfigurationError> {
        let space_id = basket.data().space_id().clone();
        let price_column = basket.data().price_column();

        let mut ids: Vec<ItemId> = Vec::new();
        for conf_item in conf_items {
            ids.push(conf_item.item_id.clone());
            ids.extend(conf_item.services.iter().cloned());
        }
        ids.push(assembly_service_item_id.clone());

        let records: FxHashMap<ItemId, ProductRecord> = self
            .catalog
            .find_full(&ids, &space_id, price_column)
            .await
            .map_err(ConfigurationError::Catalog)?
            .into_iter()
            .map(|record| (record.item_id.clone(), record))
            .collect();

        let metadata = ConfigurationAdditions {
            conf_id,
            conf_type,
            mutable: true,
        };

        let mut root = Item::new(
            ItemId::new(conf_id.to_string()),
            ItemType::Configuration,
            1,
            space_id.clone(),
            price_column,
        );
        root.name = "Конфигурация".to_string();
        root.additions = Additions::Configuration(metadata.clone());
        let root_id = root.uniq_id;

        let mut items = vec![root];

        for conf_item in conf_items {
            let (record, price) = priced(&records, &conf_item.item_id)?;

            let mut member = Item::new(
                conf_item.item_id.clone(),
                ItemType::ConfigurationProduct,
                conf_item.count,
                space_id.clone(),
                price_column,
            );
            member.parent_uniq_id = Some(root_id);
            member.name = record.name.clone();
            member.image = record.image.clone();
            member.price = price;
            member.bonus = record.bonus;
            member.additions = Additions::Product(ProductAdditions {
                in_store: record.in_store,
                stock: record.stock,
                oem: record.oem,
                marked: record.marked,
                fns_tracked: record.fns_tracked,
                credit_programs: record.credit_programs.clone(),
                category_id: record.category_id.clone(),
                brand: record.brand.clone(),
            });
            let member_id = member.uniq_id;
            items.push(member);

            for service_id in &conf_item.services {
                let (record, price) = priced(&records, service_id)?;

                let mut service = Item::new(
                    service_id.clone(),
                    ItemType::ConfigurationService,
                    conf_item.count,
                    space_id.clone(),
                    price_column,
                );
                service.parent_uniq_id = Some(member_id);
                service.name = record.name.clone();
                service.price = price;
                service.bonus = record.bonus;
                service.additions = Additions::Configuration(metadata.clone());
                items.push(service);
            }
        }

        let (record, price) = priced(&records, assembly_service_item_id)?;
        let mut assembly = Item::new(
            assembly_service_item_id.clone(),
            ItemType::AssemblyService,
            1,
            space_id,
            price_column,
        );
        assembly.parent_uniq_id = Some(root_id);
        assembly.name = record.name.clone();
        assembly.price = price;
        assembly.bonus = record.bonus;
        assembly.additions = Additions::Configuration(metadata);
        items.push(assembly);

        Ok(items)
    }

    /// Build the tree, then atomically replace any existing configuration.
    pub async fn add(
        &self,
        basket: &mut Basket,
        conf_id: i64,
        conf_type: i64,
        assembly_service_item_id: &ItemId,
        conf_items: &[ConfItem],
    ) -> Result<UniqId, ConfigurationError> {
        let items = self
            .assemble_configuration_items(
                basket,
                conf_id,
                conf_type,
                assembly_service_item_id,
                conf_items,
            )
            .await?;

        if let Some(existing) = basket.data().configuration().map(|c| c.uniq_id) {
            basket.data_mut().remove(existing);
        }

        insert_items(basket, items)
    }

    /// Validate the candidate build against the whole basket, then assemble.
    ///
    /// No verdict from the gate means nothing in the basket is assemblable;
    /// that is a silent no-op, not an error. Standalone products consumed by
    /// the new configuration are reduced or removed.
    #[tracing::instrument(
        name = "configuration.assemble",
        skip_all,
        fields(space_id = %basket.data().space_id(), count = count),
        err
    )]
    pub async fn assemble(
        &self,
        basket: &mut Basket,
        assembly_service_item_id: &ItemId,
        conf_items: &[ConfItem],
        count: u32,
    ) -> Result<Option<UniqId>, ConfigurationError> {
        if basket.data().configuration().is_some() {
            return Err(ConfigurationError::AlreadyExists);
        }

        let item_list = item_list_xml(basket);
        let Some(row) = self.compat.check(DEFAULT_CONF_ID, &item_list).await? else {
            return Ok(None);
        };
        if !row.compatible {
            return Err(ConfigurationError::Incompatible);
        }

        let mut items = self
            .assemble_configuration_items(
                basket,
                row.conf_id,
                row.assembly_type_id,
                assembly_service_item_id,
                conf_items,
            )
            .await?;

        if let Some(root) = items.first_mut() {
            root.count = count;
        }

        for member in items
            .iter()
            .filter(|i| i.item_type == ItemType::ConfigurationProduct)
        {
            let consumed = member.count.saturating_mul(count);
            let standalone = basket
                .data()
                .find(|i| i.item_type == ItemType::Product && i.item_id == member.item_id)
                .first()
                .map(|i| (i.uniq_id, i.count));

            if let Some((uniq_id, held)) = standalone {
                if held > consumed {
                    if let Some(item) = basket.data_mut().get_mut(uniq_id) {
                        item.set_count(held - consumed);
                    }
                } else {
                    basket.data_mut().remove(uniq_id);
                }
            }
        }

        insert_items(basket, items).map(Some)
    }

    /// Move a standalone product into the basket's configuration.
    pub fn move_item_in(
        &self,
        basket: &mut Basket,
        uniq_id: UniqId,
    ) -> Result<(), ConfigurationError> {
        let root_id = mutable_configuration(basket)?;

        let item = basket
            .data()
            .get(uniq_id)
            .ok_or(ConfigurationError::ItemNotFound(uniq_id))?
            .clone();
        if item.item_type != ItemType::Product {
            return Err(ConfigurationError::NotAProduct(uniq_id));
        }

        let moved = item.count.min(MAX_PRODUCT_ITEMS_IN_CONF);
        let remaining = item.count - moved;

        let existing_member = basket
            .data()
            .find(|i| {
                i.item_type == ItemType::ConfigurationProduct
                    && i.parent_uniq_id == Some(root_id)
                    && i.item_id == item.item_id
            })
            .first()
            .map(|member| (member.uniq_id, member.count));

        match existing_member {
            Some((member_id, held)) => {
                if let Some(member) = basket.data_mut().get_mut(member_id) {
                    member.set_count(held.saturating_add(moved));
                }
            }
            None => {
                let mut member = Item::new(
                    item.item_id.clone(),
                    ItemType::ConfigurationProduct,
                    moved,
                    item.space_id.clone(),
                    item.price_column,
                );
                member.parent_uniq_id = Some(root_id);
                member.name = item.name.clone();
                member.image = item.image.clone();
                member.price = item.price;
                member.bonus = item.bonus;
                member.additions = item.additions.clone();
                basket.data_mut().add(member)?;
            }
        }

        if remaining > 0 {
            if let Some(item) = basket.data_mut().get_mut(uniq_id) {
                item.set_count(remaining);
            }
        } else {
            basket.data_mut().remove(uniq_id);
        }

        Ok(())
    }

    /// Move a product member out of the configuration back into the basket.
    ///
    /// The member re-enters through [`Basket::add`], so every normal add-time
    /// validation re-applies.
    pub async fn move_item_from(
        &self,
        basket: &mut Basket,
        uniq_id: UniqId,
    ) -> Result<UniqId, ConfigurationError> {
        mutable_configuration(basket)?;

        let member = basket
            .data()
            .get(uniq_id)
            .ok_or(ConfigurationError::ItemNotFound(uniq_id))?;
        if member.item_type != ItemType::ConfigurationProduct {
            return Err(ConfigurationError::NotAProduct(uniq_id));
        }
        let item_id = member.item_id.clone();
        let count = member.count;

        let standalone_id = basket
            .add(item_id, ItemType::Product, None, count, false)
            .await?;
        basket.data_mut().remove(uniq_id);

        Ok(standalone_id)
    }

    /// Tear the configuration down, restoring its products as standalone
    /// positions.
    pub fn disassemble(&self, basket: &mut Basket) -> Result<(), ConfigurationError> {
        let root_id = mutable_configuration(basket)?;

        let root_count = basket
            .data()
            .get(root_id)
            .map(|root| root.count)
            .unwrap_or_default();

        let all = basket.data().all();
        let recreated: Vec<Item> = match basket.data().get(root_id) {
            Some(root) => finder::children_of_recursive(&all, root)
                .iter()
                .filter(|descendant| descendant.spec().is_product)
                .map(|descendant| {
                    let mut product = Item::new(
                        descendant.item_id.clone(),
                        ItemType::Product,
                        descendant.count.saturating_mul(root_count),
                        descendant.space_id.clone(),
                        descendant.price_column,
                    );
                    product.name = descendant.name.clone();
                    product.image = descendant.image.clone();
                    product.price = descendant.price;
                    product.bonus = descendant.bonus;
                    product.additions = descendant.additions.clone();
                    product
                })
                .collect(),
            None => Vec::new(),
        };

        basket.data_mut().remove(root_id);
        for product in recreated {
            basket.data_mut().add(product)?;
        }

        Ok(())
    }
}

/// The basket's configuration root, refused when the configuration is a
/// template.
fn mutable_configuration(basket: &Basket) -> Result<UniqId, ConfigurationError> {
    let conf = basket
        .data()
        .configuration()
        .ok_or(ConfigurationError::NotFound)?;
    if conf.configuration_additions().is_some_and(|c| !c.mutable) {
        return Err(ConfigurationError::Immutable);
    }
    Ok(conf.uniq_id)
}

fn priced<'r>(
    records: &'r FxHashMap<ItemId, ProductRecord>,
    item_id: &ItemId,
) -> Result<(&'r ProductRecord, u64), ConfigurationError> {
    let record = records
        .get(item_id)
        .ok_or_else(|| ConfigurationError::ProductNotFound(item_id.clone()))?;
    let price = record
        .price
        .ok_or_else(|| ConfigurationError::NoPrice(item_id.clone()))?;
    Ok((record, price))
}

/// Root-first insertion so parent links always resolve.
fn insert_items(basket: &mut Basket, items: Vec<Item>) -> Result<UniqId, ConfigurationError> {
    let mut iter = items.into_iter();
    let root = iter.next().ok_or(ConfigurationError::NotFound)?;
    let root_id = basket.data_mut().add(root)?;
    for item in iter {
        basket.data_mut().add(item)?;
    }
    Ok(root_id)
}

/// Serialize the whole basket to the `item_list` payload of the stored
/// procedure. Ordered by basket-local id for a stable payload.
fn item_list_xml(basket: &Basket) -> String {
    let mut items = basket.data().all();
    items.sort_by_key(|item| item.uniq_id);

    let mut xml = String::from("<items>");
    for item in items {
        let _ = write!(
            xml,
            r#"<item id="{}" type="{}" count="{}"/>"#,
            escape_xml(item.item_id.as_str()),
            item.item_type.as_str(),
            item.count,
        );
    }
    xml.push_str("</items>");
    xml
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
