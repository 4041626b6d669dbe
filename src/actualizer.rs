//! Actualizer snapshot
//!
//! The Actualizer is the authoritative per-item price/availability source
//! consulted during refresh. The core only needs lookup-by-item and
//! lookup-by-type over a snapshot taken by the caller.

use crate::items::{Item, ItemId, types::ItemType};

/// Quantity ceiling imposed by the Actualizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReduceInfo {
    pub max_count: u32,
    pub reason: String,
}

/// One authoritative row of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActualizerItem {
    pub item_id: ItemId,
    /// Catalog id of the product this row is attached to, when any.
    pub parent_item_id: Option<ItemId>,
    pub item_type: ItemType,
    pub name: String,
    pub price: u64,
    pub count: u32,
    /// The position no longer exists upstream.
    pub not_exist: bool,
    pub reduce: Option<ReduceInfo>,
}

/// Lookup interface over the snapshot.
pub trait ActualizerItems: Send + Sync {
    /// The row describing this basket item, matched on catalog id and type.
    fn find_by_item(&self, item: &Item) -> Option<&ActualizerItem>;

    /// Every row of the given type.
    fn find_by_type(&self, item_type: ItemType) -> Vec<&ActualizerItem>;
}

/// Plain in-memory snapshot; the form callers and tests hand to refresh.
#[derive(Debug, Clone, Default)]
pub struct ActualizerSnapshot {
    items: Vec<ActualizerItem>,
}

impl ActualizerSnapshot {
    pub fn new(items: Vec<ActualizerItem>) -> Self {
        Self { items }
    }
}

impl ActualizerItems for ActualizerSnapshot {
    fn find_by_item(&self, item: &Item) -> Option<&ActualizerItem> {
        self.items
            .iter()
            .find(|row| row.item_id == item.item_id && row.item_type == item.item_type)
    }

    fn find_by_type(&self, item_type: ItemType) -> Vec<&ActualizerItem> {
        self.items
            .iter()
            .filter(|row| row.item_type == item_type)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{PriceColumn, SpaceId};

    fn row(id: &str, item_type: ItemType) -> ActualizerItem {
        ActualizerItem {
            item_id: ItemId::new(id),
            parent_item_id: None,
            item_type,
            name: String::new(),
            price: 100,
            count: 1,
            not_exist: false,
            reduce: None,
        }
    }

    #[test]
    fn find_by_item_matches_id_and_type() {
        let snapshot =
            ActualizerSnapshot::new(vec![row("1", ItemType::Product), row("1", ItemType::Present)]);

        let mut item = Item::new(
            ItemId::new("1"),
            ItemType::Present,
            1,
            SpaceId::new("msk"),
            PriceColumn::new(1),
        );
        item.price = 0;

        let found = snapshot.find_by_item(&item);

        assert_eq!(found.map(|r| r.item_type), Some(ItemType::Present));
    }

    #[test]
    fn find_by_type_returns_all_rows_of_type() {
        let snapshot = ActualizerSnapshot::new(vec![
            row("1", ItemType::Present),
            row("2", ItemType::Present),
            row("3", ItemType::Product),
        ]);

        assert_eq!(snapshot.find_by_type(ItemType::Present).len(), 2);
    }
}
