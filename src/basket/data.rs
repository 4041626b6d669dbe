//! Basket aggregate state
//!
//! [`BasketData`] owns the flat item arena keyed by [`UniqId`], the pending
//! basket-level notices and the change-tracking fingerprint. It enforces the
//! structural invariants (merge-not-duplicate, single configuration, parent
//! resolution) and exposes the derived read models.

use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHasher};
use serde::{Deserialize, Serialize};

use crate::{
    basket::errors::BasketError,
    finder,
    items::{Item, ItemId, PriceColumn, SpaceId, UniqId, problems::Info, types::ItemType},
};

/// The basket aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasketData {
    space_id: SpaceId,
    price_column: PriceColumn,
    items: FxHashMap<UniqId, Item>,
    infos: Vec<Info>,
    commit_fingerprint: u64,
    has_possible_configuration: bool,
}

impl BasketData {
    pub fn new(space_id: SpaceId, price_column: PriceColumn) -> Self {
        Self {
            space_id,
            price_column,
            items: FxHashMap::default(),
            infos: Vec::new(),
            commit_fingerprint: 0,
            has_possible_configuration: false,
        }
    }

    pub fn space_id(&self) -> &SpaceId {
        &self.space_id
    }

    pub fn price_column(&self) -> PriceColumn {
        self.price_column
    }

    /// Change the region; the new region propagates to every selected item.
    pub fn set_space_id(&mut self, space_id: SpaceId) {
        for item in self.items.values_mut().filter(|i| i.is_selected) {
            item.space_id = space_id.clone();
            item.changed = true;
        }
        self.space_id = space_id;
    }

    /// Change the price tier; propagates to every selected item.
    pub fn set_price_column(&mut self, price_column: PriceColumn) {
        for item in self.items.values_mut().filter(|i| i.is_selected) {
            item.price_column = price_column;
            item.changed = true;
        }
        self.price_column = price_column;
    }

    pub fn get(&self, uniq_id: UniqId) -> Option<&Item> {
        self.items.get(&uniq_id)
    }

    pub fn get_mut(&mut self, uniq_id: UniqId) -> Option<&mut Item> {
        self.items.get_mut(&uniq_id)
    }

    pub fn all(&self) -> Vec<&Item> {
        self.items.values().collect()
    }

    pub fn find(&self, predicate: impl Fn(&Item) -> bool) -> Vec<&Item> {
        self.items.values().filter(|i| predicate(i)).collect()
    }

    pub fn find_one_by_id(&self, item_id: &ItemId) -> Option<&Item> {
        self.items.values().find(|i| &i.item_id == item_id)
    }

    pub fn selected_items(&self) -> Vec<&Item> {
        self.items.values().filter(|i| i.is_selected).collect()
    }

    /// The single configuration root, when one exists.
    pub fn configuration(&self) -> Option<&Item> {
        self.items
            .values()
            .find(|i| i.item_type == ItemType::Configuration)
    }

    /// Number of positions (items, not quantities).
    pub fn positions_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an item to the tree.
    ///
    /// The same catalog id under the same parent merges quantities instead of
    /// duplicating a node; the returned id is then the existing item's.
    ///
    /// # Errors
    ///
    /// Returns [`BasketError::ParentNotFound`] when the declared parent is
    /// absent from the aggregate.
    pub fn add(&mut self, item: Item) -> Result<UniqId, BasketError> {
        let merge_target = self
            .items
            .values()
            .find(|existing| {
                existing.item_id == item.item_id && existing.parent_uniq_id == item.parent_uniq_id
            })
            .map(|existing| existing.uniq_id);

        if let Some(existing_id) = merge_target {
            if let Some(existing) = self.items.get_mut(&existing_id) {
                if existing.spec().count_changeable {
                    let mut next = existing.count.saturating_add(item.count);
                    if let Some(max) = existing.rules.max_count {
                        next = next.min(max);
                    }
                    existing.set_count(next);
                }
            }
            return Ok(existing_id);
        }

        let mut item = item;

        if let Some(parent_id) = item.parent_uniq_id {
            let (parent_count, parent_selected) = match self.items.get(&parent_id) {
                Some(parent) => (parent.count, parent.is_selected),
                None => return Err(BasketError::ParentNotFound(parent_id)),
            };

            if item.spec().count_eq_parent {
                item.count = parent_count;
            } else if item.spec().count_le_parent {
                item.count = item.count.min(parent_count);
                item.rules.max_count = Some(parent_count);
            }

            if item.spec().only_one_per_parent {
                let siblings: Vec<UniqId> = self
                    .items
                    .values()
                    .filter(|sibling| {
                        sibling.parent_uniq_id == Some(parent_id)
                            && sibling.item_type == item.item_type
                    })
                    .map(|sibling| sibling.uniq_id)
                    .collect();
                for sibling in siblings {
                    self.remove(sibling);
                }
            }

            // Selecting any child pulls the whole sibling group back into the
            // purchasable set.
            if !parent_selected {
                let group: Vec<UniqId> = self
                    .items
                    .values()
                    .filter(|other| {
                        other.uniq_id == parent_id || other.parent_uniq_id == Some(parent_id)
                    })
                    .map(|other| other.uniq_id)
                    .collect();
                for uniq_id in group {
                    if let Some(other) = self.items.get_mut(&uniq_id) {
                        other.is_selected = true;
                        other.changed = true;
                    }
                }
            }
        }

        if item.spec().only_one_in_basket {
            let others: Vec<UniqId> = self
                .items
                .values()
                .filter(|other| other.item_type == item.item_type)
                .map(|other| other.uniq_id)
                .collect();
            for other in others {
                self.remove(other);
            }
        }

        let uniq_id = item.uniq_id;
        self.items.insert(uniq_id, item);
        Ok(uniq_id)
    }

    /// Delete an item together with every recursive descendant.
    ///
    /// Deletability rules are the caller's responsibility.
    pub fn remove(&mut self, uniq_id: UniqId) {
        let Some(root) = self.items.get(&uniq_id) else {
            return;
        };

        let all = self.all();
        let mut doomed: Vec<UniqId> = finder::children_of_recursive(&all, root)
            .iter()
            .map(|descendant| descendant.uniq_id)
            .collect();
        doomed.push(uniq_id);

        for uniq_id in doomed {
            self.items.remove(&uniq_id);
        }
    }

    /// Deterministic, insertion-order-independent content hash.
    ///
    /// Seeded with the region and price column, folded with the sorted
    /// multiset of per-item hashes. Used downstream as a cache key.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.space_id.as_str().hash(&mut hasher);
        self.price_column.value().hash(&mut hasher);

        let mut item_hashes: Vec<u64> =
            self.items.values().map(|item| self.item_hash(item)).collect();
        item_hashes.sort_unstable();
        for item_hash in item_hashes {
            item_hash.hash(&mut hasher);
        }

        hasher.finish()
    }

    fn item_hash(&self, item: &Item) -> u64 {
        let mut hasher = FxHasher::default();
        item.item_id.as_str().hash(&mut hasher);
        item.item_type.hash(&mut hasher);
        item.count.hash(&mut hasher);
        item.price.hash(&mut hasher);

        let all = self.all();
        let mut child_hashes: Vec<u64> = finder::children_of(&all, item)
            .iter()
            .map(|child| self.item_hash(child))
            .collect();
        child_hashes.sort_unstable();
        for child_hash in child_hashes {
            child_hash.hash(&mut hasher);
        }

        hasher.finish()
    }

    /// Total of selected, available positions in minor units.
    ///
    /// Configuration members are excluded: the configuration root already
    /// carries their aggregated price.
    pub fn cost(&self) -> u64 {
        self.items
            .values()
            .filter(|item| {
                item.is_selected && item.is_available() && !item.spec().part_of_configuration
            })
            .map(|item| u64::from(item.count) * item.price)
            .sum()
    }

    /// Loyalty points accrued by the selected, available positions.
    pub fn accrued_bonus(&self) -> u64 {
        self.items
            .values()
            .filter(|item| {
                item.is_selected && item.is_available() && !item.spec().part_of_configuration
            })
            .map(|item| u64::from(item.count) * u64::from(item.bonus))
            .sum()
    }

    /// True only when at least one product is selected and every selected
    /// product reports in-store availability.
    pub fn is_all_products_in_store(&self) -> bool {
        let mut any = false;
        for item in self
            .items
            .values()
            .filter(|item| item.is_selected && item.spec().is_product)
        {
            any = true;
            if !item.product_additions().is_some_and(|p| p.in_store) {
                return false;
            }
        }
        any
    }

    /// Snapshot the fingerprint and clear every item's dirty flag.
    pub fn commit_changes(&mut self) {
        self.commit_fingerprint = self.fingerprint();
        for item in self.items.values_mut() {
            item.changed = false;
        }
    }

    /// The economically-relevant content differs from the last commit, or any
    /// item reports itself dirty.
    pub fn is_changed(&self) -> bool {
        self.fingerprint() != self.commit_fingerprint
            || self.items.values().any(|item| item.changed)
    }

    pub fn add_info(&mut self, info: Info) {
        self.infos.push(info);
    }

    /// Drain every pending notice, basket-level first.
    pub fn take_infos(&mut self) -> Vec<Info> {
        let mut infos = std::mem::take(&mut self.infos);
        for item in self.items.values_mut() {
            infos.append(&mut item.infos);
        }
        infos
    }

    pub fn has_possible_configuration(&self) -> bool {
        self.has_possible_configuration
    }

    pub fn set_possible_configuration(&mut self, value: bool) {
        self.has_possible_configuration = value;
    }
}
