//! Basket items
//!
//! One [`Item`] is a node of the basket tree: catalog identity, commercial
//! attributes, a per-type rule set and mutable problem/notice annotations.

pub mod additions;
pub mod problems;
pub mod types;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::items::{
    additions::{Additions, ConfigurationAdditions, ProductAdditions, ServiceAdditions},
    problems::{Info, Problem, ProblemCode},
    types::{ItemType, TypeSpec},
};

/// Basket-local identity, unique across the whole tree and immutable for the
/// item's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UniqId(Uuid);

impl UniqId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for UniqId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UniqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Catalog identity. Not unique within a basket: several items may share it
/// when they live under different parents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Region the basket is priced for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpaceId(String);

impl SpaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Price tier applied to the whole basket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceColumn(u8);

impl PriceColumn {
    pub fn new(column: u8) -> Self {
        Self(column)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PriceColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Mutable per-item purchase constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    /// Quantity ceiling; `None` means no ceiling was ever set.
    pub max_count: Option<u32>,
    /// Quantity must be a multiple of this step.
    pub count_multiplicity: u32,
    pub prepayment_mandatory: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            max_count: None,
            count_multiplicity: 1,
            prepayment_mandatory: false,
        }
    }
}

/// One node of the basket tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub uniq_id: UniqId,
    pub item_id: ItemId,
    pub item_type: ItemType,
    pub name: String,
    pub image: String,
    /// Quantity, always greater than zero.
    pub count: u32,
    /// Unit price in minor currency units.
    pub price: u64,
    /// Loyalty points accrued per unit.
    pub bonus: u32,
    pub space_id: SpaceId,
    pub price_column: PriceColumn,
    /// `None` marks a root item.
    pub parent_uniq_id: Option<UniqId>,
    pub rules: Rules,
    pub additions: Additions,
    pub problems: Vec<Problem>,
    pub infos: Vec<Info>,
    /// Selected items participate in totals and checkout.
    pub is_selected: bool,
    /// Set on any mutation since the last commit.
    pub changed: bool,
    /// Debug switch: force a not-available problem on the next refresh.
    pub simulate_problems: bool,
}

impl Item {
    pub fn new(
        item_id: ItemId,
        item_type: ItemType,
        count: u32,
        space_id: SpaceId,
        price_column: PriceColumn,
    ) -> Self {
        Self {
            uniq_id: UniqId::new(),
            item_id,
            item_type,
            name: String::new(),
            image: String::new(),
            count,
            price: 0,
            bonus: 0,
            space_id,
            price_column,
            parent_uniq_id: None,
            rules: Rules::default(),
            additions: Additions::None,
            problems: Vec::new(),
            infos: Vec::new(),
            is_selected: true,
            changed: true,
            simulate_problems: false,
        }
    }

    pub fn spec(&self) -> &'static TypeSpec {
        self.item_type.spec()
    }

    /// No blocking availability problem is attached.
    pub fn is_available(&self) -> bool {
        !self
            .problems
            .iter()
            .any(|p| matches!(p.code, ProblemCode::NotAvailable | ProblemCode::ImpossibleToOrder))
    }

    pub fn has_problem(&self, code: ProblemCode) -> bool {
        self.problems.iter().any(|p| p.code == code)
    }

    pub fn add_problem(&mut self, problem: Problem) {
        self.problems.push(problem);
    }

    pub fn clear_problems(&mut self) {
        self.problems.clear();
    }

    pub fn add_info(&mut self, info: Info) {
        self.infos.push(info);
    }

    pub fn set_count(&mut self, count: u32) {
        if self.count != count {
            self.count = count;
            self.changed = true;
        }
    }

    pub fn set_price(&mut self, price: u64) {
        if self.price != price {
            self.price = price;
            self.changed = true;
        }
    }

    pub fn product_additions(&self) -> Option<&ProductAdditions> {
        match &self.additions {
            Additions::Product(p) => Some(p),
            _ => None,
        }
    }

    pub fn service_additions(&self) -> Option<&ServiceAdditions> {
        match &self.additions {
            Additions::Service(s) => Some(s),
            _ => None,
        }
    }

    pub fn configuration_additions(&self) -> Option<&ConfigurationAdditions> {
        match &self.additions {
            Additions::Configuration(c) => Some(c),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(item_type: ItemType) -> Item {
        Item::new(
            ItemId::new("123"),
            item_type,
            1,
            SpaceId::new("msk"),
            PriceColumn::new(1),
        )
    }

    #[test]
    fn new_item_is_selected_and_dirty() {
        let item = item(ItemType::Product);

        assert!(item.is_selected);
        assert!(item.changed);
        assert!(item.parent_uniq_id.is_none());
    }

    #[test]
    fn uniq_ids_are_unique() {
        assert_ne!(item(ItemType::Product).uniq_id, item(ItemType::Product).uniq_id);
    }

    #[test]
    fn availability_tracks_blocking_problems() {
        let mut item = item(ItemType::Product);
        assert!(item.is_available());

        item.add_problem(Problem::new(ProblemCode::MaxCountExceeded));
        assert!(item.is_available());

        item.add_problem(Problem::new(ProblemCode::NotAvailable));
        assert!(!item.is_available());

        item.clear_problems();
        assert!(item.is_available());
    }

    #[test]
    fn set_count_marks_changed_only_on_difference() {
        let mut item = item(ItemType::Product);
        item.changed = false;

        item.set_count(1);
        assert!(!item.changed);

        item.set_count(2);
        assert!(item.changed);
    }
}
