//! Finder
//!
//! Pure predicate functions over a flat item collection. Deterministic given
//! the same input ordering; no side effects.

use smallvec::SmallVec;

use crate::items::{Item, ItemId, types::ItemType};

/// Finder results stay inline for basket-scale collections.
pub type Found<'a> = SmallVec<[&'a Item; 10]>;

/// Direct children of `parent`.
///
/// Returns nothing when the parent's spec says it cannot have children.
pub fn children_of<'a>(items: &[&'a Item], parent: &Item) -> Found<'a> {
    if !parent.spec().can_have_children {
        return SmallVec::new();
    }

    items
        .iter()
        .filter(|item| item.parent_uniq_id == Some(parent.uniq_id))
        .copied()
        .collect()
}

/// All descendants of `parent`, depth first.
///
/// Capability-gated like [`children_of`]: an empty (never absent) result when
/// the parent can have children but none exist.
pub fn children_of_recursive<'a>(items: &[&'a Item], parent: &Item) -> Found<'a> {
    let mut found = SmallVec::new();

    for child in children_of(items, parent) {
        found.push(child);
        found.extend(children_of_recursive(items, child));
    }

    found
}

/// Items of any of the given types.
pub fn by_type<'a>(items: &[&'a Item], types: &[ItemType]) -> Found<'a> {
    items
        .iter()
        .filter(|item| types.contains(&item.item_type))
        .copied()
        .collect()
}

/// Items whose catalog id is one of `ids`.
pub fn by_item_ids<'a>(items: &[&'a Item], ids: &[ItemId]) -> Found<'a> {
    items
        .iter()
        .filter(|item| ids.contains(&item.item_id))
        .copied()
        .collect()
}

/// The basket as shown on the positions page: delivery and lifting services
/// are rendered elsewhere.
pub fn without_transport_services<'a>(items: &[&'a Item]) -> Found<'a> {
    items
        .iter()
        .filter(|item| {
            !matches!(
                item.item_type,
                ItemType::DeliveryService | ItemType::LiftingService
            )
        })
        .copied()
        .collect()
}

/// Only the third-party subcontract services.
pub fn subcontract_services<'a>(items: &[&'a Item]) -> Found<'a> {
    by_type(items, &[ItemType::SubcontractService])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::{PriceColumn, SpaceId};

    fn item(id: &str, item_type: ItemType) -> Item {
        Item::new(
            ItemId::new(id),
            item_type,
            1,
            SpaceId::new("msk"),
            PriceColumn::new(1),
        )
    }

    fn child_of(id: &str, item_type: ItemType, parent: &Item) -> Item {
        let mut child = item(id, item_type);
        child.parent_uniq_id = Some(parent.uniq_id);
        child
    }

    #[test]
    fn children_of_returns_direct_children_only() {
        let product = item("1", ItemType::Product);
        let insurance = child_of("2", ItemType::InsuranceService, &product);
        let other = item("3", ItemType::Product);
        let all = [&product, &insurance, &other];

        let children = children_of(&all, &product);

        assert_eq!(children.len(), 1);
        assert_eq!(children[0].uniq_id, insurance.uniq_id);
    }

    #[test]
    fn children_of_is_gated_on_parent_capability() {
        let parent = item("1", ItemType::InsuranceService);
        let mut stray = item("2", ItemType::Product);
        stray.parent_uniq_id = Some(parent.uniq_id);
        let all = [&parent, &stray];

        assert!(children_of(&all, &parent).is_empty());
    }

    #[test]
    fn children_of_recursive_walks_the_subtree() {
        let conf = item("1", ItemType::Configuration);
        let member = child_of("2", ItemType::ConfigurationProduct, &conf);
        let service = child_of("3", ItemType::ConfigurationService, &member);
        let all = [&conf, &member, &service];

        let descendants = children_of_recursive(&all, &conf);

        assert_eq!(descendants.len(), 2);
        assert_eq!(descendants[0].uniq_id, member.uniq_id);
        assert_eq!(descendants[1].uniq_id, service.uniq_id);
    }

    #[test]
    fn children_of_recursive_is_empty_not_missing_for_childless_parent() {
        let product = item("1", ItemType::Product);
        let all = [&product];

        assert!(children_of_recursive(&all, &product).is_empty());
    }

    #[test]
    fn transport_services_are_filtered_out() {
        let product = item("1", ItemType::Product);
        let delivery = child_of("2", ItemType::DeliveryService, &product);
        let lifting = child_of("3", ItemType::LiftingService, &product);
        let all = [&product, &delivery, &lifting];

        let shown = without_transport_services(&all);

        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].uniq_id, product.uniq_id);
    }

    #[test]
    fn subcontract_services_are_selected_by_type() {
        let product = item("1", ItemType::Product);
        let setup = child_of("2", ItemType::SubcontractService, &product);
        let insurance = child_of("3", ItemType::InsuranceService, &product);
        let all = [&product, &setup, &insurance];

        let found = subcontract_services(&all);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].uniq_id, setup.uniq_id);
    }

    #[test]
    fn by_item_ids_matches_catalog_identity() {
        let first = item("123", ItemType::Product);
        let second = item("1234", ItemType::Product);
        let all = [&first, &second];

        let found = by_item_ids(&all, &[ItemId::new("1234")]);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].item_id, ItemId::new("1234"));
    }
}
