//! Basket
//!
//! The use-case layer around [`BasketData`]: validated add/remove with the
//! shopper's context applied, and the refresh reconciliation against the
//! Actualizer snapshot.

pub mod data;
pub mod errors;
mod refresh;

use std::fmt;
use std::sync::Arc;

pub use data::BasketData;
pub use errors::{BasketError, RefreshError};

use crate::{
    catalog::ProductCatalog,
    factory::{CreateItem, ItemFactory},
    finder,
    items::{Item, ItemId, UniqId, problems::Info, types::ItemType},
    refresher::{ItemRefresher, RefresherBasket},
    users::{User, UserKind},
};

/// Position ceiling for anonymous shoppers.
pub const MAX_POSITIONS_ANONYMOUS: usize = 20;
/// Position ceiling for authenticated retail shoppers.
pub const MAX_POSITIONS_RETAIL: usize = 50;
/// Position ceiling for business customers.
pub const MAX_POSITIONS_BUSINESS: usize = 100;

/// One shopper's basket with its collaborators wired in.
pub struct Basket {
    data: BasketData,
    user: User,
    factory: Arc<dyn ItemFactory>,
    refresher: Arc<dyn ItemRefresher>,
    catalog: Arc<dyn ProductCatalog>,
    replace_subcontract_services: bool,
}

impl fmt::Debug for Basket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Basket")
            .field("data", &self.data)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl Basket {
    pub fn new(
        data: BasketData,
        user: User,
        factory: Arc<dyn ItemFactory>,
        refresher: Arc<dyn ItemRefresher>,
        catalog: Arc<dyn ProductCatalog>,
    ) -> Self {
        Self {
            data,
            user,
            factory,
            refresher,
            catalog,
            replace_subcontract_services: true,
        }
    }

    /// Operational kill-switch for subcontract-service substitution during
    /// refresh.
    pub fn with_subcontract_replacement(mut self, enabled: bool) -> Self {
        self.replace_subcontract_services = enabled;
        self
    }

    pub fn data(&self) -> &BasketData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut BasketData {
        &mut self.data
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub(crate) fn replace_subcontract_services(&self) -> bool {
        self.replace_subcontract_services
    }

    pub(crate) fn catalog(&self) -> &Arc<dyn ProductCatalog> {
        &self.catalog
    }

    pub(crate) fn refresher(&self) -> &Arc<dyn ItemRefresher> {
        &self.refresher
    }

    /// Add a position to the basket.
    ///
    /// Validation, the B2B rule and the position ceiling all run before the
    /// item is even constructed; construction itself resolves catalog price
    /// and availability through the injected factory.
    pub async fn add(
        &mut self,
        item_id: ItemId,
        item_type: ItemType,
        parent_uniq_id: Option<UniqId>,
        count: u32,
        ignore_fair_price: bool,
    ) -> Result<UniqId, BasketError> {
        if item_id.is_empty() {
            return Err(BasketError::EmptyItemId);
        }
        if count == 0 {
            return Err(BasketError::InvalidCount);
        }

        let spec = item_type.spec();
        let mut parent_item_id = None;

        match parent_uniq_id {
            Some(parent_id) => {
                let parent = self
                    .data
                    .get(parent_id)
                    .ok_or(BasketError::ParentNotFound(parent_id))?;
                if !parent.item_type.allows_child(item_type) {
                    return Err(BasketError::ChildNotAllowed {
                        parent: parent.item_type,
                        child: item_type,
                    });
                }
                parent_item_id = Some(parent.item_id.clone());
            }
            None => {
                if spec.must_be_child {
                    return Err(BasketError::MustBeChild(item_type));
                }
            }
        }

        if self.user.is_b2b() && !spec.b2b_allowed {
            return Err(BasketError::NotAllowedForBusiness(item_type));
        }

        self.check_position_limit()?;

        let item = self
            .factory
            .create(CreateItem {
                item_id,
                item_type,
                count,
                parent_uniq_id,
                parent_item_id,
                space_id: self.data.space_id().clone(),
                price_column: self.data.price_column(),
                user: self.user.clone(),
                ignore_fair_price,
            })
            .await?;

        self.add_item(item)
    }

    /// Insert an already-constructed item, re-checking the OEM/B2B rule.
    pub fn add_item(&mut self, item: Item) -> Result<UniqId, BasketError> {
        if item.product_additions().is_some_and(|p| p.oem) && !self.user.is_b2b() {
            return Err(BasketError::OemRequiresBusiness(item.item_id.clone()));
        }

        self.data.add(item)
    }

    fn check_position_limit(&self) -> Result<(), BasketError> {
        let limit = match self.user.kind {
            UserKind::Anonymous => MAX_POSITIONS_ANONYMOUS,
            UserKind::Retail => MAX_POSITIONS_RETAIL,
            UserKind::Business => MAX_POSITIONS_BUSINESS,
        };

        if self.data.positions_count() >= limit {
            return Err(BasketError::PositionLimit {
                limit,
                kind: self.user.kind,
            });
        }

        Ok(())
    }

    /// Remove a position.
    ///
    /// A configuration root bypasses the deletable check: its members are
    /// individually non-deletable and only ever leave with the root. For
    /// anything else, deletion is refused unless the type is deletable or
    /// `force` is set; once authorized, children are force-removed through
    /// this same method.
    pub fn remove(&mut self, uniq_id: UniqId, force: bool) -> Result<(), BasketError> {
        let item = self.data.get(uniq_id).ok_or(BasketError::NotFound(uniq_id))?;

        if item.spec().is_configuration {
            self.data.remove(uniq_id);
            return Ok(());
        }

        if !item.spec().deletable && !force {
            return Err(BasketError::NotDeletable(uniq_id));
        }

        let children: Vec<UniqId> = finder::children_of(&self.data.all(), item)
            .iter()
            .map(|child| child.uniq_id)
            .collect();
        for child in children {
            self.remove(child, true)?;
        }

        self.data.remove(uniq_id);
        Ok(())
    }
}

impl RefresherBasket for Basket {
    fn space_id(&self) -> &crate::items::SpaceId {
        self.data.space_id()
    }

    fn user(&self) -> &User {
        &self.user
    }

    fn all(&self) -> Vec<&Item> {
        self.data.all()
    }

    fn selected_items(&self) -> Vec<&Item> {
        self.data.selected_items()
    }

    fn find(&self, predicate: &dyn Fn(&Item) -> bool) -> Vec<&Item> {
        self.data.find(predicate)
    }

    fn find_one_by_id(&self, item_id: &ItemId) -> Option<&Item> {
        self.data.find_one_by_id(item_id)
    }

    fn configuration(&self) -> Option<&Item> {
        self.data.configuration()
    }

    fn item_mut(&mut self, uniq_id: UniqId) -> Option<&mut Item> {
        self.data.get_mut(uniq_id)
    }

    fn remove(&mut self, uniq_id: UniqId) {
        self.data.remove(uniq_id);
    }

    fn add_info(&mut self, info: Info) {
        self.data.add_info(info);
    }

    fn has_possible_configuration(&self) -> bool {
        self.data.has_possible_configuration()
    }

    fn set_possible_configuration(&mut self, value: bool) {
        self.data.set_possible_configuration(value);
    }
}


#[cfg(test)]
mod tests {
    use testresult::TestResult;
    use uuid::Uuid;

    use super::{test_support::*, *};
    use crate::items::{PriceColumn, SpaceId, additions::Additions, additions::ProductAdditions};

    #[tokio::test]
    async fn add_rejects_an_empty_item_id() {
        let mut basket = basket(User::anonymous());

        let result = basket
            .add(ItemId::new(""), ItemType::Product, None, 1, false)
            .await;

        assert!(matches!(result, Err(BasketError::EmptyItemId)));
    }

    #[tokio::test]
    async fn add_rejects_a_zero_count() {
        let mut basket = basket(User::anonymous());

        let result = basket
            .add(ItemId::new("123"), ItemType::Product, None, 0, false)
            .await;

        assert!(matches!(result, Err(BasketError::InvalidCount)));
    }

    #[tokio::test]
    async fn add_rejects_an_orphan_child_type() {
        let mut basket = basket(User::anonymous());

        let result = basket
            .add(ItemId::new("123"), ItemType::InsuranceService, None, 1, false)
            .await;

        assert!(matches!(result, Err(BasketError::MustBeChild(_))));
    }

    #[tokio::test]
    async fn add_rejects_an_unknown_parent() {
        let mut basket = basket(User::anonymous());

        let result = basket
            .add(
                ItemId::new("123"),
                ItemType::InsuranceService,
                Some(UniqId::new()),
                1,
                false,
            )
            .await;

        assert!(matches!(result, Err(BasketError::ParentNotFound(_))));
    }

    #[tokio::test]
    async fn add_rejects_a_child_type_the_parent_does_not_accept() -> TestResult {
        let mut basket = basket(User::anonymous());
        let product = basket
            .add(ItemId::new("1"), ItemType::Product, None, 1, false)
            .await?;

        let result = basket
            .add(
                ItemId::new("2"),
                ItemType::ConfigurationProduct,
                Some(product),
                1,
                false,
            )
            .await;

        assert!(matches!(result, Err(BasketError::ChildNotAllowed { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn b2b_users_cannot_add_b2c_only_types() -> TestResult {
        let mut basket = basket(User::business(Uuid::now_v7()));
        let product = basket
            .add(ItemId::new("1"), ItemType::Product, None, 1, false)
            .await?;

        match basket
            .add(
                ItemId::new("2"),
                ItemType::InsuranceService,
                Some(product),
                1,
                false,
            )
            .await
        {
            Err(err @ BasketError::NotAllowedForBusiness(_)) => {
                assert!(err.user_message().is_some());
            }
            other => panic!("expected a B2B rejection, got {other:?}"),
        }

        Ok(())
    }

    async fn fill_positions(basket: &mut Basket, count: usize) -> TestResult {
        for n in 0..count {
            basket
                .add(ItemId::new(format!("item-{n}")), ItemType::Product, None, 1, false)
                .await?;
        }
        Ok(())
    }

    #[tokio::test]
    async fn anonymous_baskets_cap_at_twenty_positions() -> TestResult {
        let mut basket = basket(User::anonymous());
        fill_positions(&mut basket, MAX_POSITIONS_ANONYMOUS).await?;

        match basket
            .add(ItemId::new("over"), ItemType::Product, None, 1, false)
            .await
        {
            Err(
                err @ BasketError::PositionLimit {
                    limit: MAX_POSITIONS_ANONYMOUS,
                    kind: UserKind::Anonymous,
                },
            ) => assert!(err.user_message().is_some_and(|m| m.contains("20"))),
            other => panic!("expected the anonymous position ceiling, got {other:?}"),
        }

        Ok(())
    }

    #[tokio::test]
    async fn retail_baskets_cap_at_fifty_positions() -> TestResult {
        let mut basket = basket(User::retail(Uuid::now_v7()));
        fill_positions(&mut basket, MAX_POSITIONS_RETAIL).await?;

        match basket
            .add(ItemId::new("over"), ItemType::Product, None, 1, false)
            .await
        {
            Err(err @ BasketError::PositionLimit { .. }) => {
                assert!(err.user_message().is_some_and(|m| m.contains("50")));
            }
            other => panic!("expected the retail position ceiling, got {other:?}"),
        }

        Ok(())
    }

    #[tokio::test]
    async fn business_baskets_cap_at_one_hundred_positions() -> TestResult {
        let mut basket = basket(User::business(Uuid::now_v7()));
        fill_positions(&mut basket, MAX_POSITIONS_BUSINESS).await?;

        match basket
            .add(ItemId::new("over"), ItemType::Product, None, 1, false)
            .await
        {
            Err(err @ BasketError::PositionLimit { .. }) => {
                assert!(err.user_message().is_some_and(|m| m.contains("100")));
            }
            other => panic!("expected the business position ceiling, got {other:?}"),
        }

        Ok(())
    }

    #[tokio::test]
    async fn ceiling_counts_positions_not_quantities() -> TestResult {
        let mut basket = basket(User::anonymous());

        // One position with a huge quantity is still one position.
        basket
            .add(ItemId::new("bulk"), ItemType::Product, None, 500, false)
            .await?;
        basket
            .add(ItemId::new("second"), ItemType::Product, None, 1, false)
            .await?;

        assert_eq!(basket.data().positions_count(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn factory_failures_propagate() {
        let mut basket = basket_with(User::anonymous(), failing_factory());

        let result = basket
            .add(ItemId::new("123"), ItemType::Product, None, 1, false)
            .await;

        assert!(matches!(result, Err(BasketError::Factory(_))));
    }

    #[tokio::test]
    async fn oem_products_are_rejected_for_retail_users() {
        let mut basket = basket(User::retail(Uuid::now_v7()));

        let mut oem = Item::new(
            ItemId::new("123"),
            ItemType::Product,
            1,
            SpaceId::new("msk"),
            PriceColumn::new(1),
        );
        oem.additions = Additions::Product(ProductAdditions {
            oem: true,
            ..ProductAdditions::default()
        });

        let result = basket.add_item(oem);

        assert!(matches!(result, Err(BasketError::OemRequiresBusiness(_))));
    }

    #[tokio::test]
    async fn oem_products_are_accepted_for_business_users() -> TestResult {
        let mut basket = basket(User::business(Uuid::now_v7()));

        let mut oem = Item::new(
            ItemId::new("123"),
            ItemType::Product,
            1,
            SpaceId::new("msk"),
            PriceColumn::new(1),
        );
        oem.additions = Additions::Product(ProductAdditions {
            oem: true,
            ..ProductAdditions::default()
        });

        basket.add_item(oem)?;

        Ok(())
    }

    #[tokio::test]
    async fn removing_a_configuration_root_bypasses_deletability() -> TestResult {
        let mut basket = basket(User::anonymous());
        let conf = basket
            .add(ItemId::new("conf"), ItemType::Configuration, None, 1, false)
            .await?;
        basket
            .add(
                ItemId::new("member"),
                ItemType::ConfigurationProduct,
                Some(conf),
                1,
                false,
            )
            .await?;

        basket.remove(conf, false)?;

        assert!(basket.data().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn non_deletable_items_require_force() -> TestResult {
        let mut basket = basket(User::anonymous());
        let conf = basket
            .add(ItemId::new("conf"), ItemType::Configuration, None, 1, false)
            .await?;
        let member = basket
            .add(
                ItemId::new("member"),
                ItemType::ConfigurationProduct,
                Some(conf),
                1,
                false,
            )
            .await?;

        let err = basket.remove(member, false);
        assert!(matches!(err, Err(BasketError::NotDeletable(_))));

        basket.remove(member, true)?;
        assert!(basket.data().get(member).is_none());

        Ok(())
    }

    #[tokio::test]
    async fn removing_a_deletable_parent_force_removes_protected_children() -> TestResult {
        let mut basket = basket(User::anonymous());
        let product = basket
            .add(ItemId::new("1"), ItemType::Product, None, 1, false)
            .await?;
        let present = basket
            .add(ItemId::new("2"), ItemType::Present, Some(product), 1, false)
            .await?;

        // Presents are deletable; simulate a protected child instead.
        if let Some(item) = basket.data_mut().get_mut(present) {
            item.item_type = ItemType::ConfigurationService;
        }

        basket.remove(product, false)?;

        assert!(basket.data().is_empty());

        Ok(())
    }
}
