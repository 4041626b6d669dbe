//! Item refresher seam
//!
//! The refresher is the injected price/availability provider run at the start
//! of every refresh. It sees the basket only through the narrow
//! [`RefresherBasket`] facade.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    catalog::CatalogError,
    items::{Item, ItemId, SpaceId, UniqId, problems::Info},
    users::User,
};

/// Read/write facade handed to the refresher; keeps it away from the
/// aggregate's structural primitives.
pub trait RefresherBasket: Send {
    fn space_id(&self) -> &SpaceId;

    fn user(&self) -> &User;

    fn all(&self) -> Vec<&Item>;

    fn selected_items(&self) -> Vec<&Item>;

    fn find(&self, predicate: &dyn Fn(&Item) -> bool) -> Vec<&Item>;

    fn find_one_by_id(&self, item_id: &ItemId) -> Option<&Item>;

    fn configuration(&self) -> Option<&Item>;

    /// In-place mutation of one item's price/availability data.
    fn item_mut(&mut self, uniq_id: UniqId) -> Option<&mut Item>;

    fn remove(&mut self, uniq_id: UniqId);

    fn add_info(&mut self, info: Info);

    fn has_possible_configuration(&self) -> bool;

    fn set_possible_configuration(&mut self, value: bool);
}

/// Mutates prices and availability of the basket's items in place.
#[automock]
#[async_trait]
pub trait ItemRefresher: Send + Sync {
    #[allow(unused_parens)]
    async fn refresh<'a>(&self, basket: &'a mut (dyn RefresherBasket + 'a))
    -> Result<(), CatalogError>;
}
