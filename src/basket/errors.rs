//! Basket errors
//!
//! Internal diagnostics and the localized user-facing message are separate
//! concerns carried by one error type: `Display` is for logs,
//! [`BasketError::user_message`] is for the shopper.

use thiserror::Error;

use crate::{
    catalog::CatalogError,
    factory::FactoryError,
    items::{ItemId, UniqId, types::ItemType},
    users::UserKind,
};

#[derive(Debug, Error)]
pub enum BasketError {
    #[error("item id is empty")]
    EmptyItemId,

    #[error("count must be greater than zero")]
    InvalidCount,

    #[error("parent {0} not found in basket")]
    ParentNotFound(UniqId),

    #[error("item {0} not found in basket")]
    NotFound(UniqId),

    #[error("type {0:?} must be added under a parent")]
    MustBeChild(ItemType),

    #[error("type {parent:?} does not accept children of type {child:?}")]
    ChildNotAllowed { parent: ItemType, child: ItemType },

    #[error("type {0:?} is not allowed for business customers")]
    NotAllowedForBusiness(ItemType),

    #[error("OEM product {0} is sold to business customers only")]
    OemRequiresBusiness(ItemId),

    #[error("basket holds the maximum of {limit} positions for {kind:?} users")]
    PositionLimit { limit: usize, kind: UserKind },

    #[error("item {0} is not deletable")]
    NotDeletable(UniqId),

    #[error("can't create item from catalog")]
    Factory(#[from] FactoryError),
}

impl BasketError {
    /// Localized message shown to the shopper, when the failure is one the
    /// shopper can act on.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            BasketError::PositionLimit {
                kind: UserKind::Anonymous,
                ..
            } => Some("В корзине не может быть больше 20 позиций. Войдите, чтобы добавить больше."),
            BasketError::PositionLimit {
                kind: UserKind::Retail,
                ..
            } => Some("В корзине не может быть больше 50 позиций."),
            BasketError::PositionLimit {
                kind: UserKind::Business,
                ..
            } => Some("В корзине не может быть больше 100 позиций."),
            BasketError::NotAllowedForBusiness(_) => {
                Some("Эта позиция недоступна для юридических лиц.")
            }
            BasketError::OemRequiresBusiness(_) => {
                Some("OEM-товары доступны только юридическим лицам.")
            }
            BasketError::NotDeletable(_) => Some("Эту позицию нельзя удалить из корзины."),
            _ => None,
        }
    }
}

/// Failures of the refresh reconciliation; any of these aborts the whole
/// refresh without committing.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("can't get services from catalog")]
    Catalog(#[source] CatalogError),

    #[error("item refresher failed")]
    Refresher(#[source] CatalogError),

    #[error("configuration product {0} is missing for its service")]
    MissingConfigurationProduct(ItemId),
}
