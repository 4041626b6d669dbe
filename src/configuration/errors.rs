//! Configuration errors

use thiserror::Error;

use crate::{
    basket::BasketError,
    catalog::CatalogError,
    configuration::compat::CompatibilityError,
    items::{ItemId, UniqId},
};

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("configuration already exists in the basket")]
    AlreadyExists,

    #[error("no configuration in the basket")]
    NotFound,

    #[error("configuration is immutable")]
    Immutable,

    #[error("assembled items are not compatible")]
    Incompatible,

    #[error("product {0} is missing from the catalog response")]
    ProductNotFound(ItemId),

    #[error("product {0} has no price for the requested price column")]
    NoPrice(ItemId),

    #[error("item {0} not found in basket")]
    ItemNotFound(UniqId),

    #[error("item {0} is not a product")]
    NotAProduct(UniqId),

    #[error("compatibility check failed")]
    Compatibility(#[from] CompatibilityError),

    #[error("can't apply configuration to basket")]
    Basket(#[from] BasketError),

    #[error("can't get products from catalog")]
    Catalog(#[source] CatalogError),
}

impl ConfigurationError {
    /// Localized message shown to the shopper, when the failure is one the
    /// shopper can act on.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            ConfigurationError::AlreadyExists => Some("В корзине уже есть конфигурация."),
            ConfigurationError::Immutable => Some("Эту конфигурацию нельзя изменить."),
            ConfigurationError::Incompatible => Some("Выбранные комплектующие несовместимы."),
            _ => None,
        }
    }
}
