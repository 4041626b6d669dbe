//! Per-type item payloads.

use serde::{Deserialize, Serialize};

use crate::items::ItemId;

/// Polymorphic payload keyed by the item's type.
///
/// Exactly one kind is populated at construction time; unrelated kinds never
/// coexist on one item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Additions {
    /// No extra payload (presents, transport services).
    #[default]
    None,
    /// Catalog attributes of a product position.
    Product(ProductAdditions),
    /// Availability attributes of a service position.
    Service(ServiceAdditions),
    /// Metadata of the configuration root.
    Configuration(ConfigurationAdditions),
}

/// Catalog attributes carried by product-kind items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAdditions {
    /// The product is physically present in a local store.
    pub in_store: bool,
    pub stock: u32,
    /// OEM positions are sold to business customers only.
    pub oem: bool,
    /// Subject to mandatory marking.
    pub marked: bool,
    /// Tracked by the fiscal authority.
    pub fns_tracked: bool,
    pub credit_programs: Vec<String>,
    pub category_id: String,
    pub brand: String,
}

/// Availability attributes carried by service-kind items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAdditions {
    pub allowed_b2b: bool,
    pub allowed_b2c: bool,
    /// Substitute offered when this service becomes unavailable.
    pub replacement_item_id: Option<ItemId>,
}

impl Default for ServiceAdditions {
    fn default() -> Self {
        Self {
            allowed_b2b: true,
            allowed_b2c: true,
            replacement_item_id: None,
        }
    }
}

/// Metadata carried by the configuration root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationAdditions {
    /// Server-assigned configuration id.
    pub conf_id: i64,
    /// Assembly type assigned by the configurator.
    pub conf_type: i64,
    /// Template configurations are immutable.
    pub mutable: bool,
}
