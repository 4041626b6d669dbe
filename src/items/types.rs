//! Item types and their capability table.

use serde::{Deserialize, Serialize};

/// Closed enumeration of everything a basket position can be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    /// A standalone catalog product.
    Product,
    /// The root of a build-to-order configuration.
    Configuration,
    /// A catalog product owned by a configuration.
    ConfigurationProduct,
    /// A service attached to a configuration member product.
    ConfigurationService,
    /// The configuration-wide assembly service.
    AssemblyService,
    /// A digital good or license.
    DigitalService,
    /// A server-granted free item attached to a qualifying purchase.
    Present,
    /// A third-party installation/setup service attached to a product.
    SubcontractService,
    /// An insurance policy covering a product.
    InsuranceService,
    /// Carrying the purchase up to the customer's floor.
    LiftingService,
    /// Courier delivery of the purchase.
    DeliveryService,
}

/// Static business rules attached to an [`ItemType`].
///
/// The table is populated once as `const` data and never mutated at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeSpec {
    pub can_have_children: bool,
    pub allowed_children: &'static [ItemType],
    pub must_be_child: bool,
    pub deletable: bool,
    pub count_changeable: bool,
    /// Count may never exceed the parent's count.
    pub count_le_parent: bool,
    /// Count always mirrors the parent's count.
    pub count_eq_parent: bool,
    pub only_one_per_parent: bool,
    pub only_one_in_basket: bool,
    pub is_product: bool,
    pub is_service: bool,
    pub is_configuration: bool,
    pub is_present: bool,
    pub part_of_configuration: bool,
    /// Synthesized by the server, never added by the shopper directly.
    pub added_by_server: bool,
    pub b2b_allowed: bool,
}

impl TypeSpec {
    const NONE: TypeSpec = TypeSpec {
        can_have_children: false,
        allowed_children: &[],
        must_be_child: false,
        deletable: false,
        count_changeable: false,
        count_le_parent: false,
        count_eq_parent: false,
        only_one_per_parent: false,
        only_one_in_basket: false,
        is_product: false,
        is_service: false,
        is_configuration: false,
        is_present: false,
        part_of_configuration: false,
        added_by_server: false,
        b2b_allowed: false,
    };
}

const PRODUCT: TypeSpec = TypeSpec {
    can_have_children: true,
    allowed_children: &[
        ItemType::DigitalService,
        ItemType::Present,
        ItemType::SubcontractService,
        ItemType::InsuranceService,
        ItemType::LiftingService,
        ItemType::DeliveryService,
    ],
    deletable: true,
    count_changeable: true,
    is_product: true,
    b2b_allowed: true,
    ..TypeSpec::NONE
};

const CONFIGURATION: TypeSpec = TypeSpec {
    can_have_children: true,
    allowed_children: &[ItemType::ConfigurationProduct, ItemType::AssemblyService],
    deletable: true,
    count_changeable: true,
    only_one_in_basket: true,
    is_configuration: true,
    b2b_allowed: true,
    ..TypeSpec::NONE
};

const CONFIGURATION_PRODUCT: TypeSpec = TypeSpec {
    can_have_children: true,
    allowed_children: &[ItemType::ConfigurationService],
    must_be_child: true,
    is_product: true,
    part_of_configuration: true,
    b2b_allowed: true,
    ..TypeSpec::NONE
};

const CONFIGURATION_SERVICE: TypeSpec = TypeSpec {
    must_be_child: true,
    count_eq_parent: true,
    is_service: true,
    part_of_configuration: true,
    added_by_server: true,
    b2b_allowed: true,
    ..TypeSpec::NONE
};

const ASSEMBLY_SERVICE: TypeSpec = TypeSpec {
    must_be_child: true,
    count_eq_parent: true,
    only_one_per_parent: true,
    is_service: true,
    part_of_configuration: true,
    added_by_server: true,
    b2b_allowed: true,
    ..TypeSpec::NONE
};

const DIGITAL_SERVICE: TypeSpec = TypeSpec {
    deletable: true,
    count_changeable: true,
    count_le_parent: true,
    is_service: true,
    b2b_allowed: true,
    ..TypeSpec::NONE
};

const PRESENT: TypeSpec = TypeSpec {
    deletable: true,
    is_present: true,
    added_by_server: true,
    ..TypeSpec::NONE
};

const SUBCONTRACT_SERVICE: TypeSpec = TypeSpec {
    must_be_child: true,
    deletable: true,
    count_changeable: true,
    count_le_parent: true,
    is_service: true,
    b2b_allowed: true,
    ..TypeSpec::NONE
};

const INSURANCE_SERVICE: TypeSpec = TypeSpec {
    must_be_child: true,
    deletable: true,
    count_le_parent: true,
    only_one_per_parent: true,
    is_service: true,
    ..TypeSpec::NONE
};

const LIFTING_SERVICE: TypeSpec = TypeSpec {
    must_be_child: true,
    deletable: true,
    only_one_per_parent: true,
    is_service: true,
    b2b_allowed: true,
    ..TypeSpec::NONE
};

const DELIVERY_SERVICE: TypeSpec = TypeSpec {
    must_be_child: true,
    deletable: true,
    only_one_per_parent: true,
    is_service: true,
    b2b_allowed: true,
    ..TypeSpec::NONE
};

impl ItemType {
    /// Resolve the static capability set for this type.
    pub fn spec(self) -> &'static TypeSpec {
        match self {
            ItemType::Product => &PRODUCT,
            ItemType::Configuration => &CONFIGURATION,
            ItemType::ConfigurationProduct => &CONFIGURATION_PRODUCT,
            ItemType::ConfigurationService => &CONFIGURATION_SERVICE,
            ItemType::AssemblyService => &ASSEMBLY_SERVICE,
            ItemType::DigitalService => &DIGITAL_SERVICE,
            ItemType::Present => &PRESENT,
            ItemType::SubcontractService => &SUBCONTRACT_SERVICE,
            ItemType::InsuranceService => &INSURANCE_SERVICE,
            ItemType::LiftingService => &LIFTING_SERVICE,
            ItemType::DeliveryService => &DELIVERY_SERVICE,
        }
    }

    /// Stable identifier used in wire payloads and diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Product => "product",
            ItemType::Configuration => "configuration",
            ItemType::ConfigurationProduct => "configuration_product",
            ItemType::ConfigurationService => "configuration_service",
            ItemType::AssemblyService => "assembly_service",
            ItemType::DigitalService => "digital_service",
            ItemType::Present => "present",
            ItemType::SubcontractService => "subcontract_service",
            ItemType::InsuranceService => "insurance_service",
            ItemType::LiftingService => "lifting_service",
            ItemType::DeliveryService => "delivery_service",
        }
    }

    /// Whether `child` may be attached under this type.
    pub fn allows_child(self, child: ItemType) -> bool {
        self.spec().allowed_children.contains(&child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_is_exclusive_in_basket() {
        assert!(ItemType::Configuration.spec().only_one_in_basket);
        assert!(!ItemType::Product.spec().only_one_in_basket);
    }

    #[test]
    fn configuration_members_are_not_deletable() {
        assert!(!ItemType::ConfigurationProduct.spec().deletable);
        assert!(!ItemType::ConfigurationService.spec().deletable);
        assert!(!ItemType::AssemblyService.spec().deletable);
    }

    #[test]
    fn product_accepts_insurance_but_not_configuration_members() {
        assert!(ItemType::Product.allows_child(ItemType::InsuranceService));
        assert!(!ItemType::Product.allows_child(ItemType::ConfigurationProduct));
    }

    #[test]
    fn services_must_live_under_a_parent() {
        assert!(ItemType::SubcontractService.spec().must_be_child);
        assert!(ItemType::InsuranceService.spec().must_be_child);
        assert!(!ItemType::Product.spec().must_be_child);
    }
}
