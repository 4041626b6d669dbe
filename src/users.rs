//! Basket owner context.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the shopper is classified for business rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserKind {
    #[default]
    Anonymous,
    /// Authenticated retail (B2C) customer.
    Retail,
    /// Business (B2B) customer.
    Business,
}

/// The shopper owning the basket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Option<Uuid>,
    pub kind: UserKind,
}

impl User {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn retail(id: Uuid) -> Self {
        Self {
            id: Some(id),
            kind: UserKind::Retail,
        }
    }

    pub fn business(id: Uuid) -> Self {
        Self {
            id: Some(id),
            kind: UserKind::Business,
        }
    }

    pub fn is_b2b(&self) -> bool {
        self.kind == UserKind::Business
    }
}
