//! Item problems and transient notices.

use serde::{Deserialize, Serialize};

use crate::items::ItemId;

/// Why a position cannot currently be purchased.
///
/// Problems are recomputed on every refresh; they are values the caller
/// queries, never errors that abort a workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProblemCode {
    /// The position exists but cannot be supplied right now.
    NotAvailable,
    /// The requested quantity exceeds the allowed ceiling.
    MaxCountExceeded,
    /// The position can no longer be ordered at all.
    ImpossibleToOrder,
}

impl ProblemCode {
    fn default_message(self) -> &'static str {
        match self {
            ProblemCode::NotAvailable => "Товар временно недоступен",
            ProblemCode::MaxCountExceeded => "Превышено доступное количество",
            ProblemCode::ImpossibleToOrder => "Позицию невозможно заказать",
        }
    }
}

/// A blocking or informational issue attached to one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub code: ProblemCode,
    pub message: String,
}

impl Problem {
    pub fn new(code: ProblemCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
        }
    }

    pub fn with_message(code: ProblemCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// What silently changed since the shopper last looked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfoCode {
    PriceChanged { old: u64, new: u64 },
    CountChanged { old: u32, new: u32 },
    PositionChanged,
    PositionRemoved,
}

/// A transient user-facing notice, consumed on acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    pub code: InfoCode,
    pub item_id: ItemId,
    pub name: String,
}

impl Info {
    pub fn new(code: InfoCode, item_id: ItemId, name: impl Into<String>) -> Self {
        Self {
            code,
            item_id,
            name: name.into(),
        }
    }
}
