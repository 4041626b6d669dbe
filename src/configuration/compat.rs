//! Compatibility gate
//!
//! The configurator validates a prospective configuration against the whole
//! basket through one stored procedure. The call is bounded by a short
//! deadline: checkout rendering must not hang on the database.

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use sqlx::{FromRow, PgPool, Postgres, Row, postgres::PgRow, query_as};
use thiserror::Error;
use tokio::time::timeout;

const SET_TEMPORARY_CONFIGURATION_SQL: &str = include_str!("sql/set_temporary_configuration.sql");

const COMPATIBILITY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum CompatibilityError {
    #[error("compatibility check timed out")]
    Timeout,

    #[error("compatibility query failed")]
    Database(#[from] sqlx::Error),
}

/// Verdict of the stored procedure for one candidate configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityRow {
    /// Server-assigned configuration id.
    pub conf_id: i64,
    pub assembly_type_id: i64,
    pub compatible: bool,
}

impl<'r> FromRow<'r, PgRow> for CompatibilityRow {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            conf_id: row.try_get("conf_id")?,
            assembly_type_id: row.try_get("assembly_type_id")?,
            compatible: row.try_get("compatible")?,
        })
    }
}

/// One compatibility probe; `None` means the server found nothing assemblable
/// in the submitted item list.
#[automock]
#[async_trait]
pub trait CompatibilityGate: Send + Sync {
    async fn check(
        &self,
        conf_id: i64,
        item_list: &str,
    ) -> Result<Option<CompatibilityRow>, CompatibilityError>;
}

/// Stored-procedure implementation over Postgres.
#[derive(Debug, Clone)]
pub struct PgCompatibilityGate {
    pool: PgPool,
}

impl PgCompatibilityGate {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompatibilityGate for PgCompatibilityGate {
    async fn check(
        &self,
        conf_id: i64,
        item_list: &str,
    ) -> Result<Option<CompatibilityRow>, CompatibilityError> {
        let query = query_as::<Postgres, CompatibilityRow>(SET_TEMPORARY_CONFIGURATION_SQL)
            .bind(conf_id)
            .bind(item_list)
            .fetch_optional(&self.pool);

        match timeout(COMPATIBILITY_TIMEOUT, query).await {
            Ok(row) => row.map_err(CompatibilityError::from),
            Err(_) => Err(CompatibilityError::Timeout),
        }
    }
}
