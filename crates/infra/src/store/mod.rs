//! Transactional persistence for the catalog, the stock ledger and the
//! movement log.
//!
//! ## Error Mapping
//!
//! SQLx errors are mapped to `StoreError` as follows:
//!
//! | SQLx Error | StoreError | Scenario |
//! |------------|------------|----------|
//! | Database (unique violation) on product insert | `DuplicateIdentifier` | Concurrent registration of the same identifier |
//! | Database (other unique violation) | `Domain(Conflict)` | Should not occur in this schema |
//! | Database (check violation) | `Domain(InvariantViolation)` | Negative stock or non-positive quantity slipped past the domain |
//! | Anything else | `Database` | IO, pool closed, busy database, ... |
//!
//! Every mutating operation runs in one `BEGIN IMMEDIATE` transaction, so
//! concurrent writers queue on the busy timeout. A `Transaction` dropped
//! without `commit()` rolls back, so any early `?` leaves the tables untouched.

mod sqlite;

use thiserror::Error;

use chemstock_core::DomainError;
use chemstock_inventory::{InventoryRecord, MovementRecord};
use chemstock_products::Product;

pub use sqlite::InventoryStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("a product with chemical identifier '{0}' already exists")]
    DuplicateIdentifier(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("database error in {operation}: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// True for failures caused by the request rather than by the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            StoreError::Domain(_) | StoreError::DuplicateIdentifier(_) | StoreError::NotFound(_)
        )
    }
}

pub(crate) fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => StoreError::Domain(
            DomainError::conflict(format!("{operation}: {}", db_err.message())),
        ),
        sqlx::Error::Database(db_err) if db_err.is_check_violation() => StoreError::Domain(
            DomainError::invariant(format!("{operation}: {}", db_err.message())),
        ),
        other => StoreError::Database {
            operation,
            source: other,
        },
    }
}

/// A unique violation on the product insert means a registration of the same
/// identifier committed first.
pub(crate) fn map_insert_product_error(identifier: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::DuplicateIdentifier(identifier.to_string())
        }
        other => map_sqlx_error("insert_product", other),
    }
}

/// Result of a product registration: all three rows written together.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRegistration {
    pub product: Product,
    pub inventory: InventoryRecord,
    pub movement: MovementRecord,
}

/// Result of a stock adjustment.
#[derive(Debug, Clone, PartialEq)]
pub struct StockAdjustment {
    pub inventory: InventoryRecord,
    pub movement: MovementRecord,
}

/// Result of a product deletion.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDeletion {
    pub product: Product,
    pub movements_removed: u64,
}

/// Inventory row joined with its product for display.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryLine {
    pub record: InventoryRecord,
    pub product_name: String,
    pub identifier: String,
    pub unit: String,
}

/// Movement row joined with its product for display.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementLine {
    pub movement: MovementRecord,
    pub product_name: String,
    pub unit: String,
}
