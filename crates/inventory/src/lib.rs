//! Inventory ledger and movement log domain module.
//!
//! This crate contains business rules for stock keeping, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod item;
pub mod movement;
pub mod registration;

pub use item::{AdjustStock, InventoryRecord, MovementType, Quantity, StockMoved};
pub use movement::MovementRecord;
pub use registration::RegisterProduct;
