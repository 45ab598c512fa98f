use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chemstock_core::{
    Aggregate, DomainError, DomainResult, Entity, InventoryId, ProductId, ValueObject,
};

/// Slack allowed when comparing fractional stock levels.
///
/// Stock is a float (litres, grams, ...), so a withdrawal of the exact
/// remaining amount must not fail on representation error.
pub const STOCK_EPSILON: f64 = 1e-9;

/// A strictly positive, finite amount of stock.
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Quantity(f64);

impl Quantity {
    pub fn new(value: f64) -> DomainResult<Self> {
        if !value.is_finite() {
            return Err(DomainError::validation("quantity must be a number"));
        }
        if value <= 0.0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl ValueObject for Quantity {}

impl TryFrom<f64> for Quantity {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for f64 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Direction of a stock movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MovementType {
    In,
    Out,
}

impl MovementType {
    pub fn as_str(self) -> &'static str {
        match self {
            MovementType::In => "IN",
            MovementType::Out => "OUT",
        }
    }
}

impl core::fmt::Display for MovementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for MovementType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "IN" => Ok(MovementType::In),
            "OUT" => Ok(MovementType::Out),
            _ => Err(DomainError::validation("movement type must be IN or OUT")),
        }
    }
}

/// Current stock level of one product.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryRecord {
    id: InventoryId,
    product_id: ProductId,
    current_stock: f64,
}

impl InventoryRecord {
    /// Rebuild a record from stored columns.
    pub fn from_parts(id: InventoryId, product_id: ProductId, current_stock: f64) -> Self {
        Self {
            id,
            product_id,
            current_stock,
        }
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn current_stock(&self) -> f64 {
        self.current_stock
    }
}

impl Entity for InventoryRecord {
    type Id = InventoryId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Command: AdjustStock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustStock {
    pub inventory_id: InventoryId,
    pub movement_type: MovementType,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

impl AdjustStock {
    /// Build a command from raw form values.
    pub fn parse(
        inventory_id: InventoryId,
        quantity: f64,
        movement_type: &str,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            inventory_id,
            movement_type: movement_type.parse()?,
            quantity: Quantity::new(quantity)?,
            occurred_at,
        })
    }
}

/// Event: StockMoved.
///
/// One of these exists for every change of `current_stock`; the store appends
/// it to the movement log in the same transaction that writes the new level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockMoved {
    pub product_id: ProductId,
    pub movement_type: MovementType,
    pub quantity: Quantity,
    pub occurred_at: DateTime<Utc>,
}

impl StockMoved {
    /// Signed change this movement makes to the stock level.
    pub fn delta(&self) -> f64 {
        match self.movement_type {
            MovementType::In => self.quantity.get(),
            MovementType::Out => -self.quantity.get(),
        }
    }
}

impl Aggregate for InventoryRecord {
    type Command = AdjustStock;
    type Event = StockMoved;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        // Clamp representation noise from a full withdrawal.
        self.current_stock = (self.current_stock + event.delta()).max(0.0);
    }

    fn handle(&self, cmd: &Self::Command) -> Result<Self::Event, Self::Error> {
        if cmd.inventory_id != self.id {
            return Err(DomainError::invariant("inventory_id mismatch"));
        }

        match cmd.movement_type {
            MovementType::Out if cmd.quantity.get() > self.current_stock + STOCK_EPSILON => {
                return Err(DomainError::invariant("stock cannot go below zero"));
            }
            MovementType::In if !(self.current_stock + cmd.quantity.get()).is_finite() => {
                return Err(DomainError::invariant("stock would exceed the largest amount"));
            }
            _ => {}
        }

        Ok(StockMoved {
            product_id: self.product_id,
            movement_type: cmd.movement_type,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
        })
    }
}
