use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chemstock_core::{Entity, MovementId, ProductId};

use crate::item::{MovementType, Quantity, StockMoved};

/// Append-only entry of the movement log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementRecord {
    id: MovementId,
    product_id: ProductId,
    movement_type: MovementType,
    quantity: Quantity,
    created_at: DateTime<Utc>,
}

impl MovementRecord {
    /// Persisted form of a `StockMoved` event.
    pub fn recorded(id: MovementId, event: &StockMoved) -> Self {
        Self {
            id,
            product_id: event.product_id,
            movement_type: event.movement_type,
            quantity: event.quantity,
            created_at: event.occurred_at,
        }
    }

    pub fn from_parts(
        id: MovementId,
        product_id: ProductId,
        movement_type: MovementType,
        quantity: Quantity,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            product_id,
            movement_type,
            quantity,
            created_at,
        }
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn movement_type(&self) -> MovementType {
        self.movement_type
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for MovementRecord {
    type Id = MovementId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
