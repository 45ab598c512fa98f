//! Product registration: catalog entry + opening stock, decided together.

use chrono::{DateTime, Utc};

use chemstock_core::{DomainResult, ProductId};
use chemstock_products::NewProduct;

use crate::item::{MovementType, Quantity, StockMoved};

/// Command: RegisterProduct.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterProduct {
    pub product: NewProduct,
    pub initial_quantity: Quantity,
}

impl RegisterProduct {
    /// Validate raw form values.
    pub fn new(
        name: &str,
        identifier: &str,
        unit: &str,
        initial_quantity: f64,
    ) -> DomainResult<Self> {
        let product = NewProduct::new(name, identifier, unit)?;
        let initial_quantity = Quantity::new(initial_quantity)?;
        Ok(Self {
            product,
            initial_quantity,
        })
    }

    /// The IN movement that stocks a freshly created product.
    pub fn opening_movement(
        &self,
        product_id: ProductId,
        occurred_at: DateTime<Utc>,
    ) -> StockMoved {
        StockMoved {
            product_id,
            movement_type: MovementType::In,
            quantity: self.initial_quantity,
            occurred_at,
        }
    }
}
