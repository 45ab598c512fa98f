use chrono::{DateTime, Utc};
use serde::Deserialize;

use chemstock_core::{DomainResult, InventoryId};
use chemstock_inventory::{AdjustStock, RegisterProduct};

use crate::app::errors::Flash;

// -------------------------
// Form DTOs
// -------------------------
//
// Fields arrive as text and default to empty so that a missing or malformed
// value is reported by domain validation instead of an extractor rejection.

#[derive(Debug, Default, Deserialize)]
pub struct CreateProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cas_number: String,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub quantity: String,
}

impl CreateProductForm {
    pub fn into_command(self) -> DomainResult<RegisterProduct> {
        RegisterProduct::new(
            &self.name,
            &self.cas_number,
            &self.unit,
            parse_quantity(&self.quantity),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStockForm {
    #[serde(default)]
    pub quantity: String,
    #[serde(rename = "type", default)]
    pub movement_type: String,
}

impl UpdateStockForm {
    pub fn into_command(
        self,
        inventory_id: InventoryId,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<AdjustStock> {
        AdjustStock::parse(
            inventory_id,
            parse_quantity(&self.quantity),
            &self.movement_type,
            occurred_at,
        )
    }
}

// -------------------------
// Query DTOs
// -------------------------

/// Query string of a listing page: optional search term plus flash message.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub notice: Option<String>,
    pub error: Option<String>,
}

impl ListQuery {
    /// Search term, `None` when blank.
    pub fn search(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// Errors take precedence when both parameters are present.
    pub fn flash(&self) -> Option<Flash> {
        match (&self.error, &self.notice) {
            (Some(msg), _) if !msg.is_empty() => Some(Flash::error(msg.clone())),
            (_, Some(msg)) if !msg.is_empty() => Some(Flash::notice(msg.clone())),
            _ => None,
        }
    }
}

/// Unparseable input becomes NaN, which `Quantity` rejects as "not a number".
fn parse_quantity(raw: &str) -> f64 {
    raw.trim().parse::<f64>().unwrap_or(f64::NAN)
}
