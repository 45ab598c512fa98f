use serde::{Deserialize, Serialize};

use chemstock_core::{DomainError, DomainResult, Entity, ProductId, ValueObject};

/// Column widths of the catalog table.
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_IDENTIFIER_LEN: usize = 50;
pub const MAX_UNIT_LEN: usize = 20;

/// Registry identifier of a chemical (a CAS number such as `67-64-1`).
///
/// Trimmed on construction; uniqueness is enforced by the catalog store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChemicalIdentifier(String);

impl ChemicalIdentifier {
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(DomainError::validation("chemical identifier is required"));
        }
        if value.chars().count() > MAX_IDENTIFIER_LEN {
            return Err(DomainError::validation(format!(
                "chemical identifier must be at most {MAX_IDENTIFIER_LEN} characters"
            )));
        }
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for ChemicalIdentifier {}

impl core::fmt::Display for ChemicalIdentifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated product metadata, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    name: String,
    identifier: ChemicalIdentifier,
    unit: String,
}

impl NewProduct {
    pub fn new(name: &str, identifier: &str, unit: &str) -> DomainResult<Self> {
        let name = required_text("name", name, MAX_NAME_LEN)?;
        let identifier = ChemicalIdentifier::parse(identifier)?;
        let unit = required_text("unit", unit, MAX_UNIT_LEN)?;
        Ok(Self {
            name,
            identifier,
            unit,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identifier(&self) -> &ChemicalIdentifier {
        &self.identifier
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Attach the id assigned by the store.
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            identifier: self.identifier,
            unit: self.unit,
        }
    }
}

fn required_text(field: &str, raw: &str, max_len: usize) -> DomainResult<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    if value.chars().count() > max_len {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(value.to_string())
}

/// Catalog entry for a chemical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    identifier: ChemicalIdentifier,
    unit: String,
}

impl Product {
    /// Rebuild a product from stored columns (already validated on the way in).
    pub fn from_parts(
        id: ProductId,
        name: String,
        identifier: ChemicalIdentifier,
        unit: String,
    ) -> Self {
        Self {
            id,
            name,
            identifier,
            unit,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn identifier(&self) -> &ChemicalIdentifier {
        &self.identifier
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Case-insensitive substring match on the name or the identifier.
    ///
    /// Case folding is Unicode-aware (`Ä` matches `ä`). A blank term matches
    /// everything.
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.trim().to_lowercase();
        needle.is_empty()
            || self.name.to_lowercase().contains(&needle)
            || self.identifier.as_str().to_lowercase().contains(&needle)
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> Self::Id {
        self.id
    }
}
