use chemstock_infra::InventoryStore;

/// Handles shared by every request handler.
#[derive(Debug, Clone)]
pub struct AppServices {
    store: InventoryStore,
}

impl AppServices {
    pub fn new(store: InventoryStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &InventoryStore {
        &self.store
    }
}
