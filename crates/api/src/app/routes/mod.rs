use axum::Router;

pub mod history;
pub mod inventory;
pub mod products;
pub mod system;

/// Every page and form endpoint.
pub fn router() -> Router {
    Router::new()
        .merge(system::router())
        .merge(products::router())
        .merge(inventory::router())
        .merge(history::router())
}
