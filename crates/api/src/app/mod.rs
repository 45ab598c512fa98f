//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: the shared store handle
//! - `routes/`: HTTP routes + handlers (one file per page)
//! - `dto.rs`: form and query DTOs
//! - `errors.rs`: flash redirects and error pages
//! - `views.rs`: HTML rendering

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use chemstock_infra::InventoryStore;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;
pub mod views;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(store: InventoryStore) -> Router {
    let services = Arc::new(services::AppServices::new(store));

    routes::router()
        .layer(Extension(services))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}
