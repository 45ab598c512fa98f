use std::sync::Arc;

use axum::{
    extract::{Extension, Form, Path, Query},
    response::{Html, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;

use chemstock_core::InventoryId;

use crate::app::dto::{ListQuery, UpdateStockForm};
use crate::app::errors::{self, Flash, PageError};
use crate::app::services::AppServices;
use crate::app::views;

const INVENTORY_PAGE: &str = "/inventory";

pub fn router() -> Router {
    Router::new()
        .route("/inventory", get(list_inventory))
        .route("/update-stock/:id", post(update_stock))
}

pub async fn list_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, PageError> {
    let lines = services.store().list_inventory().await?;
    Ok(Html(views::inventory_page(&lines, query.flash().as_ref())))
}

pub async fn update_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<InventoryId>,
    Form(form): Form<UpdateStockForm>,
) -> Response {
    let cmd = match form.into_command(id, Utc::now()) {
        Ok(cmd) => cmd,
        Err(e) => return errors::domain_error_redirect(INVENTORY_PAGE, e),
    };

    match services.store().adjust_stock(&cmd).await {
        Ok(adj) => errors::redirect_with(
            INVENTORY_PAGE,
            Flash::notice(format!(
                "Stock updated ({} {}), current stock is {}",
                adj.movement.movement_type(),
                views::format_amount(adj.movement.quantity().get()),
                views::format_amount(adj.inventory.current_stock())
            )),
        ),
        Err(e) => errors::store_error_redirect(INVENTORY_PAGE, e),
    }
}
