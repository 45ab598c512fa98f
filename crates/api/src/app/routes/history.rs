use std::sync::Arc;

use axum::{extract::Extension, response::Html, routing::get, Router};

use crate::app::errors::PageError;
use crate::app::services::AppServices;
use crate::app::views;

pub fn router() -> Router {
    Router::new().route("/stock-history", get(stock_history))
}

pub async fn stock_history(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Html<String>, PageError> {
    let lines = services.store().list_movements().await?;
    Ok(Html(views::history_page(&lines)))
}
