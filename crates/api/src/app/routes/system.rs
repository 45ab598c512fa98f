use axum::{http::StatusCode, response::Html, routing::get, Router};

use crate::app::views;

pub fn router() -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
}

pub async fn index() -> Html<String> {
    Html(views::landing_page())
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}
