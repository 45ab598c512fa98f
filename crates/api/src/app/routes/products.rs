use std::sync::Arc;

use axum::{
    extract::{Extension, Form, Path, Query},
    response::{Html, Response},
    routing::{get, post},
    Router,
};

use chemstock_core::ProductId;

use crate::app::dto::{CreateProductForm, ListQuery};
use crate::app::errors::{self, Flash, PageError};
use crate::app::services::AppServices;
use crate::app::views;

const PRODUCTS_PAGE: &str = "/products";

pub fn router() -> Router {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/delete-product/:id", post(delete_product))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, PageError> {
    let search = query.search();
    let products = services.store().list_products(search).await?;
    Ok(Html(views::products_page(
        &products,
        search,
        query.flash().as_ref(),
    )))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Form(form): Form<CreateProductForm>,
) -> Response {
    let cmd = match form.into_command() {
        Ok(cmd) => cmd,
        Err(e) => return errors::domain_error_redirect(PRODUCTS_PAGE, e),
    };

    match services.store().register_product(&cmd).await {
        Ok(reg) => errors::redirect_with(
            PRODUCTS_PAGE,
            Flash::notice(format!(
                "Product '{}' added with {} {} in stock",
                reg.product.name(),
                views::format_amount(reg.inventory.current_stock()),
                reg.product.unit()
            )),
        ),
        Err(e) => errors::store_error_redirect(PRODUCTS_PAGE, e),
    }
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<ProductId>,
) -> Response {
    match services.store().delete_product(id).await {
        Ok(deleted) => errors::redirect_with(
            PRODUCTS_PAGE,
            Flash::notice(format!("Product '{}' deleted", deleted.product.name())),
        ),
        Err(e) => errors::store_error_redirect(PRODUCTS_PAGE, e),
    }
}
