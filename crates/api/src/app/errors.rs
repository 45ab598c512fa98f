//! Error reporting for the HTML front end.
//!
//! Form submissions never render an error page: they redirect back to a
//! listing with a one-shot `notice`/`error` query parameter that the page
//! shows as a banner. GET pages that cannot load their data answer `500`.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use thiserror::Error;

use chemstock_core::DomainError;
use chemstock_infra::StoreError;

use crate::app::views;

/// Shown instead of the details of a system failure.
pub const UNEXPECTED_ERROR: &str = "an unexpected error occurred, please try again";

/// A one-shot message carried on a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flash {
    Notice(String),
    Error(String),
}

impl Flash {
    pub fn notice(msg: impl Into<String>) -> Self {
        Flash::Notice(msg.into())
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Flash::Error(msg.into())
    }

    /// Query parameter name the message travels in.
    pub fn key(&self) -> &'static str {
        match self {
            Flash::Notice(_) => "notice",
            Flash::Error(_) => "error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Flash::Notice(msg) | Flash::Error(msg) => msg,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Flash::Error(_))
    }
}

/// `303 See Other` to `path` with the flash message in the query string.
pub fn redirect_with(path: &str, flash: Flash) -> Response {
    match serde_urlencoded::to_string(&[(flash.key(), flash.message())][..]) {
        Ok(query) => Redirect::to(&format!("{path}?{query}")).into_response(),
        Err(e) => {
            tracing::warn!("failed to encode flash message: {e}");
            Redirect::to(path).into_response()
        }
    }
}

/// Redirect for input the domain rejected before touching storage.
pub fn domain_error_redirect(path: &str, err: DomainError) -> Response {
    tracing::debug!(error = %err, "form rejected");
    redirect_with(path, Flash::Error(err.user_message()))
}

/// Redirect for a failed store operation.
///
/// Client errors carry their own message; anything else is logged and
/// reported generically.
pub fn store_error_redirect(path: &str, err: StoreError) -> Response {
    if err.is_client_error() {
        tracing::warn!(error = %err, "request rejected");
        redirect_with(path, Flash::Error(user_message(&err)))
    } else {
        tracing::error!(error = ?err, "request failed");
        redirect_with(path, Flash::error(UNEXPECTED_ERROR))
    }
}

fn user_message(err: &StoreError) -> String {
    match err {
        StoreError::Domain(e) => e.user_message(),
        other => other.to_string(),
    }
}

/// Failure while rendering a page.
#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        tracing::error!(error = ?self, "page failed to render");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(views::error_page(UNEXPECTED_ERROR)),
        )
            .into_response()
    }
}
