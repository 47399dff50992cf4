//! HTTP routes:
//! - `GET /` - search page
//! - `POST /query` - assessment lookup

pub mod query;

use std::sync::Arc;

use axum::Router;
use axum::response::Html;
use axum::routing::{get, post};

use crate::processing::query::QueryService;

const INDEX_PAGE: &str = include_str!("../../static/index.html");

async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

/// Create the application router around a shared query service.
pub fn create_router(service: Arc<QueryService>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/query", post(query::post_query))
        .with_state(service)
}
