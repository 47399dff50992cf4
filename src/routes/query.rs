use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::domain::assessment::AssessmentRecord;
use crate::error::QueryError;
use crate::processing::query::QueryService;

/// Body of `POST /query`. A missing or null `query` is an empty query.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QueryRequest {
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Failure of the query pipeline, rendered as a 500 with a JSON body.
pub struct ApiError(QueryError);

impl From<QueryError> for ApiError {
    fn from(error: QueryError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log::error!("Query failed: {}", self.0);
        let body = ErrorBody {
            error: self.0.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

pub async fn post_query(
    State(service): State<Arc<QueryService>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<Vec<AssessmentRecord>>, ApiError> {
    let raw_query = request.query.unwrap_or_default();
    log::info!("Received query: {raw_query:?}");

    let records = service.handle_query(&raw_query).await?;
    log::info!("Returning {} assessments", records.len());

    Ok(Json(records))
}
