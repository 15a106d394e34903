//! Query endpoint

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// POST / and POST /query - Answer a sales-compliance question
///
/// A malformed body is treated like a missing question, after authentication.
pub async fn query(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<QueryRequest>>,
) -> Result<Json<QueryResponse>> {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let question = body.as_ref().and_then(|Json(req)| req.question.as_deref());

    let result = state.orchestrator().run(authorization, question).await?;

    Ok(Json(QueryResponse::from(result)))
}
