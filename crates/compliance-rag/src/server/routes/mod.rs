//! Routes for the compliance server

pub mod files;
pub mod query;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
    routing::{delete, get, post},
    Router,
};

use crate::error::Error;
use crate::providers::identity::authenticate;
use crate::server::state::AppState;
use crate::types::Identity;

/// Build the query and file routes
pub fn routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Query
        .route("/", post(query::query))
        .route("/query", post(query::query))
        // Knowledge base files
        .route(
            "/upload",
            post(files::upload_file).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/files", get(files::list_files))
        .route("/files/:filename", delete(files::delete_file))
}

/// Requester verified from the `Authorization: Bearer` header
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        authenticate(state.identity(), header)
            .await
            .map(AuthenticatedUser)
    }
}
