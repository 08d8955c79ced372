//! Catalog home page

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{error::AppResult, services::catalog::CatalogCounts, AppState};

/// Header identifying a browsing session for the visit counter
pub const SESSION_HEADER: &str = "x-session-id";

/// Optional search terms counted on the home page
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IndexQuery {
    /// Count books whose title contains this (case-insensitive)
    pub book_contains: Option<String>,
    /// Count genres whose name contains this (case-insensitive)
    pub genre_contains: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct IndexResponse {
    #[serde(flatten)]
    pub counts: CatalogCounts,
    /// Visits in this session, when a session id was sent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_visits: Option<i64>,
}

/// Catalog record counts and the session visit counter
#[utoipa::path(
    get,
    path = "/",
    tag = "catalog",
    params(
        IndexQuery,
        ("x-session-id" = Option<String>, Header, description = "Session id for the visit counter")
    ),
    responses(
        (status = 200, description = "Catalog counts", body = IndexResponse)
    )
)]
pub async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<IndexQuery>,
) -> AppResult<Json<IndexResponse>> {
    let counts = state
        .services
        .catalog
        .counts(query.book_contains.as_deref(), query.genre_contains.as_deref())
        .await?;

    let session_id = headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty());

    let num_visits = match session_id {
        Some(session_id) => match state.services.redis.increment_visits(session_id).await {
            Ok(visits) => Some(visits),
            Err(e) => {
                tracing::warn!("Visit counter unavailable: {}", e);
                None
            }
        },
        None => None,
    };

    Ok(Json(IndexResponse { counts, num_visits }))
}
