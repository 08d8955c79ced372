//! Genre endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        genre::{Genre, GenreForm},
        PageQuery,
    },
    AppState,
};

use super::{AuthenticatedUser, PaginatedResponse};

#[utoipa::path(
    get,
    path = "/genres",
    tag = "genres",
    params(PageQuery),
    responses(
        (status = 200, description = "List of genres", body = PaginatedResponse<Genre>)
    )
)]
pub async fn list_genres(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<Genre>>> {
    let catalog = &state.services.catalog;
    let (genres, total) = catalog.list_genres(&query).await?;

    Ok(Json(PaginatedResponse::new(genres, total, &query, catalog.page_size())))
}

#[utoipa::path(
    get,
    path = "/genres/{id}",
    tag = "genres",
    params(
        ("id" = i32, Path, description = "Genre ID")
    ),
    responses(
        (status = 200, description = "Genre", body = Genre),
        (status = 404, description = "Genre not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_genre(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Genre>> {
    let genre = state.services.catalog.get_genre(id).await?;
    Ok(Json(genre))
}

#[utoipa::path(
    post,
    path = "/genres",
    tag = "genres",
    security(("bearer_auth" = [])),
    request_body = GenreForm,
    responses(
        (status = 201, description = "Genre created", body = Genre),
        (status = 403, description = "Missing add_genre permission", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(form): Json<GenreForm>,
) -> AppResult<(StatusCode, Json<Genre>)> {
    let genre = state.services.catalog.create_genre(&claims, form).await?;
    Ok((StatusCode::CREATED, Json(genre)))
}

#[utoipa::path(
    put,
    path = "/genres/{id}",
    tag = "genres",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Genre ID")
    ),
    request_body = GenreForm,
    responses(
        (status = 200, description = "Genre updated", body = Genre),
        (status = 403, description = "Missing change_genre permission", body = crate::error::ErrorResponse),
        (status = 404, description = "Genre not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(form): Json<GenreForm>,
) -> AppResult<Json<Genre>> {
    let genre = state.services.catalog.update_genre(&claims, id, form).await?;
    Ok(Json(genre))
}

/// Delete a genre; books lose the genre but are kept
#[utoipa::path(
    delete,
    path = "/genres/{id}",
    tag = "genres",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Genre ID")
    ),
    responses(
        (status = 204, description = "Genre deleted"),
        (status = 403, description = "Missing delete_genre permission", body = crate::error::ErrorResponse),
        (status = 404, description = "Genre not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_genre(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_genre(&claims, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
