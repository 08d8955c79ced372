//! Language endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        language::{Language, LanguageForm},
        PageQuery,
    },
    AppState,
};

use super::{AuthenticatedUser, PaginatedResponse};

#[utoipa::path(
    get,
    path = "/languages",
    tag = "languages",
    params(PageQuery),
    responses(
        (status = 200, description = "List of languages", body = PaginatedResponse<Language>)
    )
)]
pub async fn list_languages(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<Language>>> {
    let catalog = &state.services.catalog;
    let (languages, total) = catalog.list_languages(&query).await?;

    Ok(Json(PaginatedResponse::new(languages, total, &query, catalog.page_size())))
}

#[utoipa::path(
    get,
    path = "/languages/{id}",
    tag = "languages",
    params(
        ("id" = i32, Path, description = "Language ID")
    ),
    responses(
        (status = 200, description = "Language", body = Language),
        (status = 404, description = "Language not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_language(State(state): State<AppState>, Path(id): Path<i32>) -> AppResult<Json<Language>> {
    let language = state.services.catalog.get_language(id).await?;
    Ok(Json(language))
}

#[utoipa::path(
    post,
    path = "/languages",
    tag = "languages",
    security(("bearer_auth" = [])),
    request_body = LanguageForm,
    responses(
        (status = 201, description = "Language created", body = Language),
        (status = 403, description = "Missing add_language permission", body = crate::error::ErrorResponse),
        (status = 409, description = "Language already exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_language(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(form): Json<LanguageForm>,
) -> AppResult<(StatusCode, Json<Language>)> {
    let language = state.services.catalog.create_language(&claims, form).await?;
    Ok((StatusCode::CREATED, Json(language)))
}

#[utoipa::path(
    put,
    path = "/languages/{id}",
    tag = "languages",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Language ID")
    ),
    request_body = LanguageForm,
    responses(
        (status = 200, description = "Language updated", body = Language),
        (status = 403, description = "Missing change_language permission", body = crate::error::ErrorResponse),
        (status = 404, description = "Language not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_language(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(form): Json<LanguageForm>,
) -> AppResult<Json<Language>> {
    let language = state.services.catalog.update_language(&claims, id, form).await?;
    Ok(Json(language))
}

/// Delete a language no book is written in
#[utoipa::path(
    delete,
    path = "/languages/{id}",
    tag = "languages",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Language ID")
    ),
    responses(
        (status = 204, description = "Language deleted"),
        (status = 403, description = "Missing delete_language permission", body = crate::error::ErrorResponse),
        (status = 404, description = "Language not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Language still used by a book", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_language(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete_language(&claims, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
