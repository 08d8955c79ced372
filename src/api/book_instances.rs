//! Book instance (copy) endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book_instance::{BookInstance, BookInstanceForm},
        PageQuery,
    },
    AppState,
};

use super::{AuthenticatedUser, InstanceId, PaginatedResponse};

/// List every copy, ordered by book title
#[utoipa::path(
    get,
    path = "/bookinstances",
    tag = "bookinstances",
    params(PageQuery),
    responses(
        (status = 200, description = "List of copies", body = PaginatedResponse<BookInstance>)
    )
)]
pub async fn list_book_instances(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<BookInstance>>> {
    let (instances, total) = state.services.loans.list(&query).await?;

    Ok(Json(PaginatedResponse::new(
        instances,
        total,
        &query,
        state.services.loans.page_size(),
    )))
}

#[utoipa::path(
    get,
    path = "/bookinstances/{id}",
    tag = "bookinstances",
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Copy details", body = BookInstance),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book_instance(
    State(state): State<AppState>,
    InstanceId(id): InstanceId,
) -> AppResult<Json<BookInstance>> {
    let instance = state.services.loans.get(id).await?;
    Ok(Json(instance))
}

/// Register a new copy of a book
#[utoipa::path(
    post,
    path = "/bookinstances",
    tag = "bookinstances",
    security(("bearer_auth" = [])),
    request_body = BookInstanceForm,
    responses(
        (status = 201, description = "Copy created", body = BookInstance),
        (status = 302, description = "Not logged in, redirect to login"),
        (status = 400, description = "Status, borrower and due date disagree", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing add_bookinstance permission", body = crate::error::ErrorResponse),
        (status = 409, description = "Unknown book or borrower", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(form): Json<BookInstanceForm>,
) -> AppResult<(StatusCode, Json<BookInstance>)> {
    let instance = state.services.loans.create(&claims, form).await?;
    Ok((StatusCode::CREATED, Json(instance)))
}

#[utoipa::path(
    put,
    path = "/bookinstances/{id}",
    tag = "bookinstances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    request_body = BookInstanceForm,
    responses(
        (status = 200, description = "Copy updated", body = BookInstance),
        (status = 400, description = "Status, borrower and due date disagree", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing change_bookinstance permission", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    InstanceId(id): InstanceId,
    Json(form): Json<BookInstanceForm>,
) -> AppResult<Json<BookInstance>> {
    let instance = state.services.loans.update(&claims, id, form).await?;
    Ok(Json(instance))
}

#[utoipa::path(
    delete,
    path = "/bookinstances/{id}",
    tag = "bookinstances",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 204, description = "Copy deleted"),
        (status = 403, description = "Missing delete_bookinstance permission", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book_instance(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    InstanceId(id): InstanceId,
) -> AppResult<StatusCode> {
    state.services.loans.delete(&claims, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
