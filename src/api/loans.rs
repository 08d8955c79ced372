//! Loan endpoints: borrowed lists, renewals, check-out and return

use axum::{
    extract::{Query, State},
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book_instance::{BookInstance, CheckoutRequest, RenewRequest, RenewalForm},
        PageQuery,
    },
    AppState,
};

use super::{AuthenticatedUser, InstanceId, PaginatedResponse};

/// Copies on loan to the current user, earliest due date first
#[utoipa::path(
    get,
    path = "/mybooks",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Copies borrowed by the current user", body = PaginatedResponse<BookInstance>),
        (status = 302, description = "Not logged in, redirect to login")
    )
)]
pub async fn my_borrowed(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<BookInstance>>> {
    let (instances, total) = state.services.loans.borrowed_by(&claims, &query).await?;

    Ok(Json(PaginatedResponse::new(
        instances,
        total,
        &query,
        state.services.loans.page_size(),
    )))
}

/// Every copy on loan, earliest due date first
#[utoipa::path(
    get,
    path = "/borrowed",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "All copies on loan", body = PaginatedResponse<BookInstance>),
        (status = 302, description = "Not logged in, redirect to login"),
        (status = 403, description = "Missing can_mark_returned permission", body = crate::error::ErrorResponse)
    )
)]
pub async fn all_borrowed(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<BookInstance>>> {
    let (instances, total) = state.services.loans.all_borrowed(&claims, &query).await?;

    Ok(Json(PaginatedResponse::new(
        instances,
        total,
        &query,
        state.services.loans.page_size(),
    )))
}

/// Renewal form with the suggested due date (three weeks from today)
#[utoipa::path(
    get,
    path = "/bookinstances/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Copy and proposed due date", body = RenewalForm),
        (status = 302, description = "Not logged in, redirect to login"),
        (status = 403, description = "Missing can_mark_returned permission", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn renewal_form(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    InstanceId(id): InstanceId,
) -> AppResult<Json<RenewalForm>> {
    let form = state.services.loans.renewal_form(&claims, id).await?;
    Ok(Json(form))
}

/// Renew a loan: the new due date must be within the next four weeks
#[utoipa::path(
    post,
    path = "/bookinstances/{id}/renew",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    request_body = RenewRequest,
    responses(
        (status = 200, description = "Loan renewed", body = BookInstance),
        (status = 302, description = "Not logged in, redirect to login"),
        (status = 400, description = "Date in the past or more than four weeks ahead", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing can_mark_returned permission", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn renew(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    InstanceId(id): InstanceId,
    Json(request): Json<RenewRequest>,
) -> AppResult<Json<BookInstance>> {
    let instance = state.services.loans.renew(&claims, id, request.due_back).await?;
    Ok(Json(instance))
}

/// Lend an available copy to a member
#[utoipa::path(
    post,
    path = "/bookinstances/{id}/checkout",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Copy lent", body = BookInstance),
        (status = 400, description = "Invalid due date", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing can_mark_returned permission", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Copy not available", body = crate::error::ErrorResponse)
    )
)]
pub async fn checkout(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    InstanceId(id): InstanceId,
    Json(request): Json<CheckoutRequest>,
) -> AppResult<Json<BookInstance>> {
    let instance = state.services.loans.checkout(&claims, id, request).await?;
    Ok(Json(instance))
}

/// Mark a copy as returned
#[utoipa::path(
    post,
    path = "/bookinstances/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Book instance ID")
    ),
    responses(
        (status = 200, description = "Copy returned and available", body = BookInstance),
        (status = 403, description = "Missing can_mark_returned permission", body = crate::error::ErrorResponse),
        (status = 404, description = "Copy not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Copy not on loan", body = crate::error::ErrorResponse)
    )
)]
pub async fn mark_returned(
    State(state): State<AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    InstanceId(id): InstanceId,
) -> AppResult<Json<BookInstance>> {
    let instance = state.services.loans.mark_returned(&claims, id).await?;
    Ok(Json(instance))
}
