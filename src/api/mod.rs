//! API handlers for the LocalLibrary REST endpoints

pub mod auth;
pub mod authors;
pub mod book_instances;
pub mod books;
pub mod genres;
pub mod health;
pub mod index;
pub mod languages;
pub mod loans;
pub mod openapi;

use axum::{
    async_trait,
    extract::{FromRequestParts, OriginalUri, Path},
    http::request::Parts,
    routing::{get, post},
    Router,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{permission::AccessDenied, user::UserClaims, PageQuery},
    AppState,
};

/// Extractor for authenticated user from JWT token
pub struct AuthenticatedUser(pub UserClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let location = login_location(parts, &state.config.auth.login_url);
        let login_required = || AccessDenied::Unauthenticated.into_app_error(&location);

        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| login_required())?;

        let claims = UserClaims::from_token(bearer.token(), &state.config.auth.jwt_secret).map_err(|e| {
            tracing::debug!("Rejected token: {}", e);
            login_required()
        })?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Book instance id taken from the path.
///
/// A malformed id resolves to the nil uuid, which no copy carries (ids are v4), so
/// the service still authorizes first and then answers with a JSON 404.
pub struct InstanceId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for InstanceId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<Uuid>::from_request_parts(parts, state).await {
            Ok(Path(id)) => Ok(InstanceId(id)),
            Err(e) => {
                tracing::debug!("Malformed book instance id: {}", e);
                Ok(InstanceId(Uuid::nil()))
            }
        }
    }
}

/// Login page url, coming back to the requested path afterwards
fn login_location(parts: &Parts, login_url: &str) -> String {
    // Nested routers see a stripped uri, the original one is kept in extensions
    let path = parts
        .extensions
        .get::<OriginalUri>()
        .map(|uri| uri.0.path().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());

    format!("{}?next={}", login_url, path)
}

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// Items of the requested page
    pub items: Vec<T>,
    /// Total number of items
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Items per page
    pub per_page: i64,
    /// True when the items do not fit on one page
    pub is_paginated: bool,
}

impl<T> PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(items: Vec<T>, total: i64, query: &PageQuery, per_page: i64) -> Self {
        Self {
            items,
            total,
            page: query.page(),
            per_page,
            is_paginated: total > per_page,
        }
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API v1 routes
    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        // Home page
        .route("/", get(index::index))
        // Authors
        .route("/authors", get(authors::list_authors).post(authors::create_author))
        .route(
            "/authors/:id",
            get(authors::get_author)
                .put(authors::update_author)
                .delete(authors::delete_author),
        )
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        // Genres
        .route("/genres", get(genres::list_genres).post(genres::create_genre))
        .route(
            "/genres/:id",
            get(genres::get_genre).put(genres::update_genre).delete(genres::delete_genre),
        )
        // Languages
        .route("/languages", get(languages::list_languages).post(languages::create_language))
        .route(
            "/languages/:id",
            get(languages::get_language)
                .put(languages::update_language)
                .delete(languages::delete_language),
        )
        // Book instances
        .route(
            "/bookinstances",
            get(book_instances::list_book_instances).post(book_instances::create_book_instance),
        )
        .route(
            "/bookinstances/:id",
            get(book_instances::get_book_instance)
                .put(book_instances::update_book_instance)
                .delete(book_instances::delete_book_instance),
        )
        // Loans
        .route("/mybooks", get(loans::my_borrowed))
        .route("/borrowed", get(loans::all_borrowed))
        .route(
            "/bookinstances/:id/renew",
            get(loans::renewal_form).post(loans::renew),
        )
        .route("/bookinstances/:id/checkout", post(loans::checkout))
        .route("/bookinstances/:id/return", post(loans::mark_returned))
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
