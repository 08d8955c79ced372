//! Router tests: the real axum router over an in-memory book instance store

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, NaiveDate, Utc};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use uuid::Uuid;

use locallibrary_server::{
    api::create_router,
    clock::FixedClock,
    config::AppConfig,
    error::AppResult,
    models::{
        book_instance::{BookInstanceForm, LoanStatus},
        BookInstance, UserClaims,
    },
    repository::{BookInstanceStore, Repository},
    services::{redis::RedisService, Services},
    AppState,
};

const MEMBER_ID: i32 = 1;
const LIBRARIAN_ID: i32 = 2;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
}

/// Book instances kept in memory, with the same ordering rules as the database
#[derive(Default)]
struct MemoryStore {
    instances: Mutex<Vec<BookInstance>>,
}

impl MemoryStore {
    fn with(instances: Vec<BookInstance>) -> Self {
        Self {
            instances: Mutex::new(instances),
        }
    }

    fn find(&self, id: Uuid) -> Option<BookInstance> {
        self.instances.lock().unwrap().iter().find(|i| i.id == id).cloned()
    }

    fn modify(&self, id: Uuid, f: impl FnOnce(&mut BookInstance)) -> Option<BookInstance> {
        let mut instances = self.instances.lock().unwrap();
        let instance = instances.iter_mut().find(|i| i.id == id)?;
        f(instance);
        Some(instance.clone())
    }
}

fn page<T: Clone>(items: &[T], offset: i64, limit: i64) -> Vec<T> {
    items
        .iter()
        .skip(offset as usize)
        .take(limit as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl BookInstanceStore for MemoryStore {
    async fn get(&self, id: Uuid) -> AppResult<Option<BookInstance>> {
        Ok(self.find(id))
    }

    async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<BookInstance>, i64)> {
        let mut all = self.instances.lock().unwrap().clone();
        all.sort_by(|a, b| a.book_title.cmp(&b.book_title).then(a.id.cmp(&b.id)));
        Ok((page(&all, offset, limit), all.len() as i64))
    }

    async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let instances = self.instances.lock().unwrap();
        Ok(instances.iter().filter(|i| i.book_id == book_id).cloned().collect())
    }

    async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<BookInstance>, i64)> {
        let mut on_loan: Vec<BookInstance> = self
            .instances
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.status == LoanStatus::OnLoan)
            .filter(|i| borrower_id.map_or(true, |b| i.borrower_id == Some(b)))
            .cloned()
            .collect();
        on_loan.sort_by(|a, b| a.due_back.cmp(&b.due_back).then(a.id.cmp(&b.id)));
        Ok((page(&on_loan, offset, limit), on_loan.len() as i64))
    }

    async fn create(&self, form: &BookInstanceForm) -> AppResult<BookInstance> {
        let instance = BookInstance {
            id: Uuid::new_v4(),
            book_id: form.book_id,
            book_title: format!("Book {}", form.book_id),
            imprint: form.imprint.clone(),
            due_back: form.due_back,
            borrower_id: form.borrower_id,
            borrower_username: None,
            status: form.status,
            is_overdue: false,
        };
        self.instances.lock().unwrap().push(instance.clone());
        Ok(instance)
    }

    async fn update(&self, id: Uuid, form: &BookInstanceForm) -> AppResult<Option<BookInstance>> {
        Ok(self.modify(id, |i| {
            i.book_id = form.book_id;
            i.imprint = form.imprint.clone();
            i.due_back = form.due_back;
            i.borrower_id = form.borrower_id;
            i.status = form.status;
        }))
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let mut instances = self.instances.lock().unwrap();
        let before = instances.len();
        instances.retain(|i| i.id != id);
        Ok(instances.len() < before)
    }

    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<Option<BookInstance>> {
        Ok(self.modify(id, |i| i.due_back = Some(due_back)))
    }

    async fn set_loan(
        &self,
        id: Uuid,
        status: LoanStatus,
        borrower_id: Option<i32>,
        due_back: Option<NaiveDate>,
    ) -> AppResult<Option<BookInstance>> {
        Ok(self.modify(id, |i| {
            i.status = status;
            i.borrower_id = borrower_id;
            i.due_back = due_back;
        }))
    }

    async fn count(&self, status: Option<LoanStatus>) -> AppResult<i64> {
        let instances = self.instances.lock().unwrap();
        Ok(instances
            .iter()
            .filter(|i| status.map_or(true, |s| i.status == s))
            .count() as i64)
    }
}

fn on_loan(borrower_id: i32, due_back: NaiveDate) -> BookInstance {
    BookInstance {
        id: Uuid::new_v4(),
        book_id: 1,
        book_title: "Book Title".to_string(),
        imprint: "Unlikely Imprint, 2016".to_string(),
        due_back: Some(due_back),
        borrower_id: Some(borrower_id),
        borrower_username: None,
        status: LoanStatus::OnLoan,
        is_overdue: false,
    }
}

fn setup(store: MemoryStore) -> (Router, AppConfig) {
    setup_with_config(store, AppConfig::default())
}

fn setup_with_config(store: MemoryStore, config: AppConfig) -> (Router, AppConfig) {

    // Neither connects until used; catalog routes that touch them are not exercised here
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database.url)
        .expect("lazy pool");
    let redis = RedisService::open(&config.redis.url).expect("redis client");

    let services = Services::new(
        Repository::new(pool),
        Arc::new(store),
        Arc::new(FixedClock(today())),
        config.auth.clone(),
        config.catalog.page_size,
        redis,
    );
    let state = AppState {
        config: Arc::new(config.clone()),
        services: Arc::new(services),
    };

    (create_router(state), config)
}

fn token(config: &AppConfig, user_id: i32, permissions: &[&str]) -> String {
    let now = Utc::now().timestamp();
    UserClaims {
        sub: format!("testuser{}", user_id),
        user_id,
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
        exp: now + 3600,
        iat: now,
    }
    .create_token(&config.auth.jwt_secret)
    .expect("token")
}

fn member_token(config: &AppConfig) -> String {
    token(config, MEMBER_ID, &[])
}

fn librarian_token(config: &AppConfig) -> String {
    token(config, LIBRARIAN_ID, &["can_mark_returned"])
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("router error");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn post(uri: &str, token: Option<&str>, payload: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(payload.to_string())).unwrap()
}

fn date(value: &Value) -> NaiveDate {
    NaiveDate::parse_from_str(value.as_str().expect("date string"), "%Y-%m-%d").unwrap()
}

#[tokio::test]
async fn test_health() {
    let (app, _) = setup(MemoryStore::default());
    let (status, body) = send(&app, get("/api/v1/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_my_books_redirects_to_login() {
    let (app, _) = setup(MemoryStore::default());
    let response = app
        .clone()
        .oneshot(get("/api/v1/mybooks", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/api/v1/auth/login?next=/api/v1/mybooks"
    );
}

#[tokio::test]
async fn test_invalid_token_redirects_to_login() {
    let (app, _) = setup(MemoryStore::default());
    let (status, _) = send(&app, get("/api/v1/borrowed", Some("not-a-token"))).await;
    assert_eq!(status, StatusCode::FOUND);
}

#[tokio::test]
async fn test_renew_redirects_anonymous_user() {
    let (app, _) = setup(MemoryStore::default());
    let uri = format!("/api/v1/bookinstances/{}/renew", Uuid::new_v4());
    let response = app.clone().oneshot(get(&uri, None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.headers().get(header::LOCATION).unwrap().to_str().unwrap();
    assert_eq!(location, format!("/api/v1/auth/login?next={}", uri));
}

#[tokio::test]
async fn test_redirect_uses_configured_login_url() {
    let mut config = AppConfig::default();
    config.auth.login_url = "/accounts/login/".to_string();
    let (app, _) = setup_with_config(MemoryStore::default(), config);

    let response = app.clone().oneshot(get("/api/v1/borrowed", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/accounts/login/?next=/api/v1/borrowed"
    );
}

#[tokio::test]
async fn test_malformed_instance_id_is_json_not_found() {
    let (app, config) = setup(MemoryStore::with(vec![on_loan(MEMBER_ID, today())]));

    let (status, body) = send(&app, get("/api/v1/bookinstances/not-a-uuid", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchData");

    let uri = "/api/v1/bookinstances/12345/renew";
    let (status, body) = send(&app, get(uri, Some(&librarian_token(&config)))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchData");
}

#[tokio::test]
async fn test_malformed_instance_id_still_checks_permission_first() {
    let (app, config) = setup(MemoryStore::default());
    let payload = json!({ "due_back": today() + Duration::days(7) });

    let uri = "/api/v1/bookinstances/not-a-uuid/renew";
    let (status, body) = send(&app, post(uri, Some(&member_token(&config)), payload)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "NotAuthorized");

    let response = app.clone().oneshot(get(uri, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FOUND);
}

#[tokio::test]
async fn test_my_books_lists_only_own_loans() {
    let (app, config) = setup(MemoryStore::with(vec![
        on_loan(MEMBER_ID, today() + Duration::days(5)),
        on_loan(3, today() + Duration::days(1)),
        on_loan(MEMBER_ID, today() - Duration::days(2)),
    ]));

    // The borrower can not be chosen by the client
    let uri = "/api/v1/mybooks?borrower_id=3";
    let (status, body) = send(&app, get(uri, Some(&member_token(&config)))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    let items = body["items"].as_array().unwrap();
    assert!(items.iter().all(|i| i["borrower_id"] == MEMBER_ID));
    assert_eq!(date(&items[0]["due_back"]), today() - Duration::days(2));
    assert_eq!(items[0]["is_overdue"], true);
    assert_eq!(items[1]["is_overdue"], false);
}

#[tokio::test]
async fn test_borrowed_forbidden_without_permission() {
    let (app, config) = setup(MemoryStore::default());
    let (status, body) = send(&app, get("/api/v1/borrowed", Some(&member_token(&config)))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "NotAuthorized");
}

#[tokio::test]
async fn test_borrowed_sorted_by_due_date_across_pages() {
    let instances = (0..30)
        .map(|i| on_loan(1 + i % 3, today() + Duration::days((i * 7 % 5) as i64)))
        .collect();
    let (app, config) = setup(MemoryStore::with(instances));
    let token = librarian_token(&config);

    let mut due_dates = Vec::new();
    for page in 1..=3 {
        let uri = format!("/api/v1/borrowed?page={}", page);
        let (status, body) = send(&app, get(&uri, Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 30);
        assert_eq!(body["per_page"], 10);
        assert_eq!(body["is_paginated"], true);
        for item in body["items"].as_array().unwrap() {
            due_dates.push(date(&item["due_back"]));
        }
    }

    assert_eq!(due_dates.len(), 30);
    assert!(due_dates.windows(2).all(|w| w[0] <= w[1]));
}

#[tokio::test]
async fn test_renew_forbidden_before_lookup() {
    let (app, config) = setup(MemoryStore::default());
    let uri = format!("/api/v1/bookinstances/{}/renew", Uuid::new_v4());
    let payload = json!({ "due_back": today() + Duration::days(7) });

    let (status, _) = send(&app, post(&uri, Some(&member_token(&config)), payload)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_renew_unknown_instance_not_found() {
    let (app, config) = setup(MemoryStore::default());
    let uri = format!("/api/v1/bookinstances/{}/renew", Uuid::new_v4());

    let (status, _) = send(&app, get(&uri, Some(&librarian_token(&config)))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let payload = json!({ "due_back": today() + Duration::days(7) });
    let (status, _) = send(&app, post(&uri, Some(&librarian_token(&config)), payload)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_renewal_form_proposes_three_weeks() {
    let instance = on_loan(MEMBER_ID, today());
    let id = instance.id;
    let (app, config) = setup(MemoryStore::with(vec![instance]));

    let uri = format!("/api/v1/bookinstances/{}/renew", id);
    let (status, body) = send(&app, get(&uri, Some(&librarian_token(&config)))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(date(&body["proposed_due_back"]), today() + Duration::weeks(3));
    assert_eq!(body["instance"]["id"], id.to_string());
}

#[tokio::test]
async fn test_renew_past_date_rejected() {
    let instance = on_loan(MEMBER_ID, today());
    let id = instance.id;
    let (app, config) = setup(MemoryStore::with(vec![instance]));

    let uri = format!("/api/v1/bookinstances/{}/renew", id);
    let payload = json!({ "due_back": today() - Duration::weeks(1) });
    let (status, body) = send(&app, post(&uri, Some(&librarian_token(&config)), payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "due_back");
    assert_eq!(body["message"], "Invalid date - renewal in past");

    // Unchanged
    let (_, body) = send(&app, get(&format!("/api/v1/bookinstances/{}", id), None)).await;
    assert_eq!(date(&body["due_back"]), today());
}

#[tokio::test]
async fn test_renew_too_far_rejected() {
    let instance = on_loan(MEMBER_ID, today());
    let id = instance.id;
    let (app, config) = setup(MemoryStore::with(vec![instance]));

    let uri = format!("/api/v1/bookinstances/{}/renew", id);
    let payload = json!({ "due_back": today() + Duration::weeks(5) });
    let (status, body) = send(&app, post(&uri, Some(&librarian_token(&config)), payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "due_back");
    assert_eq!(body["message"], "Invalid date - renewal more than 4 weeks ahead");
}

#[tokio::test]
async fn test_renew_another_members_copy() {
    let instance = on_loan(MEMBER_ID, today() + Duration::days(3));
    let id = instance.id;
    let (app, config) = setup(MemoryStore::with(vec![instance]));

    let new_due = today() + Duration::weeks(4);
    let uri = format!("/api/v1/bookinstances/{}/renew", id);
    let payload = json!({ "due_back": new_due });
    let (status, body) = send(&app, post(&uri, Some(&librarian_token(&config)), payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(date(&body["due_back"]), new_due);
    assert_eq!(body["borrower_id"], MEMBER_ID);
}

#[tokio::test]
async fn test_checkout_then_return() {
    let available = BookInstance {
        due_back: None,
        borrower_id: None,
        status: LoanStatus::Available,
        ..on_loan(MEMBER_ID, today())
    };
    let id = available.id;
    let (app, config) = setup(MemoryStore::with(vec![available]));
    let token = librarian_token(&config);

    let uri = format!("/api/v1/bookinstances/{}/checkout", id);
    let (status, body) = send(&app, post(&uri, Some(&token), json!({ "borrower_id": MEMBER_ID }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "o");
    assert_eq!(date(&body["due_back"]), today() + Duration::days(21));

    // Already lent
    let (status, _) = send(&app, post(&uri, Some(&token), json!({ "borrower_id": 3 }))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!("/api/v1/bookinstances/{}/return", id);
    let (status, body) = send(&app, post(&uri, Some(&token), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "a");
    assert!(body["due_back"].is_null());
    assert!(body["borrower_id"].is_null());

    // A copy back on the shelf has nothing to renew
    let uri = format!("/api/v1/bookinstances/{}/renew", id);
    let payload = json!({ "due_back": today() + Duration::days(7) });
    let (status, body) = send(&app, post(&uri, Some(&token), payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "due_back");

    let (_, body) = send(&app, get(&format!("/api/v1/bookinstances/{}", id), None)).await;
    assert_eq!(body["status"], "a");
    assert!(body["due_back"].is_null());
}

#[tokio::test]
async fn test_create_instance_requires_permission() {
    let (app, config) = setup(MemoryStore::default());
    let payload = json!({
        "book_id": 1,
        "imprint": "Unlikely Imprint, 2016",
        "status": "m"
    });

    let (status, _) = send(&app, post("/api/v1/bookinstances", None, payload.clone())).await;
    assert_eq!(status, StatusCode::FOUND);

    let (status, _) = send(&app, post("/api/v1/bookinstances", Some(&member_token(&config)), payload.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let token = token(&config, 4, &["add_bookinstance"]);
    let (status, body) = send(&app, post("/api/v1/bookinstances", Some(&token), payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "m");
}

#[tokio::test]
async fn test_create_instance_rejects_loan_without_borrower() {
    let (app, config) = setup(MemoryStore::default());
    let token = token(&config, 4, &["add_bookinstance"]);
    let payload = json!({
        "book_id": 1,
        "imprint": "Unlikely Imprint, 2016",
        "due_back": today(),
        "status": "o"
    });

    let (status, body) = send(&app, post("/api/v1/bookinstances", Some(&token), payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "borrower_id");
}

#[tokio::test]
async fn test_create_author_forbidden_without_permission() {
    let (app, config) = setup(MemoryStore::default());
    let payload = json!({ "first_name": "Big", "last_name": "Bob" });

    let (status, _) = send(&app, post("/api/v1/authors", Some(&member_token(&config)), payload)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
