//! Book instances repository: copies, loans and their due dates

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{map_constraint_error, AppError, AppResult},
    models::book_instance::{BookInstance, BookInstanceForm, LoanStatus},
};

/// Persistence of book instances used by the loans service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookInstanceStore: Send + Sync {
    async fn get(&self, id: Uuid) -> AppResult<Option<BookInstance>>;

    /// All copies, ordered by book title
    async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<BookInstance>, i64)>;

    async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>>;

    /// Copies on loan, earliest due date first, optionally restricted to one borrower
    async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<BookInstance>, i64)>;

    async fn create(&self, form: &BookInstanceForm) -> AppResult<BookInstance>;

    async fn update(&self, id: Uuid, form: &BookInstanceForm) -> AppResult<Option<BookInstance>>;

    /// Returns false when no copy had this id
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<Option<BookInstance>>;

    /// Write status, borrower and due date together
    async fn set_loan(
        &self,
        id: Uuid,
        status: LoanStatus,
        borrower_id: Option<i32>,
        due_back: Option<NaiveDate>,
    ) -> AppResult<Option<BookInstance>>;

    async fn count(&self, status: Option<LoanStatus>) -> AppResult<i64>;
}

const SELECT_INSTANCE: &str = r#"
    SELECT bi.id, bi.book_id, b.title AS book_title, bi.imprint, bi.due_back,
           bi.borrower_id, u.username AS borrower_username, bi.status
    FROM book_instances bi
    JOIN books b ON b.id = bi.book_id
    LEFT JOIN users u ON u.id = bi.borrower_id
"#;

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Postgres>,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookInstanceStore for BookInstancesRepository {
    async fn get(&self, id: Uuid) -> AppResult<Option<BookInstance>> {
        let query = format!("{} WHERE bi.id = $1", SELECT_INSTANCE);
        let instance = sqlx::query_as::<_, BookInstance>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(instance)
    }

    async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<BookInstance>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_instances")
            .fetch_one(&self.pool)
            .await?;

        let query = format!("{} ORDER BY b.title, bi.id LIMIT $1 OFFSET $2", SELECT_INSTANCE);
        let instances = sqlx::query_as::<_, BookInstance>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((instances, total))
    }

    async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let query = format!("{} WHERE bi.book_id = $1 ORDER BY bi.id", SELECT_INSTANCE);
        let instances = sqlx::query_as::<_, BookInstance>(&query)
            .bind(book_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(instances)
    }

    async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        offset: i64,
        limit: i64,
    ) -> AppResult<(Vec<BookInstance>, i64)> {
        // $1 NULL selects every borrower
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM book_instances
            WHERE status = 'o' AND ($1::INTEGER IS NULL OR borrower_id = $1)
            "#,
        )
        .bind(borrower_id)
        .fetch_one(&self.pool)
        .await?;

        let query = format!(
            r#"{}
            WHERE bi.status = 'o' AND ($1::INTEGER IS NULL OR bi.borrower_id = $1)
            ORDER BY bi.due_back ASC NULLS LAST, bi.id
            LIMIT $2 OFFSET $3"#,
            SELECT_INSTANCE
        );
        let instances = sqlx::query_as::<_, BookInstance>(&query)
            .bind(borrower_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((instances, total))
    }

    async fn create(&self, form: &BookInstanceForm) -> AppResult<BookInstance> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, due_back, borrower_id, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(form.book_id)
        .bind(&form.imprint)
        .bind(form.due_back)
        .bind(form.borrower_id)
        .bind(form.status)
        .execute(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "Unknown book or borrower"))?;

        self.get(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Book instance {} missing after insert", id)))
    }

    async fn update(&self, id: Uuid, form: &BookInstanceForm) -> AppResult<Option<BookInstance>> {
        let result = sqlx::query(
            r#"
            UPDATE book_instances
            SET book_id = $2, imprint = $3, due_back = $4, borrower_id = $5, status = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(form.book_id)
        .bind(&form.imprint)
        .bind(form.due_back)
        .bind(form.borrower_id)
        .bind(form.status)
        .execute(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "Unknown book or borrower"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<Option<BookInstance>> {
        let result = sqlx::query("UPDATE book_instances SET due_back = $2 WHERE id = $1")
            .bind(id)
            .bind(due_back)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    async fn set_loan(
        &self,
        id: Uuid,
        status: LoanStatus,
        borrower_id: Option<i32>,
        due_back: Option<NaiveDate>,
    ) -> AppResult<Option<BookInstance>> {
        let result = sqlx::query(
            "UPDATE book_instances SET status = $2, borrower_id = $3, due_back = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .bind(borrower_id)
        .bind(due_back)
        .execute(&self.pool)
        .await
        .map_err(|e| map_constraint_error(e, "Unknown borrower"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(id).await
    }

    async fn count(&self, status: Option<LoanStatus>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_instances WHERE ($1::TEXT IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
