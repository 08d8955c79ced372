//! Books repository for database operations

use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{map_constraint_error, AppError, AppResult},
    models::book::{Book, BookForm, BookSummary},
};

const SELECT_SUMMARY: &str = r#"
    SELECT b.id, b.title, b.author_id, a.last_name || ', ' || a.first_name AS author_name
    FROM books b
    JOIN authors a ON a.id = b.author_id
"#;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List books ordered by title
    pub async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<BookSummary>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        let query = format!("{} ORDER BY b.title, b.id LIMIT $1 OFFSET $2", SELECT_SUMMARY);
        let books = sqlx::query_as::<_, BookSummary>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((books, total))
    }

    pub async fn list_by_author(&self, author_id: i32) -> AppResult<Vec<BookSummary>> {
        let query = format!("{} WHERE b.author_id = $1 ORDER BY b.title, b.id", SELECT_SUMMARY);
        let books = sqlx::query_as::<_, BookSummary>(&query)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    /// Create a book and attach its genres
    pub async fn create(&self, form: &BookForm) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author_id, summary, isbn, language_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&form.title)
        .bind(form.author_id)
        .bind(&form.summary)
        .bind(&form.isbn)
        .bind(form.language_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint_error(e, "Unknown author or language"))?;

        Self::set_genres(&mut tx, book.id, &form.genre_ids).await?;
        tx.commit().await?;

        Ok(book)
    }

    /// Replace every field of a book, genres included
    pub async fn update(&self, id: i32, form: &BookForm) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = $2, author_id = $3, summary = $4, isbn = $5, language_id = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&form.title)
        .bind(form.author_id)
        .bind(&form.summary)
        .bind(&form.isbn)
        .bind(form.language_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_constraint_error(e, "Unknown author or language"))?
        .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;

        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        Self::set_genres(&mut tx, id, &form.genre_ids).await?;
        tx.commit().await?;

        Ok(book)
    }

    async fn set_genres(
        tx: &mut Transaction<'_, Postgres>,
        book_id: i32,
        genre_ids: &[i32],
    ) -> AppResult<()> {
        for genre_id in genre_ids {
            sqlx::query(
                "INSERT INTO book_genres (book_id, genre_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(book_id)
            .bind(genre_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_constraint_error(e, &format!("Unknown genre {}", genre_id)))?;
        }
        Ok(())
    }

    /// Delete a book; its copies and genre links go with it
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        Ok(())
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count books whose title contains `needle`, case-insensitively
    pub async fn count_title_contains(&self, needle: &str) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM books WHERE title ILIKE '%' || $1 || '%' ESCAPE '\\'",
        )
        .bind(super::escape_like(needle))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
