//! Languages repository for database operations

use sqlx::{Pool, Postgres};

use crate::{
    error::{map_constraint_error, AppError, AppResult},
    models::language::{Language, LanguageForm},
};

#[derive(Clone)]
pub struct LanguagesRepository {
    pool: Pool<Postgres>,
}

impl LanguagesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list(&self, offset: i64, limit: i64) -> AppResult<(Vec<Language>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM languages")
            .fetch_one(&self.pool)
            .await?;

        let languages = sqlx::query_as::<_, Language>(
            "SELECT * FROM languages ORDER BY name LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((languages, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Language> {
        sqlx::query_as::<_, Language>("SELECT * FROM languages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Language with id {} not found", id)))
    }

    pub async fn create(&self, form: &LanguageForm) -> AppResult<Language> {
        let language =
            sqlx::query_as::<_, Language>("INSERT INTO languages (name) VALUES ($1) RETURNING *")
                .bind(&form.name)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_constraint_error(e, &duplicate_message(&form.name)))?;
        Ok(language)
    }

    pub async fn update(&self, id: i32, form: &LanguageForm) -> AppResult<Language> {
        sqlx::query_as::<_, Language>("UPDATE languages SET name = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(&form.name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, &duplicate_message(&form.name)))?
            .ok_or_else(|| AppError::NotFound(format!("Language with id {} not found", id)))
    }

    /// Delete a language. Fails with `Conflict` while books are written in it.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM languages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_constraint_error(e, "Language is still used by books"))?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Language with id {} not found", id)));
        }
        Ok(())
    }
}

fn duplicate_message(name: &str) -> String {
    format!("Language '{}' already exists", name)
}
