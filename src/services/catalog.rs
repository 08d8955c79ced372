//! Catalog management service: authors, books, genres and languages

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    clock::Clock,
    error::AppResult,
    models::{
        author::{Author, AuthorDetail, AuthorForm},
        book::{display_genre, BookDetail, BookForm, BookSummary},
        book_instance::LoanStatus,
        genre::{Genre, GenreForm},
        language::{Language, LanguageForm},
        permission::{Permission, Resource},
        user::UserClaims,
        Book, PageQuery,
    },
    repository::{BookInstanceStore, Repository},
};

/// Record counts shown on the catalog home page
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct CatalogCounts {
    pub num_books: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_books_contain_search: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_genres_contain_search: Option<i64>,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    store: Arc<dyn BookInstanceStore>,
    clock: Arc<dyn Clock>,
    page_size: i64,
}

impl CatalogService {
    pub fn new(
        repository: Repository,
        store: Arc<dyn BookInstanceStore>,
        clock: Arc<dyn Clock>,
        page_size: i64,
    ) -> Self {
        Self {
            repository,
            store,
            clock,
            page_size,
        }
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// Counts for the home page, with optional substring searches on titles and genre names
    pub async fn counts(
        &self,
        book_contains: Option<&str>,
        genre_contains: Option<&str>,
    ) -> AppResult<CatalogCounts> {
        let num_books_contain_search = match book_contains.filter(|s| !s.is_empty()) {
            Some(needle) => Some(self.repository.books.count_title_contains(needle).await?),
            None => None,
        };
        let num_genres_contain_search = match genre_contains.filter(|s| !s.is_empty()) {
            Some(needle) => Some(self.repository.genres.count_name_contains(needle).await?),
            None => None,
        };

        Ok(CatalogCounts {
            num_books: self.repository.books.count().await?,
            num_instances: self.store.count(None).await?,
            num_instances_available: self.store.count(Some(LoanStatus::Available)).await?,
            num_authors: self.repository.authors.count().await?,
            num_genres: self.repository.genres.count().await?,
            num_books_contain_search,
            num_genres_contain_search,
        })
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    pub async fn list_authors(&self, page: &PageQuery) -> AppResult<(Vec<Author>, i64)> {
        self.repository
            .authors
            .list(page.offset(self.page_size), self.page_size)
            .await
    }

    /// Author with every book they wrote
    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetail> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.books.list_by_author(id).await?;

        Ok(AuthorDetail {
            name: author.to_string(),
            url: author.url(),
            author,
            books,
        })
    }

    pub async fn create_author(&self, claims: &UserClaims, form: AuthorForm) -> AppResult<Author> {
        claims.require(Permission::Add(Resource::Author))?;
        form.validate()?;

        let author = self.repository.authors.create(&form).await?;
        tracing::info!(id = author.id, name = %author, "Author created");
        Ok(author)
    }

    pub async fn update_author(
        &self,
        claims: &UserClaims,
        id: i32,
        form: AuthorForm,
    ) -> AppResult<Author> {
        claims.require(Permission::Change(Resource::Author))?;
        form.validate()?;

        self.repository.authors.update(id, &form).await
    }

    /// Authors with books cannot be deleted
    pub async fn delete_author(&self, claims: &UserClaims, id: i32) -> AppResult<()> {
        claims.require(Permission::Delete(Resource::Author))?;

        self.repository.authors.delete(id).await?;
        tracing::info!(id, "Author deleted");
        Ok(())
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    pub async fn list_books(&self, page: &PageQuery) -> AppResult<(Vec<BookSummary>, i64)> {
        self.repository
            .books
            .list(page.offset(self.page_size), self.page_size)
            .await
    }

    /// Book with its author, language, genres and copies
    pub async fn get_book(&self, id: i32) -> AppResult<BookDetail> {
        let book = self.repository.books.get_by_id(id).await?;
        let author = self.repository.authors.get_by_id(book.author_id).await?;
        let language = self.repository.languages.get_by_id(book.language_id).await?;
        let genres = self.repository.genres.get_for_book(id).await?;

        let today = self.clock.today();
        let instances = self
            .store
            .list_for_book(id)
            .await?
            .into_iter()
            .map(|instance| instance.with_overdue(today))
            .collect();

        Ok(BookDetail {
            url: book.url(),
            display_genre: display_genre(&genres),
            book,
            author,
            language,
            genres,
            instances,
        })
    }

    pub async fn create_book(&self, claims: &UserClaims, form: BookForm) -> AppResult<Book> {
        claims.require(Permission::Add(Resource::Book))?;
        form.validate()?;

        let book = self.repository.books.create(&form).await?;
        tracing::info!(id = book.id, title = %book.title, "Book created");
        Ok(book)
    }

    /// Full replacement, genres included
    pub async fn update_book(&self, claims: &UserClaims, id: i32, form: BookForm) -> AppResult<Book> {
        claims.require(Permission::Change(Resource::Book))?;
        form.validate()?;

        self.repository.books.update(id, &form).await
    }

    /// Deleting a book deletes its copies
    pub async fn delete_book(&self, claims: &UserClaims, id: i32) -> AppResult<()> {
        claims.require(Permission::Delete(Resource::Book))?;

        self.repository.books.delete(id).await?;
        tracing::info!(id, "Book deleted");
        Ok(())
    }

    // =========================================================================
    // GENRES
    // =========================================================================

    pub async fn list_genres(&self, page: &PageQuery) -> AppResult<(Vec<Genre>, i64)> {
        self.repository
            .genres
            .list(page.offset(self.page_size), self.page_size)
            .await
    }

    pub async fn get_genre(&self, id: i32) -> AppResult<Genre> {
        self.repository.genres.get_by_id(id).await
    }

    pub async fn create_genre(&self, claims: &UserClaims, form: GenreForm) -> AppResult<Genre> {
        claims.require(Permission::Add(Resource::Genre))?;
        form.validate()?;

        self.repository.genres.create(&form).await
    }

    pub async fn update_genre(&self, claims: &UserClaims, id: i32, form: GenreForm) -> AppResult<Genre> {
        claims.require(Permission::Change(Resource::Genre))?;
        form.validate()?;

        self.repository.genres.update(id, &form).await
    }

    pub async fn delete_genre(&self, claims: &UserClaims, id: i32) -> AppResult<()> {
        claims.require(Permission::Delete(Resource::Genre))?;

        self.repository.genres.delete(id).await
    }

    // =========================================================================
    // LANGUAGES
    // =========================================================================

    pub async fn list_languages(&self, page: &PageQuery) -> AppResult<(Vec<Language>, i64)> {
        self.repository
            .languages
            .list(page.offset(self.page_size), self.page_size)
            .await
    }

    pub async fn get_language(&self, id: i32) -> AppResult<Language> {
        self.repository.languages.get_by_id(id).await
    }

    pub async fn create_language(&self, claims: &UserClaims, form: LanguageForm) -> AppResult<Language> {
        claims.require(Permission::Add(Resource::Language))?;
        form.validate()?;

        self.repository.languages.create(&form).await
    }

    pub async fn update_language(
        &self,
        claims: &UserClaims,
        id: i32,
        form: LanguageForm,
    ) -> AppResult<Language> {
        claims.require(Permission::Change(Resource::Language))?;
        form.validate()?;

        self.repository.languages.update(id, &form).await
    }

    /// Languages still used by a book cannot be deleted
    pub async fn delete_language(&self, claims: &UserClaims, id: i32) -> AppResult<()> {
        claims.require(Permission::Delete(Resource::Language))?;

        self.repository.languages.delete(id).await
    }
}
