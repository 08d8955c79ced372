//! Book (catalog title) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::{author::Author, book_instance::BookInstance, genre::Genre, language::Language};

/// Number of genres shown by `display_genre`
const DISPLAYED_GENRES: usize = 3;

/// Book as stored in the database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    /// Brief description of the book
    pub summary: String,
    /// 13 character ISBN
    pub isbn: String,
    pub language_id: i32,
}

impl Book {
    pub fn url(&self) -> String {
        format!("/api/v1/books/{}", self.id)
    }
}

impl std::fmt::Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

/// Short book representation for lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author_id: i32,
    /// "last_name, first_name" of the author
    pub author_name: String,
}

/// Book with its author, language, genres and copies
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetail {
    #[serde(flatten)]
    pub book: Book,
    pub url: String,
    pub author: Author,
    pub language: Language,
    pub genres: Vec<Genre>,
    pub display_genre: String,
    pub instances: Vec<BookInstance>,
}

/// Create/update book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookForm {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    pub author_id: i32,
    #[validate(length(max = 1000, message = "Summary must be at most 1000 characters"))]
    pub summary: String,
    #[validate(length(min = 1, max = 13, message = "ISBN must be 1-13 characters"))]
    pub isbn: String,
    pub language_id: i32,
    #[serde(default)]
    pub genre_ids: Vec<i32>,
}

/// Genre names of a book for list display, first three only
pub fn display_genre(genres: &[Genre]) -> String {
    genres
        .iter()
        .take(DISPLAYED_GENRES)
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genre(id: i32, name: &str) -> Genre {
        Genre {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_display_genre() {
        let genres = vec![genre(1, "test genre 1"), genre(2, "test genre 2")];
        assert_eq!(display_genre(&genres), "test genre 1, test genre 2");
    }

    #[test]
    fn test_display_genre_truncates() {
        let genres = vec![
            genre(1, "Fantasy"),
            genre(2, "Horror"),
            genre(3, "Poetry"),
            genre(4, "Western"),
        ];
        assert_eq!(display_genre(&genres), "Fantasy, Horror, Poetry");
        assert_eq!(display_genre(&[]), "");
    }

    #[test]
    fn test_display_is_title() {
        let book = Book {
            id: 1,
            title: "test title".to_string(),
            author_id: 1,
            summary: "test summary".to_string(),
            isbn: "9780141439518".to_string(),
            language_id: 1,
        };
        assert_eq!(book.to_string(), "test title");
        assert_eq!(book.url(), "/api/v1/books/1");
    }

    #[test]
    fn test_isbn_max_length() {
        let form = BookForm {
            title: "Title".to_string(),
            author_id: 1,
            summary: String::new(),
            isbn: "97801414395180".to_string(),
            language_id: 1,
            genre_ids: vec![],
        };
        assert!(form.validate().is_err());
    }
}
