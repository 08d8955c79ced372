//! Data models for the library catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod language;
pub mod permission;
pub mod user;

// Re-export commonly used types
pub use author::Author;
pub use book::{Book, BookDetail, BookSummary};
pub use book_instance::{BookInstance, LoanStatus};
pub use genre::Genre;
pub use language::Language;
pub use permission::{Permission, Resource};
pub use user::{User, UserClaims};

use serde::Deserialize;
use utoipa::IntoParams;

/// Page selector accepted by every list endpoint
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number (default: 1)
    pub page: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    /// Rows to skip; saturates instead of overflowing on absurd page numbers
    pub fn offset(&self, per_page: i64) -> i64 {
        (self.page() - 1).saturating_mul(per_page)
    }
}
