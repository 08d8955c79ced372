//! Language model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Natural language a book is written in. Names are unique.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Language {
    pub id: i32,
    pub name: String,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Create/update language request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LanguageForm {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_name() {
        let language = Language {
            id: 1,
            name: "English".to_string(),
        };
        assert_eq!(language.to_string(), "English");
    }

    #[test]
    fn test_form_rejects_empty_name() {
        assert!(LanguageForm { name: String::new() }.validate().is_err());
        assert!(LanguageForm { name: "x".repeat(201) }.validate().is_err());
    }
}
