//! Permissions gating catalog operations

use thiserror::Error;

use super::user::UserClaims;
use crate::error::AppError;

/// Catalog entity a CRUD permission applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Author,
    Book,
    Genre,
    Language,
    BookInstance,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Author => "author",
            Resource::Book => "book",
            Resource::Genre => "genre",
            Resource::Language => "language",
            Resource::BookInstance => "bookinstance",
        }
    }
}

/// A named capability, matched by codename against the principal's grants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    /// Renew, lend or return any copy and see every loan ("Set book as returned")
    CanMarkReturned,
    Add(Resource),
    Change(Resource),
    Delete(Resource),
}

impl Permission {
    pub fn codename(&self) -> String {
        match self {
            Permission::CanMarkReturned => "can_mark_returned".to_string(),
            Permission::Add(r) => format!("add_{}", r.as_str()),
            Permission::Change(r) => format!("change_{}", r.as_str()),
            Permission::Delete(r) => format!("delete_{}", r.as_str()),
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.codename())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccessDenied {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Missing permission {0}")]
    Forbidden(String),
}

/// Decide whether `principal` may perform an operation requiring `required`.
pub fn authorize(principal: Option<&UserClaims>, required: Permission) -> Result<(), AccessDenied> {
    let principal = principal.ok_or(AccessDenied::Unauthenticated)?;
    let codename = required.codename();

    if principal.permissions.iter().any(|p| *p == codename) {
        Ok(())
    } else {
        tracing::warn!(user = %principal.sub, permission = %codename, "Permission denied");
        Err(AccessDenied::Forbidden(codename))
    }
}

impl AccessDenied {
    /// Response for a denied request; anonymous callers are sent to `login_location`
    pub fn into_app_error(self, login_location: &str) -> AppError {
        match self {
            AccessDenied::Unauthenticated => AppError::LoginRequired {
                location: login_location.to_string(),
            },
            AccessDenied::Forbidden(_) => AppError::Forbidden(self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(permissions: &[&str]) -> UserClaims {
        UserClaims {
            sub: "testuser".to_string(),
            user_id: 1,
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn test_codenames() {
        assert_eq!(Permission::CanMarkReturned.codename(), "can_mark_returned");
        assert_eq!(Permission::Add(Resource::Author).codename(), "add_author");
        assert_eq!(Permission::Change(Resource::Book).codename(), "change_book");
        assert_eq!(Permission::Delete(Resource::Genre).codename(), "delete_genre");
        assert_eq!(Permission::Add(Resource::Language).codename(), "add_language");
        assert_eq!(
            Permission::Delete(Resource::BookInstance).codename(),
            "delete_bookinstance"
        );
    }

    #[test]
    fn test_unauthenticated() {
        assert_eq!(
            authorize(None, Permission::CanMarkReturned),
            Err(AccessDenied::Unauthenticated)
        );
    }

    #[test]
    fn test_missing_permission_is_forbidden() {
        let user = claims(&["add_book"]);
        assert_eq!(
            authorize(Some(&user), Permission::Add(Resource::Author)),
            Err(AccessDenied::Forbidden("add_author".to_string()))
        );
    }

    #[test]
    fn test_granted_permission() {
        let user = claims(&["add_book", "add_author"]);
        assert!(authorize(Some(&user), Permission::Add(Resource::Author)).is_ok());
        assert!(authorize(Some(&user), Permission::Change(Resource::Author)).is_err());
    }

    #[test]
    fn test_access_denied_into_app_error() {
        assert!(matches!(
            AccessDenied::Forbidden("x".to_string()).into_app_error("/login"),
            AppError::Forbidden(_)
        ));
        match AccessDenied::Unauthenticated.into_app_error("/accounts/login/?next=/api/v1/mybooks") {
            AppError::LoginRequired { location } => {
                assert_eq!(location, "/accounts/login/?next=/api/v1/mybooks")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
