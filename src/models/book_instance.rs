//! Book instance (physical copy) model, loan status and overdue state

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Loan status of a copy, stored as a single character code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum LoanStatus {
    #[serde(rename = "m")]
    Maintenance,
    #[serde(rename = "o")]
    OnLoan,
    #[serde(rename = "a")]
    Available,
    #[serde(rename = "r")]
    Reserved,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }
}

impl Default for LoanStatus {
    fn default() -> Self {
        LoanStatus::Maintenance
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        };
        f.write_str(label)
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "m" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            "r" => Ok(LoanStatus::Reserved),
            other => Err(format!("Invalid loan status code: {}", other)),
        }
    }
}

// SQLx conversion for LoanStatus (CHAR(1) column)
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// A copy is overdue when it has a due date strictly before today.
pub fn is_overdue(due_back: Option<NaiveDate>, today: NaiveDate) -> bool {
    due_back.map_or(false, |due| due < today)
}

/// Check the status/borrower/due date combination of a copy.
///
/// An available copy has neither borrower nor due date, a copy on loan has
/// both. Maintenance and reserved copies are unconstrained.
pub fn check_consistency(
    status: LoanStatus,
    borrower_id: Option<i32>,
    due_back: Option<NaiveDate>,
) -> AppResult<()> {
    match status {
        LoanStatus::Available if borrower_id.is_some() => Err(AppError::field(
            "borrower_id",
            "An available copy cannot have a borrower",
        )),
        LoanStatus::Available if due_back.is_some() => Err(AppError::field(
            "due_back",
            "An available copy cannot have a due date",
        )),
        LoanStatus::OnLoan if borrower_id.is_none() => Err(AppError::field(
            "borrower_id",
            "A copy on loan must have a borrower",
        )),
        LoanStatus::OnLoan if due_back.is_none() => Err(AppError::field(
            "due_back",
            "A copy on loan must have a due date",
        )),
        _ => Ok(()),
    }
}

/// Book instance joined with its book title and borrower name
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    /// Unique id of this copy across the whole library
    pub id: Uuid,
    pub book_id: i32,
    pub book_title: String,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    #[sqlx(default)]
    pub borrower_username: Option<String>,
    pub status: LoanStatus,
    /// Computed against the server clock, not stored
    #[sqlx(skip)]
    #[serde(default)]
    pub is_overdue: bool,
}

impl BookInstance {
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        is_overdue(self.due_back, today)
    }

    /// Fill the computed overdue flag
    pub fn with_overdue(mut self, today: NaiveDate) -> Self {
        self.is_overdue = self.is_overdue(today);
        self
    }

    pub fn url(&self) -> String {
        format!("/api/v1/bookinstances/{}", self.id)
    }
}

impl std::fmt::Display for BookInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.id, self.book_title)
    }
}

/// Create/update book instance request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BookInstanceForm {
    pub book_id: i32,
    #[validate(length(min = 1, max = 200, message = "Imprint must be 1-200 characters"))]
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    #[serde(default)]
    pub status: LoanStatus,
}

impl BookInstanceForm {
    pub fn check_consistency(&self) -> AppResult<()> {
        check_consistency(self.status, self.borrower_id, self.due_back)
    }
}

/// Proposed new due date for a renewal
#[derive(Debug, Deserialize, ToSchema)]
pub struct RenewRequest {
    pub due_back: NaiveDate,
}

/// Renewal form: the copy and the suggested due date
#[derive(Debug, Serialize, ToSchema)]
pub struct RenewalForm {
    pub instance: BookInstance,
    pub proposed_due_back: NaiveDate,
}

/// Lend a copy to a member
#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub borrower_id: i32,
    /// Defaults to the standard loan period
    pub due_back: Option<NaiveDate>,
}
