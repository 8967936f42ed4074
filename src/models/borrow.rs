//! Borrow record model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

use super::book::BookSummary;
use super::profile::ProfileSummary;

/// Borrow record lifecycle state.
///
/// `Active` and `Overdue` both count as "out"; only those two can be
/// returned. `Returned` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BorrowStatus {
    Active,
    Overdue,
    Returned,
}

impl BorrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Active => "active",
            BorrowStatus::Overdue => "overdue",
            BorrowStatus::Returned => "returned",
        }
    }
}

impl std::fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BorrowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(BorrowStatus::Active),
            "overdue" => Ok(BorrowStatus::Overdue),
            "returned" => Ok(BorrowStatus::Returned),
            _ => Err(format!("Invalid borrow status: {}", s)),
        }
    }
}

impl From<String> for BorrowStatus {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(BorrowStatus::Active)
    }
}

impl From<&str> for BorrowStatus {
    fn from(s: &str) -> Self {
        s.parse().unwrap_or(BorrowStatus::Active)
    }
}

impl From<BorrowStatus> for String {
    fn from(status: BorrowStatus) -> Self {
        status.as_str().to_string()
    }
}

// SQLx conversion for BorrowStatus
impl sqlx::Type<Postgres> for BorrowStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BorrowStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BorrowStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Borrow record model from database
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct BorrowRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    /// Request this borrow was created from, when it went through approval.
    pub request_id: Option<Uuid>,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub returned_by: Option<Uuid>,
    pub status: BorrowStatus,
}

/// Borrow record with its book, for the borrower's own listing
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowWithBook {
    pub id: Uuid,
    pub status: BorrowStatus,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub book: BookSummary,
}

/// Borrow record with book and borrower, for the admin ledger
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BorrowWithContext {
    pub id: Uuid,
    pub status: BorrowStatus,
    pub issued_at: DateTime<Utc>,
    pub due_at: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub book: BookSummary,
    pub user: ProfileSummary,
}

/// One record transitioned by an overdue sweep, with the contact details
/// needed for the reminder.
#[derive(Debug, Clone, FromRow)]
pub struct OverdueReminder {
    pub borrow_id: Uuid,
    pub user_id: Uuid,
    pub book_id: Uuid,
    pub due_at: DateTime<Utc>,
    pub book_title: String,
    pub user_name: String,
    pub user_email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            BorrowStatus::Active,
            BorrowStatus::Overdue,
            BorrowStatus::Returned,
        ] {
            assert_eq!(status.as_str().parse::<BorrowStatus>().unwrap(), status);
        }
        assert!("lost".parse::<BorrowStatus>().is_err());
    }
}
