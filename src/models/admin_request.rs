//! Admin role request model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use uuid::Uuid;

use super::profile::ProfileSummary;

/// Admin approval request lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AdminRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl AdminRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminRequestStatus::Pending => "pending",
            AdminRequestStatus::Approved => "approved",
            AdminRequestStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for AdminRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AdminRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(AdminRequestStatus::Pending),
            "approved" => Ok(AdminRequestStatus::Approved),
            "rejected" => Ok(AdminRequestStatus::Rejected),
            _ => Err(format!("Invalid admin request status: {}", s)),
        }
    }
}

impl From<String> for AdminRequestStatus {
    fn from(s: String) -> Self {
        s.parse().unwrap_or(AdminRequestStatus::Pending)
    }
}

impl From<&str> for AdminRequestStatus {
    fn from(s: &str) -> Self {
        s.parse().unwrap_or(AdminRequestStatus::Pending)
    }
}

impl From<AdminRequestStatus> for String {
    fn from(status: AdminRequestStatus) -> Self {
        status.as_str().to_string()
    }
}

// SQLx conversion for AdminRequestStatus
impl sqlx::Type<Postgres> for AdminRequestStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for AdminRequestStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for AdminRequestStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Admin role request from database. One row per user for life; a repeat
/// request surfaces the existing row.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct AdminApprovalRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: AdminRequestStatus,
    pub requested_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
}

/// Pending admin request with its requester, for the review queue
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AdminRequestWithUser {
    pub id: Uuid,
    pub status: AdminRequestStatus,
    pub requested_at: DateTime<Utc>,
    pub user: ProfileSummary,
}
