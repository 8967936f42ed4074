//! Statistics endpoints

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppResult;

use super::AuthenticatedUser;

/// Statistics response
#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    /// Book statistics
    pub books: BookStats,
    /// Request statistics
    pub requests: RequestStats,
    /// Borrow statistics
    pub borrows: BorrowStats,
    /// User statistics
    pub users: UserStats,
}

#[derive(Serialize, ToSchema)]
pub struct BookStats {
    /// Total number of books in the catalog
    pub total: i64,
    /// Copies currently available across all books
    pub copies_available: i64,
}

#[derive(Serialize, ToSchema)]
pub struct RequestStats {
    /// Requests awaiting review
    pub pending: i64,
}

#[derive(Serialize, ToSchema)]
pub struct BorrowStats {
    /// Borrows currently out (active or overdue)
    pub out: i64,
    /// Borrows past their due date
    pub overdue: i64,
    /// Books returned today
    pub returned_today: i64,
}

#[derive(Serialize, ToSchema)]
pub struct UserStats {
    /// Total number of profiles
    pub total: i64,
    /// Profiles holding the admin role
    pub admins: i64,
    /// Admin requests awaiting review
    pub pending_admin_requests: i64,
}

/// Get library statistics (admin)
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Library statistics", body = StatsResponse),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<StatsResponse>> {
    claims.require_admin()?;

    let stats = state.services.stats.get_stats().await?;
    Ok(Json(stats))
}
