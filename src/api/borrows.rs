//! Borrow ledger endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::borrow::{BorrowRecord, BorrowWithBook, BorrowWithContext},
};

use super::AuthenticatedUser;

/// Return response with the closed record
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    /// Return status
    pub status: String,
    /// The closed borrow record
    pub borrow: BorrowRecord,
}

/// Sweep response
#[derive(Serialize, ToSchema)]
pub struct SweepResponse {
    /// Number of borrows transitioned to overdue
    pub marked_overdue: u64,
}

/// List the authenticated user's borrow records
#[utoipa::path(
    get,
    path = "/borrows",
    tag = "borrows",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own borrow records, newest first", body = Vec<BorrowWithBook>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_my_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowWithBook>>> {
    let borrows = state.services.borrows.list_for_user(claims.user_id).await?;
    Ok(Json(borrows))
}

/// List all borrow records (admin)
#[utoipa::path(
    get,
    path = "/borrows/all",
    tag = "borrows",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All borrow records, newest first", body = Vec<BorrowWithContext>),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn list_all_borrows(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowWithContext>>> {
    claims.require_admin()?;

    let borrows = state.services.borrows.list_all().await?;
    Ok(Json(borrows))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/borrows/{id}/return",
    tag = "borrows",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Borrow record ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 403, description = "Not the borrower"),
        (status = 404, description = "Borrow record not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_borrow(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ReturnResponse>> {
    let borrow = state
        .services
        .borrows
        .return_borrow(id, claims.user_id, claims.is_admin())
        .await?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        borrow,
    }))
}

/// Run the overdue sweep now (admin)
#[utoipa::path(
    post,
    path = "/borrows/sweep",
    tag = "borrows",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Sweep complete", body = SweepResponse),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn sweep_overdue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<SweepResponse>> {
    claims.require_admin()?;

    let marked_overdue = state.services.sweeper.sweep_overdue(Utc::now()).await?;
    Ok(Json(SweepResponse { marked_overdue }))
}
