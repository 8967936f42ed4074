//! Admin role request endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::admin_request::{AdminApprovalRequest, AdminRequestWithUser},
};

use super::AuthenticatedUser;

/// Request administrator access
#[utoipa::path(
    post,
    path = "/admin-requests",
    tag = "admin-requests",
    security(("bearer_auth" = [])),
    responses(
        (status = 201, description = "Request submitted (a repeat request returns the existing one)", body = AdminApprovalRequest),
        (status = 409, description = "Caller already has administrator access")
    )
)]
pub async fn request_admin_access(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<(StatusCode, Json<AdminApprovalRequest>)> {
    let request = state
        .services
        .admin_approval
        .request_access(claims.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// Get the authenticated user's admin request
#[utoipa::path(
    get,
    path = "/admin-requests/me",
    tag = "admin-requests",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own admin request, or null when never requested", body = AdminApprovalRequest),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn my_admin_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Option<AdminApprovalRequest>>> {
    let request = state
        .services
        .admin_approval
        .status_for_user(claims.user_id)
        .await?;
    Ok(Json(request))
}

/// List pending admin requests (admin)
#[utoipa::path(
    get,
    path = "/admin-requests/pending",
    tag = "admin-requests",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Pending admin requests, newest first", body = Vec<AdminRequestWithUser>),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn list_pending_admin_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<AdminRequestWithUser>>> {
    claims.require_admin()?;

    let requests = state.services.admin_approval.list_pending().await?;
    Ok(Json(requests))
}

/// Approve an admin request and promote the requester (admin)
#[utoipa::path(
    post,
    path = "/admin-requests/{id}/approve",
    tag = "admin-requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Admin request ID")
    ),
    responses(
        (status = 200, description = "Request approved, requester promoted", body = AdminApprovalRequest),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request no longer pending")
    )
)]
pub async fn approve_admin_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AdminApprovalRequest>> {
    claims.require_admin()?;

    let approved = state
        .services
        .admin_approval
        .approve(id, claims.user_id)
        .await?;
    Ok(Json(approved))
}

/// Reject an admin request (admin)
#[utoipa::path(
    post,
    path = "/admin-requests/{id}/reject",
    tag = "admin-requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Admin request ID")
    ),
    responses(
        (status = 200, description = "Request rejected", body = AdminApprovalRequest),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request no longer pending")
    )
)]
pub async fn reject_admin_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AdminApprovalRequest>> {
    claims.require_admin()?;

    let rejected = state
        .services
        .admin_approval
        .reject(id, claims.user_id)
        .await?;
    Ok(Json(rejected))
}
