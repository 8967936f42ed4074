//! Borrow request endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        borrow::BorrowRecord,
        request::{
            ApproveRequest, BorrowRequest, CreateRequest, RejectRequest, RequestQuery,
            RequestWithBook, RequestWithContext,
        },
    },
};

use super::AuthenticatedUser;

/// Approval response with the issued borrow
#[derive(Serialize, ToSchema)]
pub struct ApproveResponse {
    /// The approved request
    pub request: BorrowRequest,
    /// The borrow record issued by the approval
    pub borrow: BorrowRecord,
}

/// Create a borrow request for a book
#[utoipa::path(
    post,
    path = "/requests",
    tag = "requests",
    security(("bearer_auth" = [])),
    request_body = CreateRequest,
    responses(
        (status = 201, description = "Request created", body = BorrowRequest),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Duplicate pending request or no copies available")
    )
)]
pub async fn create_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateRequest>,
) -> AppResult<(StatusCode, Json<BorrowRequest>)> {
    let created = state
        .services
        .requests
        .create_request(claims.user_id, request.book_id)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List the authenticated user's requests
#[utoipa::path(
    get,
    path = "/requests",
    tag = "requests",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own requests, newest first", body = Vec<RequestWithBook>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_my_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<Vec<RequestWithBook>>> {
    let requests = state.services.requests.list_for_user(claims.user_id).await?;
    Ok(Json(requests))
}

/// List all requests (admin)
#[utoipa::path(
    get,
    path = "/requests/all",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(
        ("status" = Option<String>, Query, description = "Filter by status (pending, approved, rejected, cancelled)")
    ),
    responses(
        (status = 200, description = "All requests, newest first", body = Vec<RequestWithContext>),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn list_all_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<RequestQuery>,
) -> AppResult<Json<Vec<RequestWithContext>>> {
    claims.require_admin()?;

    let requests = state.services.requests.list_all(query.status).await?;
    Ok(Json(requests))
}

/// Cancel an own pending request
#[utoipa::path(
    post,
    path = "/requests/{id}/cancel",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Request ID")
    ),
    responses(
        (status = 200, description = "Request cancelled", body = BorrowRequest),
        (status = 403, description = "Not the request owner"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is not pending")
    )
)]
pub async fn cancel_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BorrowRequest>> {
    let cancelled = state
        .services
        .requests
        .cancel_request(id, claims.user_id)
        .await?;
    Ok(Json(cancelled))
}

/// Approve a pending request and issue the borrow (admin)
#[utoipa::path(
    post,
    path = "/requests/{id}/approve",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Request ID")
    ),
    request_body = ApproveRequest,
    responses(
        (status = 200, description = "Request approved, borrow issued", body = ApproveResponse),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request no longer pending or no copies available")
    )
)]
pub async fn approve_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    body: Option<Json<ApproveRequest>>,
) -> AppResult<Json<ApproveResponse>> {
    claims.require_admin()?;

    let approve = body.map(|Json(b)| b).unwrap_or_default();
    let (request, borrow) = state
        .services
        .requests
        .approve_request(id, claims.user_id, approve)
        .await?;

    Ok(Json(ApproveResponse { request, borrow }))
}

/// Reject a pending request (admin)
#[utoipa::path(
    post,
    path = "/requests/{id}/reject",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Request ID")
    ),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Request rejected", body = BorrowRequest),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request no longer pending")
    )
)]
pub async fn reject_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    body: Option<Json<RejectRequest>>,
) -> AppResult<Json<BorrowRequest>> {
    claims.require_admin()?;

    let reject = body.map(|Json(b)| b).unwrap_or_default();
    let rejected = state
        .services
        .requests
        .reject_request(id, claims.user_id, reject)
        .await?;

    Ok(Json(rejected))
}
