//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{admin_requests, auth, books, borrows, health, notifications, requests, stats};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Jubilee API",
        version = "1.0.0",
        description = "Internal Library Lending Server REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html"),
        contact(name = "Jubilee Team", email = "contact@jubilee-library.local")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        auth::update_my_profile,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        books::reconcile_books,
        // Requests
        requests::create_request,
        requests::list_my_requests,
        requests::list_all_requests,
        requests::cancel_request,
        requests::approve_request,
        requests::reject_request,
        // Borrows
        borrows::list_my_borrows,
        borrows::list_all_borrows,
        borrows::return_borrow,
        borrows::sweep_overdue,
        // Admin requests
        admin_requests::request_admin_access,
        admin_requests::my_admin_request,
        admin_requests::list_pending_admin_requests,
        admin_requests::approve_admin_request,
        admin_requests::reject_admin_request,
        // Notifications
        notifications::list_my_notifications,
        notifications::mark_notification_read,
        // Stats
        stats::get_stats,
    ),
    components(
        schemas(
            // Auth
            auth::AuthResponse,
            crate::models::profile::Profile,
            crate::models::profile::ProfileSummary,
            crate::models::profile::Role,
            crate::models::profile::RegisterProfile,
            crate::models::profile::LoginProfile,
            crate::models::profile::UpdateProfile,
            // Books
            crate::models::book::Book,
            crate::models::book::BookSummary,
            crate::models::book::BookQuery,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            books::ReconcileResponse,
            // Requests
            crate::models::request::BorrowRequest,
            crate::models::request::RequestWithBook,
            crate::models::request::RequestWithContext,
            crate::models::request::RequestStatus,
            crate::models::request::CreateRequest,
            crate::models::request::ApproveRequest,
            crate::models::request::RejectRequest,
            crate::models::request::RequestQuery,
            requests::ApproveResponse,
            // Borrows
            crate::models::borrow::BorrowRecord,
            crate::models::borrow::BorrowWithBook,
            crate::models::borrow::BorrowWithContext,
            crate::models::borrow::BorrowStatus,
            borrows::ReturnResponse,
            borrows::SweepResponse,
            // Admin requests
            crate::models::admin_request::AdminApprovalRequest,
            crate::models::admin_request::AdminRequestWithUser,
            crate::models::admin_request::AdminRequestStatus,
            // Notifications
            crate::models::notification::Notification,
            // Stats
            stats::StatsResponse,
            stats::BookStats,
            stats::RequestStats,
            stats::BorrowStats,
            stats::UserStats,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Authentication endpoints"),
        (name = "books", description = "Book catalog management"),
        (name = "requests", description = "Borrow request lifecycle"),
        (name = "borrows", description = "Borrow ledger and returns"),
        (name = "admin-requests", description = "Admin role requests"),
        (name = "notifications", description = "User notifications"),
        (name = "stats", description = "Statistics")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
