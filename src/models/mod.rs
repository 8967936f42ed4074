//! Data models for Jubilee

pub mod admin_request;
pub mod book;
pub mod borrow;
pub mod notification;
pub mod profile;
pub mod request;

// Re-export commonly used types
pub use admin_request::{AdminApprovalRequest, AdminRequestStatus, AdminRequestWithUser};
pub use book::{Book, BookSummary};
pub use borrow::{BorrowRecord, BorrowStatus, BorrowWithBook, BorrowWithContext};
pub use notification::{Notification, NotificationKind};
pub use profile::{Profile, ProfileSummary, Role, UserClaims};
pub use request::{BorrowRequest, RequestStatus, RequestWithBook, RequestWithContext};
