//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Accepts ISBN-10 and ISBN-13, hyphens and spaces allowed.
static ISBN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:97[89][-\s]?)?(?:\d[-\s]?){9}[\dXx]$").unwrap());

/// Catalog book with its lending counters
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub category: Option<String>,
    pub isbn: Option<String>,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub rating: Option<f64>,
    /// Copies owned by the library. Always >= 1.
    pub total_copies: i32,
    /// Copies currently on the shelf. Kept within 0..=total_copies by the
    /// lending operations themselves.
    pub available_copies: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short book representation for embedding in request/borrow listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookSummary {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub category: Option<String>,
    pub isbn: Option<String>,
    pub cover_url: Option<String>,
}

/// Create book request (admin)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub author: String,
    pub category: Option<String>,
    #[validate(regex(path = *ISBN_RE, message = "Invalid ISBN"))]
    pub isbn: Option<String>,
    pub description: Option<String>,
    #[validate(url(message = "Invalid cover URL"))]
    pub cover_url: Option<String>,
    #[validate(range(min = 0.0, max = 5.0, message = "Rating must be between 0 and 5"))]
    pub rating: Option<f64>,
    #[validate(range(min = 1, message = "A book needs at least one copy"))]
    pub total_copies: i32,
}

/// Update book request (admin)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Author cannot be empty"))]
    pub author: Option<String>,
    pub category: Option<String>,
    #[validate(regex(path = *ISBN_RE, message = "Invalid ISBN"))]
    pub isbn: Option<String>,
    pub description: Option<String>,
    #[validate(url(message = "Invalid cover URL"))]
    pub cover_url: Option<String>,
    #[validate(range(min = 0.0, max = 5.0, message = "Rating must be between 0 and 5"))]
    pub rating: Option<f64>,
    /// Changing the total adjusts `available_copies` by the same delta; the
    /// new total must still cover the copies currently out.
    #[validate(range(min = 1, message = "A book needs at least one copy"))]
    pub total_copies: Option<i32>,
}

/// Book query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Case-insensitive match against title, author and category
    pub search: Option<String>,
    pub category: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isbn_pattern_accepts_both_lengths() {
        assert!(ISBN_RE.is_match("0306406152"));
        assert!(ISBN_RE.is_match("043942089X"));
        assert!(ISBN_RE.is_match("978-0-306-40615-7"));
        assert!(ISBN_RE.is_match("9780306406157"));
    }

    #[test]
    fn isbn_pattern_rejects_garbage() {
        assert!(!ISBN_RE.is_match("not-an-isbn"));
        assert!(!ISBN_RE.is_match("12345"));
        assert!(!ISBN_RE.is_match("97912345"));
    }

    #[test]
    fn create_book_requires_at_least_one_copy() {
        let book = CreateBook {
            title: "The Pragmatic Programmer".to_string(),
            author: "Hunt & Thomas".to_string(),
            category: None,
            isbn: None,
            description: None,
            cover_url: None,
            rating: None,
            total_copies: 0,
        };
        assert!(book.validate().is_err());
    }
}
