//! Books repository for database operations

use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookQuery, CreateBook, UpdateBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    /// Search books with pagination
    pub async fn search(&self, query: &BookQuery) -> AppResult<(Vec<Book>, i64)> {
        let page = query.page.unwrap_or(1).max(1);
        let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;

        let mut conditions = Vec::new();
        let mut params: Vec<String> = Vec::new();

        if let Some(ref search) = query.search {
            params.push(format!("%{}%", search.to_lowercase()));
            conditions.push(format!(
                "(LOWER(title) LIKE ${n} OR LOWER(author) LIKE ${n} OR LOWER(COALESCE(category, '')) LIKE ${n})",
                n = params.len()
            ));
        }

        if let Some(ref category) = query.category {
            params.push(category.to_lowercase());
            conditions.push(format!("LOWER(COALESCE(category, '')) = ${}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let list_sql = format!(
            "SELECT * FROM books {} ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            where_clause,
            params.len() + 1,
            params.len() + 2
        );
        let count_sql = format!("SELECT COUNT(*) FROM books {}", where_clause);

        let mut list_query = sqlx::query_as::<_, Book>(&list_sql);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for param in &params {
            list_query = list_query.bind(param);
            count_query = count_query.bind(param);
        }

        let books = list_query
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let total = count_query.fetch_one(&self.pool).await?;

        Ok((books, total))
    }

    /// Create a new book. Every copy starts on the shelf.
    pub async fn create(&self, book: &CreateBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (id, title, author, category, isbn, description, cover_url,
                               rating, total_copies, available_copies)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(&book.isbn)
        .bind(&book.description)
        .bind(&book.cover_url)
        .bind(book.rating)
        .bind(book.total_copies)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Update a book. A change of `total_copies` shifts `available_copies`
    /// by the same delta and must keep covering the copies currently out.
    pub async fn update(&self, id: Uuid, update: &UpdateBook) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "SELECT total_copies, available_copies FROM books WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

        let total: i32 = row.get("total_copies");
        let available: i32 = row.get("available_copies");
        let outstanding = total - available;

        let (new_total, new_available) = match update.total_copies {
            Some(requested) => {
                if requested < outstanding {
                    return Err(AppError::InvalidState(format!(
                        "Cannot reduce to {} copies while {} are out on loan",
                        requested, outstanding
                    )));
                }
                (requested, requested - outstanding)
            }
            None => (total, available),
        };

        let updated = sqlx::query_as::<_, Book>(
            r#"
            UPDATE books
            SET title = COALESCE($2, title),
                author = COALESCE($3, author),
                category = COALESCE($4, category),
                isbn = COALESCE($5, isbn),
                description = COALESCE($6, description),
                cover_url = COALESCE($7, cover_url),
                rating = COALESCE($8, rating),
                total_copies = $9,
                available_copies = $10,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.title)
        .bind(&update.author)
        .bind(&update.category)
        .bind(&update.isbn)
        .bind(&update.description)
        .bind(&update.cover_url)
        .bind(update.rating)
        .bind(new_total)
        .bind(new_available)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(updated)
    }

    /// Delete a book. Refused while any copy is still out; requests and
    /// returned history go with it (cascade).
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let copies_out: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM borrow_records WHERE book_id = $1 AND status IN ('active', 'overdue'))",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if copies_out {
            return Err(AppError::InvalidState(
                "Cannot delete a book while copies are out on loan".to_string(),
            ));
        }

        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Book not found".to_string()));
        }

        Ok(())
    }

    /// Recompute `available_copies` from the ledger for every book whose
    /// counter has drifted. Returns the number of corrected rows.
    pub async fn reconcile_availability(&self) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE books b
            SET available_copies = GREATEST(b.total_copies - out_counts.n, 0),
                updated_at = NOW()
            FROM (
                SELECT b2.id, COALESCE(COUNT(br.id) FILTER (WHERE br.status IN ('active', 'overdue')), 0)::int AS n
                FROM books b2
                LEFT JOIN borrow_records br ON br.book_id = b2.id
                GROUP BY b2.id
            ) AS out_counts
            WHERE out_counts.id = b.id
              AND b.available_copies IS DISTINCT FROM GREATEST(b.total_copies - out_counts.n, 0)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Count all books
    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Sum of copies currently on the shelf
    pub async fn sum_available(&self) -> AppResult<i64> {
        let sum: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(available_copies), 0) FROM books")
                .fetch_one(&self.pool)
                .await?;
        Ok(sum)
    }
}
