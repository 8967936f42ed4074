//! Profiles repository for database operations

use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{is_unique_violation, AppError, AppResult},
    models::profile::{Profile, Role},
};

#[derive(Clone)]
pub struct ProfilesRepository {
    pool: Pool<Postgres>,
}

impl ProfilesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get profile by ID
    pub async fn get_by_id(&self, id: Uuid) -> AppResult<Profile> {
        sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User profile not found".to_string()))
    }

    /// Get profile by email (primary authentication method)
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<Profile>> {
        let profile =
            sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE LOWER(email) = LOWER($1)")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        Ok(profile)
    }

    /// Insert a new profile. Unique collisions on email or username surface
    /// as `Duplicate`.
    pub async fn create(
        &self,
        name: &str,
        username: Option<&str>,
        email: &str,
        password_hash: &str,
        department: Option<&str>,
    ) -> AppResult<Profile> {
        let result = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, name, username, email, password_hash, role, department)
            VALUES ($1, $2, $3, LOWER($4), $5, 'user', $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(department)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(profile) => Ok(profile),
            Err(err) if is_unique_violation(&err) => Err(AppError::Duplicate(
                "Email or username is already registered".to_string(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    /// Insert a profile holding the admin role. Used by the startup
    /// bootstrap; registration always creates plain users.
    pub async fn create_admin(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> AppResult<Profile> {
        let result = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (id, name, email, password_hash, role)
            VALUES ($1, $2, LOWER($3), $4, 'admin')
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(profile) => Ok(profile),
            Err(err) if is_unique_violation(&err) => Err(AppError::Duplicate(
                "Email is already registered".to_string(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    /// Set a profile's role
    pub async fn set_role(&self, id: Uuid, role: Role) -> AppResult<()> {
        let result = sqlx::query("UPDATE profiles SET role = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(role)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User profile not found".to_string()));
        }
        Ok(())
    }

    /// Update profile fields; only provided values change.
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        username: Option<&str>,
        email: Option<&str>,
        department: Option<&str>,
        password_hash: Option<&str>,
    ) -> AppResult<Profile> {
        let result = sqlx::query_as::<_, Profile>(
            r#"
            UPDATE profiles
            SET name = COALESCE($2, name),
                username = COALESCE($3, username),
                email = COALESCE(LOWER($4), email),
                department = COALESCE($5, department),
                password_hash = COALESCE($6, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(username)
        .bind(email)
        .bind(department)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => Err(AppError::NotFound("User profile not found".to_string())),
            Err(err) if is_unique_violation(&err) => Err(AppError::Duplicate(
                "Email or username is already taken".to_string(),
            )),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count profiles holding a given role
    pub async fn count_by_role(&self, role: Role) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE role = $1")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
