//! Authentication and profile management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::profile::{LoginProfile, Profile, RegisterProfile, Role, UpdateProfile, UserClaims},
    repository::Repository,
};

use super::read_profile_with_retry;

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Make sure the configured bootstrap admin account exists and holds
    /// the admin role. Runs once at startup.
    pub async fn ensure_admin_account(&self) -> AppResult<()> {
        match self
            .repository
            .profiles
            .find_by_email(&self.config.admin_email)
            .await?
        {
            Some(profile) if profile.role == Role::Admin => Ok(()),
            Some(profile) => {
                tracing::warn!(email = %profile.email, "Promoting bootstrap admin account");
                self.repository
                    .profiles
                    .set_role(profile.id, Role::Admin)
                    .await
            }
            None => {
                let password_hash = self.hash_password(&self.config.admin_password)?;
                let admin = self
                    .repository
                    .profiles
                    .create_admin("Administrator", &self.config.admin_email, &password_hash)
                    .await?;
                tracing::info!(email = %admin.email, "Bootstrap admin account created");
                Ok(())
            }
        }
    }

    /// Register a new profile and log it in
    pub async fn register(&self, register: RegisterProfile) -> AppResult<(String, Profile)> {
        register.validate()?;

        let password_hash = self.hash_password(&register.password)?;
        let profile = self
            .repository
            .profiles
            .create(
                &register.name,
                register.username.as_deref(),
                &register.email,
                &password_hash,
                register.department.as_deref(),
            )
            .await?;

        let token = self.token_for(&profile)?;
        Ok((token, profile))
    }

    /// Authenticate with email and password
    pub async fn login(&self, login: LoginProfile) -> AppResult<(String, Profile)> {
        login.validate()?;

        let profile = self
            .repository
            .profiles
            .find_by_email(&login.email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !self.verify_password(&profile, &login.password)? {
            return Err(AppError::Authentication(
                "Invalid email or password".to_string(),
            ));
        }

        let token = self.token_for(&profile)?;
        Ok((token, profile))
    }

    /// The authenticated user's own profile
    pub async fn me(&self, user_id: Uuid) -> AppResult<Profile> {
        read_profile_with_retry(&self.repository, user_id).await
    }

    /// Update the authenticated user's own profile
    pub async fn update_my_profile(
        &self,
        user_id: Uuid,
        update: UpdateProfile,
    ) -> AppResult<Profile> {
        update.validate()?;

        let profile = self.repository.profiles.get_by_id(user_id).await?;

        // Changing the password requires proving the current one
        let new_hash = if let Some(ref new_password) = update.new_password {
            let current = update.current_password.as_deref().ok_or_else(|| {
                AppError::Validation("Current password required to change password".to_string())
            })?;

            if !self.verify_password(&profile, current)? {
                return Err(AppError::Authentication(
                    "Current password is incorrect".to_string(),
                ));
            }

            Some(self.hash_password(new_password)?)
        } else {
            None
        };

        self.repository
            .profiles
            .update(
                user_id,
                update.name.as_deref(),
                update.username.as_deref(),
                update.email.as_deref(),
                update.department.as_deref(),
                new_hash.as_deref(),
            )
            .await
    }

    /// Verify a password against the stored hash
    fn verify_password(&self, profile: &Profile, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&profile.password_hash)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash a password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }

    fn token_for(&self, profile: &Profile) -> AppResult<String> {
        UserClaims::for_profile(profile, self.config.jwt_expiration_hours)
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }
}
