//! Authentication and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use std::sync::Arc;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{CreateUser, LoginResponse, NewUser, UpdateUser, User, UserClaims},
    repository::Repository,
};

#[derive(Clone)]
pub struct UsersService {
    repository: Arc<dyn Repository>,
    config: AuthConfig,
}

fn user_not_found(user_id: i32) -> AppError {
    AppError::NotFound(format!("User {} not found", user_id))
}

impl UsersService {
    pub fn new(repository: Arc<dyn Repository>, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Register a new (non-admin) account
    pub async fn register(&self, request: CreateUser) -> AppResult<User> {
        let email = request.email.trim().to_string();
        let mut uow = self.repository.begin().await?;
        if uow.user_by_email(&email).await?.is_some() {
            tracing::warn!("Registration rejected, email already used: {}", email);
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let new_user = NewUser {
            email,
            password_hash: self.hash_password(&request.password)?,
            first_name: request.first_name,
            last_name: request.last_name,
            phone: request.phone,
            address: request.address,
            admin: false,
        };
        let user = uow.user_insert(&new_user).await?;
        uow.commit().await?;

        tracing::info!("User registered: id={} email={}", user.user_id, user.email);
        Ok(user)
    }

    /// Authenticate by email and password and issue a JWT
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<LoginResponse> {
        let mut uow = self.repository.begin().await?;
        let user = uow
            .user_by_email(email.trim())
            .await?
            .filter(|user| !user.deleted)
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !self.verify_password(&user, password)? {
            tracing::warn!("Failed login for user {}", user.user_id);
            return Err(AppError::Authentication("Invalid email or password".to_string()));
        }

        let token = self.create_token_for_user(&user)?;
        tracing::info!("User {} logged in", user.user_id);
        Ok(LoginResponse {
            token,
            token_type: "Bearer".to_string(),
            user,
        })
    }

    /// A user's own account
    pub async fn get(&self, caller: &UserClaims, user_id: i32) -> AppResult<User> {
        caller.require_self(user_id)?;
        let mut uow = self.repository.begin().await?;
        uow.user_by_id(user_id)
            .await?
            .ok_or_else(|| user_not_found(user_id))
    }

    /// Update an account, by its owner or an admin. Only admins may change
    /// the admin flag.
    pub async fn update(&self, caller: &UserClaims, user_id: i32, changes: UpdateUser) -> AppResult<User> {
        caller.require_self_or_admin(user_id)?;
        if changes.admin.is_some() {
            caller.require_admin()?;
        }

        let mut uow = self.repository.begin().await?;
        let mut user = uow
            .user_by_id(user_id)
            .await?
            .ok_or_else(|| user_not_found(user_id))?;

        if let Some(email) = changes.email {
            let email = email.trim().to_string();
            if let Some(other) = uow.user_by_email(&email).await? {
                if other.user_id != user_id {
                    return Err(AppError::Conflict("Email already registered".to_string()));
                }
            }
            user.email = email;
        }
        if let Some(password) = changes.password {
            user.password = self.hash_password(&password)?;
        }
        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if changes.phone.is_some() {
            user.phone = changes.phone;
        }
        if changes.address.is_some() {
            user.address = changes.address;
        }
        if let Some(admin) = changes.admin {
            user.admin = admin;
        }

        let user = uow
            .user_save(&user)
            .await?
            .ok_or_else(|| user_not_found(user_id))?;
        uow.commit().await?;

        tracing::info!("User {} updated by {}", user_id, caller.user_id);
        Ok(user)
    }

    /// Soft delete an account; admins only
    pub async fn delete(&self, caller: &UserClaims, user_id: i32) -> AppResult<User> {
        caller.require_admin()?;
        let mut uow = self.repository.begin().await?;
        let user = uow
            .user_mark_deleted(user_id)
            .await?
            .ok_or_else(|| user_not_found(user_id))?;
        uow.commit().await?;

        tracing::info!("User {} deleted by {}", user_id, caller.user_id);
        Ok(user)
    }

    fn create_token_for_user(&self, user: &User) -> AppResult<String> {
        let now = Utc::now().timestamp();
        let exp = now + (self.config.jwt_expiration_hours as i64 * 3600);

        let claims = UserClaims {
            sub: user.email.clone(),
            user_id: user.user_id,
            admin: user.admin,
            exp,
            iat: now,
        };

        claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    fn verify_password(&self, user: &User, password: &str) -> AppResult<bool> {
        let parsed_hash = PasswordHash::new(&user.password)
            .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;

        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash password using Argon2
    pub fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
        Ok(hash.to_string())
    }
}
