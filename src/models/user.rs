//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::error::AppError;

/// Full user model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: i32,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub admin: bool,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Register user request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "The first name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "The last name is required"))]
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Update user request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUser {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    #[validate(length(min = 1, message = "The first name cannot be empty"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, message = "The last name cannot be empty"))]
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Only honored when the caller is an admin
    pub admin: Option<bool>,
}

/// Row values for a new user; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub admin: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub user: User,
}

/// JWT Claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    pub user_id: i32,
    pub admin: bool,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Require admin privileges
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.admin {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    /// Require the caller to be the given user
    pub fn require_self(&self, user_id: i32) -> Result<(), AppError> {
        if self.user_id == user_id {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Not allowed to access another user's data".to_string(),
            ))
        }
    }

    /// Require the caller to be the given user or an admin
    pub fn require_self_or_admin(&self, user_id: i32) -> Result<(), AppError> {
        if self.admin {
            return Ok(());
        }
        self.require_self(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(user_id: i32, admin: bool) -> UserClaims {
        let now = Utc::now().timestamp();
        UserClaims {
            sub: format!("user{}@example.com", user_id),
            user_id,
            admin,
            exp: now + 3600,
            iat: now,
        }
    }

    #[test]
    fn test_token_roundtrip() {
        let token = claims(7, false).create_token("secret").unwrap();
        let parsed = UserClaims::from_token(&token, "secret").unwrap();
        assert_eq!(parsed.user_id, 7);
        assert!(!parsed.admin);
        assert!(UserClaims::from_token(&token, "other-secret").is_err());
    }

    #[test]
    fn test_access_checks() {
        let reader = claims(3, false);
        assert!(reader.require_self(3).is_ok());
        assert!(reader.require_self(4).is_err());
        assert!(reader.require_self_or_admin(4).is_err());
        assert!(reader.require_admin().is_err());

        let admin = claims(1, true);
        assert!(admin.require_self_or_admin(4).is_ok());
        assert!(admin.require_admin().is_ok());
        // GET /user/:id stays self-only even for admins
        assert!(admin.require_self(4).is_err());
    }

    #[test]
    fn test_password_not_serialized() {
        let now = Utc::now();
        let user = User {
            user_id: 1,
            email: "a@b.cl".into(),
            password: "hash".into(),
            first_name: "Ana".into(),
            last_name: "Pérez".into(),
            phone: None,
            address: None,
            admin: false,
            deleted: false,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["email"], "a@b.cl");
    }
}
