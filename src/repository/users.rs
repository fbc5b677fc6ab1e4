//! Users repository

use async_trait::async_trait;
use chrono::Utc;

use super::postgres::PgUnitOfWork;
use crate::{
    error::AppResult,
    models::user::{NewUser, User},
};

#[async_trait]
pub trait UserStore: Send {
    async fn user_by_id(&mut self, user_id: i32) -> AppResult<Option<User>>;
    /// Case-insensitive lookup, deleted users included
    async fn user_by_email(&mut self, email: &str) -> AppResult<Option<User>>;
    async fn user_insert(&mut self, user: &NewUser) -> AppResult<User>;
    /// Write every mutable column of `user` back to its row
    async fn user_save(&mut self, user: &User) -> AppResult<Option<User>>;
    async fn user_mark_deleted(&mut self, user_id: i32) -> AppResult<Option<User>>;
}

#[async_trait]
impl UserStore for PgUnitOfWork {
    async fn user_by_id(&mut self, user_id: i32) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(user)
    }

    async fn user_by_email(&mut self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(user)
    }

    async fn user_insert(&mut self, user: &NewUser) -> AppResult<User> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password, first_name, last_name, phone, address,
                               admin, deleted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE, $8, $8)
            RETURNING *
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(user.admin)
        .bind(now)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn user_save(&mut self, user: &User) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                email = $2, password = $3, first_name = $4, last_name = $5,
                phone = $6, address = $7, admin = $8, updated_at = $9
            WHERE user_id = $1
            RETURNING *
            "#,
        )
        .bind(user.user_id)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .bind(&user.address)
        .bind(user.admin)
        .bind(Utc::now())
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn user_mark_deleted(&mut self, user_id: i32) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            "UPDATE users SET deleted = TRUE, updated_at = $2 WHERE user_id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(Utc::now())
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }
}
