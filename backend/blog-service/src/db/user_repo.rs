use super::{map_unique_violation, UserRepository};
use crate::error::{AppError, Result};
use crate::models::{NewUser, User};
use async_trait::async_trait;
use sqlx::PgPool;

const USER_COLUMNS: &str = "id, username, email, comments_on, api_key, custom_domain, created_at";

/// PostgreSQL repository for tenant accounts
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_by(&self, column: &str, value: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, column);
        let user = sqlx::query_as::<_, User>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_by("username", username).await
    }

    async fn find_by_custom_domain(&self, domain: &str) -> Result<Option<User>> {
        self.find_by("custom_domain", domain).await
    }

    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.find_by("api_key", api_key).await
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let query = format!(
            r#"
            INSERT INTO users (username, email, api_key)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(&new_user.username)
            .bind(&new_user.email)
            .bind(&new_user.api_key)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "user"))
    }

    async fn set_api_key(&self, user_id: i64, api_key: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET api_key = $1 WHERE id = $2")
            .bind(api_key)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("user {}", user_id)));
        }
        Ok(())
    }

    async fn set_comments_on(&self, user_id: i64, comments_on: bool) -> Result<User> {
        let query = format!(
            "UPDATE users SET comments_on = $1 WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(comments_on)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))
    }

    async fn set_custom_domain(&self, user_id: i64, domain: Option<String>) -> Result<User> {
        let query = format!(
            "UPDATE users SET custom_domain = $1 WHERE id = $2 RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(domain)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "custom domain"))?
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))
    }
}
