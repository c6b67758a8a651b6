use super::SubscriptionRepository;
use crate::error::Result;
use crate::models::Subscription;
use async_trait::async_trait;
use sqlx::PgPool;

/// PostgreSQL repository for blog email subscriptions
#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn subscribe(&self, blog_user_id: i64, email: &str) -> Result<(Subscription, bool)> {
        let inserted = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (blog_user_id, email)
            VALUES ($1, $2)
            ON CONFLICT (blog_user_id, email) DO NOTHING
            RETURNING id, blog_user_id, email, created_at
            "#,
        )
        .bind(blog_user_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(subscription) = inserted {
            return Ok((subscription, true));
        }

        let existing = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, blog_user_id, email, created_at
            FROM subscriptions
            WHERE blog_user_id = $1 AND email = $2
            "#,
        )
        .bind(blog_user_id)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok((existing, false))
    }
}
