use super::{map_unique_violation, PostRepository};
use crate::error::Result;
use crate::models::{NewPost, Post};
use async_trait::async_trait;
use sqlx::PgPool;

/// PostgreSQL repository for posts
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn find_post_by_slug(&self, owner_id: i64, slug: &str) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, owner_id, title, slug, body, created_at
            FROM posts
            WHERE owner_id = $1 AND slug = $2
            "#,
        )
        .bind(owner_id)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (owner_id, title, slug, body)
            VALUES ($1, $2, $3, $4)
            RETURNING id, owner_id, title, slug, body, created_at
            "#,
        )
        .bind(new_post.owner_id)
        .bind(&new_post.title)
        .bind(&new_post.slug)
        .bind(&new_post.body)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "post with this slug"))
    }
}
