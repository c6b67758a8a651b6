use super::CommentRepository;
use crate::error::Result;
use crate::models::{Comment, NewComment};
use async_trait::async_trait;
use sqlx::PgPool;

/// PostgreSQL repository for comments
#[derive(Clone)]
pub struct PgCommentRepository {
    pool: PgPool,
}

impl PgCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn create_comment(&self, new_comment: NewComment) -> Result<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (post_id, name, email, body, is_approved)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING id, post_id, name, email, body, is_approved, created_at
            "#,
        )
        .bind(new_comment.post_id)
        .bind(&new_comment.name)
        .bind(&new_comment.email)
        .bind(&new_comment.body)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn find_comment(&self, post_id: i64, comment_id: i64) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, name, email, body, is_approved, created_at
            FROM comments
            WHERE id = $1 AND post_id = $2
            "#,
        )
        .bind(comment_id)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn list_comments(&self, post_id: i64, approved: bool) -> Result<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT id, post_id, name, email, body, is_approved, created_at
            FROM comments
            WHERE post_id = $1 AND is_approved = $2
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(post_id)
        .bind(approved)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn approve_comment(&self, comment_id: i64) -> Result<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET is_approved = TRUE
            WHERE id = $1
            RETURNING id, post_id, name, email, body, is_approved, created_at
            "#,
        )
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_comments(&self, post_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
