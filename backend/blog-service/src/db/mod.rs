/// Database access layer
///
/// Storage is reached only through the repository traits below, so the
/// PostgreSQL implementations can be swapped for the in-memory store.
use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::models::{Comment, NewComment, NewPost, NewUser, Post, Subscription, User};
use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub mod comment_repo;
pub mod memory;
pub mod post_repo;
pub mod subscription_repo;
pub mod user_repo;

pub use comment_repo::PgCommentRepository;
pub use memory::MemoryStore;
pub use post_repo::PgPostRepository;
pub use subscription_repo::PgSubscriptionRepository;
pub use user_repo::PgUserRepository;

/// Tenant accounts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_by_custom_domain(&self, domain: &str) -> Result<Option<User>>;

    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<User>>;

    /// Fails with `AppError::Conflict` when the username is taken
    async fn create_user(&self, new_user: NewUser) -> Result<User>;

    async fn set_api_key(&self, user_id: i64, api_key: &str) -> Result<()>;

    async fn set_comments_on(&self, user_id: i64, comments_on: bool) -> Result<User>;

    /// Fails with `AppError::Conflict` when another user holds the domain
    async fn set_custom_domain(&self, user_id: i64, domain: Option<String>) -> Result<User>;
}

/// Posts, always scoped to their owner
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_post_by_slug(&self, owner_id: i64, slug: &str) -> Result<Option<Post>>;

    /// Fails with `AppError::Conflict` when the owner already has the slug
    async fn create_post(&self, new_post: NewPost) -> Result<Post>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Persist a comment; new comments are never approved
    async fn create_comment(&self, new_comment: NewComment) -> Result<Comment>;

    /// Comment `comment_id` if it belongs to `post_id`
    async fn find_comment(&self, post_id: i64, comment_id: i64) -> Result<Option<Comment>>;

    /// Comments of a post with the given approval state, oldest first
    async fn list_comments(&self, post_id: i64, approved: bool) -> Result<Vec<Comment>>;

    async fn approve_comment(&self, comment_id: i64) -> Result<Option<Comment>>;

    /// Returns whether a row was removed
    async fn delete_comment(&self, comment_id: i64) -> Result<bool>;

    async fn count_comments(&self, post_id: i64) -> Result<i64>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Returns the subscription and whether it was newly created
    async fn subscribe(&self, blog_user_id: i64, email: &str) -> Result<(Subscription, bool)>;
}

/// Create the PostgreSQL pool and apply pending migrations
pub async fn connect(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(&config.url)
        .await
        .context("failed to connect to PostgreSQL")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("failed to run database migrations")?;

    Ok(pool)
}

/// Maps a unique-constraint violation to `Conflict`, anything else to `Database`
pub(crate) fn map_unique_violation(err: sqlx::Error, what: &str) -> crate::error::AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            crate::error::AppError::Conflict(format!("{} already exists", what))
        }
        _ => err.into(),
    }
}
