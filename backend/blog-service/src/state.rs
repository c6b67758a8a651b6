use crate::db::{
    CommentRepository, MemoryStore, PgCommentRepository, PgPostRepository,
    PgSubscriptionRepository, PgUserRepository, PostRepository, SubscriptionRepository,
    UserRepository,
};
use sqlx::PgPool;
use std::sync::Arc;

/// Shared handler state: repositories plus tenant addressing
#[derive(Clone)]
pub struct AppState {
    pub canonical_host: String,
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
}

impl AppState {
    pub fn with_postgres(pool: PgPool, canonical_host: impl Into<String>) -> Self {
        Self {
            canonical_host: canonical_host.into(),
            users: Arc::new(PgUserRepository::new(pool.clone())),
            posts: Arc::new(PgPostRepository::new(pool.clone())),
            comments: Arc::new(PgCommentRepository::new(pool.clone())),
            subscriptions: Arc::new(PgSubscriptionRepository::new(pool)),
        }
    }

    pub fn in_memory(store: Arc<MemoryStore>, canonical_host: impl Into<String>) -> Self {
        Self {
            canonical_host: canonical_host.into(),
            users: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
            subscriptions: store,
        }
    }
}
