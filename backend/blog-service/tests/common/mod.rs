//! Shared fixtures for HTTP integration tests
//!
//! Every test gets its own in-memory store seeded with two blogs:
//! `alice` (comments on, owns `hello-world`) and `bob` (comments on, no posts).
#![allow(dead_code)]

use blog_service::db::{CommentRepository, MemoryStore, PostRepository, UserRepository};
use blog_service::models::{Comment, NewComment, NewPost, NewUser, Post, User};
use blog_service::AppState;
use std::sync::Arc;

pub const CANONICAL_HOST: &str = "example.com";
pub const ALICE_HOST: &str = "alice.example.com";
pub const ALICE_KEY: &str = "alice-api-key";
pub const BOB_KEY: &str = "bob-api-key";
pub const POST_SLUG: &str = "hello-world";

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub state: AppState,
    pub alice: User,
    pub bob: User,
    pub post: Post,
}

impl Fixture {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());

        let alice = store
            .create_user(NewUser {
                username: "alice".into(),
                email: "alice@example.com".into(),
                api_key: ALICE_KEY.into(),
            })
            .await
            .unwrap();
        let alice = store.set_comments_on(alice.id, true).await.unwrap();

        let bob = store
            .create_user(NewUser {
                username: "bob".into(),
                email: "bob@example.com".into(),
                api_key: BOB_KEY.into(),
            })
            .await
            .unwrap();
        let bob = store.set_comments_on(bob.id, true).await.unwrap();

        let post = store
            .create_post(NewPost {
                owner_id: alice.id,
                title: "Hello World".into(),
                slug: POST_SLUG.into(),
                body: "First post".into(),
            })
            .await
            .unwrap();

        let state = AppState::in_memory(store.clone(), CANONICAL_HOST);

        Self {
            store,
            state,
            alice,
            bob,
            post,
        }
    }

    pub async fn disable_comments(&self) {
        self.store
            .set_comments_on(self.alice.id, false)
            .await
            .unwrap();
    }

    pub async fn comment_count(&self) -> i64 {
        self.store.count_comments(self.post.id).await.unwrap()
    }

    pub async fn comments(&self) -> Vec<Comment> {
        let mut all = self.store.list_comments(self.post.id, false).await.unwrap();
        all.extend(self.store.list_comments(self.post.id, true).await.unwrap());
        all
    }

    /// Store a comment directly, bypassing the gate
    pub async fn seed_comment(&self, name: &str, body: &str, approved: bool) -> Comment {
        let comment = self
            .store
            .create_comment(NewComment {
                post_id: self.post.id,
                name: name.into(),
                email: Some(format!("{}@example.net", name.to_lowercase())),
                body: body.into(),
            })
            .await
            .unwrap();

        if approved {
            self.store.approve_comment(comment.id).await.unwrap().unwrap()
        } else {
            comment
        }
    }
}

pub fn bearer(key: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", key))
}

/// Build the service the way `main` does, minus CORS and tracing
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state))
                .wrap(blog_service::middleware::ApiKeyAuth)
                .configure(blog_service::handlers::configure),
        )
        .await
    };
}
