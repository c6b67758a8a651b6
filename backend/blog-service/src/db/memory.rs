//! In-process storage backend.
//!
//! Implements every repository trait on `DashMap`s. Uniqueness (usernames, API
//! keys, custom domains, per-owner slugs, subscriptions) is enforced by claiming
//! an index entry before the row is written, so concurrent requests cannot both
//! win. Used by the integration tests and by `STORAGE_BACKEND=memory`.

use super::{CommentRepository, PostRepository, SubscriptionRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::models::{Comment, NewComment, NewPost, NewUser, Post, Subscription, User};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

#[derive(Default)]
pub struct MemoryStore {
    next_id: AtomicI64,
    users: DashMap<i64, User>,
    usernames: DashMap<String, i64>,
    api_keys: DashMap<String, i64>,
    custom_domains: DashMap<String, i64>,
    posts: DashMap<i64, Post>,
    post_slugs: DashMap<(i64, String), i64>,
    comments: DashMap<i64, Comment>,
    subscriptions: DashMap<(i64, String), Subscription>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Row lock on a user. Updates go through the guard so concurrent
    /// writers to the same user serialize instead of overwriting each other.
    fn user_mut(&self, user_id: i64) -> Result<RefMut<'_, i64, User>> {
        self.users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))
    }

    fn user_by_index(&self, index: &DashMap<String, i64>, key: &str) -> Option<User> {
        let user_id = index.get(key).map(|id| *id.value())?;
        self.users.get(&user_id).map(|u| u.value().clone())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.user_by_index(&self.usernames, username))
    }

    async fn find_by_custom_domain(&self, domain: &str) -> Result<Option<User>> {
        Ok(self.user_by_index(&self.custom_domains, domain))
    }

    async fn find_by_api_key(&self, api_key: &str) -> Result<Option<User>> {
        Ok(self.user_by_index(&self.api_keys, api_key))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        let slot = match self.usernames.entry(new_user.username.clone()) {
            Entry::Occupied(_) => return Err(AppError::Conflict("user already exists".into())),
            Entry::Vacant(slot) => slot,
        };

        let user = User {
            id: self.next_id(),
            username: new_user.username,
            email: new_user.email,
            comments_on: false,
            api_key: new_user.api_key,
            custom_domain: None,
            created_at: Utc::now(),
        };

        slot.insert(user.id);
        self.api_keys.insert(user.api_key.clone(), user.id);
        self.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn set_api_key(&self, user_id: i64, api_key: &str) -> Result<()> {
        let mut user = self.user_mut(user_id)?;

        self.api_keys.remove(&user.api_key);
        self.api_keys.insert(api_key.to_string(), user_id);
        user.api_key = api_key.to_string();

        Ok(())
    }

    async fn set_comments_on(&self, user_id: i64, comments_on: bool) -> Result<User> {
        let mut user = self.user_mut(user_id)?;
        user.comments_on = comments_on;

        Ok(user.value().clone())
    }

    async fn set_custom_domain(&self, user_id: i64, domain: Option<String>) -> Result<User> {
        let mut user = self.user_mut(user_id)?;

        if user.custom_domain == domain {
            return Ok(user.value().clone());
        }

        if let Some(domain) = &domain {
            match self.custom_domains.entry(domain.clone()) {
                Entry::Occupied(held) if *held.get() != user_id => {
                    return Err(AppError::Conflict("custom domain already exists".into()))
                }
                Entry::Occupied(_) => {}
                Entry::Vacant(slot) => {
                    slot.insert(user_id);
                }
            }
        }

        if let Some(previous) = user.custom_domain.take() {
            self.custom_domains.remove(&previous);
        }
        user.custom_domain = domain;

        Ok(user.value().clone())
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn find_post_by_slug(&self, owner_id: i64, slug: &str) -> Result<Option<Post>> {
        let Some(post_id) = self
            .post_slugs
            .get(&(owner_id, slug.to_string()))
            .map(|id| *id.value())
        else {
            return Ok(None);
        };

        Ok(self.posts.get(&post_id).map(|p| p.value().clone()))
    }

    async fn create_post(&self, new_post: NewPost) -> Result<Post> {
        let slot = match self
            .post_slugs
            .entry((new_post.owner_id, new_post.slug.clone()))
        {
            Entry::Occupied(_) => {
                return Err(AppError::Conflict(
                    "post with this slug already exists".into(),
                ))
            }
            Entry::Vacant(slot) => slot,
        };

        let post = Post {
            id: self.next_id(),
            owner_id: new_post.owner_id,
            title: new_post.title,
            slug: new_post.slug,
            body: new_post.body,
            created_at: Utc::now(),
        };

        slot.insert(post.id);
        self.posts.insert(post.id, post.clone());

        Ok(post)
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create_comment(&self, new_comment: NewComment) -> Result<Comment> {
        let comment = Comment {
            id: self.next_id(),
            post_id: new_comment.post_id,
            name: new_comment.name,
            email: new_comment.email,
            body: new_comment.body,
            is_approved: false,
            created_at: Utc::now(),
        };
        self.comments.insert(comment.id, comment.clone());

        Ok(comment)
    }

    async fn find_comment(&self, post_id: i64, comment_id: i64) -> Result<Option<Comment>> {
        Ok(self
            .comments
            .get(&comment_id)
            .filter(|c| c.post_id == post_id)
            .map(|c| c.value().clone()))
    }

    async fn list_comments(&self, post_id: i64, approved: bool) -> Result<Vec<Comment>> {
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|c| c.post_id == post_id && c.is_approved == approved)
            .map(|c| c.value().clone())
            .collect();
        comments.sort_by_key(|c| (c.created_at, c.id));

        Ok(comments)
    }

    async fn approve_comment(&self, comment_id: i64) -> Result<Option<Comment>> {
        Ok(self.comments.get_mut(&comment_id).map(|mut c| {
            c.is_approved = true;
            c.value().clone()
        }))
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<bool> {
        Ok(self.comments.remove(&comment_id).is_some())
    }

    async fn count_comments(&self, post_id: i64) -> Result<i64> {
        Ok(self
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .count() as i64)
    }
}

#[async_trait]
impl SubscriptionRepository for MemoryStore {
    async fn subscribe(&self, blog_user_id: i64, email: &str) -> Result<(Subscription, bool)> {
        match self.subscriptions.entry((blog_user_id, email.to_string())) {
            Entry::Occupied(existing) => Ok((existing.get().clone(), false)),
            Entry::Vacant(slot) => {
                let subscription = Subscription {
                    id: self.next_id(),
                    blog_user_id,
                    email: email.to_string(),
                    created_at: Utc::now(),
                };
                slot.insert(subscription.clone());
                Ok((subscription, true))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_user(username: &str, api_key: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            api_key: api_key.to_string(),
        }
    }

    #[tokio::test]
    async fn usernames_are_unique() {
        let store = MemoryStore::new();
        store.create_user(new_user("alice", "k1")).await.unwrap();

        let err = store.create_user(new_user("alice", "k2")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(store.find_by_api_key("k2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn api_key_reset_drops_old_key() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("alice", "old")).await.unwrap();

        store.set_api_key(alice.id, "new").await.unwrap();

        assert!(store.find_by_api_key("old").await.unwrap().is_none());
        assert_eq!(
            store.find_by_api_key("new").await.unwrap().map(|u| u.id),
            Some(alice.id)
        );
    }

    #[tokio::test]
    async fn custom_domains_are_exclusive() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("alice", "a")).await.unwrap();
        let bob = store.create_user(new_user("bob", "b")).await.unwrap();

        store
            .set_custom_domain(alice.id, Some("alice.blog".into()))
            .await
            .unwrap();
        let err = store
            .set_custom_domain(bob.id, Some("alice.blog".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        store
            .set_custom_domain(alice.id, Some("alice.dev".into()))
            .await
            .unwrap();
        assert!(store.find_by_custom_domain("alice.blog").await.unwrap().is_none());
        store
            .set_custom_domain(bob.id, Some("alice.blog".into()))
            .await
            .unwrap();
        assert_eq!(
            store
                .find_by_custom_domain("alice.blog")
                .await
                .unwrap()
                .map(|u| u.username),
            Some("bob".to_string())
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_user_updates_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        let alice_id = store.create_user(new_user("alice", "k0")).await.unwrap().id;

        let mut tasks = Vec::new();
        for i in 1..=50 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.set_api_key(alice_id, &format!("k{}", i)).await.unwrap();
                store
                    .set_custom_domain(alice_id, Some(format!("alice{}.blog", i)))
                    .await
                    .unwrap();
            }));
        }
        let toggle = {
            let store = store.clone();
            tokio::spawn(async move { store.set_comments_on(alice_id, true).await.unwrap() })
        };

        for task in tasks {
            task.await.unwrap();
        }
        toggle.await.unwrap();

        let user = store.users.get(&alice_id).unwrap().value().clone();
        assert!(user.comments_on);

        // Exactly one key and one domain still point at alice, and they are hers
        assert_eq!(store.api_keys.len(), 1);
        assert_eq!(store.api_keys.get(&user.api_key).map(|id| *id), Some(alice_id));
        assert_eq!(store.custom_domains.len(), 1);
        let domain = user.custom_domain.clone().unwrap();
        assert_eq!(store.custom_domains.get(&domain).map(|id| *id), Some(alice_id));
    }

    #[tokio::test]
    async fn comments_are_scoped_to_their_post() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("alice", "a")).await.unwrap();
        let first = store
            .create_post(NewPost {
                owner_id: alice.id,
                title: "One".into(),
                slug: "one".into(),
                body: String::new(),
            })
            .await
            .unwrap();
        let second = store
            .create_post(NewPost {
                owner_id: alice.id,
                title: "Two".into(),
                slug: "two".into(),
                body: String::new(),
            })
            .await
            .unwrap();

        let comment = store
            .create_comment(NewComment {
                post_id: first.id,
                name: "Jon".into(),
                email: None,
                body: "Hi".into(),
            })
            .await
            .unwrap();

        assert!(!comment.is_approved);
        assert!(store.find_comment(second.id, comment.id).await.unwrap().is_none());
        assert_eq!(store.count_comments(first.id).await.unwrap(), 1);
        assert!(store.list_comments(first.id, true).await.unwrap().is_empty());

        store.approve_comment(comment.id).await.unwrap();
        assert_eq!(store.list_comments(first.id, true).await.unwrap().len(), 1);

        assert!(store.delete_comment(comment.id).await.unwrap());
        assert!(!store.delete_comment(comment.id).await.unwrap());
        assert_eq!(store.count_comments(first.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_slug_per_owner_conflicts() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("alice", "a")).await.unwrap();
        let bob = store.create_user(new_user("bob", "b")).await.unwrap();
        let post = |owner_id| NewPost {
            owner_id,
            title: "Hello".into(),
            slug: "hello".into(),
            body: String::new(),
        };

        store.create_post(post(alice.id)).await.unwrap();
        store.create_post(post(bob.id)).await.unwrap();
        assert!(matches!(
            store.create_post(post(alice.id)).await.unwrap_err(),
            AppError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn subscribing_twice_is_idempotent() {
        let store = MemoryStore::new();
        let (first, created) = store.subscribe(1, "r@example.com").await.unwrap();
        assert!(created);
        let (again, created) = store.subscribe(1, "r@example.com").await.unwrap();
        assert!(!created);
        assert_eq!(first.id, again.id);
    }
}
