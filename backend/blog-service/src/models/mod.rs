/// Data models for blog-service
///
/// - User: a tenant account, owner of posts
/// - Post: a blog post, unique by slug within its owner
/// - Comment: a visitor comment, hidden until approved
/// - Subscription: an email address following a blog
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name stored on comments submitted without one
pub const ANONYMOUS_NAME: &str = "Anonymous";

/// User entity - a tenant addressed by its username subdomain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub comments_on: bool,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub custom_domain: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub api_key: String,
}

/// Post entity - reachable only through its owner's tenant host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub owner_id: i64,
    pub title: String,
    pub slug: String,
    pub body: String,
}

/// Comment entity - belongs to exactly one post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub body: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

/// Validated comment ready to be stored; always starts unapproved
#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub post_id: i64,
    pub name: String,
    pub email: Option<String>,
    pub body: String,
}

/// Subscription entity - an email following a blog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: i64,
    pub blog_user_id: i64,
    pub email: String,
    pub created_at: DateTime<Utc>,
}
