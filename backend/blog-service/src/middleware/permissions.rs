/// Authorization module for blog-service
///
/// Ownership checks: only a blog's owner may moderate or delete the comments on
/// its posts.
use crate::error::AppError;
use crate::middleware::Identity;
use crate::models::Post;

/// Result type for permission checks
pub type PermissionResult = Result<(), AppError>;

/// Check that `identity` is the owner of `post`
pub fn check_post_ownership(identity: &Identity, post: &Post) -> PermissionResult {
    match identity.user_id() {
        Some(user_id) if user_id == post.owner_id => Ok(()),
        _ => Err(AppError::Forbidden(
            "You don't have permission to moderate comments on this post".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use chrono::Utc;

    fn user(id: i64) -> User {
        User {
            id,
            username: format!("user-{}", id),
            email: String::new(),
            comments_on: true,
            api_key: format!("key-{}", id),
            custom_domain: None,
            created_at: Utc::now(),
        }
    }

    fn post(owner_id: i64) -> Post {
        Post {
            id: 10,
            owner_id,
            title: "Hello world".into(),
            slug: "hello-world".into(),
            body: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn owner_passes() {
        assert!(check_post_ownership(&Identity::User(user(1)), &post(1)).is_ok());
    }

    #[test]
    fn other_user_and_anonymous_are_forbidden() {
        assert!(matches!(
            check_post_ownership(&Identity::User(user(2)), &post(1)),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            check_post_ownership(&Identity::Anonymous, &post(1)),
            Err(AppError::Forbidden(_))
        ));
    }
}
