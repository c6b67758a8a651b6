/// Post service - post detail view and post creation
use crate::db::PostRepository;
use crate::error::{AppError, Result};
use crate::forms::{CommentForm, FormErrors, ValidPost};
use crate::models::{Comment, NewPost, Post, User};
use crate::services::CommentService;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Shown to a visitor right after their comment was stored
pub const PENDING_REVIEW_NOTICE: &str = "Thank you, your comment is pending review.";

/// Public view of an approved comment. Email addresses are never exposed.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: i64,
    pub name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<Comment> for CommentView {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            name: comment.name,
            body: comment.body,
            created_at: comment.created_at,
        }
    }
}

/// Comment form state echoed back after a rejected submission
#[derive(Debug, Clone, Serialize)]
pub struct CommentFormState {
    pub values: CommentForm,
    pub errors: FormErrors,
}

/// Everything the post page shows
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub author: String,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub comments_on: bool,
    pub comments: Vec<CommentView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_form: Option<CommentFormState>,
}

pub struct PostService {
    posts: Arc<dyn PostRepository>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>) -> Self {
        Self { posts }
    }

    /// Post `slug` of `owner`, or `NotFound`
    pub async fn get_post(&self, owner: &User, slug: &str) -> Result<Post> {
        self.posts
            .find_post_by_slug(owner.id, slug)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post '{}'", slug)))
    }

    /// Create a post for `owner`; a taken slug is reported as a field error
    pub async fn create_post(&self, owner: &User, post: ValidPost) -> Result<Post> {
        let created = self
            .posts
            .create_post(NewPost {
                owner_id: owner.id,
                title: post.title,
                slug: post.slug,
                body: post.body,
            })
            .await;

        match created {
            Err(AppError::Conflict(_)) => Err(AppError::Validation(FormErrors::single(
                "slug",
                "A post with this slug already exists.",
            ))),
            other => other,
        }
    }
}

/// Build the post page. Only approved comments are included.
pub async fn post_detail(
    owner: &User,
    post: Post,
    comments: &CommentService,
    pending_notice: bool,
    comment_form: Option<CommentFormState>,
) -> Result<PostDetail> {
    let approved = comments.approved(&post).await?;

    Ok(PostDetail {
        author: owner.username.clone(),
        title: post.title,
        slug: post.slug,
        body: post.body,
        created_at: post.created_at,
        comments_on: owner.comments_on,
        comments: approved.into_iter().map(CommentView::from).collect(),
        notice: pending_notice.then_some(PENDING_REVIEW_NOTICE),
        comment_form,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MockCommentRepository, MockPostRepository};
    use mockall::predicate::eq;

    fn alice() -> User {
        User {
            id: 1,
            username: "alice".into(),
            email: "alice@example.com".into(),
            comments_on: true,
            api_key: "key".into(),
            custom_domain: None,
            created_at: Utc::now(),
        }
    }

    fn hello() -> Post {
        Post {
            id: 10,
            owner_id: 1,
            title: "Hello world".into(),
            slug: "hello-world".into(),
            body: "First post".into(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn detail_lists_only_approved_comments() {
        let mut repo = MockCommentRepository::new();
        repo.expect_list_comments()
            .with(eq(10), eq(true))
            .times(1)
            .returning(|post_id, _| {
                Ok(vec![Comment {
                    id: 1,
                    post_id,
                    name: "Jon".into(),
                    email: Some("jon@wick.com".into()),
                    body: "Content sentence.".into(),
                    is_approved: true,
                    created_at: Utc::now(),
                }])
            });
        repo.expect_list_comments().with(eq(10), eq(false)).never();
        let comments = CommentService::new(Arc::new(repo));

        let detail = post_detail(&alice(), hello(), &comments, false, None)
            .await
            .unwrap();

        assert_eq!(detail.comments.len(), 1);
        assert_eq!(detail.comments[0].name, "Jon");
        assert!(detail.notice.is_none());

        let json = serde_json::to_string(&detail).unwrap();
        assert!(!json.contains("jon@wick.com"));
    }

    #[tokio::test]
    async fn detail_carries_pending_notice() {
        let mut repo = MockCommentRepository::new();
        repo.expect_list_comments().returning(|_, _| Ok(vec![]));
        let comments = CommentService::new(Arc::new(repo));

        let detail = post_detail(&alice(), hello(), &comments, true, None)
            .await
            .unwrap();
        assert_eq!(detail.notice, Some(PENDING_REVIEW_NOTICE));
    }

    #[tokio::test]
    async fn missing_post_is_not_found() {
        let mut repo = MockPostRepository::new();
        repo.expect_find_post_by_slug().returning(|_, _| Ok(None));
        let service = PostService::new(Arc::new(repo));

        let err = service.get_post(&alice(), "nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn duplicate_slug_becomes_field_error() {
        let mut repo = MockPostRepository::new();
        repo.expect_create_post()
            .returning(|_| Err(AppError::Conflict("post with this slug already exists".into())));
        let service = PostService::new(Arc::new(repo));

        let err = service
            .create_post(
                &alice(),
                ValidPost {
                    title: "Hello".into(),
                    slug: "hello".into(),
                    body: String::new(),
                },
            )
            .await
            .unwrap_err();

        match err {
            AppError::Validation(errors) => assert!(errors.contains("slug")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
