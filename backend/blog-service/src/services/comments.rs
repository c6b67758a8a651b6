/// Comment gate - decides whether comments are created, approved or deleted
use crate::db::CommentRepository;
use crate::error::{AppError, Result};
use crate::forms::{validate_comment, CommentForm, FormErrors};
use crate::metrics::{COMMENT_MODERATION_TOTAL, COMMENT_SUBMISSIONS_TOTAL};
use crate::middleware::{check_post_ownership, Identity};
use crate::models::{Comment, Post, User};
use std::sync::Arc;

/// Result of a comment submission
#[derive(Debug)]
pub enum Submission {
    /// Stored, waiting for approval
    Accepted(Comment),
    /// Nothing stored; the caller re-renders the post
    Rejected(Rejection),
}

#[derive(Debug)]
pub enum Rejection {
    /// The blog owner has comments switched off
    CommentsDisabled,
    /// The form failed validation; carries the cleaned values for re-rendering
    Invalid {
        form: CommentForm,
        errors: FormErrors,
    },
}

impl Rejection {
    fn outcome(&self) -> &'static str {
        match self {
            Rejection::CommentsDisabled => "comments_disabled",
            Rejection::Invalid { .. } => "invalid",
        }
    }
}

pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>) -> Self {
        Self { comments }
    }

    /// Run a submission through the gate.
    ///
    /// Order matters: a disabled blog rejects before the payload is looked at.
    pub async fn submit(&self, owner: &User, post: &Post, form: CommentForm) -> Result<Submission> {
        let submission = self.evaluate(owner, post, form).await?;

        match &submission {
            Submission::Accepted(comment) => {
                COMMENT_SUBMISSIONS_TOTAL
                    .with_label_values(&["accepted"])
                    .inc();
                tracing::info!(
                    post_id = post.id,
                    comment_id = comment.id,
                    "comment stored pending review"
                );
            }
            Submission::Rejected(rejection) => {
                COMMENT_SUBMISSIONS_TOTAL
                    .with_label_values(&[rejection.outcome()])
                    .inc();
                tracing::debug!(
                    post_id = post.id,
                    outcome = rejection.outcome(),
                    "comment rejected"
                );
            }
        }

        Ok(submission)
    }

    async fn evaluate(&self, owner: &User, post: &Post, form: CommentForm) -> Result<Submission> {
        if !owner.comments_on {
            return Ok(Submission::Rejected(Rejection::CommentsDisabled));
        }

        let cleaned = form.cleaned();
        match validate_comment(cleaned.clone(), post.id) {
            Ok(new_comment) => {
                let comment = self.comments.create_comment(new_comment).await?;
                Ok(Submission::Accepted(comment))
            }
            Err(errors) => Ok(Submission::Rejected(Rejection::Invalid {
                form: cleaned,
                errors,
            })),
        }
    }

    /// Delete a comment on `post`. Only the post owner may do this.
    pub async fn delete(&self, post: &Post, comment_id: i64, identity: &Identity) -> Result<()> {
        let result = self.delete_checked(post, comment_id, identity).await;
        record_moderation("delete", &result);
        result
    }

    async fn delete_checked(&self, post: &Post, comment_id: i64, identity: &Identity) -> Result<()> {
        check_post_ownership(identity, post)?;

        let comment = self
            .comments
            .find_comment(post.id, comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("comment {}", comment_id)))?;

        if !self.comments.delete_comment(comment.id).await? {
            return Err(AppError::NotFound(format!("comment {}", comment_id)));
        }

        tracing::info!(post_id = post.id, comment_id, "comment deleted by owner");
        Ok(())
    }

    /// Approve a comment on `post`, making it public. Owner only.
    pub async fn approve(&self, post: &Post, comment_id: i64, identity: &Identity) -> Result<Comment> {
        let result = self.approve_checked(post, comment_id, identity).await;
        record_moderation("approve", &result);
        result
    }

    async fn approve_checked(
        &self,
        post: &Post,
        comment_id: i64,
        identity: &Identity,
    ) -> Result<Comment> {
        check_post_ownership(identity, post)?;

        self.comments
            .find_comment(post.id, comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("comment {}", comment_id)))?;

        let comment = self
            .comments
            .approve_comment(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("comment {}", comment_id)))?;

        tracing::info!(post_id = post.id, comment_id, "comment approved");
        Ok(comment)
    }

    /// Comments awaiting review. Owner only.
    pub async fn pending(&self, post: &Post, identity: &Identity) -> Result<Vec<Comment>> {
        check_post_ownership(identity, post)?;
        self.comments.list_comments(post.id, false).await
    }

    /// Approved comments, safe to show to anyone
    pub async fn approved(&self, post: &Post) -> Result<Vec<Comment>> {
        self.comments.list_comments(post.id, true).await
    }
}

fn record_moderation<T>(action: &str, result: &Result<T>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(AppError::Forbidden(_)) => "forbidden",
        Err(AppError::NotFound(_)) => "not_found",
        Err(_) => "error",
    };
    COMMENT_MODERATION_TOTAL
        .with_label_values(&[action, outcome])
        .inc();
}
