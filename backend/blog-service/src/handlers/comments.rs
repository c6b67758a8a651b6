/// Comment handlers - HTTP endpoints for the comment gate
use crate::error::Result;
use crate::forms::CommentForm;
use crate::handlers::posts::{FLASH_COOKIE, FLASH_PENDING};
use crate::handlers::{post_url, request_tenant};
use crate::middleware::Identity;
use crate::services::{
    post_detail, CommentFormState, CommentService, PostService, Rejection, Submission,
};
use crate::state::AppState;
use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};

fn redirect_to_post(slug: &str) -> actix_web::HttpResponseBuilder {
    let mut builder = HttpResponse::Found();
    builder.insert_header((header::LOCATION, post_url(slug)));
    builder
}

/// Submit a comment (form-encoded `name`, `email`, `body`).
///
/// Success redirects to the post with the pending-review flash set. Any gate
/// rejection re-renders the post with status 200 and stores nothing.
pub async fn create_comment(
    req: HttpRequest,
    state: web::Data<AppState>,
    slug: web::Path<String>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse> {
    let owner = request_tenant(&req, &state).await?;
    let post = PostService::new(state.posts.clone())
        .get_post(&owner, &slug)
        .await?;

    let comments = CommentService::new(state.comments.clone());
    let submission = comments.submit(&owner, &post, form.into_inner()).await?;

    let form_state = match submission {
        Submission::Accepted(_) => {
            let flash = Cookie::build(FLASH_COOKIE, FLASH_PENDING)
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .max_age(Duration::minutes(5))
                .finish();

            return Ok(redirect_to_post(&post.slug).cookie(flash).finish());
        }
        Submission::Rejected(Rejection::CommentsDisabled) => None,
        Submission::Rejected(Rejection::Invalid { form, errors }) => Some(CommentFormState {
            values: form,
            errors,
        }),
    };

    let detail = post_detail(&owner, post, &comments, false, form_state).await?;
    Ok(HttpResponse::Ok().json(detail))
}

/// Delete a comment. Owner only; everyone else gets 403.
pub async fn delete_comment(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse> {
    let (slug, comment_id) = path.into_inner();
    let owner = request_tenant(&req, &state).await?;
    let post = PostService::new(state.posts.clone())
        .get_post(&owner, &slug)
        .await?;

    CommentService::new(state.comments.clone())
        .delete(&post, comment_id, &identity)
        .await?;

    Ok(redirect_to_post(&post.slug).finish())
}

/// Approve a comment so it shows on the post. Owner only.
pub async fn approve_comment(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<(String, i64)>,
) -> Result<HttpResponse> {
    let (slug, comment_id) = path.into_inner();
    let owner = request_tenant(&req, &state).await?;
    let post = PostService::new(state.posts.clone())
        .get_post(&owner, &slug)
        .await?;

    CommentService::new(state.comments.clone())
        .approve(&post, comment_id, &identity)
        .await?;

    Ok(redirect_to_post(&post.slug).finish())
}

/// Comments waiting for review, with submitter emails. Owner only.
pub async fn pending_comments(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    slug: web::Path<String>,
) -> Result<HttpResponse> {
    let owner = request_tenant(&req, &state).await?;
    let post = PostService::new(state.posts.clone())
        .get_post(&owner, &slug)
        .await?;

    let pending = CommentService::new(state.comments.clone())
        .pending(&post, &identity)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "post": post.slug,
        "comments": pending,
    })))
}
