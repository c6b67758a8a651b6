/// Post handlers - HTTP endpoints for post operations
use crate::error::{AppError, Result};
use crate::forms::{validate_post, PostForm};
use crate::handlers::request_tenant;
use crate::middleware::AuthenticatedUser;
use crate::services::{post_detail, CommentService, PostService};
use crate::state::AppState;
use actix_web::cookie::Cookie;
use actix_web::{web, HttpRequest, HttpResponse};

/// One-shot cookie set after a comment is stored
pub const FLASH_COOKIE: &str = "comment_status";
pub const FLASH_PENDING: &str = "pending";

/// Post detail page on the tenant host
pub async fn get_post(
    req: HttpRequest,
    state: web::Data<AppState>,
    slug: web::Path<String>,
) -> Result<HttpResponse> {
    let owner = request_tenant(&req, &state).await?;
    let post = PostService::new(state.posts.clone())
        .get_post(&owner, &slug)
        .await?;

    let pending_notice = req
        .cookie(FLASH_COOKIE)
        .map(|c| c.value() == FLASH_PENDING)
        .unwrap_or(false);

    let comments = CommentService::new(state.comments.clone());
    let detail = post_detail(&owner, post, &comments, pending_notice, None).await?;

    let mut response = HttpResponse::Ok();
    if pending_notice {
        let mut removal = Cookie::build(FLASH_COOKIE, "").path("/").finish();
        removal.make_removal();
        response.cookie(removal);
    }

    Ok(response.json(detail))
}

/// Create a post owned by the caller
pub async fn create_post(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    form: web::Json<PostForm>,
) -> Result<HttpResponse> {
    let valid = validate_post(form.into_inner()).map_err(AppError::Validation)?;
    let post = PostService::new(state.posts.clone())
        .create_post(&user.0, valid)
        .await?;

    tracing::info!(user_id = user.0.id, post_id = post.id, slug = %post.slug, "post created");
    Ok(HttpResponse::Created().json(post))
}
