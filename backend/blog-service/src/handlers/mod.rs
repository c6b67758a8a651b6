/// HTTP handlers for blog endpoints
///
/// Tenant-scoped routes (`/posts/{slug}...`, `/notifications/...`) resolve the
/// blog owner from the request host on every call; there is no tenant state
/// outside the request.
pub mod accounts;
pub mod comments;
pub mod posts;

use crate::error::{AppError, Result};
use crate::models::User;
use crate::state::AppState;
use crate::tenancy::resolve_tenant;
use actix_web::{web, HttpRequest};

// Re-export handler functions at module level
pub use accounts::{reset_api_key, signup, subscribe, update_settings};
pub use comments::{approve_comment, create_comment, delete_comment, pending_comments};
pub use posts::{create_post, get_post};

/// Path of a post's detail page on its tenant host
pub fn post_url(slug: &str) -> String {
    format!("/posts/{}", slug)
}

/// Blog owner addressed by the request host, or `NotFound`
pub async fn request_tenant(req: &HttpRequest, state: &AppState) -> Result<User> {
    let host = req.connection_info().host().to_string();

    resolve_tenant(&host, &state.canonical_host, state.users.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no blog at {}", host)))
}

/// Route table shared by the server and the integration tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/accounts")
            .route("/signup", web::post().to(signup))
            .route("/api-key/reset", web::post().to(reset_api_key))
            .route("/settings", web::post().to(update_settings)),
    )
    .route("/notifications/subscribe", web::post().to(subscribe))
    .service(
        web::scope("/posts")
            .service(web::resource("").route(web::post().to(create_post)))
            .service(web::resource("/{slug}").route(web::get().to(get_post)))
            .service(web::resource("/{slug}/comments").route(web::post().to(create_comment)))
            .service(
                web::resource("/{slug}/comments/pending")
                    .route(web::get().to(pending_comments)),
            )
            .service(
                web::resource("/{slug}/comments/{comment_id}/delete")
                    .route(web::post().to(delete_comment)),
            )
            .service(
                web::resource("/{slug}/comments/{comment_id}/approve")
                    .route(web::post().to(approve_comment)),
            ),
    );
}
