/// Account handlers - signup, API key reset, settings, subscriptions
use crate::error::{AppError, Result};
use crate::forms::{
    validate_settings, validate_signup, validate_subscription, SettingsForm, SignupForm,
    SubscribeForm,
};
use crate::handlers::request_tenant;
use crate::middleware::AuthenticatedUser;
use crate::models::User;
use crate::services::{AccountService, NotificationService};
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;

/// Account as shown to its owner, API key included
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub comments_on: bool,
    pub custom_domain: Option<String>,
    pub api_key: String,
}

impl From<User> for AccountResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            comments_on: user.comments_on,
            custom_domain: user.custom_domain,
            api_key: user.api_key,
        }
    }
}

/// Register a new blog (form-encoded `username`, `email`)
pub async fn signup(
    state: web::Data<AppState>,
    form: web::Form<SignupForm>,
) -> Result<HttpResponse> {
    let valid = validate_signup(form.into_inner()).map_err(AppError::Validation)?;
    let user = AccountService::new(state.users.clone()).signup(valid).await?;

    Ok(HttpResponse::Created().json(AccountResponse::from(user)))
}

/// Issue a new API key for the caller
pub async fn reset_api_key(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let api_key = AccountService::new(state.users.clone())
        .reset_api_key(&user.0)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "api_key": api_key })))
}

/// Toggle comments and set the custom domain
pub async fn update_settings(
    state: web::Data<AppState>,
    user: AuthenticatedUser,
    form: web::Form<SettingsForm>,
) -> Result<HttpResponse> {
    let change = validate_settings(form.into_inner()).map_err(AppError::Validation)?;
    let updated = AccountService::new(state.users.clone())
        .update_settings(&user.0, change)
        .await?;

    Ok(HttpResponse::Ok().json(AccountResponse::from(updated)))
}

/// Subscribe an email address to the blog on the request host
pub async fn subscribe(
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<SubscribeForm>,
) -> Result<HttpResponse> {
    let owner = request_tenant(&req, &state).await?;
    let email = validate_subscription(form.into_inner()).map_err(AppError::Validation)?;

    let (subscription, created) = NotificationService::new(state.subscriptions.clone())
        .subscribe(&owner, &email)
        .await?;

    let mut response = if created {
        HttpResponse::Created()
    } else {
        HttpResponse::Ok()
    };
    Ok(response.json(serde_json::json!({
        "blog": owner.username,
        "email": subscription.email,
        "subscribed_at": subscription.created_at,
    })))
}
