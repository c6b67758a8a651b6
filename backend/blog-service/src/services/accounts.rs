/// Account service - signup, API keys, blog settings and email subscriptions
use crate::db::{SubscriptionRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::forms::{FormErrors, SettingsChange, ValidSignup};
use crate::models::{NewUser, Subscription, User};
use std::sync::Arc;
use uuid::Uuid;

/// A fresh random API key: 32 lowercase hex characters
pub fn generate_api_key() -> String {
    Uuid::new_v4().simple().to_string()
}

pub struct AccountService {
    users: Arc<dyn UserRepository>,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn signup(&self, signup: ValidSignup) -> Result<User> {
        let created = self
            .users
            .create_user(NewUser {
                username: signup.username,
                email: signup.email,
                api_key: generate_api_key(),
            })
            .await;

        match created {
            Ok(user) => {
                tracing::info!(user_id = user.id, username = %user.username, "user signed up");
                Ok(user)
            }
            Err(AppError::Conflict(_)) => Err(AppError::Validation(FormErrors::single(
                "username",
                "A user with that username already exists.",
            ))),
            Err(e) => Err(e),
        }
    }

    /// Replace the user's API key; the previous key stops working immediately
    pub async fn reset_api_key(&self, user: &User) -> Result<String> {
        let api_key = generate_api_key();
        self.users.set_api_key(user.id, &api_key).await?;
        tracing::info!(user_id = user.id, "api key reset");
        Ok(api_key)
    }

    pub async fn update_settings(&self, user: &User, change: SettingsChange) -> Result<User> {
        let mut updated = user.clone();

        if let Some(comments_on) = change.comments_on {
            updated = self.users.set_comments_on(user.id, comments_on).await?;
        }

        if let Some(domain) = change.custom_domain {
            updated = match self.users.set_custom_domain(user.id, domain).await {
                Err(AppError::Conflict(_)) => {
                    return Err(AppError::Validation(FormErrors::single(
                        "custom_domain",
                        "This domain is already in use.",
                    )))
                }
                other => other?,
            };
        }

        tracing::info!(
            user_id = user.id,
            comments_on = updated.comments_on,
            custom_domain = ?updated.custom_domain,
            "settings updated"
        );
        Ok(updated)
    }
}

pub struct NotificationService {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl NotificationService {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }

    /// Subscribe `email` to `blog_owner`'s posts. Returns whether it is new.
    pub async fn subscribe(&self, blog_owner: &User, email: &str) -> Result<(Subscription, bool)> {
        let (subscription, created) = self.subscriptions.subscribe(blog_owner.id, email).await?;
        if created {
            tracing::info!(blog_user_id = blog_owner.id, "new email subscription");
        }
        Ok((subscription, created))
    }
}
