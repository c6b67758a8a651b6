//! Form validation.
//!
//! Each form is deserialized with every field optional, cleaned (trimmed, empty
//! strings dropped), then validated into a plain value. Failures come back as
//! [`FormErrors`], a map of field name to messages, so a handler can re-render
//! the submission or answer 400 without any exception-style control flow.

use crate::models::{NewComment, ANONYMOUS_NAME};
use crate::validators::{self, message_of};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationErrors};

pub const REQUIRED_MESSAGE: &str = "This field is required.";

/// Field-level error messages keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// `Ok(value)` when nothing was recorded
    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FormErrors::default();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors.iter() {
                out.add(field.to_string(), message_of(error));
            }
        }
        out
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validation_errors(form: &impl Validate) -> FormErrors {
    match form.validate() {
        Ok(()) => FormErrors::default(),
        Err(errors) => errors.into(),
    }
}

// =====================================================================
// Comments
// =====================================================================

/// Comment submission as posted by a visitor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Ensure this value has at most 254 characters.")
    )]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(required(message = "This field is required."))]
    pub body: Option<String>,
}

impl CommentForm {
    pub fn cleaned(self) -> Self {
        Self {
            name: clean(self.name),
            email: clean(self.email),
            body: clean(self.body),
        }
    }
}

/// Validate a comment for `post_id`. A missing name becomes "Anonymous".
pub fn validate_comment(form: CommentForm, post_id: i64) -> Result<NewComment, FormErrors> {
    let form = form.cleaned();
    let errors = validation_errors(&form);

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(NewComment {
        post_id,
        name: form.name.unwrap_or_else(|| ANONYMOUS_NAME.to_string()),
        email: form.email,
        body: form.body.unwrap_or_default(),
    })
}

// =====================================================================
// Accounts
// =====================================================================

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SignupForm {
    #[serde(default)]
    #[validate(
        required(message = "This field is required."),
        length(max = 150, message = "Ensure this value has at most 150 characters.")
    )]
    pub username: Option<String>,
    #[serde(default)]
    #[validate(
        required(message = "This field is required."),
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Ensure this value has at most 254 characters.")
    )]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSignup {
    pub username: String,
    pub email: String,
}

pub fn validate_signup(form: SignupForm) -> Result<ValidSignup, FormErrors> {
    let form = SignupForm {
        username: clean(form.username),
        email: clean(form.email),
    };
    let mut errors = validation_errors(&form);

    if let Some(username) = form.username.as_deref() {
        if let Err(e) = validators::validate_username(username) {
            errors.add("username", message_of(&e));
        }
    }

    match (form.username, form.email) {
        (Some(username), Some(email)) => errors.into_result(ValidSignup { username, email }),
        _ => Err(errors),
    }
}

/// Account settings; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    pub comments_on: Option<String>,
    #[serde(default)]
    pub custom_domain: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsChange {
    pub comments_on: Option<bool>,
    /// `Some(None)` clears the custom domain
    pub custom_domain: Option<Option<String>>,
}

/// DNS limit on a full domain name, and the width of `users.custom_domain`
pub const MAX_DOMAIN_LENGTH: usize = 253;

pub fn validate_settings(form: SettingsForm) -> Result<SettingsChange, FormErrors> {
    let mut errors = FormErrors::default();
    let mut change = SettingsChange::default();

    if let Some(raw) = form.comments_on {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "1" | "yes" => change.comments_on = Some(true),
            "false" | "off" | "0" | "no" | "" => change.comments_on = Some(false),
            _ => errors.add("comments_on", "Enter a valid boolean."),
        }
    }

    if let Some(raw) = form.custom_domain {
        let domain = raw.trim().trim_end_matches('.').to_ascii_lowercase();
        if domain.is_empty() {
            change.custom_domain = Some(None);
        } else if domain.len() > MAX_DOMAIN_LENGTH {
            errors.add(
                "custom_domain",
                format!("Ensure this value has at most {} characters.", MAX_DOMAIN_LENGTH),
            );
        } else if let Err(e) = validators::validate_domain_name(&domain) {
            errors.add("custom_domain", message_of(&e));
        } else {
            change.custom_domain = Some(Some(domain));
        }
    }

    errors.into_result(change)
}

// =====================================================================
// Posts
// =====================================================================

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PostForm {
    #[serde(default)]
    #[validate(
        required(message = "This field is required."),
        length(max = 300, message = "Ensure this value has at most 300 characters.")
    )]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(length(max = 300, message = "Ensure this value has at most 300 characters."))]
    pub slug: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidPost {
    pub title: String,
    pub slug: String,
    pub body: String,
}

/// Slug defaults to the slugified title
pub fn validate_post(form: PostForm) -> Result<ValidPost, FormErrors> {
    let form = PostForm {
        title: clean(form.title),
        slug: clean(form.slug),
        body: form.body,
    };
    let mut errors = validation_errors(&form);

    let Some(title) = form.title else {
        return Err(errors);
    };

    let slug = form.slug.unwrap_or_else(|| validators::slugify(&title));
    if slug.is_empty() {
        errors.add("slug", REQUIRED_MESSAGE);
    } else if let Err(e) = validators::validate_slug(&slug) {
        errors.add("slug", message_of(&e));
    }

    errors.into_result(ValidPost {
        title,
        slug,
        body: form.body.unwrap_or_default(),
    })
}

// =====================================================================
// Notifications
// =====================================================================

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SubscribeForm {
    #[serde(default)]
    #[validate(
        required(message = "This field is required."),
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Ensure this value has at most 254 characters.")
    )]
    pub email: Option<String>,
}

/// Returns the normalized (lowercased) address
pub fn validate_subscription(form: SubscribeForm) -> Result<String, FormErrors> {
    let form = SubscribeForm {
        email: clean(form.email).map(|e| e.to_ascii_lowercase()),
    };
    let errors = validation_errors(&form);

    match form.email {
        Some(email) => errors.into_result(email),
        None => Err(errors),
    }
}

// =====================================================================
// Uploads and payments (validation only)
// =====================================================================

/// Every uploaded file must carry an image extension
pub fn validate_image_upload(filenames: &[&str]) -> Result<(), FormErrors> {
    let mut errors = FormErrors::default();

    if filenames.is_empty() {
        errors.add("file", REQUIRED_MESSAGE);
    }
    for filename in filenames {
        if let Err(e) = validators::validate_image_extension(filename) {
            errors.add("file", message_of(&e));
        }
    }

    errors.into_result(())
}

const CARD_TOKEN_MAX_LEN: usize = 100;

/// Card token produced by the payment widget
pub fn validate_card_token(token: Option<&str>) -> Result<String, FormErrors> {
    match token.map(str::trim).filter(|t| !t.is_empty()) {
        None => Err(FormErrors::single("card_token", REQUIRED_MESSAGE)),
        Some(t) if t.chars().count() > CARD_TOKEN_MAX_LEN => Err(FormErrors::single(
            "card_token",
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                CARD_TOKEN_MAX_LEN,
                t.chars().count()
            ),
        )),
        Some(t) => Ok(t.to_string()),
    }
}
