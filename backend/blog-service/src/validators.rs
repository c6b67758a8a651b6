use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;
use validator::ValidationError;

/// Field validators shared by forms and handlers

// Compile regex patterns once at startup
static USERNAME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9-]+$").expect("hardcoded username regex is invalid - fix source code")
});

pub const USERNAME_MESSAGE: &str =
    "Enter a valid username, it should include only lowercase letters, numbers, and -";
pub const DOMAIN_NAME_MESSAGE: &str = "Invalid domain name";
pub const SLUG_MESSAGE: &str =
    "Enter a valid slug, it should include only lowercase letters, numbers, and -";

/// Extensions accepted by the image upload form
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpeg", "jpg", "png", "svg", "gif", "webp", "tiff", "tif", "bmp",
];

/// Username: lowercase letters, digits and hyphens only, whole string
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_REGEX.is_match(username) {
        Ok(())
    } else {
        Err(error("invalid_username", USERNAME_MESSAGE))
    }
}

/// Domain name: anything containing a dot.
///
/// This is intentionally loose; tenancy only needs it to tell custom domains
/// apart from bare usernames.
pub fn validate_domain_name(value: &str) -> Result<(), ValidationError> {
    if value.contains('.') {
        Ok(())
    } else {
        Err(error("invalid_domain_name", DOMAIN_NAME_MESSAGE))
    }
}

/// Post slugs share the username alphabet
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if USERNAME_REGEX.is_match(slug) {
        Ok(())
    } else {
        Err(error("invalid_slug", SLUG_MESSAGE))
    }
}

/// Build a slug from free text: lowercase alphanumerics joined by single hyphens
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch);
            pending_hyphen = false;
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

/// File extension check for image uploads (case insensitive)
pub fn validate_image_extension(filename: &str) -> Result<(), ValidationError> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        Err(error(
            "invalid_extension",
            format!(
                "File extension \u{201c}{}\u{201d} is not allowed. Allowed extensions are: {}.",
                extension,
                IMAGE_EXTENSIONS.join(", ")
            ),
        ))
    }
}

pub(crate) fn error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Human readable message of a validation error
pub fn message_of(error: &ValidationError) -> String {
    error
        .message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| error.code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_username() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("bob-2").is_ok());
        assert!(validate_username("-").is_ok());
    }

    #[test]
    fn test_invalid_username() {
        assert!(validate_username("").is_err());
        assert!(validate_username("Alice").is_err());
        assert!(validate_username("john_doe").is_err());
        assert!(validate_username("alice\n").is_err());
        assert!(validate_username("al ice").is_err());

        let err = validate_username("Alice").unwrap_err();
        assert_eq!(message_of(&err), USERNAME_MESSAGE);
    }

    #[test]
    fn test_domain_name() {
        assert!(validate_domain_name("example.com").is_ok());
        assert!(validate_domain_name(".").is_ok());
        assert!(validate_domain_name("localhost").is_err());
        assert_eq!(
            message_of(&validate_domain_name("nodot").unwrap_err()),
            DOMAIN_NAME_MESSAGE
        );
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello world"), "hello-world");
        assert_eq!(slugify("  Rust -- 2024!  "), "rust-2024");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_image_extension() {
        assert!(validate_image_extension("cat.PNG").is_ok());
        assert!(validate_image_extension("photo.tar.jpeg").is_ok());
        assert!(validate_image_extension("notes.txt").is_err());
        assert!(validate_image_extension("noextension").is_err());
    }
}
