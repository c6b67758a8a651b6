//! Host to tenant resolution.
//!
//! `alice.<canonical host>` belongs to user `alice`; any host outside the
//! canonical domain is looked up as a custom domain; the canonical host itself
//! belongs to nobody.

use crate::db::UserRepository;
use crate::error::Result;
use crate::models::User;

/// Lowercase the host and drop any port
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('.');
    let without_port = match host.rsplit_once(':') {
        Some((name, port)) if !name.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => {
            name
        }
        _ => host,
    };
    without_port.trim_end_matches('.').to_ascii_lowercase()
}

/// How a host addresses a tenant, before any lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantAddress {
    /// `<username>.<canonical host>`
    Subdomain(String),
    /// A host outside the canonical domain
    CustomDomain(String),
    /// The canonical host or a nested subdomain of it
    NoTenant,
}

pub fn classify_host(host: &str, canonical_host: &str) -> TenantAddress {
    let host = normalize_host(host);
    let canonical = normalize_host(canonical_host);

    if host.is_empty() || host == canonical {
        return TenantAddress::NoTenant;
    }

    match host.strip_suffix(canonical.as_str()) {
        Some(prefix) if prefix.ends_with('.') => {
            let label = &prefix[..prefix.len() - 1];
            if label.is_empty() || label.contains('.') {
                TenantAddress::NoTenant
            } else {
                TenantAddress::Subdomain(label.to_string())
            }
        }
        _ => TenantAddress::CustomDomain(host),
    }
}

/// Resolve the tenant addressed by `host`
pub async fn resolve_tenant(
    host: &str,
    canonical_host: &str,
    users: &dyn UserRepository,
) -> Result<Option<User>> {
    match classify_host(host, canonical_host) {
        TenantAddress::Subdomain(username) => users.find_by_username(&username).await,
        TenantAddress::CustomDomain(domain) => users.find_by_custom_domain(&domain).await,
        TenantAddress::NoTenant => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MockUserRepository;
    use chrono::Utc;
    use mockall::predicate::eq;

    fn alice() -> User {
        User {
            id: 1,
            username: "alice".into(),
            email: "alice@example.com".into(),
            comments_on: true,
            api_key: "key".into(),
            custom_domain: Some("alice.blog".into()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("Alice.Example.com:8080"), "alice.example.com");
        assert_eq!(normalize_host("example.com."), "example.com");
        assert_eq!(normalize_host("localhost"), "localhost");
    }

    #[test]
    fn test_classify_host() {
        assert_eq!(
            classify_host("alice.example.com", "example.com"),
            TenantAddress::Subdomain("alice".into())
        );
        assert_eq!(
            classify_host("ALICE.example.com:443", "example.com"),
            TenantAddress::Subdomain("alice".into())
        );
        assert_eq!(classify_host("example.com", "example.com"), TenantAddress::NoTenant);
        assert_eq!(
            classify_host("a.b.example.com", "example.com"),
            TenantAddress::NoTenant
        );
        assert_eq!(
            classify_host("badexample.com", "example.com"),
            TenantAddress::CustomDomain("badexample.com".into())
        );
        assert_eq!(
            classify_host("alice.blog", "example.com"),
            TenantAddress::CustomDomain("alice.blog".into())
        );
    }

    #[tokio::test]
    async fn subdomain_resolves_by_username() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_username()
            .with(eq("alice"))
            .times(1)
            .returning(|_| Ok(Some(alice())));

        let tenant = resolve_tenant("alice.example.com", "example.com", &users)
            .await
            .unwrap();
        assert_eq!(tenant.map(|u| u.id), Some(1));
    }

    #[tokio::test]
    async fn custom_domain_resolves_by_domain() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_custom_domain()
            .with(eq("alice.blog"))
            .times(1)
            .returning(|_| Ok(Some(alice())));
        users.expect_find_by_username().never();

        let tenant = resolve_tenant("alice.blog", "example.com", &users)
            .await
            .unwrap();
        assert!(tenant.is_some());
    }

    #[tokio::test]
    async fn canonical_host_has_no_tenant() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_username().never();
        users.expect_find_by_custom_domain().never();

        let tenant = resolve_tenant("example.com", "example.com", &users)
            .await
            .unwrap();
        assert!(tenant.is_none());
    }
}
