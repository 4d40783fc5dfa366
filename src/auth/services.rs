use lazy_static::lazy_static;
use regex::Regex;

use super::dto::{AuthResponse, PublicUser};
use super::jwt::JwtKeys;
use super::repo_types::User;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Blank display names are stored as NULL.
pub fn normalize_name(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string)
}

pub fn issue_tokens(keys: &JwtKeys, user: User) -> anyhow::Result<AuthResponse> {
    Ok(AuthResponse {
        access_token: keys.sign_access(user.id)?,
        refresh_token: keys.sign_refresh(user.id)?,
        user: PublicUser::from(user),
    })
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;
    use uuid::Uuid;

    use super::*;
    use crate::config::JwtConfig;

    #[test]
    fn emails_are_normalized_and_checked() {
        assert_eq!(normalize_email("  Anna@Example.COM "), "anna@example.com");
        assert!(is_valid_email("anna@example.com"));
        assert!(!is_valid_email("anna@example"));
        assert!(!is_valid_email("anna example@x.io"));
    }

    #[test]
    fn blank_names_become_none() {
        assert_eq!(normalize_name(Some("  Анна ")).as_deref(), Some("Анна"));
        assert_eq!(normalize_name(Some("   ")), None);
        assert_eq!(normalize_name(None), None);
    }

    #[test]
    fn issued_pair_carries_public_user() {
        let keys = JwtKeys::from_config(&JwtConfig {
            secret: "s".into(),
            issuer: "i".into(),
            audience: "a".into(),
            ttl_minutes: 5,
            refresh_ttl_minutes: 60,
        });
        let user = User {
            id: Uuid::new_v4(),
            email: "anna@example.com".into(),
            password_hash: "hash".into(),
            name: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let id = user.id;
        let resp = issue_tokens(&keys, user).unwrap();
        assert_eq!(keys.verify(&resp.access_token).unwrap().sub, id);
        assert_eq!(keys.verify_refresh(&resp.refresh_token).unwrap().sub, id);
        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("accessToken").is_some());
        assert!(json["user"].get("password_hash").is_none());
    }
}
