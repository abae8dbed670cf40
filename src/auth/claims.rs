/// JWT Claims structures
///
/// Access tokens carry enough identity for logging and display; refresh
/// tokens carry only the subject plus a unique `jti` so that two tokens
/// minted for the same user in the same second still differ.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::User;

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
}

impl AccessClaims {
    pub fn new(user: &User, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
        }
    }

    /// Extract user ID from claims
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

/// JWT Claims for refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub sub: String,
    /// Token ID, unique per issuance
    pub jti: String,
    pub exp: i64,
    pub iat: i64,
    pub iss: String,
}

impl RefreshClaims {
    pub fn new(user_id: Uuid, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "maulik".to_string(),
            email: "maulik@test.com".to_string(),
            full_name: "maulik patel".to_string(),
            avatar: "https://cdn.example.com/a.png".to_string(),
            cover_image: String::new(),
            password_hash: "hash".to_string(),
            refresh_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_access_claims_creation() {
        let user = user();
        let claims = AccessClaims::new(&user, 900, "test".to_string());

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.username, "maulik");
        assert_eq!(claims.exp - claims.iat, 900);
        assert_eq!(claims.user_id(), Some(user.id));
    }

    #[test]
    fn test_refresh_claims_are_unique() {
        let user_id = Uuid::new_v4();
        let first = RefreshClaims::new(user_id, 3600, "test".to_string());
        let second = RefreshClaims::new(user_id, 3600, "test".to_string());

        assert_ne!(first.jti, second.jti);
        assert_eq!(first.user_id(), Some(user_id));
    }

    #[test]
    fn test_invalid_user_id() {
        let mut claims = RefreshClaims::new(Uuid::new_v4(), 3600, "test".to_string());
        claims.sub = "invalid-uuid".to_string();

        assert!(claims.user_id().is_none());
    }
}
