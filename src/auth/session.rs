/// Token lifecycle
///
/// Issue, login, request-time verification, refresh rotation and logout.
/// Handlers and the JWT middleware call into these functions; nothing here
/// touches HTTP.

use serde::Serialize;
use uuid::Uuid;

use crate::auth::jwt::{
    generate_access_token, generate_refresh_token, validate_access_token, validate_refresh_token,
};
use crate::auth::refresh_token::{hash_refresh_token, refresh_token_matches};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError, ValidationError};
use crate::store::{PublicUser, User, UserStore};

/// Freshly minted access/refresh pair
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn mint_tokens(user: &User, config: &JwtSettings) -> Result<TokenPair, AppError> {
    Ok(TokenPair {
        access_token: generate_access_token(user, config)?,
        refresh_token: generate_refresh_token(user.id, config)?,
    })
}

/// Mint a token pair for `user_id` and persist its refresh token,
/// replacing whatever was stored before
pub async fn issue_tokens(
    store: &dyn UserStore,
    user_id: Uuid,
    config: &JwtSettings,
) -> Result<TokenPair, AppError> {
    let user = store.find_by_id(user_id).await?.ok_or_else(|| {
        AppError::Internal(format!(
            "Cannot issue tokens for missing user {}",
            user_id
        ))
    })?;

    let tokens = mint_tokens(&user, config)?;
    store
        .update_refresh_token(user.id, Some(&hash_refresh_token(&tokens.refresh_token)))
        .await?;

    Ok(tokens)
}

/// Verify credentials and issue a token pair
///
/// `username` and `email` are alternatives; the first stored user matching
/// either one is checked against `password`.
pub async fn login(
    store: &dyn UserStore,
    username: Option<&str>,
    email: Option<&str>,
    password: &str,
    config: &JwtSettings,
) -> Result<(PublicUser, TokenPair), AppError> {
    let username = username.map(str::trim).filter(|s| !s.is_empty()).map(str::to_lowercase);
    let email = email.map(str::trim).filter(|s| !s.is_empty()).map(str::to_lowercase);
    if username.is_none() && email.is_none() {
        return Err(ValidationError::MissingIdentifier.into());
    }

    let user = store
        .find_by_username_or_email(username.as_deref(), email.as_deref())
        .await?
        .ok_or_else(|| AppError::not_found("User does not exist"))?;

    if !user.verify_password(password)? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let tokens = issue_tokens(store, user.id, config).await?;

    Ok((user.to_public(), tokens))
}

/// Keep auth errors as they are; anything else (a store outage, a signing
/// failure) becomes the given `AuthError` with its message as the cause.
fn into_unauthorized(err: AppError, wrap: fn(String) -> AuthError) -> AppError {
    match err {
        AppError::Auth(_) => err,
        other => wrap(other.to_string()).into(),
    }
}

/// Resolve an access token to the user it was issued for
///
/// Every failure is `Unauthorized`; the refresh token is not consulted.
pub async fn authenticate(
    store: &dyn UserStore,
    token: Option<&str>,
    config: &JwtSettings,
) -> Result<PublicUser, AppError> {
    resolve_access_token(store, token, config)
        .await
        .map_err(|e| into_unauthorized(e, AuthError::InvalidAccessToken))
}

async fn resolve_access_token(
    store: &dyn UserStore,
    token: Option<&str>,
    config: &JwtSettings,
) -> Result<PublicUser, AppError> {
    let token = token.filter(|t| !t.is_empty()).ok_or(AuthError::MissingToken)?;

    let claims = validate_access_token(token, config)?;
    let user_id = claims
        .user_id()
        .ok_or_else(|| AuthError::InvalidAccessToken("malformed subject".to_string()))?;

    let user = store.find_by_id(user_id).await?.ok_or_else(|| {
        AuthError::InvalidAccessToken(format!("user {} no longer exists", user_id))
    })?;

    Ok(user.to_public())
}

/// Exchange a refresh token for a new pair (rotation)
///
/// The presented token must be the one currently stored for the user. The
/// stored value is swapped only if it is still the presented one, so a
/// replayed or concurrently used token can succeed at most once.
///
/// Every failure is `Unauthorized`, including store errors.
pub async fn refresh(
    store: &dyn UserStore,
    token: Option<&str>,
    config: &JwtSettings,
) -> Result<TokenPair, AppError> {
    rotate_session(store, token, config)
        .await
        .map_err(|e| into_unauthorized(e, AuthError::InvalidRefreshToken))
}

async fn rotate_session(
    store: &dyn UserStore,
    token: Option<&str>,
    config: &JwtSettings,
) -> Result<TokenPair, AppError> {
    let token = token.filter(|t| !t.is_empty()).ok_or(AuthError::MissingToken)?;

    let claims = validate_refresh_token(token, config)?;
    let user_id = claims
        .user_id()
        .ok_or_else(|| AuthError::InvalidRefreshToken("malformed subject".to_string()))?;

    let user = store.find_by_id(user_id).await?.ok_or_else(|| {
        AuthError::InvalidRefreshToken(format!("user {} no longer exists", user_id))
    })?;

    let stored_hash = match user.refresh_token.as_deref() {
        Some(stored) if refresh_token_matches(token, stored) => stored.to_string(),
        _ => return Err(AuthError::RefreshTokenReused.into()),
    };

    let tokens = mint_tokens(&user, config)?;
    let rotated = store
        .rotate_refresh_token(user.id, &stored_hash, &hash_refresh_token(&tokens.refresh_token))
        .await?;
    if !rotated {
        return Err(AuthError::RefreshTokenReused.into());
    }

    Ok(tokens)
}

/// Forget the user's refresh token. Logging out twice is not an error.
pub async fn logout(store: &dyn UserStore, user_id: Uuid) -> Result<(), AppError> {
    store.update_refresh_token(user_id, None).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::error::DatabaseError;
    use crate::store::{ChannelProfile, InMemoryUserStore, NewUser, WatchedVideo};
    use async_trait::async_trait;

    fn config() -> JwtSettings {
        JwtSettings {
            access_token_secret: "access-secret-key-at-least-32-characters".to_string(),
            access_token_expiry: 900,
            refresh_token_secret: "refresh-secret-key-at-least-32-characters".to_string(),
            refresh_token_expiry: 864000,
            issuer: "test".to_string(),
        }
    }

    async fn store_with_user() -> (InMemoryUserStore, User) {
        let store = InMemoryUserStore::new();
        let user = store
            .insert_user(NewUser {
                username: "maulik".to_string(),
                email: "maulik@test.com".to_string(),
                full_name: "maulik patel".to_string(),
                avatar: "https://cdn.example.com/avatar.png".to_string(),
                cover_image: String::new(),
                password_hash: hash_password("12345678", 4).unwrap(),
            })
            .await
            .unwrap();
        (store, user)
    }

    #[tokio::test]
    async fn test_login_token_decodes_to_user() {
        let (store, user) = store_with_user().await;
        let config = config();

        let (public, tokens) = login(&store, Some("maulik"), None, "12345678", &config)
            .await
            .unwrap();

        assert_eq!(public.id, user.id);
        let claims = validate_access_token(&tokens.access_token, &config).unwrap();
        assert_eq!(claims.user_id(), Some(user.id));
    }

    #[tokio::test]
    async fn test_login_by_email_is_case_insensitive() {
        let (store, user) = store_with_user().await;

        let (public, _) = login(&store, None, Some("Maulik@Test.com"), "12345678", &config())
            .await
            .unwrap();
        assert_eq!(public.id, user.id);
    }

    #[tokio::test]
    async fn test_login_failures() {
        let (store, _) = store_with_user().await;
        let config = config();

        let wrong_password = login(&store, Some("maulik"), None, "wrong-pass", &config).await;
        assert!(matches!(wrong_password, Err(AppError::Auth(AuthError::InvalidCredentials))));

        let unknown = login(&store, Some("nobody"), None, "12345678", &config).await;
        assert!(matches!(unknown, Err(AppError::Database(_))));

        let no_identifier = login(&store, None, Some("  "), "12345678", &config).await;
        assert!(matches!(
            no_identifier,
            Err(AppError::Validation(ValidationError::MissingIdentifier))
        ));
    }

    #[tokio::test]
    async fn test_login_persists_refresh_digest() {
        let (store, user) = store_with_user().await;

        let (_, tokens) = login(&store, Some("maulik"), None, "12345678", &config())
            .await
            .unwrap();

        let stored = store.find_by_id(user.id).await.unwrap().unwrap();
        let digest = stored.refresh_token.expect("refresh token should be stored");
        assert_ne!(digest, tokens.refresh_token);
        assert!(refresh_token_matches(&tokens.refresh_token, &digest));
    }

    #[tokio::test]
    async fn test_issue_for_missing_user_is_internal() {
        let store = InMemoryUserStore::new();
        let result = issue_tokens(&store, Uuid::new_v4(), &config()).await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_issue_then_authenticate_round_trip() {
        let (store, user) = store_with_user().await;
        let config = config();

        let tokens = issue_tokens(&store, user.id, &config).await.unwrap();
        let identity = authenticate(&store, Some(&tokens.access_token), &config)
            .await
            .unwrap();

        assert_eq!(identity.id, user.id);
        assert_eq!(identity.username, "maulik");
    }

    #[tokio::test]
    async fn test_authenticate_rejects_each_failure_mode() {
        let (store, user) = store_with_user().await;
        let config = config();
        let tokens = issue_tokens(&store, user.id, &config).await.unwrap();

        let missing = authenticate(&store, None, &config).await;
        assert!(matches!(missing, Err(AppError::Auth(AuthError::MissingToken))));

        let tampered = format!("{}X", tokens.access_token);
        let result = authenticate(&store, Some(&tampered), &config).await;
        assert!(matches!(result, Err(AppError::Auth(AuthError::InvalidAccessToken(_)))));

        let mut expired_config = config.clone();
        expired_config.access_token_expiry = -3600;
        let expired = issue_tokens(&store, user.id, &expired_config).await.unwrap();
        let result = authenticate(&store, Some(&expired.access_token), &config).await;
        assert!(matches!(result, Err(AppError::Auth(AuthError::InvalidAccessToken(_)))));

        store.remove_user(user.id).await;
        let result = authenticate(&store, Some(&tokens.access_token), &config).await;
        assert!(matches!(result, Err(AppError::Auth(AuthError::InvalidAccessToken(_)))));
    }

    #[tokio::test]
    async fn test_refresh_token_is_single_use() {
        let (store, user) = store_with_user().await;
        let config = config();
        let first = issue_tokens(&store, user.id, &config).await.unwrap();

        let second = refresh(&store, Some(&first.refresh_token), &config).await.unwrap();
        assert_ne!(second.refresh_token, first.refresh_token);

        let replay = refresh(&store, Some(&first.refresh_token), &config).await;
        assert!(matches!(replay, Err(AppError::Auth(AuthError::RefreshTokenReused))));

        // The rotated token still works once
        assert!(refresh(&store, Some(&second.refresh_token), &config).await.is_ok());
    }

    #[tokio::test]
    async fn test_login_supersedes_previous_refresh_token() {
        let (store, user) = store_with_user().await;
        let config = config();
        let first = issue_tokens(&store, user.id, &config).await.unwrap();
        login(&store, Some("maulik"), None, "12345678", &config).await.unwrap();

        let result = refresh(&store, Some(&first.refresh_token), &config).await;
        assert!(matches!(result, Err(AppError::Auth(AuthError::RefreshTokenReused))));
    }

    #[tokio::test]
    async fn test_refresh_rejects_invalid_tokens() {
        let (store, user) = store_with_user().await;
        let config = config();
        let tokens = issue_tokens(&store, user.id, &config).await.unwrap();

        let missing = refresh(&store, Some(""), &config).await;
        assert!(matches!(missing, Err(AppError::Auth(AuthError::MissingToken))));

        // An access token is not signed with the refresh secret
        let wrong_family = refresh(&store, Some(&tokens.access_token), &config).await;
        assert!(matches!(wrong_family, Err(AppError::Auth(AuthError::InvalidRefreshToken(_)))));

        store.remove_user(user.id).await;
        let gone = refresh(&store, Some(&tokens.refresh_token), &config).await;
        assert!(matches!(gone, Err(AppError::Auth(AuthError::InvalidRefreshToken(_)))));
    }

    #[tokio::test]
    async fn test_logout_then_refresh_fails() {
        let (store, user) = store_with_user().await;
        let config = config();
        let tokens = issue_tokens(&store, user.id, &config).await.unwrap();

        logout(&store, user.id).await.unwrap();
        // Idempotent
        logout(&store, user.id).await.unwrap();

        let result = refresh(&store, Some(&tokens.refresh_token), &config).await;
        assert!(matches!(result, Err(AppError::Auth(AuthError::RefreshTokenReused))));
    }

    #[tokio::test]
    async fn test_concurrent_refresh_succeeds_once() {
        let (store, user) = store_with_user().await;
        let config = config();
        let tokens = issue_tokens(&store, user.id, &config).await.unwrap();

        let (a, b) = tokio::join!(
            refresh(&store, Some(&tokens.refresh_token), &config),
            refresh(&store, Some(&tokens.refresh_token), &config),
        );

        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    }

    #[tokio::test]
    async fn test_refresh_rejects_expired_and_tampered_tokens() {
        let (store, user) = store_with_user().await;
        let config = config();

        let mut expired_config = config.clone();
        expired_config.refresh_token_expiry = -3600;
        let expired = issue_tokens(&store, user.id, &expired_config).await.unwrap();
        let result = refresh(&store, Some(&expired.refresh_token), &config).await;
        assert!(matches!(result, Err(AppError::Auth(AuthError::InvalidRefreshToken(_)))));

        let tokens = issue_tokens(&store, user.id, &config).await.unwrap();
        let tampered = format!("{}X", tokens.refresh_token);
        let result = refresh(&store, Some(&tampered), &config).await;
        assert!(matches!(result, Err(AppError::Auth(AuthError::InvalidRefreshToken(_)))));

        // The untampered token is still the stored one
        assert!(refresh(&store, Some(&tokens.refresh_token), &config).await.is_ok());
    }

    /// Store whose database is down; `find_by_id` can optionally still
    /// answer so that the rotation write is the first failure.
    struct UnavailableStore {
        user: Option<User>,
    }

    fn pool_timeout() -> AppError {
        DatabaseError::ConnectionPool("pool timed out".to_string()).into()
    }

    #[async_trait]
    impl UserStore for UnavailableStore {
        async fn find_by_username_or_email(
            &self,
            _username: Option<&str>,
            _email: Option<&str>,
        ) -> Result<Option<User>, AppError> {
            Err(pool_timeout())
        }

        async fn find_by_id(&self, _user_id: Uuid) -> Result<Option<User>, AppError> {
            match &self.user {
                Some(user) => Ok(Some(user.clone())),
                None => Err(pool_timeout()),
            }
        }

        async fn insert_user(&self, _new_user: NewUser) -> Result<User, AppError> {
            Err(pool_timeout())
        }

        async fn update_refresh_token(
            &self,
            _user_id: Uuid,
            _token_hash: Option<&str>,
        ) -> Result<(), AppError> {
            Err(pool_timeout())
        }

        async fn rotate_refresh_token(
            &self,
            _user_id: Uuid,
            _expected: &str,
            _replacement: &str,
        ) -> Result<bool, AppError> {
            Err(pool_timeout())
        }

        async fn update_password(&self, _user_id: Uuid, _hash: &str) -> Result<(), AppError> {
            Err(pool_timeout())
        }

        async fn update_account(
            &self,
            _user_id: Uuid,
            _full_name: &str,
            _email: &str,
        ) -> Result<Option<User>, AppError> {
            Err(pool_timeout())
        }

        async fn find_channel_profile(
            &self,
            _username: &str,
            _viewer_id: Uuid,
        ) -> Result<Option<ChannelProfile>, AppError> {
            Err(pool_timeout())
        }

        async fn watch_history(&self, _user_id: Uuid) -> Result<Vec<WatchedVideo>, AppError> {
            Err(pool_timeout())
        }
    }

    #[tokio::test]
    async fn test_refresh_store_failure_is_unauthorized() {
        use actix_web::{http::StatusCode, ResponseError};

        let config = config();
        let token = generate_refresh_token(Uuid::new_v4(), &config).unwrap();
        let store = UnavailableStore { user: None };

        let err = refresh(&store, Some(&token), &config).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::InvalidRefreshToken(_))));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_rotation_failure_is_unauthorized() {
        let (memory, user) = store_with_user().await;
        let config = config();
        let tokens = issue_tokens(&memory, user.id, &config).await.unwrap();
        let stored = memory.find_by_id(user.id).await.unwrap();
        let store = UnavailableStore { user: stored };

        let err = refresh(&store, Some(&tokens.refresh_token), &config).await.unwrap_err();
        match err {
            AppError::Auth(AuthError::InvalidRefreshToken(cause)) => {
                assert!(cause.contains("pool timed out"));
            }
            other => panic!("expected InvalidRefreshToken, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_authenticate_store_failure_is_unauthorized() {
        let (memory, user) = store_with_user().await;
        let config = config();
        let tokens = issue_tokens(&memory, user.id, &config).await.unwrap();
        let store = UnavailableStore { user: None };

        let result = authenticate(&store, Some(&tokens.access_token), &config).await;
        assert!(matches!(result, Err(AppError::Auth(AuthError::InvalidAccessToken(_)))));
    }
}
